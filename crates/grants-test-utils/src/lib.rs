//! Testing utilities for grants-ui workspace
//!
//! Shared fixtures and a recording mock backend.

#![warn(missing_docs)]

use bytes::Bytes;
use grants_config::BackendConfig;
use grants_state::FormState;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;
use warp::http::{Method, StatusCode};
use warp::path::FullPath;
use warp::Filter;

/// Land application form used across tests
pub const LAND_GRANTS_FORM_YAML: &str = r#"
slug: farm-payments
title: Apply for farm payments
metadata:
  scheme: SFI
  year: 2025
pages:
  - path: start
    title: Apply for farm payments
    kind: generic
  - path: check-land-details
    title: Check your land details
    kind: question
    section: land-details
    fields:
      - name: hasCheckedLandIsUpToDate
        label: Is your land information up to date?
        type: yesno
        required: true
  - path: select-land-parcel
    title: Select a land parcel
    kind: question
    section: land-parcel
    fields:
      - name: landParcel
        label: Land parcel
        type: landparcel
        required: true
  - path: select-actions
    title: Select actions for this parcel
    kind: question
    section: actions
    load_parcel: true
    fields:
      - name: actionsObj
        label: Actions
        type: actions
        required: true
  - path: check-answers
    title: Check your answers
    kind: summary
  - path: confirmation
    title: Application submitted
    kind: status
"#;

/// Single-page information form without submission
pub const INFO_FORM_YAML: &str = r"
slug: eligibility
title: Check your eligibility
pages:
  - path: start
    title: Who can apply
    kind: generic
    next: farm-size
  - path: farm-size
    title: How big is your farm?
    kind: question
    section: farm
    fields:
      - name: farmSize
        label: Size in hectares
        type: number
";

/// Journey answers ready for submission
#[must_use]
pub fn sample_land_state() -> FormState {
    FormState::from_value(json!({
        "sbi": "106284736",
        "crn": "1100014934",
        "scheme": "SFI",
        "year": 2025,
        "hasCheckedLandIsUpToDate": true,
        "landParcel": "SX0679-9238",
        "actionsObj": {
            "CMOR1": { "value": "4.53", "unit": "ha" },
            "UPL1": { "value": "2", "unit": " ha " }
        }
    }))
    .expect("fixture is an object")
}

/// Parcel body as returned by the Land Grants API
#[must_use]
pub fn sample_parcel_response() -> Value {
    json!({
        "parcel": {
            "parcelId": "9238",
            "sheetId": "SX0679",
            "size": { "unit": "ha", "value": 4.53 },
            "actions": [
                { "code": "CMOR1", "description": "Assess moorland", "availableArea": { "unit": "ha", "value": 4.53 } },
                { "code": "UPL1", "description": "Moderate livestock grazing on moorland" }
            ]
        }
    })
}

/// Write form definitions into a fresh directory
#[must_use]
pub fn forms_dir(forms: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    for (name, yaml) in forms {
        std::fs::write(dir.path().join(name), yaml).expect("write form definition");
    }
    dir
}

/// Request captured by [`MockBackend`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method
    pub method: Method,
    /// Path as received, percent-encoding kept
    pub path: String,
    /// `Authorization` header
    pub authorization: Option<String>,
    /// `x-sbi` header
    pub sbi: Option<String>,
    /// Raw body
    pub body: Bytes,
}

impl RecordedRequest {
    /// Body parsed as JSON
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }
}

type Responses = HashMap<(Method, String), (u16, Value)>;

/// HTTP server answering canned responses and recording every request
#[derive(Debug, Clone)]
pub struct MockBackend {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockBackend {
    /// Start a server on an ephemeral port
    ///
    /// Unmatched requests get a 404.
    #[must_use]
    pub fn start(responses: Vec<(Method, &str, u16, Value)>) -> Self {
        let responses: Arc<Responses> = Arc::new(
            responses
                .into_iter()
                .map(|(method, path, status, body)| ((method, path.to_string()), (status, body)))
                .collect(),
        );
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();

        let routes = warp::method()
            .and(warp::path::full())
            .and(warp::header::optional::<String>("authorization"))
            .and(warp::header::optional::<String>("x-sbi"))
            .and(warp::body::bytes())
            .map(
                move |method: Method,
                      path: FullPath,
                      authorization: Option<String>,
                      sbi: Option<String>,
                      body: Bytes| {
                    let path = path.as_str().to_string();
                    recorded.lock().push(RecordedRequest {
                        method: method.clone(),
                        path: path.clone(),
                        authorization,
                        sbi,
                        body,
                    });
                    let (status, body) = responses
                        .get(&(method, path))
                        .cloned()
                        .unwrap_or((404, json!({ "message": "not found" })));
                    warp::reply::with_status(
                        warp::reply::json(&body),
                        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                    )
                },
            );

        let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        Self { addr, requests }
    }

    /// Base URL of the server
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Backend settings pointing at this server
    #[must_use]
    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig::new(self.url())
    }

    /// Requests received so far
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }
}

/// Mock Grant Application Service answering submissions
#[must_use]
pub fn mock_gas(status: u16, body: Value) -> MockBackend {
    MockBackend::start(vec![(
        Method::POST,
        "/grants/actions/submit-land-application/invoke",
        status,
        body,
    )])
}

/// Mock Land Grants API serving the sample parcel
#[must_use]
pub fn mock_land_grants() -> MockBackend {
    MockBackend::start(vec![(
        Method::GET,
        "/parcel/SX0679-9238",
        200,
        sample_parcel_response(),
    )])
}
