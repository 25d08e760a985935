use grants_config::{AppConfig, BackendConfig, DevToolsConfig, ServerConfig};
use grants_forms::{FormDefinition, FormRegistry};
use grants_server::{routes, AppState};
use grants_services::{
    AgreementsProxy, Backends, HttpBackend, MockGrantApplicationService, MockLandGrantsApi,
    SubmissionReceipt,
};
use grants_test_utils::{MockBackend, LAND_GRANTS_FORM_YAML};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use warp::http::{Method, StatusCode};

const FORM: &str = "application/x-www-form-urlencoded";

fn registry() -> FormRegistry {
    let mut registry = FormRegistry::new();
    registry
        .register(FormDefinition::from_yaml(LAND_GRANTS_FORM_YAML).unwrap())
        .unwrap();
    registry
}

fn state_with(config: AppConfig, gas: MockGrantApplicationService, agreements: BackendConfig) -> AppState {
    let backends = Backends {
        gas: Arc::new(gas),
        land_grants: Arc::new(MockLandGrantsApi::new()),
        agreements: AgreementsProxy::new(
            HttpBackend::without_redirects(agreements, Duration::from_secs(5)).unwrap(),
        ),
    };
    AppState::new(config, registry(), backends)
}

fn state(config: AppConfig) -> AppState {
    state_with(
        config,
        MockGrantApplicationService::new(),
        BackendConfig::new("http://127.0.0.1:9"),
    )
}

fn json_body(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

fn session_cookie(response: &warp::http::Response<bytes::Bytes>) -> String {
    response.headers()["set-cookie"]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

fn location(response: &warp::http::Response<bytes::Bytes>) -> &str {
    response.headers()["location"].to_str().unwrap()
}

#[tokio::test]
async fn health_reports_success() {
    let api = routes(state(AppConfig::new()));

    let response = warp::test::request().path("/health").reply(&api).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response.body()), json!({ "message": "success" }));
}

#[tokio::test]
async fn form_root_redirects_to_first_page() {
    let api = routes(state(AppConfig::new()));

    let response = warp::test::request().path("/farm-payments").reply(&api).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/farm-payments/start");
}

#[tokio::test]
async fn unknown_form_is_404_json() {
    let api = routes(state(AppConfig::new()));

    let response = warp::test::request().path("/nope/start").reply(&api).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response.body());
    assert_eq!(body["statusCode"], json!(404));
    assert_eq!(body["code"], json!("NOT_FOUND"));
}

#[tokio::test]
async fn journey_is_kept_across_requests_by_cookie() {
    let mut gas = MockGrantApplicationService::new();
    gas.expect_submit()
        .withf(|payload| payload.sbi == Some(json!("106284736")))
        .times(1)
        .returning(|_| {
            Ok(SubmissionReceipt {
                reference: "ABC-DEF-123".to_string(),
                status: 200,
                response: None,
            })
        });
    let config = AppConfig::new().with_dev_tools(DevToolsConfig::default().enabled());
    let api = routes(state_with(config, gas, BackendConfig::new("http://127.0.0.1:9")));

    let response = warp::test::request()
        .path("/farm-payments/start")
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response.body())["view"], json!("content-page"));
    let cookie = session_cookie(&response);
    assert!(cookie.starts_with("session="));

    let steps = [
        ("check-land-details", "hasCheckedLandIsUpToDate=yes", "/farm-payments/select-land-parcel"),
        ("select-land-parcel", "landParcel=SX0679-9238", "/farm-payments/select-actions"),
        (
            "select-actions",
            "actionsObj=CMOR1&actionsObj.CMOR1.value=4.53&actionsObj.CMOR1.unit=ha",
            "/farm-payments/check-answers",
        ),
        ("check-answers", "", "/farm-payments/confirmation"),
    ];
    for (page, body, next) in steps {
        let response = warp::test::request()
            .method("POST")
            .path(&format!("/farm-payments/{page}"))
            .header("cookie", &cookie)
            .header("content-type", FORM)
            .body(body)
            .reply(&api)
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "posting {page}");
        assert_eq!(location(&response), next);
    }

    let response = warp::test::request()
        .path("/farm-payments/confirmation")
        .header("cookie", &cookie)
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response.body())["model"]["reference"], json!("ABC-DEF-123"));
}

#[tokio::test]
async fn invalid_answer_is_400_with_errors() {
    let api = routes(state(AppConfig::new()));

    let response = warp::test::request()
        .method("POST")
        .path("/farm-payments/select-land-parcel")
        .header("content-type", FORM)
        .body("landParcel=")
        .reply(&api)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response.body())["errors"][0]["field"], json!("landParcel"));
}

#[tokio::test]
async fn malformed_land_parcel_is_400_before_any_lookup() {
    let api = routes(state(AppConfig::new()));

    let response = warp::test::request()
        .method("POST")
        .path("/farm-payments/select-land-parcel")
        .header("content-type", FORM)
        .body("landParcel=x%2F..%2F..%2Fadmin%2Fusers%3Fall%3D1%23-9238")
        .reply(&api)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response.body());
    assert_eq!(body["errors"][0]["field"], json!("landParcel"));
    assert_eq!(body["model"]["fields"][0]["value"], Value::Null);
}

#[tokio::test]
async fn agreements_path_escaping_the_prefix_is_refused() {
    let mock = MockBackend::start(vec![]);
    let api = routes(state_with(
        AppConfig::new(),
        MockGrantApplicationService::new(),
        mock.backend_config(),
    ));

    let response = warp::test::request()
        .path("/agreements/%2e%2e/internal/x")
        .reply(&api)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response.body())["code"], json!("INVALID_AGREEMENTS_PATH"));
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn status_page_post_is_405() {
    let api = routes(state(AppConfig::new()));

    let response = warp::test::request()
        .method("POST")
        .path("/farm-payments/confirmation")
        .header("content-type", FORM)
        .body("")
        .reply(&api)
        .await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn update_sbi_is_hidden_unless_enabled() {
    let api = routes(state(AppConfig::new()));

    let response = warp::test::request()
        .method("POST")
        .path("/api/update-sbi")
        .json(&json!({ "sbi": "106284736" }))
        .reply(&api)
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_sbi_validates_and_applies_to_journeys() {
    let api = routes(state(AppConfig::new().with_sbi_selector(true)));

    let response = warp::test::request()
        .method("POST")
        .path("/api/update-sbi")
        .json(&json!({ "sbi": "12345" }))
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response.body())["code"], json!("INVALID_SBI"));

    let response = warp::test::request()
        .method("POST")
        .path("/api/update-sbi")
        .json(&json!({ "sbi": "200000001" }))
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);

    let response = warp::test::request()
        .path("/farm-payments/check-answers")
        .header("cookie", &cookie)
        .reply(&api)
        .await;
    assert_eq!(
        json_body(response.body())["model"]["answers"]["sbi"],
        json!("200000001")
    );
}

#[tokio::test]
async fn demo_confirmation_needs_dev_tools() {
    let api = routes(state(AppConfig::new()));
    let response = warp::test::request()
        .path("/dev/demo-confirmation/farm-payments")
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let config = AppConfig::new().with_dev_tools(DevToolsConfig::default().enabled());
    let api = routes(state(config));
    let response = warp::test::request()
        .path("/dev/demo-confirmation/farm-payments")
        .reply(&api)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response.body());
    assert_eq!(body["model"]["reference"], json!("DEV2024001"));
    assert_eq!(body["model"]["sessionTimeout"], json!("4 hours"));
    assert_eq!(body["pagePath"], json!("confirmation"));
}

#[tokio::test]
async fn agreements_requests_are_proxied_with_sbi() {
    let mock = MockBackend::start(vec![(
        Method::GET,
        "/agreements/review-offer",
        200,
        json!({ "offer": "ok" }),
    )]);
    let config = AppConfig::new().with_dev_tools(DevToolsConfig::default().enabled());
    let api = routes(state_with(
        config,
        MockGrantApplicationService::new(),
        mock.backend_config(),
    ));

    let response = warp::test::request()
        .path("/agreements/review-offer")
        .reply(&api)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response.body()), json!({ "offer": "ok" }));
    assert_eq!(mock.requests()[0].sbi.as_deref(), Some("106284736"));
}

#[tokio::test]
async fn static_assets_are_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("javascripts")).unwrap();
    std::fs::create_dir_all(dir.path().join("assets/images")).unwrap();
    std::fs::write(dir.path().join("javascripts/application.min.js"), "window.app={};").unwrap();
    std::fs::write(dir.path().join("assets/images/logo.svg"), "<svg/>").unwrap();

    let server = ServerConfig {
        static_dir: dir.path().to_path_buf(),
        ..ServerConfig::default()
    };
    let api = routes(state(AppConfig::new().with_server(server)));

    let response = warp::test::request()
        .path("/javascripts/application.min.js")
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body().as_ref(), b"window.app={};");

    let response = warp::test::request()
        .path("/assets/images/logo.svg")
        .reply(&api)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}
