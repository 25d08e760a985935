//! Request handlers
//!
//! Handlers never reject: every failure becomes an [`AppError`] reply so a
//! failed form request is not retried against the other routes.

use crate::reply::{error_reply, page_reply, see_other, with_session_cookie};
use crate::state::AppState;
use bytes::Bytes;
use grants_config::format_ttl_to_readable;
use grants_forms::{PageKind, ViewModel};
use grants_services::{AppError, AppResult, ProxyRequest, Session};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use std::convert::Infallible;
use warp::http::header::{HeaderValue, CONTENT_TYPE, LOCATION};
use warp::http::{Method, StatusCode};
use warp::hyper::Body;
use warp::reply::{Reply, Response};

static SBI_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{9}$").expect("sbi pattern is valid"));

/// `GET /health`
pub async fn health() -> Result<Response, Infallible> {
    Ok(warp::reply::json(&json!({ "message": "success" })).into_response())
}

async fn load_session(state: &AppState, cookie: Option<&str>) -> Session {
    state
        .sessions
        .load_or_create(cookie, || state.default_identity())
        .await
}

async fn finish(state: &AppState, session: Session, result: AppResult<Response>) -> Response {
    let id = session.id;
    state.sessions.save(session).await;
    let response = result.unwrap_or_else(|err| error_reply(&err));
    with_session_cookie(response, id, state.sessions.ttl())
}

/// `GET /{slug}`
pub async fn form_start(slug: String, state: AppState) -> Result<Response, Infallible> {
    Ok(match state.engine.start_path(&slug) {
        Ok(location) => see_other(&location),
        Err(err) => error_reply(&err),
    })
}

/// `GET /{slug}/{page}`
pub async fn page_get(
    slug: String,
    page: String,
    state: AppState,
    cookie: Option<String>,
) -> Result<Response, Infallible> {
    let mut session = load_session(&state, cookie.as_deref()).await;
    let result = state
        .engine
        .get(&mut session, &slug, &page)
        .await
        .map(page_reply);
    Ok(finish(&state, session, result).await)
}

/// `POST /{slug}/{page}`
pub async fn page_post(
    slug: String,
    page: String,
    state: AppState,
    cookie: Option<String>,
    posted: Vec<(String, String)>,
) -> Result<Response, Infallible> {
    let mut session = load_session(&state, cookie.as_deref()).await;
    let result = state
        .engine
        .post(&mut session, &slug, &page, &posted)
        .await
        .map(page_reply);
    Ok(finish(&state, session, result).await)
}

fn parse_sbi(body: &[u8]) -> AppResult<String> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        AppError::payload_validation("INVALID_PAYLOAD", "request body must be JSON").with_source(e)
    })?;
    let sbi = match value.get("sbi") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    if SBI_PATTERN.is_match(&sbi) {
        Ok(sbi)
    } else {
        Err(AppError::payload_validation("INVALID_SBI", "SBI must be 9 digits")
            .with_context("sbi", sbi))
    }
}

/// `POST /api/update-sbi`
pub async fn update_sbi(
    state: AppState,
    cookie: Option<String>,
    body: Bytes,
) -> Result<Response, Infallible> {
    if !state.config.sbi_selector_enabled {
        return Ok(error_reply(&AppError::not_found("route not found")));
    }

    let mut session = load_session(&state, cookie.as_deref()).await;
    let result = parse_sbi(&body).map(|sbi| {
        tracing::info!(session = %session.id, %sbi, "business selection changed");
        session.identity.sbi = Some(sbi.clone());
        warp::reply::json(&json!({ "success": true, "sbi": sbi })).into_response()
    });
    Ok(finish(&state, session, result).await)
}

fn proxy_method(method: &Method) -> AppResult<reqwest::Method> {
    if method != Method::GET && method != Method::POST {
        return Err(AppError::method_not_allowed(format!(
            "{method} is not supported for agreements"
        )));
    }
    reqwest::Method::from_bytes(method.as_str().as_bytes())
        .map_err(|e| AppError::internal("unsupported method").with_source(e))
}

async fn proxy(
    state: &AppState,
    session: &Session,
    request: (Method, String, String, Option<String>, Bytes),
) -> AppResult<Response> {
    let (method, path, query, content_type, body) = request;
    let proxied = state
        .agreements
        .forward(ProxyRequest {
            method: proxy_method(&method)?,
            path,
            query: (!query.is_empty()).then_some(query),
            content_type,
            body,
            sbi: session.identity.sbi.clone(),
        })
        .await?;

    let mut response = Response::new(Body::from(proxied.body));
    *response.status_mut() = StatusCode::from_u16(proxied.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let headers = [(CONTENT_TYPE, proxied.content_type), (LOCATION, proxied.location)];
    for (name, value) in headers {
        if let Some(value) = value.and_then(|v| HeaderValue::from_str(&v).ok()) {
            response.headers_mut().insert(name, value);
        }
    }
    Ok(response)
}

/// `GET|POST /agreements/{path*}`
pub async fn agreements(
    method: Method,
    tail: warp::path::Tail,
    query: String,
    content_type: Option<String>,
    body: Bytes,
    state: AppState,
    cookie: Option<String>,
) -> Result<Response, Infallible> {
    let session = load_session(&state, cookie.as_deref()).await;
    let request = (method, tail.as_str().to_string(), query, content_type, body);
    let result = proxy(&state, &session, request).await;
    Ok(finish(&state, session, result).await)
}

/// `GET /dev/demo-confirmation/{slug}`
pub async fn demo_confirmation(slug: String, state: AppState) -> Result<Response, Infallible> {
    Ok(match demo_view(&slug, &state) {
        Ok(view) => warp::reply::json(&view).into_response(),
        Err(err) => error_reply(&err),
    })
}

fn demo_view(slug: &str, state: &AppState) -> AppResult<ViewModel> {
    let dev_tools = &state.config.dev_tools;
    if !dev_tools.enabled {
        return Err(AppError::not_found("route not found"));
    }

    let form = state.engine.form(slug)?;
    let page = form
        .page_of_kind(PageKind::Status)
        .unwrap_or_else(|| form.first_page());
    let model = json!({
        "reference": dev_tools.demo_ref_number,
        "businessName": dev_tools.demo_business_name,
        "sbi": dev_tools.demo_sbi,
        "contactName": dev_tools.demo_contact_name,
        "sessionTimeout": format_ttl_to_readable(state.config.session.ttl_ms),
        "isDevelopmentMode": true,
    });
    Ok(ViewModel::new(&form, page, "confirmation-page", model).without_back_link())
}
