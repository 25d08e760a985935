//! Turning page responses and errors into HTTP replies

use grants_forms::PageResponse;
use grants_services::{AppError, ErrorKind, SessionId, SESSION_COOKIE};
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use warp::http::header::{HeaderValue, LOCATION, SET_COOKIE};
use warp::http::StatusCode;
use warp::hyper::Body;
use warp::reply::{Reply, Response};
use warp::Rejection;

/// Reply for a page handler outcome
pub fn page_reply(response: PageResponse) -> Response {
    match response {
        PageResponse::Render { status, view } => warp::reply::with_status(
            warp::reply::json(&view),
            StatusCode::from_u16(status).unwrap_or(StatusCode::OK),
        )
        .into_response(),
        PageResponse::Redirect(location) => see_other(&location),
    }
}

/// 303 redirect
pub fn see_other(location: &str) -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::SEE_OTHER;
    match HeaderValue::from_str(location) {
        Ok(value) => {
            response.headers_mut().insert(LOCATION, value);
            response
        }
        Err(_) => error_reply(&AppError::internal("redirect location is not a valid header")),
    }
}

/// JSON error reply; logs the error unless already logged
pub fn error_reply(err: &AppError) -> Response {
    err.log_once();

    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = match err.kind() {
        ErrorKind::Internal | ErrorKind::Config | ErrorKind::OidcConfig => {
            "An internal server error occurred"
        }
        _ => err.message(),
    };
    let body = json!({
        "statusCode": status.as_u16(),
        "error": status.canonical_reason().unwrap_or("Error"),
        "code": err.code(),
        "message": message,
    });
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

/// Attach the session cookie
pub fn with_session_cookie(mut response: Response, id: SessionId, ttl: Duration) -> Response {
    let cookie = format!(
        "{SESSION_COOKIE}={id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        ttl.as_secs()
    );
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    response
}

/// Map warp's own rejections onto the application error shape
pub async fn handle_rejection(rejection: Rejection) -> Result<Response, Infallible> {
    let err = if rejection.is_not_found() {
        AppError::not_found("route not found")
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        AppError::method_not_allowed("method not allowed")
    } else if let Some(e) = rejection.find::<warp::filters::body::BodyDeserializeError>() {
        AppError::payload_validation("INVALID_PAYLOAD", e.to_string())
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        AppError::payload_validation("PAYLOAD_TOO_LARGE", "request body too large")
    } else if rejection.find::<warp::reject::UnsupportedMediaType>().is_some() {
        AppError::payload_validation("UNSUPPORTED_MEDIA_TYPE", "unsupported content type")
    } else {
        AppError::internal(format!("unhandled rejection: {rejection:?}"))
    };
    Ok(error_reply(&err))
}
