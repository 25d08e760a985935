//! Route table

use crate::handlers;
use crate::reply::handle_rejection;
use crate::state::AppState;
use grants_services::SESSION_COOKIE;
use std::convert::Infallible;
use warp::{Filter, Rejection, Reply};

const MAX_FORM_BYTES: u64 = 64 * 1024;
const MAX_PROXY_BYTES: u64 = 1024 * 1024;

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn session_cookie() -> impl Filter<Extract = (Option<String>,), Error = Infallible> + Clone {
    warp::cookie::optional::<String>(SESSION_COOKIE)
}

fn raw_query() -> impl Filter<Extract = (String,), Error = Infallible> + Clone {
    warp::query::raw()
        .or(warp::any().map(String::new))
        .unify()
}

/// `/health`, `/api/update-sbi` and `/dev/*`
pub fn api(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let health = warp::path!("health").and(warp::get()).and_then(handlers::health);

    let update_sbi = warp::path!("api" / "update-sbi")
        .and(warp::post())
        .and(with_state(state.clone()))
        .and(session_cookie())
        .and(warp::body::content_length_limit(MAX_FORM_BYTES))
        .and(warp::body::bytes())
        .and_then(handlers::update_sbi);

    let demo = warp::path!("dev" / "demo-confirmation" / String)
        .and(warp::get())
        .and(with_state(state))
        .and_then(handlers::demo_confirmation);

    health.or(update_sbi).or(demo)
}

/// `/agreements/{path*}`
pub fn agreements(
    state: AppState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path("agreements")
        .and(warp::method())
        .and(warp::path::tail())
        .and(raw_query())
        .and(warp::header::optional::<String>("content-type"))
        .and(warp::body::content_length_limit(MAX_PROXY_BYTES))
        .and(warp::body::bytes())
        .and(with_state(state))
        .and(session_cookie())
        .and_then(handlers::agreements)
}

/// Static files under the configured directory
pub fn assets(state: &AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let root = state.config.server.static_dir.clone();
    let script = warp::path!("javascripts" / "application.min.js")
        .and(warp::get())
        .and(warp::fs::file(root.join("javascripts").join("application.min.js")));
    let files = warp::path("assets")
        .and(warp::get())
        .and(warp::fs::dir(root.join("assets")));
    script.or(files)
}

/// `/{slug}` and `/{slug}/{page}`
pub fn forms(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let start = warp::path!(String)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::form_start);

    let get = warp::path!(String / String)
        .and(warp::get())
        .and(with_state(state.clone()))
        .and(session_cookie())
        .and_then(handlers::page_get);

    let post = warp::path!(String / String)
        .and(warp::post())
        .and(with_state(state))
        .and(session_cookie())
        .and(warp::body::content_length_limit(MAX_FORM_BYTES))
        .and(warp::body::form::<Vec<(String, String)>>())
        .and_then(handlers::page_post);

    start.or(get).or(post)
}

/// Every route, with request logging and error replies
pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    api(state.clone())
        .or(agreements(state.clone()))
        .or(assets(&state))
        .or(forms(state))
        .recover(handle_rejection)
        .with(warp::log::custom(|info| {
            tracing::info!(
                method = %info.method(),
                path = info.path(),
                status = info.status().as_u16(),
                elapsed_ms = u64::try_from(info.elapsed().as_millis()).unwrap_or(u64::MAX),
                "request"
            );
        }))
}
