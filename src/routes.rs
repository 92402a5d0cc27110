//! Router assembly and the route classification table.

use crate::auth::api;
use crate::auth::flow::AuthFlow;
use crate::auth::gate::{access_gate, GateState, RouteClass};
use crate::middleware::request_logging;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

/// The single place routes are classified. Handlers never re-derive this
/// from path strings; the gate receives it per request.
pub fn classify(path: &str) -> RouteClass {
    match path {
        "/addreview" | "/restaurant/new" => RouteClass::Protected,
        _ => RouteClass::Public,
    }
}

/// Build the application router. Every route except `/health` sits behind
/// the access gate, which attaches the session for handlers downstream.
pub fn build_router(flow: AuthFlow) -> Router {
    let gate = GateState {
        flow: flow.clone(),
        classify,
    };

    Router::new()
        .route("/", get(api::landing))
        .route("/login", get(api::login_page).post(api::login))
        .route("/create_acct", get(api::signup_page).post(api::create_acct))
        .route("/signout", post(api::signout))
        .route("/addreview", get(api::add_review_page))
        .route("/restaurant/new", get(api::new_restaurant_page))
        .layer(middleware::from_fn_with_state(gate, access_gate))
        .route("/health", get(api::health))
        .layer(middleware::from_fn(request_logging))
        .with_state(flow)
}
