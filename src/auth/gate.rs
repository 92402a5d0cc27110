//! Access-Control Gate
//! Mission: Decide pass-through vs. redirect-to-login before every request
//!
//! The policy itself is a pure function of the session and the route's
//! classification, evaluated fresh each request. The middleware around it
//! owns the session cookie and persists destination captures.

use crate::auth::flow::AuthFlow;
use crate::auth::session::Session;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::debug;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "tableside_session";
pub const LOGIN_PATH: &str = "/login";

/// Whether a route requires an authenticated session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Public,
    Protected,
}

/// Outcome of the per-request policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectToLogin { captured: String },
}

/// Evaluate the access policy for one request.
///
/// Authenticated sessions pass regardless of classification. An anonymous
/// request to a protected route captures its destination on the session,
/// overwriting any earlier capture.
pub fn authorize(session: &mut Session, requested_path: &str, class: RouteClass) -> Decision {
    if session.is_authenticated() {
        return Decision::Allow;
    }
    match class {
        RouteClass::Protected => {
            session.capture_destination(requested_path);
            Decision::RedirectToLogin {
                captured: requested_path.to_string(),
            }
        }
        RouteClass::Public => Decision::Allow,
    }
}

/// State for the gate middleware: the flow's stores plus the route layer's
/// classification table, injected so the policy stays free of hardcoded
/// path comparisons.
#[derive(Clone)]
pub struct GateState {
    pub flow: AuthFlow,
    pub classify: fn(&str) -> RouteClass,
}

/// The request's session, made available to handlers downstream of the gate.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

/// Middleware run before every routed request.
///
/// Lazily creates a session (and its cookie) for clients without one, then
/// either forwards to the handler with the session attached or halts with a
/// redirect to the login page.
pub async fn access_gate(State(state): State<GateState>, mut req: Request, next: Next) -> Response {
    let jar = CookieJar::from_headers(req.headers());
    let known_id = jar
        .get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok());

    // An expired or unknown token gets a fresh session under a new id.
    let (mut session, issued) = match known_id.and_then(|id| state.flow.sessions.get(&id)) {
        Some(session) => (session, false),
        None => (Session::new(Uuid::new_v4()), true),
    };

    // Capture path plus query so a login can restore e.g. /addreview?id=7.
    let destination = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let class = (state.classify)(req.uri().path());

    match authorize(&mut session, &destination, class) {
        Decision::RedirectToLogin { captured } => {
            state.flow.sessions.put(session.clone());
            debug!(destination = %captured, "anonymous request to protected route");
            with_cookie(jar, issued, &session, Redirect::to(LOGIN_PATH).into_response())
        }
        Decision::Allow => {
            // Every touch refreshes the idle deadline.
            state.flow.sessions.put(session.clone());
            req.extensions_mut().insert(CurrentSession(session.clone()));
            let response = next.run(req).await;
            with_cookie(jar, issued, &session, response)
        }
    }
}

fn with_cookie(jar: CookieJar, issued: bool, session: &Session, response: Response) -> Response {
    if !issued {
        return response;
    }
    let cookie = Cookie::build((SESSION_COOKIE, session.id.to_string()))
        .path("/")
        .http_only(true)
        .build();
    (jar.add(cookie), response).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_protected_redirects_and_captures() {
        let mut session = Session::new(Uuid::new_v4());
        let decision = authorize(&mut session, "/addreview?id=7", RouteClass::Protected);
        assert_eq!(
            decision,
            Decision::RedirectToLogin {
                captured: "/addreview?id=7".to_string()
            }
        );
        assert_eq!(session.pending_destination(), Some("/addreview?id=7"));
    }

    #[test]
    fn test_anonymous_public_allows_without_capture() {
        let mut session = Session::new(Uuid::new_v4());
        session.capture_destination("/addreview");
        let decision = authorize(&mut session, "/search", RouteClass::Public);
        assert_eq!(decision, Decision::Allow);
        // An earlier capture is left alone.
        assert_eq!(session.pending_destination(), Some("/addreview"));
    }

    #[test]
    fn test_authenticated_allows_any_class() {
        let mut session = Session::new(Uuid::new_v4());
        session.authenticate(Uuid::new_v4(), "Alice");
        assert_eq!(
            authorize(&mut session, "/addreview", RouteClass::Protected),
            Decision::Allow
        );
        assert_eq!(
            authorize(&mut session, "/", RouteClass::Public),
            Decision::Allow
        );
        assert_eq!(session.pending_destination(), None);
    }

    #[test]
    fn test_latest_capture_wins() {
        let mut session = Session::new(Uuid::new_v4());
        authorize(&mut session, "/addreview", RouteClass::Protected);
        authorize(&mut session, "/restaurant/new", RouteClass::Protected);
        assert_eq!(session.pending_destination(), Some("/restaurant/new"));
    }
}
