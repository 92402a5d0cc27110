//! Authentication API Endpoints
//! Mission: Bind the signup, login, and sign-out flows to routes
//!
//! Page rendering lives elsewhere; these handlers return the context a page
//! would be rendered from, and redirects where the browser is sent onward.

use crate::auth::flow::{AuthFlow, DEFAULT_LANDING};
use crate::auth::gate::CurrentSession;
use crate::auth::AuthError;
use axum::{
    extract::State,
    response::Redirect,
    Extension, Form, Json,
};
use serde::{Deserialize, Serialize};

/// Context shared by every page: its title and who is signed in.
#[derive(Debug, Serialize)]
pub struct PageContext {
    pub title: &'static str,
    pub login_name: Option<String>,
}

impl PageContext {
    fn new(title: &'static str, session: &CurrentSession) -> Self {
        Self {
            title,
            login_name: session.0.account().map(|a| a.display_name.clone()),
        }
    }
}

/// Login form fields. `username` carries the email, as the original form did.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Signup form fields.
#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirmpwd: String,
}

/// GET /
pub async fn landing(Extension(session): Extension<CurrentSession>) -> Json<PageContext> {
    Json(PageContext::new("Restaurant Review", &session))
}

/// GET /health
pub async fn health() -> &'static str {
    "OK"
}

/// GET /login
pub async fn login_page(Extension(session): Extension<CurrentSession>) -> Json<PageContext> {
    Json(PageContext::new("Login", &session))
}

/// POST /login — verify credentials and send the client back where it was
/// originally headed, or to the landing page.
pub async fn login(
    State(flow): State<AuthFlow>,
    Extension(session): Extension<CurrentSession>,
    Form(form): Form<LoginForm>,
) -> Result<Redirect, AuthError> {
    let outcome = flow.login(session.0.id, &form.username, &form.password)?;
    Ok(Redirect::to(&outcome.destination))
}

/// GET /create_acct
pub async fn signup_page(Extension(session): Extension<CurrentSession>) -> Json<PageContext> {
    Json(PageContext::new("Create Account", &session))
}

/// POST /create_acct — create the account and sign the new reviewer in.
pub async fn create_acct(
    State(flow): State<AuthFlow>,
    Extension(session): Extension<CurrentSession>,
    Form(form): Form<SignupForm>,
) -> Result<Redirect, AuthError> {
    flow.create_account(
        session.0.id,
        &form.name,
        &form.email,
        &form.password,
        &form.confirmpwd,
    )?;
    Ok(Redirect::to(DEFAULT_LANDING))
}

/// POST /signout
pub async fn signout(
    State(flow): State<AuthFlow>,
    Extension(session): Extension<CurrentSession>,
) -> Redirect {
    flow.logout(session.0.id);
    Redirect::to(DEFAULT_LANDING)
}

/// GET /addreview — protected; only reachable through the gate. The review
/// insert itself is the record layer's business, not this subsystem's.
pub async fn add_review_page(Extension(session): Extension<CurrentSession>) -> Json<PageContext> {
    Json(PageContext::new("Add Restaurant Review", &session))
}

/// GET /restaurant/new — protected.
pub async fn new_restaurant_page(
    Extension(session): Extension<CurrentSession>,
) -> Json<PageContext> {
    Json(PageContext::new("Add Restaurant", &session))
}
