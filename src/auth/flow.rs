//! Authentication Flow
//! Mission: Orchestrate signup, login, and sign-out against the stores

use crate::auth::account_store::{AccountStore, StoreError};
use crate::auth::credential::Credential;
use crate::auth::session::{Session, SessionStore};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Where a successful login lands when no destination was captured, e.g.
/// direct navigation to the login page.
pub const DEFAULT_LANDING: &str = "/";

/// One user-facing message for unknown email, wrong password, and corrupt
/// credentials alike, so responses never reveal which emails are registered.
const GENERIC_LOGIN_FAILURE: &str = "Invalid email or password.";

/// Signup and login orchestration over injected stores.
#[derive(Clone)]
pub struct AuthFlow {
    pub sessions: Arc<dyn SessionStore>,
    pub accounts: Arc<dyn AccountStore>,
    /// Iteration policy for credentials created now. Existing records carry
    /// their own count and are unaffected by changes here.
    pub signup_iterations: u32,
}

/// Successful login: the authenticated session plus where to send the client.
#[derive(Debug)]
pub struct LoginOutcome {
    pub session: Session,
    pub destination: String,
}

impl AuthFlow {
    /// Create an account and authenticate the current session with it.
    ///
    /// Validation happens before any store call; a failed signup never
    /// leaves a partial row behind.
    pub fn create_account(
        &self,
        session_id: Uuid,
        display_name: &str,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> Result<Session, AuthError> {
        if display_name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingField);
        }
        if password != confirm {
            return Err(AuthError::PasswordMismatch);
        }

        let credential = Credential::encode(password, self.signup_iterations);
        let account = self
            .accounts
            .create(display_name, email, &credential.serialized())
            .map_err(|e| match e {
                StoreError::DuplicateEmail => AuthError::DuplicateEmail,
                StoreError::Other(e) => AuthError::Store(e),
            })?;

        let mut session = self
            .sessions
            .get(&session_id)
            .unwrap_or_else(|| Session::new(session_id));
        session.authenticate(account.id, &account.display_name);
        self.sessions.put(session.clone());

        info!(account_id = %account.id, "account created");
        Ok(session)
    }

    /// Verify credentials and authenticate the current session.
    ///
    /// On success the captured destination is consumed and cleared; the
    /// caller redirects there, or to [`DEFAULT_LANDING`] if none was set.
    pub fn login(
        &self,
        session_id: Uuid,
        email: &str,
        password: &str,
    ) -> Result<LoginOutcome, AuthError> {
        let account = self
            .accounts
            .find_by_email(email)
            .map_err(AuthError::Store)?
            .ok_or(AuthError::NoSuchAccount)?;

        let matched = Credential::verify(password, &account.credential).map_err(|e| {
            // Data corruption, not a wrong password. Distinguished here and
            // in the logs, identical to the client.
            error!(account_id = %account.id, "stored credential unusable: {}", e);
            AuthError::MalformedCredential
        })?;

        if !matched {
            warn!(account_id = %account.id, "failed login attempt");
            return Err(AuthError::InvalidPassword);
        }

        let mut session = self
            .sessions
            .get(&session_id)
            .unwrap_or_else(|| Session::new(session_id));
        session.authenticate(account.id, &account.display_name);
        let destination = session
            .take_destination()
            .unwrap_or_else(|| DEFAULT_LANDING.to_string());
        self.sessions.put(session.clone());

        info!(account_id = %account.id, "login successful");
        Ok(LoginOutcome {
            session,
            destination,
        })
    }

    /// Destroy the session's server-side state. Idempotent: signing out an
    /// anonymous or already-destroyed session is not an error.
    pub fn logout(&self, session_id: Uuid) {
        self.sessions.destroy(&session_id);
    }
}

/// Authentication failures. The `IntoResponse` mapping is the only place
/// these reach clients; it never discloses which field was wrong.
#[derive(Debug)]
pub enum AuthError {
    MissingField,
    PasswordMismatch,
    DuplicateEmail,
    NoSuchAccount,
    InvalidPassword,
    MalformedCredential,
    Store(anyhow::Error),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingField => write!(f, "missing required field"),
            AuthError::PasswordMismatch => write!(f, "password confirmation mismatch"),
            AuthError::DuplicateEmail => write!(f, "email already registered"),
            AuthError::NoSuchAccount => write!(f, "no account for login identifier"),
            AuthError::InvalidPassword => write!(f, "password verification failed"),
            AuthError::MalformedCredential => write!(f, "stored credential is malformed"),
            AuthError::Store(e) => write!(f, "store failure: {}", e),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingField => (StatusCode::BAD_REQUEST, "All fields are required."),
            AuthError::PasswordMismatch => (StatusCode::BAD_REQUEST, "Passwords do not match."),
            AuthError::DuplicateEmail => (
                StatusCode::CONFLICT,
                "An account with that email already exists.",
            ),
            AuthError::NoSuchAccount
            | AuthError::InvalidPassword
            | AuthError::MalformedCredential => (StatusCode::UNAUTHORIZED, GENERIC_LOGIN_FAILURE),
            AuthError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::account_store::SqliteAccountStore;
    use crate::auth::session::MemorySessionStore;
    use tempfile::NamedTempFile;

    fn test_flow() -> (AuthFlow, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let accounts = SqliteAccountStore::new(temp_file.path().to_str().unwrap()).unwrap();
        let flow = AuthFlow {
            sessions: Arc::new(MemorySessionStore::new(60)),
            accounts: Arc::new(accounts),
            signup_iterations: 1_000,
        };
        (flow, temp_file)
    }

    #[test]
    fn test_signup_password_mismatch_creates_nothing() {
        let (flow, _temp) = test_flow();
        let session_id = Uuid::new_v4();

        let err = flow
            .create_account(session_id, "Alice", "alice@example.com", "secret1", "secret2")
            .unwrap_err();
        assert!(matches!(err, AuthError::PasswordMismatch));

        // No partial write, no session change.
        assert!(flow
            .accounts
            .find_by_email("alice@example.com")
            .unwrap()
            .is_none());
        assert!(flow.sessions.get(&session_id).is_none());
    }

    #[test]
    fn test_signup_authenticates_session() {
        let (flow, _temp) = test_flow();
        let session_id = Uuid::new_v4();

        let session = flow
            .create_account(session_id, "Alice", "alice@example.com", "secret1", "secret1")
            .unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.account().unwrap().display_name, "Alice");

        let stored = flow.sessions.get(&session_id).unwrap();
        assert!(stored.is_authenticated());
    }

    #[test]
    fn test_signup_duplicate_email() {
        let (flow, _temp) = test_flow();

        flow.create_account(Uuid::new_v4(), "Alice", "alice@example.com", "secret1", "secret1")
            .unwrap();
        let err = flow
            .create_account(Uuid::new_v4(), "Bob", "alice@example.com", "hunter2", "hunter2")
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateEmail));
    }

    #[test]
    fn test_login_success_consumes_destination() {
        let (flow, _temp) = test_flow();
        flow.create_account(Uuid::new_v4(), "Alice", "alice@example.com", "secret1", "secret1")
            .unwrap();

        let session_id = Uuid::new_v4();
        let mut session = Session::new(session_id);
        session.capture_destination("/addreview?id=7");
        flow.sessions.put(session);

        let outcome = flow.login(session_id, "alice@example.com", "secret1").unwrap();
        assert_eq!(outcome.destination, "/addreview?id=7");
        assert!(outcome.session.is_authenticated());

        // Destination is consumed: a second login falls back to the default.
        flow.logout(session_id);
        let outcome = flow.login(session_id, "alice@example.com", "secret1").unwrap();
        assert_eq!(outcome.destination, DEFAULT_LANDING);
    }

    #[test]
    fn test_login_wrong_password_leaves_session_untouched() {
        let (flow, _temp) = test_flow();
        flow.create_account(Uuid::new_v4(), "Alice", "alice@example.com", "secret1", "secret1")
            .unwrap();

        let session_id = Uuid::new_v4();
        let err = flow
            .login(session_id, "alice@example.com", "wrong")
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidPassword));
        assert!(flow.sessions.get(&session_id).is_none());
    }

    #[test]
    fn test_login_unknown_email() {
        let (flow, _temp) = test_flow();
        let err = flow
            .login(Uuid::new_v4(), "nobody@example.com", "secret1")
            .unwrap_err();
        assert!(matches!(err, AuthError::NoSuchAccount));
    }

    #[test]
    fn test_unknown_email_and_wrong_password_present_identically() {
        let (flow, _temp) = test_flow();
        flow.create_account(Uuid::new_v4(), "Alice", "alice@example.com", "secret1", "secret1")
            .unwrap();

        let unknown = flow
            .login(Uuid::new_v4(), "nobody@example.com", "secret1")
            .unwrap_err()
            .into_response();
        let wrong = flow
            .login(Uuid::new_v4(), "alice@example.com", "wrong")
            .unwrap_err()
            .into_response();
        assert_eq!(unknown.status(), wrong.status());
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_malformed_stored_credential_surfaces_as_generic_failure() {
        let (flow, _temp) = test_flow();
        flow.accounts
            .create("Alice", "alice@example.com", "not-a-credential")
            .unwrap();

        let err = flow
            .login(Uuid::new_v4(), "alice@example.com", "secret1")
            .unwrap_err();
        assert!(matches!(err, AuthError::MalformedCredential));
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_logout_is_idempotent() {
        let (flow, _temp) = test_flow();
        let session_id = Uuid::new_v4();
        flow.sessions.put(Session::new(session_id));

        flow.logout(session_id);
        flow.logout(session_id);
        assert!(flow.sessions.get(&session_id).is_none());
    }
}
