//! Authentication Module
//! Mission: Gate protected routes behind verified sessions

pub mod account_store;
pub mod api;
pub mod credential;
pub mod flow;
pub mod gate;
pub mod session;

pub use account_store::{AccountStore, SqliteAccountStore};
pub use flow::{AuthError, AuthFlow};
pub use gate::access_gate;
pub use session::{MemorySessionStore, SessionStore};
