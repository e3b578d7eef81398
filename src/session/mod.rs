//! Authenticated session state.

mod auth;

pub use auth::{AuthSession, Credentials};
pub(crate) use auth::LOGIN_PATH;
