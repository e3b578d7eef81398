//! Login and credential state.

use tokio::sync::{Mutex, RwLock};

use crate::api::envelope::Envelope;
use crate::api::types::LoginData;
use crate::config::Account;
use crate::error::{QuqiError, Result};
use crate::http::HttpClient;

/// Login endpoint, relative to the API root.
pub(crate) const LOGIN_PATH: &str = "/auth/person/login/password";

/// Snapshot of the credential triple attached to every remote call.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub cloud_id: u64,
    pub passport_id: String,
    pub session_key: String,
    /// Bumped by every login attempt; lets concurrent callers tell whether
    /// someone else already refreshed the session they saw expire.
    pub generation: u64,
}

impl Credentials {
    /// `Cookie` header value the API authenticates with.
    pub fn cookie(&self) -> String {
        format!(
            "quqiid={}; passport_id={}; session_key={}",
            self.cloud_id, self.passport_id, self.session_key
        )
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("cloud_id", &self.cloud_id)
            .field("passport_id", &self.passport_id)
            .field("session_key", &"<redacted>")
            .field("generation", &self.generation)
            .finish()
    }
}

#[derive(Default)]
struct SessionState {
    passport_id: Option<String>,
    session_key: Option<String>,
    generation: u64,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("authenticated", &self.session_key.is_some())
            .field("generation", &self.generation)
            .finish()
    }
}

/// Authenticated-session state machine: `Unauthenticated -> Authenticated`,
/// falling back to `Unauthenticated` when a login fails.
#[derive(Debug)]
pub struct AuthSession {
    account: Account,
    state: RwLock<SessionState>,
    login_lock: Mutex<()>,
}

impl AuthSession {
    /// New, unauthenticated session. Performs no I/O.
    pub fn new(account: Account) -> Self {
        Self {
            account,
            state: RwLock::new(SessionState::default()),
            login_lock: Mutex::new(()),
        }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.session_key.is_some()
    }

    /// Current credential triple (empty tokens while unauthenticated).
    pub async fn credentials(&self) -> Credentials {
        let state = self.state.read().await;
        Credentials {
            cloud_id: self.account.cloud_id,
            passport_id: state.passport_id.clone().unwrap_or_default(),
            session_key: state.session_key.clone().unwrap_or_default(),
            generation: state.generation,
        }
    }

    /// Log in with the account name and secret.
    pub async fn login(&self, http: &HttpClient, url: &str) -> Result<()> {
        let _guard = self.login_lock.lock().await;
        self.login_locked(http, url).await
    }

    /// Log in again unless another caller already did so after `seen_generation`.
    pub(crate) async fn relogin(
        &self,
        http: &HttpClient,
        url: &str,
        seen_generation: u64,
    ) -> Result<()> {
        let _guard = self.login_lock.lock().await;
        if self.state.read().await.generation != seen_generation {
            tracing::debug!("session already refreshed by a concurrent call");
            return Ok(());
        }
        self.login_locked(http, url).await
    }

    async fn login_locked(&self, http: &HttpClient, url: &str) -> Result<()> {
        tracing::info!("logging in as {}", self.account.username);
        let outcome = self.request_login(http, url).await;

        let mut state = self.state.write().await;
        state.generation = state.generation.wrapping_add(1);
        match outcome {
            Ok(login) => {
                state.passport_id = Some(login.passport_id);
                state.session_key = Some(login.session_key);
                Ok(())
            }
            Err(e) => {
                state.passport_id = None;
                state.session_key = None;
                Err(e)
            }
        }
    }

    async fn request_login(&self, http: &HttpClient, url: &str) -> Result<LoginData> {
        let form = [
            ("phone", self.account.username.as_str()),
            ("password", self.account.password.as_str()),
        ];
        let body = http.post_form(url, None, &form[..]).await?.bytes().await?;
        let envelope = Envelope::parse(&body)?;
        if !envelope.is_success() {
            tracing::warn!("login rejected: {} {}", envelope.err, envelope.msg);
            let reason = if envelope.msg.is_empty() {
                format!("error code {}", envelope.err)
            } else {
                envelope.msg
            };
            return Err(QuqiError::AuthError(reason));
        }
        envelope.into_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account::new("13800000000", "secret", 115540, 43)
    }

    #[tokio::test]
    async fn test_starts_unauthenticated() {
        let session = AuthSession::new(account());
        assert!(!session.is_authenticated().await);
        let creds = session.credentials().await;
        assert_eq!(creds.cloud_id, 115540);
        assert!(creds.session_key.is_empty());
        assert_eq!(creds.generation, 0);
    }

    #[test]
    fn test_cookie_format() {
        let creds = Credentials {
            cloud_id: 115540,
            passport_id: "p1".into(),
            session_key: "s1".into(),
            generation: 1,
        };
        assert_eq!(creds.cookie(), "quqiid=115540; passport_id=p1; session_key=s1");
        assert!(!format!("{:?}", creds).contains("s1"));
    }
}
