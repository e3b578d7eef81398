//! Quqi API client with request/response handling.

use std::future::Future;

use serde::de::DeserializeOwned;

use crate::api::envelope::Envelope;
use crate::api::error::ApiErrorCode;
use crate::config::{Account, ClientConfig};
use crate::error::Result;
use crate::http::HttpClient;
use crate::session::{AuthSession, Credentials, LOGIN_PATH};

/// Result of one attempt at an authenticated call.
pub(crate) enum Attempt<T> {
    Done(T),
    /// The server rejected the session; carries the rejecting envelope.
    SessionExpired(Envelope),
}

/// Remote action executor.
///
/// Every call carries the session's credential cookie. A "session expired"
/// envelope triggers exactly one re-login and one retry of the same call.
#[derive(Debug)]
pub struct ApiClient {
    http: HttpClient,
    config: ClientConfig,
    session: AuthSession,
}

impl ApiClient {
    /// Create a client. Performs no I/O; the session starts unauthenticated.
    pub fn new(config: ClientConfig, account: Account) -> Result<Self> {
        let http = match config.proxy.as_deref() {
            Some(proxy) => HttpClient::with_proxy(proxy, config.timeout())?,
            None => HttpClient::new(config.timeout())?,
        };
        Ok(Self {
            http,
            config,
            session: AuthSession::new(account),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub(crate) fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn cloud_id(&self) -> u64 {
        self.session.account().cloud_id
    }

    /// Log in with the configured account.
    pub async fn login(&self) -> Result<()> {
        self.session
            .login(&self.http, &self.config.url(LOGIN_PATH))
            .await
    }

    /// Call an API action and decode its `data` payload.
    ///
    /// Issues a GET when `form` is `None`, an urlencoded POST otherwise.
    ///
    /// # Arguments
    /// * `path` - Endpoint path relative to the API root
    /// * `form` - Form fields, or `None` for a GET
    pub async fn call<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Option<&[(&str, String)]>,
    ) -> Result<T> {
        self.with_session_retry(path, |creds| self.call_once(path, form, creds))
            .await
    }

    async fn call_once<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Option<&[(&str, String)]>,
        creds: Credentials,
    ) -> Result<Attempt<T>> {
        let url = self.config.url(path);
        let cookie = creds.cookie();
        tracing::debug!("api request path={} post={}", path, form.is_some());

        let response = match form {
            Some(form) => self.http.post_form(&url, Some(&cookie), form).await?,
            None => {
                let no_query: &[(&str, &str)] = &[];
                self.http.get(&url, Some(&cookie), no_query).await?
            }
        };
        let body = response.bytes().await?;
        let envelope = Envelope::parse(&body)?;
        tracing::debug!("api response path={} err={}", path, envelope.err);

        self.settle(envelope)?.map_done(|envelope| envelope.into_data())
    }

    /// Sort an envelope into success, session expiry or failure.
    pub(crate) fn settle(&self, envelope: Envelope) -> Result<Attempt<Envelope>> {
        match ApiErrorCode::classify(envelope.err, self.config.session_expired_code) {
            ApiErrorCode::Success => Ok(Attempt::Done(envelope)),
            ApiErrorCode::SessionExpired => Ok(Attempt::SessionExpired(envelope)),
            code @ ApiErrorCode::Other(c) => Err(code.into_error(c, &envelope.msg)),
        }
    }

    /// Run `attempt` with current credentials; on session expiry log in once
    /// and run it once more. A second expiry is surfaced as an error.
    pub(crate) async fn with_session_retry<T, F, Fut>(&self, path: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut(Credentials) -> Fut,
        Fut: Future<Output = Result<Attempt<T>>>,
    {
        let creds = self.session.credentials().await;
        let seen = creds.generation;
        if let Attempt::Done(value) = attempt(creds).await? {
            return Ok(value);
        }

        tracing::warn!("session expired on {}, logging in again", path);
        self.session
            .relogin(&self.http, &self.config.url(LOGIN_PATH), seen)
            .await?;

        match attempt(self.session.credentials().await).await? {
            Attempt::Done(value) => Ok(value),
            Attempt::SessionExpired(envelope) => {
                tracing::warn!("session still expired after re-login on {}", path);
                Err(ApiErrorCode::SessionExpired.into_error(envelope.err, &envelope.msg))
            }
        }
    }
}

impl Attempt<Envelope> {
    fn map_done<T>(self, decode: impl FnOnce(Envelope) -> Result<T>) -> Result<Attempt<T>> {
        match self {
            Attempt::Done(envelope) => Ok(Attempt::Done(decode(envelope)?)),
            Attempt::SessionExpired(envelope) => Ok(Attempt::SessionExpired(envelope)),
        }
    }
}
