use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::types::types::{ApiConfigError, RemoteFailure, ServerErrorBody};

/// Client-server API path of the logout endpoint, relative to the homeserver.
pub const LOGOUT_PATH: &str = "_matrix/client/r0/logout";

/// The remote half of a sign-out: invalidates the access token on the homeserver.
#[async_trait]
pub trait SignOutApi: Send + Sync {
    async fn sign_out(&self) -> Result<(), RemoteFailure>;
}

/// `SignOutApi` backed by a real homeserver over HTTP.
pub struct HttpSignOutApi {
    client: Client,
    logout_url: Url,
    access_token: String,
}

impl HttpSignOutApi {
    pub fn new(homeserver: &str, access_token: impl Into<String>) -> Result<Self, ApiConfigError> {
        Self::with_client(Client::builder().build()?, homeserver, access_token)
    }

    /// Reuse an existing `reqwest::Client` (and its connection pool).
    pub fn with_client(
        client: Client,
        homeserver: &str,
        access_token: impl Into<String>,
    ) -> Result<Self, ApiConfigError> {
        let logout_url = logout_url(homeserver)?;
        log::debug!("[HttpSignOutApi] logout endpoint: {}", logout_url);
        Ok(Self {
            client,
            logout_url,
            access_token: access_token.into(),
        })
    }

    pub fn logout_url(&self) -> &Url {
        &self.logout_url
    }
}

/// Resolves the logout endpoint against the homeserver base URL, keeping any
/// path prefix the homeserver is mounted under.
fn logout_url(homeserver: &str) -> Result<Url, ApiConfigError> {
    let invalid = |reason: String| ApiConfigError::InvalidHomeserver {
        url: homeserver.to_string(),
        reason,
    };

    let mut base = Url::parse(homeserver).map_err(|e| invalid(e.to_string()))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", base.scheme())));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(LOGOUT_PATH).map_err(|e| invalid(e.to_string()))
}

#[async_trait]
impl SignOutApi for HttpSignOutApi {
    async fn sign_out(&self) -> Result<(), RemoteFailure> {
        let response = self
            .client
            .post(self.logout_url.clone())
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await?;
        log::debug!("[HttpSignOutApi] logout rejected: status={}, body={}", status, body);

        match serde_json::from_str::<ServerErrorBody>(&body) {
            Ok(err) => Err(RemoteFailure::Server {
                http_status: status.as_u16(),
                errcode: err.errcode,
                message: err.error,
            }),
            Err(_) => Err(RemoteFailure::OtherServer {
                http_status: status.as_u16(),
                body,
            }),
        }
    }
}
