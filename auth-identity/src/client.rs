use crate::{config::AuthServiceConfig, error::*, models::*, service::AuthenticationService};
use async_trait::async_trait;
use reqwest::{cookie::Jar, Client, Response, StatusCode, Url};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    Login,
    Logout,
    Refresh,
    Verify,
    Profile,
    ChangePassword,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Endpoint::Login => "auth/login",
            Endpoint::Logout => "auth/logout",
            Endpoint::Refresh => "auth/refresh",
            Endpoint::Verify => "auth/verify",
            Endpoint::Profile => "auth/profile",
            Endpoint::ChangePassword => "auth/change-password",
        }
    }

    /// Map a non-success status to the failure it means for this endpoint
    fn failure(self, status: StatusCode, message: Option<String>) -> AuthServiceError {
        let code = status.as_u16();
        match (self, code) {
            (Endpoint::Login, 400 | 401 | 403) => AuthServiceError::InvalidCredentials,
            (_, 401) => AuthServiceError::Unauthorized,
            (_, _) if status.is_server_error() => AuthServiceError::Unavailable { status: code },
            (_, _) => AuthServiceError::Rejected {
                status: code,
                message: message.unwrap_or_else(|| {
                    status.canonical_reason().unwrap_or("request rejected").to_string()
                }),
            },
        }
    }

    /// A 2xx carrying `success: false`
    fn unsuccessful(self, status: StatusCode, message: Option<String>) -> AuthServiceError {
        match self {
            Endpoint::Login => AuthServiceError::InvalidCredentials,
            Endpoint::Verify | Endpoint::Refresh => AuthServiceError::Unauthorized,
            Endpoint::Logout | Endpoint::Profile | Endpoint::ChangePassword => {
                AuthServiceError::Rejected {
                    status: status.as_u16(),
                    message: message.unwrap_or_else(|| "request unsuccessful".to_string()),
                }
            }
        }
    }
}

/// HTTP implementation of [`AuthenticationService`].
///
/// Each instance owns a private cookie jar which acts as the credential
/// store: the access and refresh cookies set by the service are replayed on
/// later calls and never surface to callers.
#[derive(Debug, Clone)]
pub struct HttpAuthService {
    client: Client,
    base_url: Url,
    jar: Arc<Jar>,
}

impl HttpAuthService {
    pub fn new(config: &AuthServiceConfig) -> Result<Self> {
        let base_url = normalize_base_url(&config.base_url)?;
        let jar = Arc::new(Jar::default());

        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| AuthServiceError::Configuration(e.to_string()))?;

        Ok(Self { client, base_url, jar })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether the credential store currently holds any cookie for the service
    pub fn holds_credentials(&self) -> bool {
        use reqwest::cookie::CookieStore;
        self.jar.cookies(&self.base_url).is_some()
    }

    fn url(&self, endpoint: Endpoint) -> Result<Url> {
        self.base_url
            .join(endpoint.path())
            .map_err(|e| AuthServiceError::Configuration(e.to_string()))
    }

    async fn send(
        &self,
        endpoint: Endpoint,
        body: Option<serde_json::Value>,
    ) -> Result<Response> {
        let url = self.url(endpoint)?;
        let request = match (endpoint, body) {
            (Endpoint::Verify | Endpoint::Profile, _) => self.client.get(url),
            (_, Some(body)) => self.client.post(url).json(&body),
            (_, None) => self.client.post(url),
        };

        let response = request.send().await.map_err(|e| {
            tracing::debug!(endpoint = endpoint.path(), error = %e, "Authentication service request failed");
            AuthServiceError::from(e)
        })?;
        Ok(response)
    }

    /// Decode an envelope, mapping statuses and `success: false`
    async fn envelope<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        response: Response,
    ) -> Result<ApiEnvelope<T>> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ApiEnvelope<serde_json::Value>>()
                .await
                .ok()
                .and_then(|envelope| envelope.message);
            return Err(endpoint.failure(status, message));
        }

        let envelope: ApiEnvelope<T> = response
            .json()
            .await
            .map_err(|e| AuthServiceError::MalformedResponse(e.to_string()))?;

        if !envelope.success {
            return Err(endpoint.unsuccessful(status, envelope.message));
        }
        Ok(envelope)
    }

    async fn user_call(&self, endpoint: Endpoint, body: Option<serde_json::Value>) -> Result<Identity> {
        let response = self.send(endpoint, body).await?;
        self.envelope::<UserPayload>(endpoint, response)
            .await?
            .data
            .map(|payload| payload.user)
            .ok_or_else(|| AuthServiceError::MalformedResponse("missing user in response".to_string()))
    }
}

#[async_trait]
impl AuthenticationService for HttpAuthService {
    async fn login(&self, credentials: &Credentials) -> Result<Identity> {
        let body = json!({
            "username": credentials.username,
            "password": credentials.password.expose_secret(),
        });
        self.user_call(Endpoint::Login, Some(body)).await
    }

    async fn logout(&self) -> Result<()> {
        let response = self.send(Endpoint::Logout, None).await?;
        // Already logged out remotely
        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(());
        }
        self.envelope::<serde_json::Value>(Endpoint::Logout, response)
            .await
            .map(|_| ())
    }

    async fn refresh(&self) -> Result<Identity> {
        self.user_call(Endpoint::Refresh, None).await
    }

    async fn verify(&self) -> Result<Identity> {
        self.user_call(Endpoint::Verify, None).await
    }

    async fn profile(&self) -> Result<Identity> {
        let response = self.send(Endpoint::Profile, None).await?;
        self.envelope::<Identity>(Endpoint::Profile, response)
            .await?
            .data
            .ok_or_else(|| AuthServiceError::MalformedResponse("missing profile in response".to_string()))
    }

    async fn change_password(&self, change: &PasswordChange) -> Result<()> {
        let body = json!({
            "currentPassword": change.current_password.expose_secret(),
            "newPassword": change.new_password.expose_secret(),
        });
        let response = self.send(Endpoint::ChangePassword, Some(body)).await?;
        self.envelope::<serde_json::Value>(Endpoint::ChangePassword, response)
            .await
            .map(|_| ())
    }
}

/// Relative endpoint paths only resolve under the base when it ends in `/`
fn normalize_base_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash)
        .map_err(|e| AuthServiceError::Configuration(format!("invalid base URL '{trimmed}': {e}")))?;
    if url.cannot_be_a_base() {
        return Err(AuthServiceError::Configuration(format!(
            "base URL '{trimmed}' cannot be a base"
        )));
    }
    Ok(url)
}
