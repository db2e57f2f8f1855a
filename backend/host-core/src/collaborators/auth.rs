use crate::USER_AGENT;
use crate::error::CollaboratorError;
use crate::model::SessionToken;

use common::{ErrorLocation, HttpStatusCode, RedactedSecret};

use std::panic::Location;
use std::time::Duration;

use futures_util::future::BoxFuture;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

const DEFAULT_TIMEOUT_DURATION: Duration = Duration::from_secs(15);
const LOGIN_ENDPOINT: &str = "login";
const LOGOUT_ENDPOINT: &str = "logout";

/// Remote network-access portal.
pub trait AuthService: Send + Sync {
    fn login<'a>(
        &'a self,
        username: &'a str,
        password: &'a RedactedSecret,
    ) -> BoxFuture<'a, Result<SessionToken, CollaboratorError>>;

    fn logout<'a>(&'a self, token: &'a SessionToken) -> BoxFuture<'a, Result<(), CollaboratorError>>;
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Serialize)]
struct LogoutRequest<'a> {
    token: &'a str,
}

/// JSON-over-HTTP portal client.
///
/// `POST {portal}/login {username, password}` → `{token}`,
/// `POST {portal}/logout {token}`.
#[derive(Clone)]
pub struct HttpAuthService {
    base_url: Url,
    client: Client,
}

impl HttpAuthService {
    pub fn new(portal_url: &str) -> Result<Self, CollaboratorError> {
        let mut base_url = Url::parse(portal_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT_DURATION)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { base_url, client })
    }

    async fn post<B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<reqwest::Response, CollaboratorError> {
        let url = self.base_url.join(endpoint)?;
        debug!("POST {url}");

        let response = self.client.post(url).json(body).send().await?;
        let status = HttpStatusCode(response.status().as_u16());

        if !status.is_success() {
            return Err(CollaboratorError::Server {
                status,
                message: response.text().await.unwrap_or_default(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(response)
    }
}

impl AuthService for HttpAuthService {
    fn login<'a>(
        &'a self,
        username: &'a str,
        password: &'a RedactedSecret,
    ) -> BoxFuture<'a, Result<SessionToken, CollaboratorError>> {
        Box::pin(async move {
            let body = LoginRequest {
                username,
                password: password.expose(),
            };
            let response = self.post(LOGIN_ENDPOINT, &body).await?;
            let parsed: LoginResponse = response.json().await.map_err(|e| {
                CollaboratorError::invalid_response(format!("Malformed login response: {e}"))
            })?;

            if parsed.token.is_empty() {
                return Err(CollaboratorError::invalid_response(
                    "Portal returned an empty session token",
                ));
            }

            Ok(SessionToken(RedactedSecret::new(parsed.token)))
        })
    }

    fn logout<'a>(&'a self, token: &'a SessionToken) -> BoxFuture<'a, Result<(), CollaboratorError>> {
        Box::pin(async move {
            let body = LogoutRequest {
                token: token.0.expose(),
            };
            self.post(LOGOUT_ENDPOINT, &body).await.map(|_| ())
        })
    }
}

/// Used when no portal URL is configured.
#[derive(Debug, Default)]
pub struct DisabledAuthService;

impl AuthService for DisabledAuthService {
    fn login<'a>(
        &'a self,
        _username: &'a str,
        _password: &'a RedactedSecret,
    ) -> BoxFuture<'a, Result<SessionToken, CollaboratorError>> {
        Box::pin(async { Err(CollaboratorError::platform("No auth portal configured")) })
    }

    fn logout<'a>(&'a self, _token: &'a SessionToken) -> BoxFuture<'a, Result<(), CollaboratorError>> {
        Box::pin(async { Ok(()) })
    }
}
