use crate::USER_AGENT;
use crate::error::CollaboratorError;
use crate::model::{Connectivity, WifiInfo};

use common::HttpStatusCode;

use std::time::Duration;

use futures_util::future::BoxFuture;
use log::debug;
use reqwest::Client;

/// Derives connectivity from the outside world.
pub trait ConnectivityProbe: Send + Sync {
    fn probe(&self) -> BoxFuture<'_, Connectivity>;
}

/// OS WiFi enumeration.
pub trait WifiInspector: Send + Sync {
    /// The associated network, `None` when not on WiFi.
    fn current(&self) -> BoxFuture<'_, Result<Option<WifiInfo>, CollaboratorError>>;

    fn interface_name(&self) -> Option<String> {
        None
    }
}

/// `GET probe_url`: 2xx is online, a transport error is offline, anything
/// else (typically a captive portal redirect) is unknown.
#[derive(Clone)]
pub struct HttpConnectivityProbe {
    client: Client,
    url: String,
}

impl HttpConnectivityProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, CollaboratorError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl ConnectivityProbe for HttpConnectivityProbe {
    fn probe(&self) -> BoxFuture<'_, Connectivity> {
        Box::pin(async move {
            match self.client.get(&self.url).send().await {
                Ok(response) => {
                    let status = HttpStatusCode(response.status().as_u16());
                    if status.is_success() {
                        Connectivity::Online
                    } else {
                        debug!("Connectivity probe got {status}");
                        Connectivity::Unknown
                    }
                }
                Err(e) => {
                    debug!("Connectivity probe failed: {e}");
                    Connectivity::Offline
                }
            }
        })
    }
}

/// Used where no platform WiFi backend exists.
#[derive(Debug, Default)]
pub struct NullWifiInspector;

impl WifiInspector for NullWifiInspector {
    fn current(&self) -> BoxFuture<'_, Result<Option<WifiInfo>, CollaboratorError>> {
        Box::pin(async { Ok(None) })
    }
}

/// Always reports the same connectivity. Used when probing is disabled and
/// by tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticConnectivityProbe(pub Connectivity);

impl ConnectivityProbe for StaticConnectivityProbe {
    fn probe(&self) -> BoxFuture<'_, Connectivity> {
        let connectivity = self.0;
        Box::pin(async move { connectivity })
    }
}
