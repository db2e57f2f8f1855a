//! Network status monitor.
//!
//! Observations arrive from the poll loop ([`NetworkMonitor::run`]), from
//! `network:check`, and from OS change notifications ([`NetworkMonitor::push`]).
//! All of them pass through [`NetworkMonitor::observe`], which broadcasts
//! `event:network:statusChanged` only when `(connectivity, ssid)` differs from
//! the last broadcast value.

mod probe;

pub use probe::{
    ConnectivityProbe, HttpConnectivityProbe, NullWifiInspector, StaticConnectivityProbe,
    WifiInspector,
};

use crate::channel::EventChannel;
use crate::error::CollaboratorError;
use crate::events::EventBus;
use crate::model::{NetworkInfo, NetworkStatus, WifiInfo, now_millis};

use std::net::IpAddr;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Routable address used to pick the outbound interface. Nothing is sent.
const ROUTE_PROBE_ADDR: &str = "1.1.1.1:80";

struct Inner {
    probe: Arc<dyn ConnectivityProbe>,
    wifi: Arc<dyn WifiInspector>,
    bus: EventBus,
    /// `None` until the first observation, so that one is always broadcast.
    last_broadcast: Mutex<Option<NetworkStatus>>,
    latest: RwLock<NetworkStatus>,
}

#[derive(Clone)]
pub struct NetworkMonitor {
    inner: Arc<Inner>,
}

impl NetworkMonitor {
    pub fn new(
        probe: Arc<dyn ConnectivityProbe>,
        wifi: Arc<dyn WifiInspector>,
        bus: EventBus,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                probe,
                wifi,
                bus,
                last_broadcast: Mutex::new(None),
                latest: RwLock::new(NetworkStatus::unknown()),
            }),
        }
    }

    /// Most recent observation, broadcast or not.
    pub fn latest(&self) -> NetworkStatus {
        self.inner
            .latest
            .read()
            .map(|status| status.clone())
            .unwrap_or_else(|_| NetworkStatus::unknown())
    }

    /// Record an observation. Returns the status if it was broadcast.
    pub fn observe(&self, status: NetworkStatus) -> Option<NetworkStatus> {
        if let Ok(mut latest) = self.inner.latest.write() {
            *latest = status.clone();
        }

        let Ok(mut last) = self.inner.last_broadcast.lock() else {
            warn!("Network monitor state poisoned, dropping observation");
            return None;
        };

        if last.as_ref().is_some_and(|prev| prev.same_state(&status)) {
            return None;
        }

        info!(
            "Network status changed: {:?} ssid={}",
            status.connectivity,
            status.ssid.as_deref().unwrap_or("-")
        );
        *last = Some(status.clone());

        // Emitted under the lock so broadcast order follows observation order.
        self.inner
            .bus
            .emit(EventChannel::NetworkStatusChanged, &status);

        Some(status)
    }

    /// Entry point for OS-pushed change notifications.
    pub fn push(&self, status: NetworkStatus) -> Option<NetworkStatus> {
        self.observe(status)
    }

    /// Sample the collaborators without recording anything.
    pub async fn sample(&self) -> NetworkStatus {
        let connectivity = self.inner.probe.probe().await;
        let wifi = match self.inner.wifi.current().await {
            Ok(wifi) => wifi,
            Err(e) => {
                warn!("WiFi inspection failed: {e}");
                None
            }
        };

        NetworkStatus {
            connectivity,
            ssid: wifi.as_ref().map(|w| w.ssid.clone()),
            signal_quality: wifi.and_then(|w| w.signal_quality),
            timestamp: now_millis(),
        }
    }

    /// Observe now and return the resulting status.
    pub async fn check_now(&self) -> NetworkStatus {
        let status = self.sample().await;
        self.observe(status.clone());
        status
    }

    pub async fn wifi_info(&self) -> Result<Option<WifiInfo>, CollaboratorError> {
        self.inner.wifi.current().await
    }

    pub async fn info(&self) -> NetworkInfo {
        NetworkInfo {
            status: self.latest(),
            interface_name: self.inner.wifi.interface_name(),
            local_ip: local_ip().await.map(|ip| ip.to_string()),
        }
    }

    /// Poll every `period` until `cancel` fires. The first poll is immediate.
    pub async fn run(self, period: Duration, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(period);
        info!("Network monitor started (every {}s)", period.as_secs());

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    debug!("Network monitor tick");
                    self.check_now().await;
                }
            }
        }

        info!("Network monitor stopped");
    }

    pub fn spawn(&self, period: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.clone().run(period, cancel))
    }
}

/// Address of the interface that would carry outbound traffic.
async fn local_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").await.ok()?;
    socket.connect(ROUTE_PROBE_ADDR).await.ok()?;
    let ip = socket.local_addr().ok()?.ip();
    (!ip.is_unspecified()).then_some(ip)
}
