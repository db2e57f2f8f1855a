//! Host assembly.
//!
//! [`Host::builder`] wires the stores, the network monitor and the update
//! controller into a [`HostContext`], registers every request channel and
//! refuses to build if any channel is left without a handler.

use crate::bridge::{Bridge, LocalTransport};
use crate::collaborators::{
    AuthService, AutoLaunchRegistrar, CredentialStore, DisabledAuthService, HttpAuthService,
    InMemoryCredentialStore, LogNotifier, LoggingAutoLaunch, Notifier,
};
use crate::config::AppConfig;
use crate::dispatch::Dispatcher;
use crate::error::{CollaboratorError, HostError, IpcError};
use crate::events::EventBus;
use crate::handlers::{self, HostContext};
use crate::ipc::{IpcServerHandle, start_ipc_server};
use crate::log_store::LogStore;
use crate::model::Connectivity;
use crate::monitor::{
    ConnectivityProbe, HttpConnectivityProbe, NetworkMonitor, NullWifiInspector,
    StaticConnectivityProbe, WifiInspector,
};
use crate::state::{AccountStore, ConfigState, SessionState, WifiStore};
use crate::update::{DisabledUpdateSource, HttpUpdateSource, UpdateController, UpdateSource};
use crate::{APP_NAME, APP_VERSION};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::info;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const UPDATE_DOWNLOAD_DIR: &str = "updates";

/// External collaborators the host delegates to.
#[derive(Clone)]
pub struct HostServices {
    pub credentials: Arc<dyn CredentialStore>,
    pub auth: Arc<dyn AuthService>,
    pub notifier: Arc<dyn Notifier>,
    pub auto_launch: Arc<dyn AutoLaunchRegistrar>,
    pub probe: Arc<dyn ConnectivityProbe>,
    pub wifi: Arc<dyn WifiInspector>,
    pub updates: Arc<dyn UpdateSource>,
}

impl HostServices {
    /// HTTP-backed services for the URLs present in `config`; features
    /// without a URL get their disabled variant.
    pub fn from_config(config: &AppConfig, data_dir: &Path) -> Result<Self, CollaboratorError> {
        let probe = HttpConnectivityProbe::new(
            config.network.probe_url.clone(),
            Duration::from_secs(config.network.probe_timeout_secs),
        )?;

        let auth: Arc<dyn AuthService> = match config.auth.portal_url {
            Some(ref url) => Arc::new(HttpAuthService::new(url)?),
            None => Arc::new(DisabledAuthService),
        };

        let updates: Arc<dyn UpdateSource> = match config.update.feed_url {
            Some(ref url) => Arc::new(HttpUpdateSource::new(url, data_dir.join(UPDATE_DOWNLOAD_DIR))?),
            None => Arc::new(DisabledUpdateSource),
        };

        Ok(Self {
            probe: Arc::new(probe),
            auth,
            updates,
            ..Self::local()
        })
    }

    /// In-process services only: nothing touches the network.
    pub fn local() -> Self {
        Self {
            credentials: Arc::new(InMemoryCredentialStore::new()),
            auth: Arc::new(DisabledAuthService),
            notifier: Arc::new(LogNotifier),
            auto_launch: Arc::new(LoggingAutoLaunch),
            probe: Arc::new(StaticConnectivityProbe(Connectivity::Unknown)),
            wifi: Arc::new(NullWifiInspector),
            updates: Arc::new(DisabledUpdateSource),
        }
    }
}

#[derive(Default)]
pub struct HostBuilder {
    config: AppConfig,
    config_dir: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    services: Option<HostServices>,
    events: Option<EventBus>,
    logs: Option<LogStore>,
}

impl HostBuilder {
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Where `config.json` is saved. Without it config changes stay in memory.
    pub fn config_dir(mut self, config_dir: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(config_dir.into());
        self
    }

    /// Where accounts, WiFi profiles and downloads live. Without it the
    /// stores are memory-only.
    pub fn data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(data_dir.into());
        self
    }

    pub fn services(mut self, services: HostServices) -> Self {
        self.services = Some(services);
        self
    }

    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Use a log store created before the host, typically the one the
    /// logger already feeds. It must publish on the same bus as
    /// [`HostBuilder::events`].
    pub fn logs(mut self, logs: LogStore) -> Self {
        self.logs = Some(logs);
        self
    }

    pub fn build(self) -> Result<Host, HostError> {
        let events = self.events.unwrap_or_default();
        let logs = self.logs.unwrap_or_else(|| LogStore::new(events.clone()));

        let services = match self.services {
            Some(services) => services,
            None => {
                let data_dir = self
                    .data_dir
                    .clone()
                    .unwrap_or_else(|| std::env::temp_dir().join(APP_NAME));
                HostServices::from_config(&self.config, &data_dir)?
            }
        };

        let (accounts, wifi) = match self.data_dir {
            Some(ref data_dir) => (
                AccountStore::load(data_dir.clone())?,
                WifiStore::load(data_dir.clone())?,
            ),
            None => (AccountStore::new(), WifiStore::new()),
        };

        let poll_interval = Duration::from_secs(self.config.network.poll_interval_secs);
        let check_on_startup = self.config.update.check_on_startup;

        let ctx = HostContext {
            config: ConfigState::new(self.config_dir, self.config),
            accounts,
            wifi,
            session: SessionState::new(),
            monitor: NetworkMonitor::new(services.probe, services.wifi, events.clone()),
            update: UpdateController::new(services.updates, events.clone(), APP_VERSION),
            logs,
            events,
            credentials: services.credentials,
            auth: services.auth,
            notifier: services.notifier,
            auto_launch: services.auto_launch,
            shutdown: CancellationToken::new(),
        };

        let mut builder = Dispatcher::builder();
        handlers::register_all(&mut builder, &ctx)?;
        let dispatcher = builder.build_complete()?;

        info!("Host assembled ({APP_NAME} v{APP_VERSION})");

        Ok(Host {
            ctx,
            dispatcher,
            poll_interval,
            check_on_startup,
        })
    }
}

/// The assembled host: routing table plus the shared state behind it.
pub struct Host {
    ctx: HostContext,
    dispatcher: Dispatcher,
    poll_interval: Duration,
    check_on_startup: bool,
}

impl Host {
    pub fn builder() -> HostBuilder {
        HostBuilder::default()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn context(&self) -> &HostContext {
        &self.ctx
    }

    pub fn events(&self) -> &EventBus {
        &self.ctx.events
    }

    pub fn logs(&self) -> &LogStore {
        &self.ctx.logs
    }

    pub fn monitor(&self) -> &NetworkMonitor {
        &self.ctx.monitor
    }

    pub fn update(&self) -> &UpdateController {
        &self.ctx.update
    }

    /// Cancelled when the UI asks the host to quit.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.ctx.shutdown.clone()
    }

    pub fn check_on_startup(&self) -> bool {
        self.check_on_startup
    }

    /// An in-process Bridge, for embedding the UI in the host process.
    pub fn local_bridge(&self) -> Bridge<LocalTransport> {
        Bridge::new(LocalTransport::new(
            self.dispatcher.clone(),
            self.ctx.events.clone(),
        ))
    }

    /// Start the connectivity poll loop at the configured interval.
    pub fn start_monitor(&self, cancel: CancellationToken) -> JoinHandle<()> {
        self.ctx.monitor.spawn(self.poll_interval, cancel)
    }

    /// Serve this host over the loopback WebSocket IPC.
    pub async fn start_ipc(
        &self,
        port: u16,
        auth_token: Option<String>,
    ) -> Result<IpcServerHandle, IpcError> {
        start_ipc_server(
            port,
            auth_token,
            self.dispatcher.clone(),
            self.ctx.events.clone(),
        )
        .await
    }
}
