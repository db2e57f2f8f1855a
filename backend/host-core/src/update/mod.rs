//! Update lifecycle controller.
//!
//! ```text
//! Idle ──check──► Checking ──found──► Available ──download──► Downloading
//!  ▲                 │                                            │
//!  │                 └──none──► UpToDate                     complete
//!  │                                                              ▼
//!  └───────success─── Installing ◄──────install────────── ReadyToInstall
//!
//! any ──error──► Failed(reason)      UpToDate / Failed ──check or reset──► Idle
//! ```
//!
//! The controller is the only writer of [`UpdateState`]. Every legality
//! check and the transition it guards happen under one lock, and every
//! transition is broadcast on `event:update:statusChanged` before the lock
//! is released, so subscribers see transitions in the order they happened.

mod source;
mod version;

pub use source::{DisabledUpdateSource, HttpUpdateSource, ProgressFn, UpdateSource};
pub use version::{is_newer, parse_version};

use crate::channel::EventChannel;
use crate::error::CollaboratorError;
use crate::error::handler::HandlerError;
use crate::events::EventBus;
use crate::model::{UpdateInfo, UpdateState};

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, error, info, warn};
use tokio::task::JoinHandle;

/// Smallest progress change that is broadcast.
const PROGRESS_STEP: f32 = 0.01;

#[derive(Default)]
struct Machine {
    state: UpdateState,
    available: Option<UpdateInfo>,
    artifact: Option<PathBuf>,
    last_progress: f32,
}

struct Inner {
    source: Arc<dyn UpdateSource>,
    bus: EventBus,
    current_version: String,
    machine: Mutex<Machine>,
}

#[derive(Clone)]
pub struct UpdateController {
    inner: Arc<Inner>,
}

impl UpdateController {
    pub fn new(source: Arc<dyn UpdateSource>, bus: EventBus, current_version: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                bus,
                current_version: current_version.into(),
                machine: Mutex::new(Machine::default()),
            }),
        }
    }

    pub fn current_version(&self) -> &str {
        &self.inner.current_version
    }

    pub fn status(&self) -> UpdateState {
        self.lock()
            .map(|machine| machine.state.clone())
            .unwrap_or_default()
    }

    /// The release found by the last successful check.
    pub fn available(&self) -> Option<UpdateInfo> {
        self.lock().ok().and_then(|machine| machine.available.clone())
    }

    /// Query the update source.
    ///
    /// Allowed from `Idle`, `UpToDate` and `Failed` (the latter two pass
    /// through `Idle` first). Returns the resulting state.
    pub async fn check(&self) -> Result<UpdateState, HandlerError> {
        {
            let mut machine = self.lock()?;
            let state = machine.state.clone();
            match &state {
                current if current.is_in_flight() => {
                    return Err(HandlerError::busy(format!("Update {} in progress", current.name())));
                }
                UpdateState::UpToDate | UpdateState::Failed { .. } => {
                    self.transition(&mut machine, UpdateState::Idle);
                }
                UpdateState::Idle => {}
                other => {
                    return Err(HandlerError::illegal_transition(format!(
                        "Cannot check for updates while {}",
                        other.name()
                    )));
                }
            }
            machine.available = None;
            machine.artifact = None;
            self.transition(&mut machine, UpdateState::Checking);
        }

        let result = self
            .inner
            .source
            .check(&self.inner.current_version)
            .await;

        let mut machine = self.lock()?;
        match result {
            Ok(Some(info)) => {
                let next = UpdateState::Available {
                    version: info.version.clone(),
                };
                machine.available = Some(info);
                self.transition(&mut machine, next.clone());
                Ok(next)
            }
            Ok(None) => {
                self.transition(&mut machine, UpdateState::UpToDate);
                Ok(UpdateState::UpToDate)
            }
            Err(e) => {
                self.fail(&mut machine, "Update check", &e);
                Err(e.into())
            }
        }
    }

    /// Start downloading the available release in the background.
    ///
    /// Only legal from `Available`. Returns `Downloading(0)` immediately.
    pub fn download(&self) -> Result<UpdateState, HandlerError> {
        self.start_download().map(|(state, _)| state)
    }

    /// Like [`download`](Self::download), also returning the task so callers
    /// can wait for it.
    pub fn start_download(&self) -> Result<(UpdateState, JoinHandle<()>), HandlerError> {
        let info = {
            let mut machine = self.lock()?;
            let state = machine.state.clone();
            match &state {
                UpdateState::Available { .. } => {}
                UpdateState::Downloading { .. } => {
                    return Err(HandlerError::busy("Update download already in progress"));
                }
                other => {
                    return Err(HandlerError::illegal_transition(format!(
                        "Cannot download an update while {}",
                        other.name()
                    )));
                }
            }

            let info = machine
                .available
                .clone()
                .ok_or_else(|| HandlerError::internal("Available state without release info"))?;

            machine.last_progress = 0.0;
            self.transition(&mut machine, UpdateState::Downloading { progress: 0.0 });
            info
        };

        let controller = self.clone();
        let handle = tokio::spawn(async move { controller.run_download(info).await });

        Ok((UpdateState::Downloading { progress: 0.0 }, handle))
    }

    async fn run_download(&self, info: UpdateInfo) {
        let reporter = self.clone();
        let report = move |progress: f32| reporter.report_progress(progress);

        let result = self.inner.source.download(&info, &report).await;

        let Ok(mut machine) = self.lock() else {
            return;
        };
        match result {
            Ok(path) => {
                machine.artifact = Some(path);
                self.transition(&mut machine, UpdateState::ReadyToInstall);
            }
            Err(e) => self.fail(&mut machine, "Update download", &e),
        }
    }

    fn report_progress(&self, progress: f32) {
        let Ok(mut machine) = self.lock() else {
            return;
        };
        if !matches!(machine.state, UpdateState::Downloading { .. }) {
            return;
        }

        let progress = progress.clamp(0.0, 1.0);
        // Completion is announced by ReadyToInstall.
        if progress >= 1.0 || progress - machine.last_progress < PROGRESS_STEP {
            return;
        }

        machine.last_progress = progress;
        self.transition(&mut machine, UpdateState::Downloading { progress });
    }

    /// Hand the downloaded artifact to the installer.
    ///
    /// Only legal from `ReadyToInstall`. Returns `Idle` on success.
    pub async fn install(&self) -> Result<UpdateState, HandlerError> {
        let artifact = {
            let mut machine = self.lock()?;
            let state = machine.state.clone();
            match &state {
                UpdateState::ReadyToInstall => {}
                UpdateState::Installing => {
                    return Err(HandlerError::busy("Update install already in progress"));
                }
                other => {
                    return Err(HandlerError::illegal_transition(format!(
                        "Cannot install an update while {}",
                        other.name()
                    )));
                }
            }

            let artifact = machine
                .artifact
                .clone()
                .ok_or_else(|| HandlerError::internal("ReadyToInstall state without artifact"))?;

            self.transition(&mut machine, UpdateState::Installing);
            artifact
        };

        let result = self.inner.source.install(&artifact).await;

        let mut machine = self.lock()?;
        match result {
            Ok(()) => {
                info!("Update installer launched");
                machine.available = None;
                machine.artifact = None;
                self.transition(&mut machine, UpdateState::Idle);
                Ok(UpdateState::Idle)
            }
            Err(e) => {
                self.fail(&mut machine, "Update install", &e);
                Err(e.into())
            }
        }
    }

    /// Return to `Idle` from `UpToDate` or `Failed`. A no-op in `Idle`.
    pub fn reset(&self) -> Result<UpdateState, HandlerError> {
        let mut machine = self.lock()?;
        let state = machine.state.clone();
        match &state {
            UpdateState::Idle => {}
            UpdateState::UpToDate | UpdateState::Failed { .. } => {
                self.transition(&mut machine, UpdateState::Idle);
            }
            other => {
                return Err(HandlerError::illegal_transition(format!(
                    "Cannot reset update state while {}",
                    other.name()
                )));
            }
        }
        Ok(UpdateState::Idle)
    }

    fn fail(&self, machine: &mut Machine, stage: &str, e: &CollaboratorError) {
        error!("{stage} failed: {e}");
        let reason = failure_reason(stage, e);
        machine.available = None;
        machine.artifact = None;
        self.transition(machine, UpdateState::Failed { reason });
    }

    fn transition(&self, machine: &mut Machine, next: UpdateState) {
        debug!("Update state {} -> {next}", machine.state);
        machine.state = next;
        self.inner
            .bus
            .emit(EventChannel::UpdateStatusChanged, &machine.state);
    }

    #[track_caller]
    fn lock(&self) -> Result<MutexGuard<'_, Machine>, HandlerError> {
        self.inner.machine.lock().map_err(|_| {
            warn!("Update state lock poisoned");
            HandlerError::internal("Update state lock poisoned")
        })
    }
}

/// User-facing failure reason. Collaborator details stay in the host log.
fn failure_reason(stage: &str, e: &CollaboratorError) -> String {
    match e {
        CollaboratorError::Network { .. } => format!("{stage} failed: network unavailable"),
        CollaboratorError::Server { status, .. } => format!("{stage} failed: server returned {status}"),
        CollaboratorError::InvalidResponse { .. } => format!("{stage} failed: invalid response"),
        CollaboratorError::Io { .. } => format!("{stage} failed: could not write the download"),
        CollaboratorError::Credentials { .. } | CollaboratorError::Platform { .. } => {
            format!("{stage} failed")
        }
    }
}
