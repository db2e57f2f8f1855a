// Test doubles shared by the unit tests.

use crate::channel::EventChannel;
use crate::collaborators::AuthService;
use crate::error::CollaboratorError;
use crate::events::EventReceiver;
use crate::host::{Host, HostServices};
use crate::model::{SessionToken, UpdateInfo};
use crate::update::{ProgressFn, UpdateSource};

use common::RedactedSecret;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::future::BoxFuture;
use serde_json::Value;
use tokio::sync::Notify;

/// Scripted update source.
#[derive(Default)]
pub struct FakeUpdateSource {
    pub latest: Option<UpdateInfo>,
    pub fail_check: bool,
    pub fail_download: bool,
    pub progress_steps: Vec<f32>,
    /// When set, `check` waits for a notification before answering.
    pub check_gate: Option<Arc<Notify>>,
    /// When set, `install` waits for a notification before returning.
    pub install_gate: Option<Arc<Notify>>,
    pub install_calls: AtomicUsize,
}

impl FakeUpdateSource {
    pub fn with_release(version: &str) -> Self {
        Self {
            latest: Some(release(version)),
            ..Self::default()
        }
    }
}

pub fn release(version: &str) -> UpdateInfo {
    UpdateInfo {
        version: version.to_string(),
        url: format!("https://updates.example.com/netgate-{version}.bin"),
        notes: None,
    }
}

impl UpdateSource for FakeUpdateSource {
    fn check<'a>(
        &'a self,
        _current_version: &'a str,
    ) -> BoxFuture<'a, Result<Option<UpdateInfo>, CollaboratorError>> {
        Box::pin(async move {
            if let Some(ref gate) = self.check_gate {
                gate.notified().await;
            }
            if self.fail_check {
                return Err(CollaboratorError::platform("feed unreachable"));
            }
            Ok(self.latest.clone())
        })
    }

    fn download<'a>(
        &'a self,
        info: &'a UpdateInfo,
        progress: &'a ProgressFn,
    ) -> BoxFuture<'a, Result<PathBuf, CollaboratorError>> {
        Box::pin(async move {
            for step in &self.progress_steps {
                progress(*step);
            }
            if self.fail_download {
                return Err(CollaboratorError::platform("disk full"));
            }
            Ok(PathBuf::from(format!("netgate-{}.bin", info.version)))
        })
    }

    fn install<'a>(&'a self, _artifact: &'a Path) -> BoxFuture<'a, Result<(), CollaboratorError>> {
        self.install_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            if let Some(ref gate) = self.install_gate {
                gate.notified().await;
            }
            Ok(())
        })
    }
}

/// Portal that accepts every login and counts calls.
#[derive(Default)]
pub struct FakeAuthService {
    pub logins: AtomicUsize,
    pub logouts: AtomicUsize,
}

impl AuthService for FakeAuthService {
    fn login<'a>(
        &'a self,
        username: &'a str,
        _password: &'a RedactedSecret,
    ) -> BoxFuture<'a, Result<SessionToken, CollaboratorError>> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move { Ok(SessionToken(RedactedSecret::new(format!("token-{username}")))) })
    }

    fn logout<'a>(&'a self, _token: &'a SessionToken) -> BoxFuture<'a, Result<(), CollaboratorError>> {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Ok(()) })
    }
}

/// A memory-only host with local services.
pub fn local_host() -> Host {
    host_with(HostServices::local())
}

pub fn host_with(services: HostServices) -> Host {
    Host::builder()
        .services(services)
        .build()
        .expect("local host should build")
}

/// Drain every frame already queued on `rx` for `channel`.
pub fn drain(rx: &mut EventReceiver, channel: EventChannel) -> Vec<Value> {
    let mut payloads = Vec::new();
    while let Some(frame) = rx.try_recv() {
        if frame.channel == channel {
            payloads.push(frame.payload);
        }
    }
    payloads
}
