use super::version::is_newer;
use crate::error::CollaboratorError;
use crate::model::UpdateInfo;
use crate::{APP_NAME, USER_AGENT};

use common::{ErrorLocation, HttpStatusCode};

use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use futures_util::future::BoxFuture;
use log::{debug, info, trace};
use reqwest::Client;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tokio::time::sleep as TokioSleep;
use url::Url;

const FEED_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_RETRY_WINDOW: Duration = Duration::from_secs(10);
const PARTIAL_SUFFIX: &str = "part";

#[cfg(target_os = "windows")]
const LAUNCHER: (&str, &[&str]) = ("cmd", &["/C", "start", ""]);
#[cfg(target_os = "macos")]
const LAUNCHER: (&str, &[&str]) = ("open", &[]);
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const LAUNCHER: (&str, &[&str]) = ("xdg-open", &[]);

/// Progress callback, fraction in `0.0..=1.0`.
pub type ProgressFn = dyn Fn(f32) + Send + Sync;

/// Where releases come from and how they are installed.
pub trait UpdateSource: Send + Sync {
    /// The newest release if it is newer than `current_version`.
    fn check<'a>(
        &'a self,
        current_version: &'a str,
    ) -> BoxFuture<'a, Result<Option<UpdateInfo>, CollaboratorError>>;

    /// Fetch the release artifact, returning its local path.
    fn download<'a>(
        &'a self,
        info: &'a UpdateInfo,
        progress: &'a ProgressFn,
    ) -> BoxFuture<'a, Result<PathBuf, CollaboratorError>>;

    /// Hand a downloaded artifact to the platform installer.
    fn install<'a>(&'a self, artifact: &'a Path) -> BoxFuture<'a, Result<(), CollaboratorError>>;
}

/// Release feed served as JSON: `GET feed_url` → `{version, url, notes?}`.
#[derive(Clone)]
pub struct HttpUpdateSource {
    client: Client,
    feed_url: Url,
    download_dir: PathBuf,
    retry_window: Duration,
}

impl HttpUpdateSource {
    pub fn new(feed_url: &str, download_dir: PathBuf) -> Result<Self, CollaboratorError> {
        // No overall timeout: downloads may legitimately take minutes.
        let client = Client::builder()
            .connect_timeout(FEED_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            feed_url: Url::parse(feed_url)?,
            download_dir,
            retry_window: DEFAULT_RETRY_WINDOW,
        })
    }

    /// How long transient feed failures are retried.
    pub fn with_retry_window(mut self, retry_window: Duration) -> Self {
        self.retry_window = retry_window;
        self
    }

    async fn fetch_feed(&self) -> Result<UpdateInfo, CollaboratorError> {
        let response = self
            .client
            .get(self.feed_url.clone())
            .timeout(FEED_TIMEOUT)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        response
            .json::<UpdateInfo>()
            .await
            .map_err(|e| CollaboratorError::invalid_response(format!("Malformed update feed: {e}")))
    }

    async fn fetch_feed_with_retry(&self) -> Result<UpdateInfo, CollaboratorError> {
        let mut backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.retry_window),
            ..Default::default()
        };

        loop {
            match self.fetch_feed().await {
                Ok(info) => return Ok(info),
                Err(e) if e.is_retryable() => match backoff.next_backoff() {
                    Some(duration) => {
                        trace!("Update feed unavailable ({e}), retrying after {duration:?}");
                        TokioSleep(duration).await;
                    }
                    None => return Err(e),
                },
                Err(e) => return Err(e),
            }
        }
    }

    fn artifact_path(&self, info: &UpdateInfo, url: &Url) -> PathBuf {
        let file_name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{APP_NAME}-{}.bin", info.version));
        self.download_dir.join(file_name)
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, CollaboratorError> {
    let status = HttpStatusCode(response.status().as_u16());
    if status.is_success() {
        return Ok(response);
    }

    Err(CollaboratorError::Server {
        status,
        message: response.text().await.unwrap_or_default(),
        location: ErrorLocation::from(Location::caller()),
    })
}

impl UpdateSource for HttpUpdateSource {
    fn check<'a>(
        &'a self,
        current_version: &'a str,
    ) -> BoxFuture<'a, Result<Option<UpdateInfo>, CollaboratorError>> {
        Box::pin(async move {
            debug!("Checking update feed {}", self.feed_url);
            let info = self.fetch_feed_with_retry().await?;

            if is_newer(&info.version, current_version) {
                info!("Update available: {} (running {current_version})", info.version);
                Ok(Some(info))
            } else {
                debug!("Feed version {} is not newer than {current_version}", info.version);
                Ok(None)
            }
        })
    }

    fn download<'a>(
        &'a self,
        info: &'a UpdateInfo,
        progress: &'a ProgressFn,
    ) -> BoxFuture<'a, Result<PathBuf, CollaboratorError>> {
        Box::pin(async move {
            let url = Url::parse(&info.url)?;
            let path = self.artifact_path(info, &url);
            let partial = path.with_extension(PARTIAL_SUFFIX);

            tokio::fs::create_dir_all(&self.download_dir).await?;

            info!("Downloading update {} from {url}", info.version);
            let mut response = ensure_success(self.client.get(url).send().await?).await?;
            let total = response.content_length().filter(|len| *len > 0);

            let mut file = File::create(&partial).await?;
            let mut received: u64 = 0;

            while let Some(chunk) = response.chunk().await? {
                file.write_all(&chunk).await?;
                received += chunk.len() as u64;

                if let Some(total) = total {
                    progress((received as f64 / total as f64).min(1.0) as f32);
                }
            }

            file.flush().await?;
            drop(file);

            if let Some(total) = total
                && received != total
            {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(CollaboratorError::invalid_response(format!(
                    "Download truncated: {received} of {total} bytes"
                )));
            }

            tokio::fs::rename(&partial, &path).await?;
            progress(1.0);

            info!("Update {} saved to {}", info.version, path.display());
            Ok(path)
        })
    }

    fn install<'a>(&'a self, artifact: &'a Path) -> BoxFuture<'a, Result<(), CollaboratorError>> {
        Box::pin(async move {
            let (program, args) = LAUNCHER;
            info!("Launching installer {}", artifact.display());

            let status = TokioCommand::new(program)
                .args(args)
                .arg(artifact)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await?;

            if status.success() {
                Ok(())
            } else {
                Err(CollaboratorError::platform(format!(
                    "Installer launcher {program} exited with {status}"
                )))
            }
        })
    }
}

/// Used when no update feed is configured: never finds an update.
#[derive(Debug, Default)]
pub struct DisabledUpdateSource;

impl UpdateSource for DisabledUpdateSource {
    fn check<'a>(
        &'a self,
        _current_version: &'a str,
    ) -> BoxFuture<'a, Result<Option<UpdateInfo>, CollaboratorError>> {
        Box::pin(async { Ok(None) })
    }

    fn download<'a>(
        &'a self,
        _info: &'a UpdateInfo,
        _progress: &'a ProgressFn,
    ) -> BoxFuture<'a, Result<PathBuf, CollaboratorError>> {
        Box::pin(async { Err(CollaboratorError::platform("No update feed configured")) })
    }

    fn install<'a>(&'a self, _artifact: &'a Path) -> BoxFuture<'a, Result<(), CollaboratorError>> {
        Box::pin(async { Err(CollaboratorError::platform("No update feed configured")) })
    }
}
