//! Display sinks mirroring the published state: overlay text files or a remote overlay API.

pub mod dispatcher;
pub mod file;
pub mod overlay;

use std::{io, path::PathBuf, sync::Arc};

use futures::future::BoxFuture;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{info, warn};

use crate::{config::AppConfig, model::FieldQuadrants};

pub use self::dispatcher::SinkDispatcher;
pub use self::file::FileSink;
pub use self::overlay::OverlaySink;

/// Result alias for sink writes.
pub type SinkResult<T> = Result<T, SinkError>;

/// A write a sink could not complete. Reported per sink and never fatal.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Rewriting an overlay text file failed.
    #[error("failed to write `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The overlay API could not be reached.
    #[error("failed to send text for source `{source_id}`")]
    Request {
        source_id: String,
        #[source]
        source: reqwest::Error,
    },
    /// The overlay API rejected the update.
    #[error("overlay API answered {status} for source `{source_id}`")]
    Status {
        source_id: String,
        status: StatusCode,
    },
}

/// A sink whose configuration cannot be used. The sink is left out and the process continues.
#[derive(Debug, Error)]
pub enum SinkConfigError {
    /// The directory holding the overlay text files does not exist.
    #[error("overlay file directory `{0}` does not exist")]
    MissingDirectory(PathBuf),
    /// The overlay API base URL is empty.
    #[error("overlay API base URL is not configured")]
    MissingBaseUrl,
    /// Building the HTTP client for the overlay API failed.
    #[error("failed to build overlay API client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
}

/// Target of the published display state.
///
/// Every method receives owned values so implementations can move them into the returned
/// future. A logical field the sink has no target for is a successful no-op.
pub trait DisplaySink: Send + Sync {
    /// Name used in log lines.
    fn name(&self) -> &str;
    /// Replace the countdown text.
    fn set_timer(&self, text: String) -> BoxFuture<'static, SinkResult<()>>;
    /// Replace the match label text.
    fn set_match_label(&self, text: String) -> BoxFuture<'static, SinkResult<()>>;
    /// Replace the quadrant labels of one field.
    fn set_quadrants(
        &self,
        field: u32,
        quads: FieldQuadrants,
    ) -> BoxFuture<'static, SinkResult<()>>;
}

/// Build every configured sink, leaving out the ones whose configuration is unusable.
pub fn dispatcher_from_config(config: &AppConfig) -> SinkDispatcher {
    let mut sinks: Vec<Arc<dyn DisplaySink>> = Vec::new();

    if let Some(file) = &config.file_sink {
        match FileSink::from_config(file) {
            Ok(sink) => sinks.push(Arc::new(sink)),
            Err(err) => warn!(error = %err, "file sink disabled"),
        }
    }
    if let Some(overlay) = &config.overlay_sink {
        match OverlaySink::from_config(overlay) {
            Ok(sink) => sinks.push(Arc::new(sink)),
            Err(err) => warn!(error = %err, "overlay sink disabled"),
        }
    }

    if sinks.is_empty() {
        warn!("no display sink configured; published values are only visible on /status");
    } else {
        info!(sinks = sinks.len(), "display sinks ready");
    }
    SinkDispatcher::new(sinks)
}
