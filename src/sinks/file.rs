use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use tracing::{info, warn};

use crate::{
    config::FileSinkConfig,
    model::{FieldQuadrants, QuadrantColor},
};

use super::{DisplaySink, SinkConfigError, SinkError, SinkResult};

/// Rewrites one text file per logical display field; overlay tools watch these files.
#[derive(Debug, Clone)]
pub struct FileSink {
    timer: Option<Arc<Path>>,
    match_label: Option<Arc<Path>>,
    fields: Arc<BTreeMap<u32, BTreeMap<QuadrantColor, PathBuf>>>,
}

impl FileSink {
    /// Resolve every configured file against the overlay directory.
    ///
    /// Fields without a file name are left out and never written.
    pub fn from_config(config: &FileSinkConfig) -> Result<Self, SinkConfigError> {
        let base = PathBuf::from(&config.rel_file_path);
        if !config.rel_file_path.is_empty() && !base.is_dir() {
            return Err(SinkConfigError::MissingDirectory(base));
        }

        let resolve = |name: &Option<String>| {
            name.as_deref()
                .filter(|name| !name.is_empty())
                .map(|name| Arc::<Path>::from(base.join(name)))
        };

        let timer = resolve(&config.timer_file);
        let match_label = resolve(&config.match_num_file);
        if timer.is_none() {
            warn!("no timer file configured; timer updates are not written to disk");
        }
        if match_label.is_none() {
            warn!("no match number file configured; match label updates are not written to disk");
        }

        let fields = config
            .fields
            .iter()
            .zip(1u32..)
            .map(|(targets, field)| {
                let files = targets
                    .targets()
                    .map(|(color, name)| (color, base.join(name)))
                    .collect();
                (field, files)
            })
            .collect();

        info!(directory = %base.display(), "overlay file sink ready");
        Ok(Self {
            timer,
            match_label,
            fields: Arc::new(fields),
        })
    }

    fn rewrite(path: Option<Arc<Path>>, text: String) -> BoxFuture<'static, SinkResult<()>> {
        Box::pin(async move {
            match path {
                Some(path) => rewrite_file(&path, &text).await,
                None => Ok(()),
            }
        })
    }
}

/// Truncate the file and write `text` in its place.
async fn rewrite_file(path: &Path, text: &str) -> SinkResult<()> {
    tokio::fs::write(path, text)
        .await
        .map_err(|source| SinkError::Io {
            path: path.to_path_buf(),
            source,
        })
}

impl DisplaySink for FileSink {
    fn name(&self) -> &str {
        "file"
    }

    fn set_timer(&self, text: String) -> BoxFuture<'static, SinkResult<()>> {
        Self::rewrite(self.timer.clone(), text)
    }

    fn set_match_label(&self, text: String) -> BoxFuture<'static, SinkResult<()>> {
        Self::rewrite(self.match_label.clone(), text)
    }

    fn set_quadrants(
        &self,
        field: u32,
        quads: FieldQuadrants,
    ) -> BoxFuture<'static, SinkResult<()>> {
        let fields = self.fields.clone();

        Box::pin(async move {
            let Some(files) = fields.get(&field) else {
                return Ok(());
            };

            let mut first_error = None;
            for (color, label) in &quads {
                let Some(path) = files.get(color) else {
                    continue;
                };
                if let Err(err) = rewrite_file(path, label).await {
                    first_error.get_or_insert(err);
                }
            }

            first_error.map_or(Ok(()), Err)
        })
    }
}
