use std::{collections::BTreeMap, sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    config::OverlaySinkConfig,
    model::{FieldQuadrants, QuadrantColor},
};

use super::{DisplaySink, SinkConfigError, SinkError, SinkResult};

/// Body of the overlay API "set text" request.
#[derive(Debug, Serialize)]
struct SetTextRequest<'a> {
    source: &'a str,
    text: &'a str,
}

/// Pushes text to named sources of a remote scene-composition API.
#[derive(Clone, Debug)]
pub struct OverlaySink {
    client: Client,
    url: Arc<str>,
    timer: Option<Arc<str>>,
    match_label: Option<Arc<str>>,
    fields: Arc<BTreeMap<u32, BTreeMap<QuadrantColor, String>>>,
}

impl OverlaySink {
    /// Build a client for the configured API.
    pub fn from_config(config: &OverlaySinkConfig) -> Result<Self, SinkConfigError> {
        let base_url = config.base_url.trim_end_matches('/');
        if base_url.is_empty() {
            return Err(SinkConfigError::MissingBaseUrl);
        }

        let timeout =
            Duration::try_from_secs_f64(config.timeout_secs).unwrap_or(Duration::from_secs(2));
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| SinkConfigError::ClientBuilder { source })?;

        let source_id = |id: &Option<String>| {
            id.as_deref()
                .filter(|id| !id.is_empty())
                .map(Arc::<str>::from)
        };
        let timer = source_id(&config.timer_source);
        let match_label = source_id(&config.match_source);
        if timer.is_none() {
            warn!("no overlay timer source configured; timer updates are not sent");
        }
        if match_label.is_none() {
            warn!("no overlay match source configured; match label updates are not sent");
        }

        let fields = config
            .fields
            .iter()
            .zip(1u32..)
            .map(|(targets, field)| {
                let sources = targets
                    .targets()
                    .map(|(color, id)| (color, id.to_string()))
                    .collect();
                (field, sources)
            })
            .collect();

        info!(%base_url, "overlay API sink ready");
        Ok(Self {
            client,
            url: Arc::from(format!("{base_url}/text")),
            timer,
            match_label,
            fields: Arc::new(fields),
        })
    }

    fn send(
        &self,
        source_id: Option<Arc<str>>,
        text: String,
    ) -> BoxFuture<'static, SinkResult<()>> {
        let client = self.client.clone();
        let url = self.url.clone();

        Box::pin(async move {
            match source_id {
                Some(source_id) => set_text(&client, &url, &source_id, &text).await,
                None => Ok(()),
            }
        })
    }
}

async fn set_text(client: &Client, url: &str, source_id: &str, text: &str) -> SinkResult<()> {
    let response = client
        .post(url)
        .json(&SetTextRequest {
            source: source_id,
            text,
        })
        .send()
        .await
        .map_err(|source| SinkError::Request {
            source_id: source_id.to_string(),
            source,
        })?;

    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(SinkError::Status {
            source_id: source_id.to_string(),
            status,
        })
    }
}

impl DisplaySink for OverlaySink {
    fn name(&self) -> &str {
        "overlay"
    }

    fn set_timer(&self, text: String) -> BoxFuture<'static, SinkResult<()>> {
        self.send(self.timer.clone(), text)
    }

    fn set_match_label(&self, text: String) -> BoxFuture<'static, SinkResult<()>> {
        self.send(self.match_label.clone(), text)
    }

    fn set_quadrants(
        &self,
        field: u32,
        quads: FieldQuadrants,
    ) -> BoxFuture<'static, SinkResult<()>> {
        let client = self.client.clone();
        let url = self.url.clone();
        let fields = self.fields.clone();

        Box::pin(async move {
            let Some(sources) = fields.get(&field) else {
                return Ok(());
            };

            let mut first_error = None;
            for (color, label) in &quads {
                let Some(source_id) = sources.get(color) else {
                    continue;
                };
                if let Err(err) = set_text(&client, &url, source_id, label).await {
                    first_error.get_or_insert(err);
                }
            }

            first_error.map_or(Ok(()), Err)
        })
    }
}
