use std::sync::Arc;

use futures::future::{BoxFuture, join_all};
use tracing::warn;

use crate::model::FieldQuadrants;

use super::{DisplaySink, SinkResult};

/// Fans a single update out to every configured sink.
///
/// Sinks are written concurrently and independently; a failing sink is logged and does not
/// keep the others from receiving the update.
#[derive(Clone, Default)]
pub struct SinkDispatcher {
    sinks: Vec<Arc<dyn DisplaySink>>,
}

impl SinkDispatcher {
    /// Dispatcher writing to `sinks`, in order.
    pub fn new(sinks: Vec<Arc<dyn DisplaySink>>) -> Self {
        Self { sinks }
    }

    /// Number of configured sinks.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether no sink is configured.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Send the countdown text. Returns `true` when no sink faulted.
    pub async fn timer(&self, text: &str) -> bool {
        self.dispatch("timer", |sink| sink.set_timer(text.to_string()))
            .await
    }

    /// Send the match label text. Returns `true` when no sink faulted.
    pub async fn match_label(&self, text: &str) -> bool {
        self.dispatch("match_label", |sink| sink.set_match_label(text.to_string()))
            .await
    }

    /// Send the quadrant labels of one field. Returns `true` when no sink faulted.
    pub async fn quadrants(&self, field: u32, quads: &FieldQuadrants) -> bool {
        self.dispatch("quadrants", |sink| sink.set_quadrants(field, quads.clone()))
            .await
    }

    async fn dispatch<F>(&self, what: &'static str, write: F) -> bool
    where
        F: Fn(&Arc<dyn DisplaySink>) -> BoxFuture<'static, SinkResult<()>>,
    {
        let results = join_all(self.sinks.iter().map(&write)).await;

        let mut clean = true;
        for (sink, result) in self.sinks.iter().zip(results) {
            if let Err(err) = result {
                warn!(sink = sink.name(), update = what, error = %err, "sink write failed");
                clean = false;
            }
        }
        clean
    }
}
