use crate::{
    model::{MatchLabel, QuadrantTable},
    sinks::SinkDispatcher,
};

/// Last values handed to the sinks, used to skip writes that would not change anything.
///
/// A cached value only advances when every sink accepted it, so a faulted write is retried on
/// the next differing update. Quadrants are cached per field.
pub struct DisplayState {
    dispatcher: SinkDispatcher,
    show_match_phase: bool,
    timer: String,
    match_label: Option<MatchLabel>,
    quadrants: QuadrantTable,
}

impl DisplayState {
    /// Empty cache in front of `dispatcher`.
    pub fn new(dispatcher: SinkDispatcher, show_match_phase: bool) -> Self {
        Self {
            dispatcher,
            show_match_phase,
            timer: String::new(),
            match_label: None,
            quadrants: QuadrantTable::new(),
        }
    }

    /// Last published countdown text.
    pub fn timer(&self) -> &str {
        &self.timer
    }

    /// Last published match label.
    pub fn match_label(&self) -> Option<&MatchLabel> {
        self.match_label.as_ref()
    }

    /// Last published quadrant labels.
    pub fn quadrants(&self) -> &QuadrantTable {
        &self.quadrants
    }

    /// Publish the countdown text. Returns `true` when the sinks were written.
    pub async fn publish_timer(&mut self, text: &str) -> bool {
        if self.timer == text {
            return false;
        }

        if self.dispatcher.timer(text).await {
            self.timer = text.to_string();
        }
        true
    }

    /// Publish the match label. Returns `true` when the sinks were written.
    pub async fn publish_match_label(&mut self, label: &MatchLabel, force_rewrite: bool) -> bool {
        if !force_rewrite && self.match_label.as_ref() == Some(label) {
            return false;
        }

        let text = label.render(self.show_match_phase);
        if self.dispatcher.match_label(&text).await {
            self.match_label = Some(label.clone());
        }
        true
    }

    /// Publish the quadrant labels of every field in `table`. Returns the number of fields
    /// written.
    pub async fn publish_quadrants(&mut self, table: &QuadrantTable, force_rewrite: bool) -> usize {
        let mut written = 0;
        for (field, quads) in table {
            if !force_rewrite && self.quadrants.get(field) == Some(quads) {
                continue;
            }

            written += 1;
            if self.dispatcher.quadrants(*field, quads).await {
                self.quadrants.insert(*field, quads.clone());
            }
        }
        written
    }

    /// Write every cached value to the sinks again, e.g. after an overlay tool restarted.
    pub async fn resync(&mut self) {
        let timer = self.timer.clone();
        self.dispatcher.timer(&timer).await;

        if let Some(label) = self.match_label.clone() {
            self.publish_match_label(&label, true).await;
        }

        let quadrants = self.quadrants.clone();
        self.publish_quadrants(&quadrants, true).await;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    };

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        model::{FieldQuadrants, QuadrantColor, blank_table},
        sinks::{DisplaySink, SinkError, SinkResult},
    };

    /// One write received by a [`RecordingSink`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Write {
        Timer(String),
        Label(String),
        Quadrants(u32, FieldQuadrants),
    }

    /// Sink recording every write, optionally failing quadrant writes for one field.
    #[derive(Default)]
    pub struct RecordingSink {
        writes: Mutex<Vec<Write>>,
        fail_field: Mutex<Option<u32>>,
        fail_timer: AtomicBool,
    }

    impl RecordingSink {
        pub fn writes(&self) -> Vec<Write> {
            self.writes.lock().unwrap().clone()
        }

        pub fn clear(&self) {
            self.writes.lock().unwrap().clear();
        }

        pub fn fail_field(&self, field: Option<u32>) {
            *self.fail_field.lock().unwrap() = field;
        }

        pub fn fail_timer(&self, fail: bool) {
            self.fail_timer.store(fail, Ordering::SeqCst);
        }

        fn failure() -> SinkError {
            SinkError::Io {
                path: "recording".into(),
                source: std::io::Error::other("injected failure"),
            }
        }
    }

    impl DisplaySink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        fn set_timer(&self, text: String) -> BoxFuture<'static, SinkResult<()>> {
            self.writes.lock().unwrap().push(Write::Timer(text));
            let fail = self.fail_timer.load(Ordering::SeqCst);
            Box::pin(async move { if fail { Err(Self::failure()) } else { Ok(()) } })
        }

        fn set_match_label(&self, text: String) -> BoxFuture<'static, SinkResult<()>> {
            self.writes.lock().unwrap().push(Write::Label(text));
            Box::pin(async { Ok(()) })
        }

        fn set_quadrants(
            &self,
            field: u32,
            quads: FieldQuadrants,
        ) -> BoxFuture<'static, SinkResult<()>> {
            self.writes.lock().unwrap().push(Write::Quadrants(field, quads));
            let fail = *self.fail_field.lock().unwrap() == Some(field);
            Box::pin(async move { if fail { Err(Self::failure()) } else { Ok(()) } })
        }
    }

    fn display(sinks: &[Arc<RecordingSink>]) -> DisplayState {
        let sinks = sinks
            .iter()
            .map(|sink| sink.clone() as Arc<dyn DisplaySink>)
            .collect();
        DisplayState::new(SinkDispatcher::new(sinks), true)
    }

    fn field(red: &str) -> FieldQuadrants {
        [(QuadrantColor::Red, red.to_string())].into_iter().collect()
    }

    #[tokio::test]
    async fn repeated_timer_text_is_written_once() {
        let sink = Arc::new(RecordingSink::default());
        let mut display = display(&[sink.clone()]);

        assert!(display.publish_timer("1:59").await);
        assert!(!display.publish_timer("1:59").await);
        assert!(display.publish_timer("1:58").await);
        assert!(!display.publish_timer("1:58").await);

        assert_eq!(
            sink.writes(),
            vec![Write::Timer("1:59".into()), Write::Timer("1:58".into())]
        );
    }

    #[tokio::test]
    async fn failed_timer_write_is_retried_next_time() {
        let sink = Arc::new(RecordingSink::default());
        let mut display = display(&[sink.clone()]);

        sink.fail_timer(true);
        display.publish_timer("0:30").await;
        assert_eq!(display.timer(), "");

        sink.fail_timer(false);
        assert!(display.publish_timer("0:30").await);
        assert_eq!(display.timer(), "0:30");
        assert_eq!(sink.writes().len(), 2);
    }

    #[tokio::test]
    async fn label_is_deduplicated_unless_forced() {
        let sink = Arc::new(RecordingSink::default());
        let mut display = display(&[sink.clone()]);
        let label = MatchLabel::new("Qualification", 4);

        assert!(display.publish_match_label(&label, false).await);
        assert!(!display.publish_match_label(&label, false).await);
        assert!(display.publish_match_label(&label, true).await);

        assert_eq!(
            sink.writes(),
            vec![
                Write::Label("Qualification 4".into()),
                Write::Label("Qualification 4".into())
            ]
        );
    }

    #[tokio::test]
    async fn quadrant_cache_is_field_granular() {
        let healthy = Arc::new(RecordingSink::default());
        let flaky = Arc::new(RecordingSink::default());
        let mut display = display(&[healthy.clone(), flaky.clone()]);

        let table: QuadrantTable = [(1, field("A")), (2, field("B"))].into_iter().collect();
        flaky.fail_field(Some(2));
        assert_eq!(display.publish_quadrants(&table, false).await, 2);

        assert_eq!(display.quadrants().get(&1), Some(&field("A")));
        assert_eq!(display.quadrants().get(&2), None);
        assert_eq!(healthy.writes().len(), 2);

        healthy.clear();
        flaky.fail_field(None);
        assert_eq!(display.publish_quadrants(&table, false).await, 1);
        assert_eq!(healthy.writes(), vec![Write::Quadrants(2, field("B"))]);
        assert_eq!(display.quadrants().get(&2), Some(&field("B")));
    }

    #[tokio::test]
    async fn resync_rewrites_cached_values() {
        let sink = Arc::new(RecordingSink::default());
        let mut display = display(&[sink.clone()]);

        display.publish_timer("2:00").await;
        display
            .publish_match_label(&MatchLabel::new("Qualification", 1), false)
            .await;
        display.publish_quadrants(&blank_table(2), false).await;
        sink.clear();

        display.resync().await;
        let writes = sink.writes();
        assert_eq!(writes.len(), 4);
        assert_eq!(writes[0], Write::Timer("2:00".into()));
    }
}
