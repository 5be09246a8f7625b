//! Turning raw scoring documents into typed snapshots.

pub mod html;
pub mod marquee;

use thiserror::Error;

use crate::model::{LiveDocument, TeamDirectory, UpcomingScheduleTable};

pub use self::marquee::MarqueeExtractor;

/// A piece of a document that could not be read. Always local to the element it names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedDocument {
    /// An element the extractor relies on is absent.
    #[error("missing element `{0}`")]
    MissingElement(&'static str),
    /// A number could not be read from the element text.
    #[error("invalid {what} `{text}`")]
    InvalidNumber { what: &'static str, text: String },
}

/// Extraction rules for the scoring system documents.
///
/// Implementations never fail as a whole: an unreadable live document is [`LiveDocument::Blank`],
/// unreadable rows and fields are skipped, and diagnostics go to the log.
pub trait SnapshotExtractor: Send + Sync {
    /// Read the live marquee.
    fn live_document(&self, body: &[u8]) -> LiveDocument;
    /// Read the upcoming matches table.
    fn upcoming_schedule(&self, body: &[u8]) -> UpcomingScheduleTable;
    /// Read the team listing.
    fn team_directory(&self, body: &[u8]) -> TeamDirectory;
    /// Read the name of the phase currently being played.
    fn current_phase(&self, body: &[u8]) -> Option<String>;
}
