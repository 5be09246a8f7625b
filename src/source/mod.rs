//! Network fetches of the scoring system documents.

pub mod http;

use futures::future::BoxFuture;
use reqwest::StatusCode;
use thiserror::Error;

pub use self::http::HttpSnapshotSource;

/// Result alias for document fetches.
pub type FetchResult<T> = Result<T, FetchError>;

/// Documents served by the scoring system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Live marquee of the match in progress.
    LiveMatch,
    /// Table of upcoming matches shown in the pits.
    UpcomingSchedule,
    /// Team number to team name listing.
    TeamLookup,
    /// Schedule of competition phases.
    PhaseSchedule,
}

impl Endpoint {
    /// Short name used in log lines.
    pub fn name(self) -> &'static str {
        match self {
            Endpoint::LiveMatch => "live_match",
            Endpoint::UpcomingSchedule => "upcoming_schedule",
            Endpoint::TeamLookup => "team_lookup",
            Endpoint::PhaseSchedule => "phase_schedule",
        }
    }
}

/// A fetch that did not produce a document. Every variant counts as one failed attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request did not complete within the configured timeout.
    #[error("request to `{endpoint}` timed out")]
    Timeout { endpoint: &'static str },
    /// The server answered with something other than 200.
    #[error("request to `{endpoint}` failed with status {status}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
    },
    /// Connection, TLS or body transfer failure.
    #[error("request to `{endpoint}` failed")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// Classify a reqwest failure for the given endpoint.
    pub fn from_reqwest(endpoint: Endpoint, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            FetchError::Timeout {
                endpoint: endpoint.name(),
            }
        } else {
            FetchError::Transport {
                endpoint: endpoint.name(),
                source,
            }
        }
    }
}

/// Abstraction over the transport used to pull documents from the scoring system.
pub trait SnapshotSource: Send + Sync {
    /// Fetch the raw body of one document.
    fn fetch(&self, endpoint: Endpoint) -> BoxFuture<'static, FetchResult<Vec<u8>>>;
}
