//! Typed snapshots of the scoring display and the lookup tables derived from them.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

/// One of the four colored indicators shown for every playing field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuadrantColor {
    /// Red quadrant.
    Red,
    /// Green quadrant.
    Green,
    /// Blue quadrant.
    Blue,
    /// Yellow quadrant.
    Yellow,
}

impl QuadrantColor {
    /// Every quadrant in display order.
    pub const ALL: [QuadrantColor; 4] = [
        QuadrantColor::Red,
        QuadrantColor::Green,
        QuadrantColor::Blue,
        QuadrantColor::Yellow,
    ];

    /// Lowercase name used in documents, file names and configuration keys.
    pub fn as_str(self) -> &'static str {
        match self {
            QuadrantColor::Red => "red",
            QuadrantColor::Green => "green",
            QuadrantColor::Blue => "blue",
            QuadrantColor::Yellow => "yellow",
        }
    }
}

impl fmt::Display for QuadrantColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Labels of a single field keyed by quadrant.
pub type FieldQuadrants = BTreeMap<QuadrantColor, String>;
/// Labels of every field keyed by the field's ordinal number.
pub type QuadrantTable = BTreeMap<u32, FieldQuadrants>;
/// Quadrant tables of the upcoming matches keyed by match number.
pub type UpcomingScheduleTable = BTreeMap<u32, QuadrantTable>;

/// A field with every quadrant label cleared.
pub fn blank_field() -> FieldQuadrants {
    QuadrantColor::ALL
        .into_iter()
        .map(|color| (color, String::new()))
        .collect()
}

/// A table with blank labels for fields `1..=field_count`.
pub fn blank_table(field_count: u32) -> QuadrantTable {
    (1..=field_count).map(|field| (field, blank_field())).collect()
}

/// Phase and match number read from the live document header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchHeader {
    /// First whitespace separated token, e.g. `Qualification`.
    pub phase: String,
    /// Last token parsed as a number; `None` when it is not numeric.
    pub number: Option<u32>,
}

/// Split a header such as `"Qualification 42"` into phase and match number.
///
/// Returns `None` for a header without any token. A non-numeric last token still yields the
/// phase, with `number` left empty so callers keep their previous match number.
pub fn parse_match_header(text: &str) -> Option<MatchHeader> {
    let mut tokens = text.split_whitespace();
    let phase = tokens.next()?.to_string();
    let last = tokens.last().unwrap_or(phase.as_str());

    let number = match last.parse::<u32>() {
        Ok(number) => Some(number),
        Err(err) => {
            warn!(token = %last, error = %err, "failed to parse match number from header");
            None
        }
    };

    Some(MatchHeader { phase, number })
}

/// Everything the live document says about the match in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSnapshot {
    /// Header line, absent when the document does not carry one.
    pub header: Option<MatchHeader>,
    /// Countdown text exactly as displayed (trimmed).
    pub timer_text: String,
    /// Quadrant labels of every field whose number could be read.
    pub fields: QuadrantTable,
}

/// Result of extracting the live document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveDocument {
    /// Empty or unparsable document; the scoring system shows nothing between matches.
    Blank,
    /// A match is on screen.
    Match(MatchSnapshot),
}

impl LiveDocument {
    /// Whether this document means the display sits between two matches.
    pub fn signals_between_matches(&self) -> bool {
        match self {
            LiveDocument::Blank => true,
            LiveDocument::Match(snapshot) => is_zero_timer(&snapshot.timer_text),
        }
    }
}

/// Whether `text` is one of the zero values the scoring display shows after a match.
pub fn is_zero_timer(text: &str) -> bool {
    matches!(text.trim(), "00:00" | "0:00")
}

/// Render a countdown in seconds as `m:ss`.
pub fn format_timer(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Phase and match number pair shown by the match label sinks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchLabel {
    /// Phase name, empty when nothing is scheduled.
    pub phase: String,
    /// Match number, empty when nothing is scheduled.
    pub number: Option<u32>,
}

impl MatchLabel {
    /// Label for a known match.
    pub fn new(phase: impl Into<String>, number: u32) -> Self {
        Self {
            phase: phase.into(),
            number: Some(number),
        }
    }

    /// Label shown once the schedule is exhausted.
    pub fn blank() -> Self {
        Self::default()
    }

    /// Text written to the sinks, optionally prefixed with the phase.
    pub fn render(&self, show_phase: bool) -> String {
        let number = self.number.map(|n| n.to_string()).unwrap_or_default();
        if show_phase {
            format!("{} {}", self.phase, number).trim().to_string()
        } else {
            number
        }
    }
}

/// Team names keyed by team number, loaded from the team-lookup document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamDirectory {
    names: BTreeMap<u32, String>,
}

impl TeamDirectory {
    /// Register a team name.
    pub fn insert(&mut self, number: u32, name: impl Into<String>) {
        self.names.insert(number, name.into());
    }

    /// Number of known teams.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no team is known.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Append the team name to a label that is a bare, known team number.
    pub fn resolve(&self, label: &str) -> String {
        label
            .trim()
            .parse::<u32>()
            .ok()
            .and_then(|number| self.names.get(&number).map(|name| (number, name)))
            .map(|(number, name)| format!("{number} {name}"))
            .unwrap_or_else(|| label.to_string())
    }

    /// Resolve every label of a quadrant table.
    pub fn decorate(&self, table: &QuadrantTable) -> QuadrantTable {
        table
            .iter()
            .map(|(field, quads)| {
                let quads = quads
                    .iter()
                    .map(|(color, label)| (*color, self.resolve(label)))
                    .collect();
                (*field, quads)
            })
            .collect()
    }
}

impl FromIterator<(u32, String)> for TeamDirectory {
    fn from_iter<T: IntoIterator<Item = (u32, String)>>(iter: T) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}
