use std::time::Duration;

use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    config::AppConfig,
    model::{
        MatchLabel, MatchSnapshot, QuadrantTable, UpcomingScheduleTable, blank_table,
    },
    state::manual_timer::ManualTimer,
};

/// Phase name assumed until the live document says otherwise.
pub const DEFAULT_PHASE: &str = "Seeding";

/// Whether the display currently follows a running match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Nothing observed since startup. Treated as between matches, except that the first
    /// between-matches indicator still counts as an entry so the bootstrap switchover runs.
    Unsettled,
    /// The live document shows a match in progress.
    InMatch,
    /// The last match ended; the display shows (or waits to show) the next one.
    BetweenMatches,
}

/// What to do once a between-matches period begins and the schedule is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchoverPlan {
    /// Advance right away.
    Immediate,
    /// Arm the switchover timer.
    After(Duration),
    /// Automatic switchover is off; wait for an operator.
    AwaitTrigger,
}

/// Display update produced by a switchover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// The next match is scheduled.
    Scheduled {
        /// Label of the next match.
        label: MatchLabel,
        /// Quadrant labels of the next match.
        quadrants: QuadrantTable,
    },
    /// The schedule has no next match; every field is blanked.
    Exhausted {
        /// Blank labels for every configured field.
        quadrants: QuadrantTable,
    },
}

/// Switchover behaviour taken from the configuration.
#[derive(Debug, Clone)]
pub struct SwitchoverSettings {
    /// Advance automatically after a match ends.
    pub auto_switchover: bool,
    /// Delay before the automatic switchover.
    pub switchover_time: Duration,
    /// The countdown is driven by the manual timer.
    pub manual_timer: bool,
    /// Length of the manual timer.
    pub manual_timer_length: u32,
    /// Number of playing fields.
    pub field_count: u32,
}

impl From<&AppConfig> for SwitchoverSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            auto_switchover: config.auto_switchover,
            switchover_time: Duration::try_from_secs_f64(config.switchover_time_secs)
                .unwrap_or(Duration::ZERO),
            manual_timer: config.manual_timer,
            manual_timer_length: config.manual_timer_length_secs,
            field_count: config.field_count,
        }
    }
}

/// Decision core: which match is current, whether one is running, and what the next
/// switchover shows. Holds no I/O; the engine performs fetches and publishes.
#[derive(Debug, Clone)]
pub struct MatchStateMachine {
    settings: SwitchoverSettings,
    mode: MatchMode,
    current_phase: String,
    current_match_number: u32,
    upcoming: UpcomingScheduleTable,
    manual_timer: ManualTimer,
}

impl MatchStateMachine {
    /// Machine with no match established yet.
    pub fn new(settings: SwitchoverSettings) -> Self {
        let manual_timer = ManualTimer::new(settings.manual_timer_length);
        Self {
            settings,
            mode: MatchMode::Unsettled,
            current_phase: DEFAULT_PHASE.to_string(),
            current_match_number: 0,
            upcoming: UpcomingScheduleTable::new(),
            manual_timer,
        }
    }

    /// Current mode.
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Whether the display is not following a running match.
    pub fn is_between_matches(&self) -> bool {
        self.mode != MatchMode::InMatch
    }

    /// Phase of the current match.
    pub fn current_phase(&self) -> &str {
        &self.current_phase
    }

    /// Number of the current match; `0` until one is established.
    pub fn current_match_number(&self) -> u32 {
        self.current_match_number
    }

    /// Override the current match pointer, e.g. after an operator correction.
    pub fn set_current_match_number(&mut self, number: u32) {
        self.current_match_number = number;
    }

    /// Upcoming matches cached for the current between-matches period.
    pub fn upcoming(&self) -> &UpcomingScheduleTable {
        &self.upcoming
    }

    /// Switchover behaviour.
    pub fn settings(&self) -> &SwitchoverSettings {
        &self.settings
    }

    /// Local countdown.
    pub fn manual_timer(&self) -> &ManualTimer {
        &self.manual_timer
    }

    /// Local countdown, mutably.
    pub fn manual_timer_mut(&mut self) -> &mut ManualTimer {
        &mut self.manual_timer
    }

    /// Record a between-matches indicator. Returns `true` only for the first indicator of a
    /// period, which also drops the previous period's schedule.
    pub fn begin_between_matches(&mut self) -> bool {
        if self.mode == MatchMode::BetweenMatches {
            return false;
        }

        info!(
            phase = %self.current_phase,
            match_number = self.current_match_number,
            "entering between matches"
        );
        self.mode = MatchMode::BetweenMatches;
        self.upcoming.clear();
        true
    }

    /// Cache the upcoming matches fetched for this period.
    pub fn install_schedule(&mut self, schedule: UpcomingScheduleTable) {
        self.upcoming = schedule;
    }

    /// Decide how to reach the next match.
    pub fn switchover_plan(&self) -> SwitchoverPlan {
        if self.current_match_number == 0 {
            return SwitchoverPlan::Immediate;
        }
        if !self.settings.auto_switchover {
            return SwitchoverPlan::AwaitTrigger;
        }

        let mut delay = self.settings.switchover_time;
        if self.settings.manual_timer {
            delay += Duration::from_secs(u64::from(self.manual_timer.remaining()));
        }

        if delay.is_zero() {
            SwitchoverPlan::Immediate
        } else {
            SwitchoverPlan::After(delay)
        }
    }

    /// Whether the next switchover starts from an unknown match and should re-resolve the
    /// phase first.
    pub fn needs_phase_lookup(&self) -> bool {
        self.current_match_number == 0 && !self.upcoming.is_empty()
    }

    /// Move the match pointer to the next match and describe what to show.
    ///
    /// Returns `None` when no schedule is cached. `resolved_phase` replaces the phase when
    /// starting from match `0`.
    pub fn advance_match(&mut self, resolved_phase: Option<String>) -> Option<Advance> {
        let lowest = *self.upcoming.keys().next()?;

        if self.current_match_number == 0 {
            self.current_match_number = lowest;
            if let Some(phase) = resolved_phase {
                self.current_phase = phase;
            }
            info!(
                match_number = lowest,
                "previous match unknown; assuming the lowest upcoming match is next"
            );
        } else {
            self.current_match_number += 1;
        }

        let advance = match self.upcoming.get(&self.current_match_number) {
            Some(quadrants) => Advance::Scheduled {
                label: MatchLabel::new(self.current_phase.clone(), self.current_match_number),
                quadrants: quadrants.clone(),
            },
            None => {
                info!(
                    match_number = self.current_match_number,
                    "no upcoming match found; end of phase"
                );
                Advance::Exhausted {
                    quadrants: blank_table(self.settings.field_count),
                }
            }
        };
        Some(advance)
    }

    /// Follow a running match. Returns the label to publish.
    ///
    /// A header without a numeric match number still updates the phase and keeps the
    /// previous number.
    pub fn enter_match(&mut self, snapshot: &MatchSnapshot) -> MatchLabel {
        if self.mode != MatchMode::InMatch {
            info!("match in progress");
        }
        self.mode = MatchMode::InMatch;

        if let Some(header) = &snapshot.header {
            self.current_phase = header.phase.clone();
            if let Some(number) = header.number {
                self.current_match_number = number;
            }
        }

        MatchLabel::new(self.current_phase.clone(), self.current_match_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldQuadrants, MatchHeader, QuadrantColor, parse_match_header};

    fn settings() -> SwitchoverSettings {
        SwitchoverSettings {
            auto_switchover: true,
            switchover_time: Duration::from_secs(10),
            manual_timer: false,
            manual_timer_length: 150,
            field_count: 2,
        }
    }

    fn quads(red: &str) -> FieldQuadrants {
        [(QuadrantColor::Red, red.to_string())].into_iter().collect()
    }

    fn schedule(entries: &[(u32, &str)]) -> UpcomingScheduleTable {
        entries
            .iter()
            .map(|(number, red)| (*number, [(1, quads(red))].into_iter().collect()))
            .collect()
    }

    fn snapshot(header: &str) -> MatchSnapshot {
        MatchSnapshot {
            header: parse_match_header(header),
            timer_text: "1:00".into(),
            fields: QuadrantTable::new(),
        }
    }

    #[test]
    fn initial_state_has_no_match() {
        let sm = MatchStateMachine::new(settings());
        assert_eq!(sm.mode(), MatchMode::Unsettled);
        assert!(sm.is_between_matches());
        assert_eq!(sm.current_phase(), "Seeding");
        assert_eq!(sm.current_match_number(), 0);
    }

    #[test]
    fn only_first_indicator_enters_between_matches() {
        let mut sm = MatchStateMachine::new(settings());
        assert!(sm.begin_between_matches());
        assert!(!sm.begin_between_matches());

        sm.enter_match(&snapshot("Qualification 3"));
        assert!(sm.begin_between_matches());
    }

    #[test]
    fn unknown_match_switches_immediately() {
        let mut sm = MatchStateMachine::new(settings());
        sm.begin_between_matches();
        sm.install_schedule(schedule(&[(5, "A")]));
        assert_eq!(sm.switchover_plan(), SwitchoverPlan::Immediate);
    }

    #[test]
    fn known_match_waits_for_switchover_time_plus_manual_remainder() {
        let mut sm = MatchStateMachine::new(settings());
        sm.enter_match(&snapshot("Qualification 3"));
        assert_eq!(
            sm.switchover_plan(),
            SwitchoverPlan::After(Duration::from_secs(10))
        );

        let mut manual = settings();
        manual.manual_timer = true;
        manual.manual_timer_length = 20;
        let mut sm = MatchStateMachine::new(manual);
        sm.enter_match(&snapshot("Qualification 3"));
        assert_eq!(
            sm.switchover_plan(),
            SwitchoverPlan::After(Duration::from_secs(30))
        );
    }

    #[test]
    fn zero_delay_and_disabled_auto_switchover() {
        let mut zero = settings();
        zero.switchover_time = Duration::ZERO;
        let mut sm = MatchStateMachine::new(zero);
        sm.enter_match(&snapshot("Qualification 3"));
        assert_eq!(sm.switchover_plan(), SwitchoverPlan::Immediate);

        let mut manual_only = settings();
        manual_only.auto_switchover = false;
        let mut sm = MatchStateMachine::new(manual_only);
        sm.enter_match(&snapshot("Qualification 3"));
        assert_eq!(sm.switchover_plan(), SwitchoverPlan::AwaitTrigger);
    }

    #[test]
    fn advance_without_schedule_is_a_noop() {
        let mut sm = MatchStateMachine::new(settings());
        sm.set_current_match_number(4);
        assert_eq!(sm.advance_match(None), None);
        assert_eq!(sm.current_match_number(), 4);
    }

    #[test]
    fn bootstrap_advance_picks_lowest_match_and_resolved_phase() {
        let mut sm = MatchStateMachine::new(settings());
        sm.install_schedule(schedule(&[(9, "B"), (7, "A")]));
        assert!(sm.needs_phase_lookup());

        let advance = sm.advance_match(Some("Qualification".into())).unwrap();
        assert_eq!(sm.current_match_number(), 7);
        assert_eq!(
            advance,
            Advance::Scheduled {
                label: MatchLabel::new("Qualification", 7),
                quadrants: [(1, quads("A"))].into_iter().collect(),
            }
        );
    }

    #[test]
    fn advance_past_schedule_gap_blanks_every_field() {
        let mut sm = MatchStateMachine::new(settings());
        sm.install_schedule(schedule(&[(5, "A"), (7, "B")]));
        sm.set_current_match_number(5);

        let first = sm.advance_match(None).unwrap();
        assert_eq!(sm.current_match_number(), 6);
        assert_eq!(
            first,
            Advance::Exhausted {
                quadrants: blank_table(2)
            }
        );

        sm.set_current_match_number(5);
        assert_eq!(sm.advance_match(None).unwrap(), first);
    }

    #[test]
    fn header_number_failure_keeps_previous_number() {
        let mut sm = MatchStateMachine::new(settings());
        sm.enter_match(&snapshot("Qualification 41"));

        let label = sm.enter_match(&MatchSnapshot {
            header: Some(MatchHeader {
                phase: "Playoff".into(),
                number: None,
            }),
            timer_text: "0:30".into(),
            fields: QuadrantTable::new(),
        });
        assert_eq!(label, MatchLabel::new("Playoff", 41));
        assert_eq!(sm.mode(), MatchMode::InMatch);
    }
}
