//! State synchronization engine: turns live documents into display updates.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::{
    config::AppConfig,
    dto::{
        sse::ServerEvent,
        status::{DisplayStatus, ManualTimerStatus},
    },
    extract::SnapshotExtractor,
    model::{
        LiveDocument, MatchLabel, MatchSnapshot, QuadrantTable, TeamDirectory,
        UpcomingScheduleTable,
    },
    sinks::SinkDispatcher,
    source::{Endpoint, SnapshotSource},
    state::{
        SseHub,
        display::DisplayState,
        match_state::{Advance, MatchStateMachine, SwitchoverPlan, SwitchoverSettings},
        switchover::SwitchoverScheduler,
    },
};

const EVENT_DISPLAY: &str = "display";

/// Operator command for the manual timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualTimerCommand {
    /// Resume the countdown.
    Start,
    /// Pause the countdown.
    Stop,
    /// Stop and load the given seconds, or the configured length.
    Reset(Option<u32>),
}

/// Result of an operator switchover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchoverOutcome {
    /// The display moved to the next match, or was blanked at the end of the schedule.
    Advanced,
    /// A match is running; nothing was touched.
    MatchInProgress,
    /// No upcoming matches are cached; nothing was touched.
    NothingScheduled,
    /// The match state changed while the phase was being resolved; nothing was applied.
    Superseded,
}

/// Engine options that do not belong to the decision core.
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Append team names to bare team numbers.
    pub show_team_names: bool,
    /// Timer text comes from the manual timer.
    pub manual_timer: bool,
    /// Prefix the match label with the phase.
    pub show_match_phase: bool,
}

impl From<&AppConfig> for EngineOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            show_team_names: config.show_team_names,
            manual_timer: config.manual_timer,
            show_match_phase: config.show_match_phase,
        }
    }
}

/// Everything guarded by the engine lock.
struct EngineCore {
    machine: MatchStateMachine,
    display: DisplayState,
    switchover: SwitchoverScheduler,
    teams: TeamDirectory,
    last_broadcast: Option<DisplayStatus>,
    /// Bumped on every match state transition. Work started before a fetch is only applied
    /// if the generation is unchanged once the lock is taken again.
    generation: u64,
}

type CoreGuard<'a> = MutexGuard<'a, EngineCore>;

/// Cloneable handle to the synchronization engine.
///
/// Poll cycles, switchover timer expiry, manual timer ticks and operator commands all run
/// under the same lock, so they never interleave. Fetches from the scoring system run with
/// the lock released.
#[derive(Clone)]
pub struct MatchEngine {
    core: Arc<Mutex<EngineCore>>,
    source: Arc<dyn SnapshotSource>,
    extractor: Arc<dyn SnapshotExtractor>,
    options: EngineOptions,
    events: SseHub,
}

impl MatchEngine {
    /// Build an engine publishing through `dispatcher`.
    pub fn new(
        settings: SwitchoverSettings,
        options: EngineOptions,
        source: Arc<dyn SnapshotSource>,
        extractor: Arc<dyn SnapshotExtractor>,
        dispatcher: SinkDispatcher,
        events: SseHub,
    ) -> Self {
        let core = EngineCore {
            machine: MatchStateMachine::new(settings),
            display: DisplayState::new(dispatcher, options.show_match_phase),
            switchover: SwitchoverScheduler::new(),
            teams: TeamDirectory::default(),
            last_broadcast: None,
            generation: 0,
        };

        Self {
            core: Arc::new(Mutex::new(core)),
            source,
            extractor,
            options,
            events,
        }
    }

    /// Options the engine was built with.
    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Consume one successfully fetched live document.
    pub async fn handle_live_document(&self, body: &[u8]) {
        let document = self.extractor.live_document(body);

        if document.signals_between_matches() {
            self.between_matches(&document).await;
        } else if let LiveDocument::Match(snapshot) = document {
            let mut core = self.core.lock().await;
            self.in_match(&mut core, snapshot).await;
            self.broadcast_changes(&mut core);
        }
    }

    /// Operator switchover: drop any armed timer and advance now.
    ///
    /// Nothing is touched while a match is in progress or when no schedule is cached.
    pub async fn trigger_switchover(&self) -> SwitchoverOutcome {
        let mut core = self.core.lock().await;
        if !core.machine.is_between_matches() {
            return SwitchoverOutcome::MatchInProgress;
        }
        if core.machine.upcoming().is_empty() {
            debug!("operator switchover without cached matches");
            return SwitchoverOutcome::NothingScheduled;
        }

        if core.switchover.cancel_if_pending() {
            debug!("pending switchover replaced by operator trigger");
        }
        self.advance(core).await
    }

    /// Write every cached display value to the sinks again.
    pub async fn resync(&self) {
        let mut core = self.core.lock().await;
        info!("rewriting display state to every sink");
        core.display.resync().await;
    }

    /// Override the current match number.
    pub async fn set_match_number(&self, number: u32) {
        let mut core = self.core.lock().await;
        info!(match_number = number, "match number set by operator");
        core.machine.set_current_match_number(number);
        self.broadcast_changes(&mut core);
    }

    /// Apply an operator command to the manual timer and publish the resulting text.
    pub async fn manual_timer(&self, command: ManualTimerCommand) -> ManualTimerStatus {
        let mut core = self.core.lock().await;
        let timer = core.machine.manual_timer_mut();
        match command {
            ManualTimerCommand::Start => timer.start(),
            ManualTimerCommand::Stop => timer.stop(),
            ManualTimerCommand::Reset(seconds) => timer.reset(seconds),
        }
        debug!(?command, remaining = timer.remaining(), "manual timer command");

        if self.options.manual_timer {
            let text = core.machine.manual_timer().text();
            core.display.publish_timer(&text).await;
        }
        self.broadcast_changes(&mut core);
        self.manual_timer_status(&core)
    }

    /// Advance the manual timer by one second, publishing the new text.
    pub async fn tick_manual_timer(&self) {
        if !self.options.manual_timer {
            return;
        }

        let mut core = self.core.lock().await;
        if core.machine.manual_timer_mut().tick().is_none() {
            return;
        }

        let text = core.machine.manual_timer().text();
        core.display.publish_timer(&text).await;
        self.broadcast_changes(&mut core);
    }

    /// Current display state.
    pub async fn status(&self) -> DisplayStatus {
        let core = self.core.lock().await;
        self.display_status(&core)
    }

    async fn between_matches(&self, document: &LiveDocument) {
        let generation = {
            let mut core = self.core.lock().await;
            if !core.machine.begin_between_matches() {
                return;
            }
            core.generation += 1;

            // Show the final zero once instead of leaving the last second up, unless the
            // timer is already blank.
            if let LiveDocument::Match(snapshot) = document {
                if !core.display.timer().is_empty() {
                    core.display.publish_timer(&snapshot.timer_text).await;
                }
            }
            self.broadcast_changes(&mut core);
            core.generation
        };

        let schedule = self.fetch_schedule().await;
        let teams = if self.options.show_team_names {
            self.fetch_teams().await
        } else {
            None
        };

        let mut core = self.core.lock().await;
        if let Some(teams) = teams {
            core.teams = teams;
        }
        if core.generation != generation {
            debug!("match state changed while fetching the schedule; schedule dropped");
            return;
        }
        core.machine.install_schedule(schedule);

        let plan = core.machine.switchover_plan();
        match plan {
            SwitchoverPlan::Immediate => {
                self.advance(core).await;
                return;
            }
            SwitchoverPlan::After(delay) => {
                info!(delay_secs = delay.as_secs_f64(), "switchover scheduled");
                let engine = self.clone();
                core.switchover.arm(delay, async move {
                    engine.switchover_due(generation).await
                });
            }
            SwitchoverPlan::AwaitTrigger => {
                info!("automatic switchover disabled; waiting for an operator")
            }
        }
        self.broadcast_changes(&mut core);
    }

    /// Switchover timer expiry for the period that armed it.
    async fn switchover_due(&self, generation: u64) {
        let core = self.core.lock().await;
        if core.generation != generation {
            debug!("switchover timer fired after the match state changed; ignored");
            return;
        }
        self.advance(core).await;
    }

    async fn in_match(&self, core: &mut EngineCore, snapshot: MatchSnapshot) {
        if core.switchover.cancel_if_pending() {
            info!("match started before the switchover; pending switchover cancelled");
        }
        core.generation += 1;

        let label = core.machine.enter_match(&snapshot);
        if !self.options.manual_timer {
            core.display.publish_timer(&snapshot.timer_text).await;
        }
        core.display.publish_match_label(&label, false).await;

        if !snapshot.fields.is_empty() {
            let quadrants = self.labels(core, &snapshot.fields);
            core.display.publish_quadrants(&quadrants, false).await;
        }
    }

    /// Move to the next match and publish it. Releases the lock while the phase is looked up.
    async fn advance<'a>(&'a self, mut core: CoreGuard<'a>) -> SwitchoverOutcome {
        let mut phase = None;
        if core.machine.needs_phase_lookup() {
            let generation = core.generation;
            drop(core);
            phase = self.lookup_phase().await;
            core = self.core.lock().await;
            if core.generation != generation {
                debug!("match state changed while resolving the phase; switchover dropped");
                return SwitchoverOutcome::Superseded;
            }
        }

        let Some(advance) = core.machine.advance_match(phase) else {
            debug!("no upcoming matches cached; switchover skipped");
            return SwitchoverOutcome::NothingScheduled;
        };
        core.generation += 1;

        match advance {
            Advance::Scheduled { label, quadrants } => {
                info!(phase = %label.phase, match_number = ?label.number, "switched over to next match");
                let quadrants = self.labels(&core, &quadrants);
                core.display.publish_quadrants(&quadrants, false).await;
                core.display.publish_timer("").await;
                core.display.publish_match_label(&label, false).await;
            }
            Advance::Exhausted { quadrants } => {
                core.display.publish_quadrants(&quadrants, false).await;
                core.display.publish_timer("").await;
                core.display
                    .publish_match_label(&MatchLabel::blank(), false)
                    .await;
            }
        }
        self.broadcast_changes(&mut core);
        SwitchoverOutcome::Advanced
    }

    fn labels(&self, core: &EngineCore, table: &QuadrantTable) -> QuadrantTable {
        if self.options.show_team_names && !core.teams.is_empty() {
            core.teams.decorate(table)
        } else {
            table.clone()
        }
    }

    async fn fetch_schedule(&self) -> UpcomingScheduleTable {
        match self.source.fetch(Endpoint::UpcomingSchedule).await {
            Ok(body) => self.extractor.upcoming_schedule(&body),
            Err(err) => {
                warn!(error = %err, "failed to fetch upcoming matches");
                UpcomingScheduleTable::new()
            }
        }
    }

    async fn fetch_teams(&self) -> Option<TeamDirectory> {
        match self.source.fetch(Endpoint::TeamLookup).await {
            Ok(body) => {
                let teams = self.extractor.team_directory(&body);
                debug!(teams = teams.len(), "refreshed team names");
                (!teams.is_empty()).then_some(teams)
            }
            Err(err) => {
                warn!(error = %err, "failed to fetch team names; keeping previous ones");
                None
            }
        }
    }

    async fn lookup_phase(&self) -> Option<String> {
        match self.source.fetch(Endpoint::PhaseSchedule).await {
            Ok(body) => {
                let phase = self.extractor.current_phase(&body);
                if phase.is_none() {
                    warn!("phase schedule does not name a current phase");
                }
                phase
            }
            Err(err) => {
                warn!(error = %err, "failed to fetch phase schedule; keeping current phase");
                None
            }
        }
    }

    fn manual_timer_status(&self, core: &EngineCore) -> ManualTimerStatus {
        let timer = core.machine.manual_timer();
        ManualTimerStatus {
            enabled: self.options.manual_timer,
            running: timer.is_running(),
            remaining_secs: timer.remaining(),
            text: timer.text(),
        }
    }

    fn display_status(&self, core: &EngineCore) -> DisplayStatus {
        DisplayStatus {
            mode: core.machine.mode(),
            phase: core.machine.current_phase().to_string(),
            match_number: core.machine.current_match_number(),
            timer: core.display.timer().to_string(),
            match_label: core
                .display
                .match_label()
                .map(|label| label.render(self.options.show_match_phase))
                .unwrap_or_default(),
            quadrants: core.display.quadrants().clone(),
            upcoming_matches: core.machine.upcoming().len(),
            switchover_due_secs: core.switchover.due_in().map(|due| due.as_secs_f64()),
            manual_timer: self.manual_timer_status(core),
        }
    }

    /// Push the display state to SSE subscribers when it differs from the last push.
    fn broadcast_changes(&self, core: &mut EngineCore) {
        let mut status = self.display_status(core);
        // The countdown to the switchover changes on every call; only its presence matters.
        status.switchover_due_secs = status.switchover_due_secs.map(|_| 0.0);
        if core.last_broadcast.as_ref() == Some(&status) {
            return;
        }

        match ServerEvent::json(Some(EVENT_DISPLAY.to_string()), &status) {
            Ok(event) => self.events.broadcast(event),
            Err(err) => warn!(error = %err, "failed to serialise display event"),
        }
        core.last_broadcast = Some(status);
    }
}
