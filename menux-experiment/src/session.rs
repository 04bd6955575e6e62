//! One participant's run: the scheduled trials and a cursor into them.

use crate::error::{ConfigurationError, PersistenceError, ProtocolViolation};
use crate::pool::ItemPools;
use crate::recorder::ResultRecorder;
use crate::scheduler::TrialScheduler;
use crate::selection::{Completion, Effect};
use menux_core::{Stamp, Trial};
use menux_timing::Timer;
use rand::Rng;
use std::fmt;
use tracing::{debug, info};

pub const SESSION_COMPLETED: &str = "Session completed";

/// Where a session stands after starting or advancing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionSignal<'a> {
    TrialReady(&'a Trial),
    /// The configuration produced no trials at all.
    Empty,
    Complete,
}

#[derive(Debug, Clone)]
pub struct Session {
    participant: u32,
    scheduler: TrialScheduler,
    pools: ItemPools,
    trials: Vec<Trial>,
    cursor: usize,
}

impl Session {
    /// Schedules every trial for `participant` up front. Nothing is created
    /// if the pools are unusable.
    pub fn start<R: Rng + ?Sized>(
        participant: u32,
        pools: ItemPools,
        scheduler: TrialScheduler,
        rng: &mut R,
    ) -> Result<Self, ConfigurationError> {
        let trials = scheduler.schedule(participant, &pools, rng)?;
        info!(participant, trials = trials.len(), "session started");
        Ok(Self {
            participant,
            scheduler,
            pools,
            trials,
            cursor: 0,
        })
    }

    pub fn status(&self) -> SessionSignal<'_> {
        if self.trials.is_empty() {
            return SessionSignal::Empty;
        }
        self.trials
            .get(self.cursor)
            .map_or(SessionSignal::Complete, SessionSignal::TrialReady)
    }

    /// Moves past the current trial, which must have been completed. Once
    /// the sequence is exhausted this keeps returning the terminal signal.
    pub fn advance(&mut self) -> Result<SessionSignal<'_>, ProtocolViolation> {
        if let Some(trial) = self.trials.get(self.cursor) {
            if !trial.is_complete() {
                return Err(ProtocolViolation::TrialOpen(trial.trial_number()));
            }
            self.cursor += 1;
            debug!(cursor = self.cursor, total = self.trials.len(), "advanced");
            if self.cursor == self.trials.len() {
                info!(participant = self.participant, "session complete");
            }
        }
        Ok(self.status())
    }

    pub fn current_trial(&self) -> Option<&Trial> {
        self.trials.get(self.cursor)
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.trials.len()
    }

    /// Applies the trial effects of one pointer event to the current trial
    /// and passes back the completion, if the event produced one.
    pub fn apply_effects<T>(
        &mut self,
        effects: &[Effect],
        timer: &T,
    ) -> Result<Option<Completion>, ProtocolViolation>
    where
        T: Timer<Timestamp = u64>,
    {
        let mut completion = None;
        for effect in effects {
            match *effect {
                Effect::StartTrial { at } => {
                    let trial = self.open_trial()?;
                    trial.start(at, stamp(timer))?;
                    debug!(trial = trial.trial_number(), x = at.x, y = at.y, "trial started");
                }
                Effect::FinishTrial { selected, at } => {
                    let trial = self.open_trial()?;
                    trial.end(at, selected, stamp(timer))?;
                    debug!(
                        trial = trial.trial_number(),
                        selected = trial.selected_option(),
                        prompted = trial.prompted_index(),
                        duration_ms = trial.duration_ms(),
                        "trial finished"
                    );
                }
                Effect::Completed(c) => completion = Some(c),
                Effect::Redraw | Effect::Rejected(_) => {}
            }
        }
        Ok(completion)
    }

    /// Hands the current (finished) trial to `recorder`. A failure leaves
    /// the trial and cursor alone; the session can still advance.
    pub fn record_current<R: ResultRecorder + ?Sized>(
        &self,
        recorder: &mut R,
    ) -> Result<(), PersistenceError> {
        let trial = self.current_trial().ok_or(PersistenceError::NoTrial)?;
        recorder.append(trial)
    }

    /// `(current, total)` with `current` counted from one.
    pub fn progress(&self) -> (usize, usize) {
        let total = self.trials.len();
        ((self.cursor + 1).min(total), total)
    }

    /// Instruction shown to the participant.
    pub fn prompt(&self) -> String {
        match self.current_trial() {
            Some(trial) => format!(
                "Select \"{}\" from the {} menu",
                trial.prompted_item(),
                trial.menu()
            ),
            None => SESSION_COMPLETED.to_string(),
        }
    }

    pub fn participant(&self) -> u32 {
        self.participant
    }

    pub fn scheduler(&self) -> &TrialScheduler {
        &self.scheduler
    }

    pub fn pools(&self) -> &ItemPools {
        &self.pools
    }

    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    fn open_trial(&mut self) -> Result<&mut Trial, ProtocolViolation> {
        self.trials
            .get_mut(self.cursor)
            .ok_or(ProtocolViolation::NoCurrentTrial)
    }
}

fn stamp<T: Timer<Timestamp = u64>>(timer: &T) -> Stamp {
    Stamp {
        wall_ms: timer.wall_clock_ms(),
        mono_ns: timer.now(),
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (current, total) = self.progress();
        write!(
            f,
            "Session: participant {}, trial {}/{}, {} repeats, {} items per condition, {} tasks",
            self.participant,
            current,
            total,
            self.scheduler.repeat_count,
            self.scheduler.item_count_cap,
            self.pools.len(),
        )
    }
}
