use crate::{ItemList, MenuKind, Point, TaskKind};

/// Lifecycle of a single trial. Each step happens at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrialState {
    #[default]
    Pending,
    Running,
    Complete,
}

/// One instant read from both clocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stamp {
    /// Milliseconds since the Unix epoch, written to the result log.
    pub wall_ms: u64,
    /// Monotonic nanoseconds, used for durations.
    pub mono_ns: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TrialError {
    #[error("prompted index {prompted} is outside a menu of {len} items")]
    PromptOutOfRange { prompted: usize, len: usize },
    #[error("trial {0} was already started")]
    AlreadyStarted(usize),
    #[error("trial {0} is not running")]
    NotRunning(usize),
}

/// One measured attempt to select the prompted item from one menu.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    menu: MenuKind,
    task: TaskKind,
    items: ItemList,
    prompted: usize,
    repeat: usize,
    number: usize,
    participant: u32,

    state: TrialState,
    selected: Option<usize>,
    started: Option<Stamp>,
    duration_ms: u64,
    start_point: Point,
    end_point: Point,
}

impl Trial {
    pub fn new(
        menu: MenuKind,
        task: TaskKind,
        items: ItemList,
        prompted: usize,
        repeat: usize,
        number: usize,
        participant: u32,
    ) -> Result<Self, TrialError> {
        if prompted >= items.len() {
            return Err(TrialError::PromptOutOfRange {
                prompted,
                len: items.len(),
            });
        }
        Ok(Self {
            menu,
            task,
            items,
            prompted,
            repeat,
            number,
            participant,
            state: TrialState::Pending,
            selected: None,
            started: None,
            duration_ms: 0,
            start_point: Point::ZERO,
            end_point: Point::ZERO,
        })
    }

    /// Records the press that opens the menu.
    pub fn start(&mut self, at: Point, now: Stamp) -> Result<(), TrialError> {
        if self.state != TrialState::Pending {
            return Err(TrialError::AlreadyStarted(self.number));
        }
        self.started = Some(now);
        self.start_point = at;
        self.state = TrialState::Running;
        Ok(())
    }

    /// Records the release, the item it landed on and the elapsed time.
    pub fn end(&mut self, at: Point, selected: Option<usize>, now: Stamp) -> Result<(), TrialError> {
        let Some(started) = self.started.filter(|_| self.state == TrialState::Running) else {
            return Err(TrialError::NotRunning(self.number));
        };
        self.duration_ms = now.mono_ns.saturating_sub(started.mono_ns) / 1_000_000;
        self.end_point = at;
        self.selected = selected;
        self.state = TrialState::Complete;
        Ok(())
    }

    pub fn menu(&self) -> MenuKind {
        self.menu
    }

    pub fn task(&self) -> TaskKind {
        self.task
    }

    pub fn items(&self) -> &ItemList {
        &self.items
    }

    pub fn prompted_index(&self) -> usize {
        self.prompted
    }

    pub fn prompted_item(&self) -> &str {
        self.items.get(self.prompted).unwrap_or_default()
    }

    pub fn repeat_number(&self) -> usize {
        self.repeat
    }

    pub fn trial_number(&self) -> usize {
        self.number
    }

    pub fn participant(&self) -> u32 {
        self.participant
    }

    pub fn state(&self) -> TrialState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == TrialState::Complete
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// Selected index as logged: `-1` for no selection.
    pub fn selected_option(&self) -> i64 {
        self.selected.map_or(-1, |i| i as i64)
    }

    /// Epoch millis of the press, `0` before the trial starts.
    pub fn start_time_ms(&self) -> u64 {
        self.started.map_or(0, |s| s.wall_ms)
    }

    /// Zero until the trial is complete.
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn start_point(&self) -> Point {
        self.start_point
    }

    pub fn end_point(&self) -> Point {
        self.end_point
    }

    pub fn is_correct(&self) -> bool {
        self.selected == Some(self.prompted)
    }
}
