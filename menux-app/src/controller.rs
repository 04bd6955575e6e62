//! Ties the experiment model together for the window: routes pointer events
//! through the open menu into the session, records results and handles the
//! operator commands.

use anyhow::Result;
use menux_core::{DisplayMetrics, ItemList, MenuKind, MenuLayout, RenderRequest};
use menux_experiment::{
    Completion, CsvResultLog, Effect, ExperimentConfig, ItemPools, Menu, PointerEvent, Session,
    SessionSignal,
};
use menux_timing::Timer;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info, warn};

/// Items offered in test mode.
pub const TEST_ITEMS: &str = "1/2/4/8/16";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Experiment,
    /// Free play: no trials, nothing recorded.
    Test,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Abandon the running session and start one for a new participant.
    NextSession,
    /// Delete the result log and restart the session for a new participant.
    EraseData,
    /// Delete the result log and drop into free play.
    TestMode,
    /// Test mode only.
    Shape(MenuKind),
}

pub struct Controller<T> {
    config: ExperimentConfig,
    pools: ItemPools,
    timer: T,
    rng: StdRng,
    log: CsvResultLog,
    session: Session,
    menu: Menu,
    metrics: DisplayMetrics,
    mode: Mode,
    banner: String,
}

impl<T: Timer<Timestamp = u64>> Controller<T> {
    pub fn new(
        config: ExperimentConfig,
        pools: ItemPools,
        participant: Option<u32>,
        test_mode: bool,
        metrics: DisplayMetrics,
        timer: T,
    ) -> Result<Self> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let participant = participant.unwrap_or_else(|| rng.random_range(0..1000));
        let session = Session::start(participant, pools.clone(), config.scheduler(), &mut rng)?;
        let log = CsvResultLog::open(&config.results_path)?;
        info!(path = %log.path().display(), "logging results");

        let mut controller = Self {
            config,
            pools,
            timer,
            rng,
            log,
            session,
            menu: test_menu(metrics),
            metrics,
            mode: Mode::Test,
            banner: String::new(),
        };
        if !test_mode {
            controller.enter_session();
        }
        Ok(controller)
    }

    /// Feeds one pointer event through. Returns whether the screen changed.
    pub fn pointer(&mut self, event: PointerEvent) -> bool {
        if self.mode == Mode::Finished {
            return false;
        }
        let effects = self.menu.handle(event);
        let completion = match self.mode {
            Mode::Experiment => match self.session.apply_effects(&effects, &self.timer) {
                Ok(c) => c,
                Err(violation) => {
                    warn!(%violation, "trial event dropped");
                    None
                }
            },
            _ => effects.iter().find_map(|e| match e {
                Effect::Completed(c) => Some(*c),
                _ => None,
            }),
        };
        if let Some(completion) = completion {
            self.complete(completion);
        }
        completion.is_some() || effects.contains(&Effect::Redraw)
    }

    pub fn command(&mut self, command: Command) -> Result<()> {
        match command {
            Command::NextSession => {
                let participant = self.rng.random_range(0..1000);
                self.restart(participant)?;
            }
            Command::EraseData => {
                self.log.clear()?;
                self.banner = "Data erased".into();
                let participant = self.rng.random_range(0..1000);
                self.restart(participant)?;
            }
            Command::TestMode => {
                self.log.clear()?;
                self.menu = test_menu(self.metrics);
                self.mode = Mode::Test;
                self.banner = "Data erased".into();
                info!("test mode");
            }
            Command::Shape(kind) if self.mode == Mode::Test => {
                self.menu.reshape(kind, self.metrics);
                self.banner = format!("{kind} menu");
            }
            Command::Shape(_) => {}
        }
        Ok(())
    }

    pub fn resize(&mut self, metrics: DisplayMetrics) {
        self.metrics = metrics;
        self.menu.relayout(metrics);
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn font_path(&self) -> Option<&std::path::Path> {
        self.config.font_path.as_deref()
    }

    pub fn prompt(&self) -> String {
        match self.mode {
            Mode::Test => "Test mode: press 1, 2 or 3 to switch menus, N to start a session".into(),
            Mode::Experiment | Mode::Finished => self.session.prompt(),
        }
    }

    pub fn progress(&self) -> Option<(usize, usize)> {
        (self.mode == Mode::Experiment).then(|| self.session.progress())
    }

    pub fn render_request(&self) -> Option<RenderRequest> {
        self.menu.render_request()
    }

    pub fn banner(&self) -> &str {
        &self.banner
    }

    fn complete(&mut self, completion: Completion) {
        self.banner = self.menu.announcement(&completion);
        info!(announcement = %self.banner, "selection");
        if self.mode != Mode::Experiment {
            return;
        }
        if let Err(e) = self.session.record_current(&mut self.log) {
            error!(error = %e, "result row not saved");
            self.banner = format!("{}: result not saved", self.banner);
        }
        match self.session.advance() {
            Ok(SessionSignal::TrialReady(trial)) => {
                self.menu = Menu::for_trial(trial, self.metrics);
            }
            Ok(SessionSignal::Complete | SessionSignal::Empty) => self.mode = Mode::Finished,
            Err(violation) => warn!(%violation, "cannot advance"),
        }
    }

    fn restart(&mut self, participant: u32) -> Result<()> {
        self.session = Session::start(
            participant,
            self.pools.clone(),
            self.config.scheduler(),
            &mut self.rng,
        )?;
        self.enter_session();
        Ok(())
    }

    fn enter_session(&mut self) {
        match self.session.status() {
            SessionSignal::TrialReady(trial) => {
                self.menu = Menu::for_trial(trial, self.metrics);
                self.mode = Mode::Experiment;
            }
            SessionSignal::Empty => {
                warn!("configuration produced no trials");
                self.banner = "No trials scheduled".into();
                self.mode = Mode::Finished;
            }
            SessionSignal::Complete => self.mode = Mode::Finished,
        }
        info!(session = %self.session, "session ready");
    }
}

fn test_menu(metrics: DisplayMetrics) -> Menu {
    Menu::new(
        MenuLayout::new(MenuKind::Linear, metrics),
        ItemList::from_slashed(TEST_ITEMS),
    )
}
