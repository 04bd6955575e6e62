pub mod config;
pub mod error;
pub mod menu;
pub mod pool;
pub mod recorder;
pub mod scheduler;
pub mod selection;
pub mod session;

pub use config::ExperimentConfig;
pub use error::{ConfigurationError, PersistenceError, ProtocolViolation};
pub use menu::Menu;
pub use pool::{ItemPoolSource, ItemPools, PoolFile};
pub use recorder::{CsvResultLog, MemoryRecorder, RESULT_HEADER, ResultRecorder, format_row};
pub use scheduler::TrialScheduler;
pub use selection::{
    Completion, Effect, PointerEvent, Selection, SelectionState, Transition, TrialLink,
};
pub use session::{Session, SessionSignal};
