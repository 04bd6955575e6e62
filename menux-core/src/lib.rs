pub mod items;
pub mod point;
pub mod request;
pub mod shape;
pub mod task;
pub mod trial;

pub use items::ItemList;
pub use point::Point;
pub use request::RenderRequest;
pub use shape::{DisplayMetrics, MenuKind, MenuLayout, MenuShape};
pub use task::{TaskKind, UnknownTaskError};
pub use trial::{Stamp, Trial, TrialError, TrialState};
