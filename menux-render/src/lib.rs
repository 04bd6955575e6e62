pub mod render;
pub mod text;

pub use render::{FrameStats, Scene, SkiaRenderer};
pub use text::{TextCache, load_font, render_text_pixmap};
