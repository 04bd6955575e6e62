use crate::{ItemList, MenuLayout, Point};

/// Everything the renderer needs to draw one open menu.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub layout: MenuLayout,
    pub items: ItemList,
    /// Highlighted item, if any.
    pub current: Option<usize>,
    /// Press position; the menu is drawn relative to it.
    pub origin: Point,
}
