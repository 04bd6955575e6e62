use crate::selection::{Completion, Effect, PointerEvent, Selection, TrialLink};
use menux_core::{DisplayMetrics, ItemList, MenuKind, MenuLayout, RenderRequest, Trial};
use tracing::{debug, warn};

pub const NOTHING_SELECTED: &str = "Nothing Selected";
pub const INVALID_SELECTION: &str = "Invalid Selection";

/// One menu instance: a layout, the items it offers and the gesture in
/// progress. Built per trial, or standalone for free play.
#[derive(Debug, Clone, PartialEq)]
pub struct Menu {
    layout: MenuLayout,
    items: ItemList,
    selection: Selection,
}

impl Menu {
    /// Free-play menu; completions are not tied to any trial.
    pub fn new(layout: MenuLayout, items: ItemList) -> Self {
        Self {
            layout,
            items,
            selection: Selection::idle(TrialLink::Detached),
        }
    }

    /// Menu configured with a trial's shape and items. The first press starts
    /// the trial and the release that follows finishes it.
    pub fn for_trial(trial: &Trial, metrics: DisplayMetrics) -> Self {
        Self {
            layout: MenuLayout::new(trial.menu(), metrics),
            items: trial.items().clone(),
            selection: Selection::for_trial(),
        }
    }

    /// Feeds one pointer event through the selection protocol and returns
    /// the effects for the caller to apply. Rejected events leave the menu
    /// untouched.
    pub fn handle(&mut self, event: PointerEvent) -> Vec<Effect> {
        let transition = self.selection.step(event, &self.layout, self.items.len());
        if let Some(violation) = transition.violation() {
            warn!(%violation, "ignoring pointer event");
        } else if transition.next.tracked != self.selection.tracked {
            debug!(index = ?transition.next.tracked, "tracked item changed");
        }
        self.selection = transition.next;
        transition.effects
    }

    /// What to draw, or `None` while no gesture is in progress.
    pub fn render_request(&self) -> Option<RenderRequest> {
        self.selection.is_selecting().then(|| RenderRequest {
            layout: self.layout,
            items: self.items.clone(),
            current: self.selection.tracked,
            origin: self.selection.origin,
        })
    }

    pub fn current_index(&self) -> Option<usize> {
        self.selection.tracked
    }

    /// Label under the pointer, for display.
    pub fn current_item(&self) -> &str {
        match self.selection.tracked {
            None => NOTHING_SELECTED,
            Some(i) => self.items.get(i).unwrap_or(INVALID_SELECTION),
        }
    }

    pub fn announcement(&self, completion: &Completion) -> String {
        match completion.selected.and_then(|i| self.items.get(i)) {
            Some(label) => format!("Selected {label}"),
            None => NOTHING_SELECTED.to_string(),
        }
    }

    /// Recomputes the layout for a new surface size. The gesture in progress
    /// is kept.
    pub fn relayout(&mut self, metrics: DisplayMetrics) {
        self.layout = MenuLayout::new(self.layout.kind(), metrics);
    }

    /// Switches to another shape, abandoning any gesture in progress.
    pub fn reshape(&mut self, kind: MenuKind, metrics: DisplayMetrics) {
        self.layout = MenuLayout::new(kind, metrics);
        self.selection = Selection::idle(self.selection.trial);
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn layout(&self) -> &MenuLayout {
        &self.layout
    }

    pub fn items(&self) -> &ItemList {
        &self.items
    }

    pub fn kind(&self) -> MenuKind {
        self.layout.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolViolation;
    use menux_core::{MenuShape, Point, TaskKind};

    fn metrics() -> DisplayMetrics {
        DisplayMetrics::new(1000, 800)
    }

    fn free_linear() -> Menu {
        Menu::new(
            MenuLayout::with_shape(
                MenuShape::Linear {
                    cell_width: 100.0,
                    cell_height: 50.0,
                },
                5.0,
            ),
            ItemList::from_slashed("1/2/4/8/16"),
        )
    }

    #[test]
    fn render_request_only_while_selecting() {
        let mut menu = free_linear();
        assert!(menu.render_request().is_none());

        menu.handle(PointerEvent::Press(Point::new(10.0, 10.0)));
        menu.handle(PointerEvent::Move(Point::new(60.0, 135.0)));
        let request = menu.render_request().unwrap();
        assert_eq!(request.current, Some(2));
        assert_eq!(request.origin, Point::new(10.0, 10.0));
        assert_eq!(request.items.len(), 5);
        assert_eq!(menu.current_item(), "4");

        menu.handle(PointerEvent::Release(Point::new(60.0, 135.0)));
        assert!(menu.render_request().is_none());
    }

    #[test]
    fn current_item_labels() {
        let mut menu = free_linear();
        assert_eq!(menu.current_item(), NOTHING_SELECTED);
        menu.selection.tracked = Some(9);
        assert_eq!(menu.current_item(), INVALID_SELECTION);
    }

    #[test]
    fn announcements() {
        let menu = free_linear();
        let hit = Completion {
            selected: Some(3),
            at: Point::ZERO,
        };
        let miss = Completion {
            selected: None,
            at: Point::ZERO,
        };
        assert_eq!(menu.announcement(&hit), "Selected 8");
        assert_eq!(menu.announcement(&miss), "Nothing Selected");
    }

    #[test]
    fn rejected_event_leaves_menu_untouched() {
        let mut menu = free_linear();
        let before = menu.clone();
        let effects = menu.handle(PointerEvent::Release(Point::ZERO));
        assert_eq!(
            effects,
            [Effect::Rejected(ProtocolViolation::ReleaseWhileIdle)]
        );
        assert_eq!(menu, before);
    }

    #[test]
    fn trial_menu_takes_shape_and_items_from_trial() {
        let trial = Trial::new(
            MenuKind::Grid,
            TaskKind::Unclass,
            ItemList::from_slashed("a/b/c/d/e"),
            4,
            0,
            0,
            3,
        )
        .unwrap();
        let mut menu = Menu::for_trial(&trial, metrics());
        assert_eq!(menu.kind(), MenuKind::Grid);
        assert!(menu.items().shares_storage(trial.items()));

        let effects = menu.handle(PointerEvent::Press(Point::new(5.0, 5.0)));
        assert_eq!(effects[0], Effect::StartTrial {
            at: Point::new(5.0, 5.0)
        });
    }

    #[test]
    fn reshape_drops_gesture() {
        let mut menu = free_linear();
        menu.handle(PointerEvent::Press(Point::ZERO));
        menu.reshape(MenuKind::Radial, metrics());
        assert_eq!(menu.kind(), MenuKind::Radial);
        assert!(menu.render_request().is_none());
    }

    #[test]
    fn relayout_scales_with_surface() {
        let mut menu = Menu::new(
            MenuLayout::new(MenuKind::Radial, metrics()),
            ItemList::from_slashed("a/b"),
        );
        menu.handle(PointerEvent::Press(Point::ZERO));
        menu.relayout(DisplayMetrics::new(2000, 1600));
        assert_eq!(*menu.layout(), MenuLayout::new(MenuKind::Radial, DisplayMetrics::new(2000, 1600)));
        assert!(menu.selection().is_selecting());
    }
}
