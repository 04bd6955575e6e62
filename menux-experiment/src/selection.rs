//! Press → drag → release selection protocol.
//!
//! [`Selection::step`] is a pure transition: it takes the current record and
//! one pointer event and returns the next record plus the effects the caller
//! has to carry out (open/close the trial, redraw, report the completion).

use crate::error::ProtocolViolation;
use menux_core::{MenuLayout, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    Selecting,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Press(Point),
    Move(Point),
    Release(Point),
    /// Abandon the gesture without finishing the trial.
    Reset,
}

/// How the selection relates to a live trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrialLink {
    /// Free play, or the trial has already been finished.
    #[default]
    Detached,
    /// Waiting for the press that starts the trial.
    Ready,
    /// The trial has started; the next release finishes it.
    Open,
}

/// Result of a finished gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Completion {
    pub selected: Option<usize>,
    pub at: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    StartTrial { at: Point },
    FinishTrial { selected: Option<usize>, at: Point },
    Completed(Completion),
    Redraw,
    Rejected(ProtocolViolation),
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Selection {
    pub state: SelectionState,
    /// Press position. Zero while idle.
    pub origin: Point,
    pub tracked: Option<usize>,
    pub trial: TrialLink,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: Selection,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(next: Selection, effects: Vec<Effect>) -> Self {
        Self { next, effects }
    }

    fn rejected(unchanged: Selection, violation: ProtocolViolation) -> Self {
        Self::to(unchanged, vec![Effect::Rejected(violation)])
    }

    pub fn completion(&self) -> Option<Completion> {
        self.effects.iter().find_map(|e| match e {
            Effect::Completed(c) => Some(*c),
            _ => None,
        })
    }

    pub fn violation(&self) -> Option<&ProtocolViolation> {
        self.effects.iter().find_map(|e| match e {
            Effect::Rejected(v) => Some(v),
            _ => None,
        })
    }

    pub fn needs_redraw(&self) -> bool {
        self.effects.contains(&Effect::Redraw)
    }
}

impl Selection {
    pub fn idle(trial: TrialLink) -> Self {
        Self {
            trial,
            ..Self::default()
        }
    }

    /// Idle selection that will start a trial on the next press.
    pub fn for_trial() -> Self {
        Self::idle(TrialLink::Ready)
    }

    pub fn is_selecting(&self) -> bool {
        self.state == SelectionState::Selecting
    }

    /// Advances the protocol by one event. Out-of-order events come back as
    /// [`Effect::Rejected`] with the record unchanged.
    pub fn step(self, event: PointerEvent, layout: &MenuLayout, item_count: usize) -> Transition {
        match (self.state, event) {
            (SelectionState::Idle, PointerEvent::Press(at)) => {
                let mut effects = Vec::with_capacity(2);
                let trial = match self.trial {
                    TrialLink::Ready => {
                        effects.push(Effect::StartTrial { at });
                        TrialLink::Open
                    }
                    other => other,
                };
                effects.push(Effect::Redraw);
                Transition::to(
                    Selection {
                        state: SelectionState::Selecting,
                        origin: at,
                        tracked: None,
                        trial,
                    },
                    effects,
                )
            }
            (SelectionState::Selecting, PointerEvent::Move(at)) => {
                let index = layout.resolve(at - self.origin, item_count);
                if index == self.tracked {
                    return Transition::to(self, Vec::new());
                }
                Transition::to(
                    Selection {
                        tracked: index,
                        ..self
                    },
                    vec![Effect::Redraw],
                )
            }
            (SelectionState::Selecting, PointerEvent::Release(at)) => {
                let selected = layout.resolve(at - self.origin, item_count);
                let mut effects = Vec::with_capacity(3);
                let trial = match self.trial {
                    TrialLink::Open => {
                        effects.push(Effect::FinishTrial { selected, at });
                        TrialLink::Detached
                    }
                    other => other,
                };
                effects.push(Effect::Completed(Completion { selected, at }));
                effects.push(Effect::Redraw);
                Transition::to(Selection::idle(trial), effects)
            }
            (SelectionState::Selecting, PointerEvent::Reset) => {
                Transition::to(Selection::idle(self.trial), vec![Effect::Redraw])
            }
            (SelectionState::Selecting, PointerEvent::Press(_)) => {
                Transition::rejected(self, ProtocolViolation::PressWhileSelecting)
            }
            (SelectionState::Idle, PointerEvent::Move(_)) => {
                Transition::rejected(self, ProtocolViolation::MoveWhileIdle)
            }
            (SelectionState::Idle, PointerEvent::Release(_)) => {
                Transition::rejected(self, ProtocolViolation::ReleaseWhileIdle)
            }
            (SelectionState::Idle, PointerEvent::Reset) => {
                Transition::rejected(self, ProtocolViolation::ResetWhileIdle)
            }
        }
    }
}
