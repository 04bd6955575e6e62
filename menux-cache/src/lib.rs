//! Process-wide label interner. Menu labels, prompts and progress strings
//! are interned once and referred to by id from the renderer's caches.

use lazy_static::lazy_static;
use std::sync::{PoisonError, RwLock};
pub use string_cache::DefaultAtom as Atom;

lazy_static! {
    static ref LABELS: RwLock<Vec<Atom>> = RwLock::new(Vec::new());
}

/// Intern a label and return its id. Equal strings get the same id.
pub fn intern_label(s: &str) -> usize {
    let atom = Atom::from(s);
    if let Some(id) = find(&atom) {
        return id;
    }
    let mut labels = LABELS.write().unwrap_or_else(PoisonError::into_inner);
    // another thread may have added it between the two locks
    match labels.iter().position(|a| *a == atom) {
        Some(id) => id,
        None => {
            labels.push(atom);
            labels.len() - 1
        }
    }
}

pub fn label(id: usize) -> Option<Atom> {
    LABELS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(id)
        .cloned()
}

/// Number of distinct labels interned so far.
pub fn label_count() -> usize {
    LABELS.read().unwrap_or_else(PoisonError::into_inner).len()
}

fn find(atom: &Atom) -> Option<usize> {
    LABELS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .position(|a| a == atom)
}
