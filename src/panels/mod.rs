//! Admin panels: the fetch / edit / save cycle every content screen runs.
//!
//! Panels hold local state only. Each one reports failures in its own error
//! banner and successes through the shared [`Notifier`](crate::notify::Notifier).

mod applications;
mod debounce;
mod editor;
mod email;
mod list;

pub use applications::*;
pub use debounce::*;
pub use editor::*;
pub use email::*;
pub use list::*;

/// What a panel is currently editing, at most one thing at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditingTarget<K> {
    None,
    Section(K),
}

impl<K> EditingTarget<K> {
    pub fn is_editing(&self) -> bool {
        matches!(self, EditingTarget::Section(_))
    }

    pub fn key(&self) -> Option<&K> {
        match self {
            EditingTarget::Section(key) => Some(key),
            EditingTarget::None => None,
        }
    }
}
