//! Allocation entries: a prefix ID plus its labels.

use core::fmt;

use crate::key::Key;
use crate::label::{label_string, LabelMap};
use crate::pid::Pid;

/// An allocated ID and the labels it was claimed with.
///
/// Two entries are equal when their ID value, ID length and canonical
/// label form all match.
#[derive(Clone, Debug)]
pub struct Entry<U: Key> {
    id: Pid<U>,
    labels: LabelMap,
}

impl<U: Key> Entry<U> {
    /// Creates an entry for `id` with `labels`.
    pub fn new(id: Pid<U>, labels: LabelMap) -> Self {
        Self { id, labels }
    }

    /// The allocated prefix ID.
    #[inline]
    pub fn id(&self) -> Pid<U> {
        self.id
    }

    /// The labels the entry was claimed with.
    #[inline]
    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }
}

impl<U: Key> PartialEq for Entry<U> {
    fn eq(&self, other: &Self) -> bool {
        self.id.value() == other.id.value()
            && self.id.length() == other.id.length()
            && self.labels == other.labels
    }
}

impl<U: Key> Eq for Entry<U> {}

impl<U: Key> fmt::Display for Entry<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id: {}, labels: {}", self.id, label_string(&self.labels))
    }
}
