//! Error types for the dense table and its façades.

use core::fmt;

use thiserror::Error;

/// Errors surfaced by the dense table and the façades layered on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// An index exceeds the table's logical size.
    #[error("id {id} is bigger than max allowed entries: {max}")]
    OutOfBounds {
        /// The offending index.
        id: u64,
        /// The highest valid index.
        max: u64,
    },

    /// An external ID lies outside a façade's window.
    #[error("id {id} does not fit in the range from {start} to {end}")]
    OutOfWindow {
        /// The offending external ID.
        id: u64,
        /// The window's first ID.
        start: u64,
        /// The window's last ID.
        end: u64,
    },

    /// A claim hit an occupied slot.
    #[error("entry {0} already exists")]
    Exists(u64),

    /// A lookup, update or release named an empty slot.
    #[error("entry {0} not found")]
    NotFound(u64),

    /// No free slot anywhere in the table.
    #[error("no free entry found")]
    NoFreeEntry,

    /// A contiguous free run could not be found.
    #[error("could not find free range that fit in start {start}, size {size}")]
    NoFreeRange {
        /// The requested first index.
        start: u64,
        /// The requested run length.
        size: u64,
    },

    /// A free run starting at `start` is broken by an occupied slot.
    #[error("entry {id} in use in range: start: {start}, end: {end}")]
    InUse {
        /// The first free index violating consecutiveness.
        id: u64,
        /// The requested first index.
        start: u64,
        /// The requested last index.
        end: u64,
    },

    /// Fewer free slots than requested exist anywhere in the table.
    #[error("could not find free entries that fit in size {0}")]
    NoFreeSize(u64),

    /// A caller-supplied validator rejected the ID.
    #[error("{0}")]
    Rejected(String),

    /// Multiple failures from one bulk operation.
    #[error("{0}")]
    Multiple(Errors),
}

/// A list of failures accumulated across one bulk operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Errors(
    /// The individual failures, in operation order.
    pub Vec<TableError>,
);

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}
