//! # idpool-tree
//!
//! An arena-backed binary radix (Patricia) tree for identifier
//! allocation, plus the typed façades that turn it into a concurrent,
//! windowed, label-aware ID allocator.
//!
//! The [`RadixTree`] core keeps nodes in a flat arena addressed by index
//! (index 0 null, index 1 root) with a LIFO free-list, and supports
//! insertion with node splitting, deletion with path compaction, and a
//! stateful depth-first iterator. [`IdTree`] wraps it with a
//! reader-writer lock, a `[0, 2^L)` window, and the claim/release
//! contract shared with the dense table crate.
//!
//! # Example
//!
//! ```
//! use idpool_prefix::{labels, Pid};
//! use idpool_tree::IdTree32;
//!
//! // A private AS-number pool.
//! let pool = IdTree32::new(16).unwrap();
//! pool.claim_range("64512-64551", &labels([("purpose", "fabric")])).unwrap();
//!
//! let spare = pool.claim_free(labels([("purpose", "spine")])).unwrap();
//! assert!(spare.id().value() < 1 << 16);
//! ```

#![warn(missing_docs)]

mod error;
mod idtree;
mod iter;
mod radix;

pub use error::{Errors, TreeError};
pub use idtree::{IdTree, IdTree16, IdTree32, IdTree64};
pub use iter::TreeIter;
pub use radix::RadixTree;
