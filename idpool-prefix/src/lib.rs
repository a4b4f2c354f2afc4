//! # idpool-prefix
//!
//! Prefix IDs, ranges and prefix-set algebra over bounded integer
//! key-spaces (`u16`, `u32`, `u64`).
//!
//! A [`Pid`] names an aligned block of keys as a `(value, length)` pair —
//! the integer analogue of a CIDR prefix. A [`PidRange`] is an arbitrary
//! closed interval, decomposable into its minimal prefix cover. A
//! [`PidSet`] is a normalized union of ranges supporting subtraction and
//! free-block extraction, which is what turns "everything in the window
//! minus everything claimed" into "the next free ID".
//!
//! # Example
//!
//! ```
//! use idpool_prefix::{Pid, PidRange, PidSetBuilder};
//!
//! // A VLAN-sized window, with one range already claimed.
//! let mut b: PidSetBuilder<u32> = PidSetBuilder::new();
//! b.add_id(Pid::new(0, 20));                          // [0, 4096)
//! b.remove_range(PidRange::parse("0-99").unwrap());
//! let free = b.finish();
//!
//! // Best fit: the tightest free block supplies the next ID.
//! let (id, _rest) = free.remove_free_prefix(32).unwrap();
//! assert_eq!(id, Pid::new(100, 32));
//! ```

#![warn(missing_docs)]

mod entry;
mod error;
mod key;
mod label;
mod pid;
mod range;
mod set;

pub use entry::Entry;
pub use error::PrefixError;
pub use key::Key;
pub use label::{label_string, labels, LabelMap, Selector};
pub use pid::Pid;
pub use range::PidRange;
pub use set::{PidSet, PidSetBuilder};
