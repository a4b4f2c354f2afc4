//! # idpool-table
//!
//! Dense indexed ID tables: a fixed-size slot table ([`Table`]) with
//! claim/release/free-scan operations, an external-window façade
//! ([`OffsetTable`]) translating ID ranges like VXLAN VNIs onto it, and a
//! [`VlanTable`] with the protocol-reserved IDs held back.
//!
//! The table shares its claim/release contract with the radix tree crate:
//! explicit claims collide on occupied slots, dynamic claims take the
//! lowest free index, range claims need a strictly consecutive free run,
//! and every failure is a typed error with a human-readable message.
//!
//! # Example
//!
//! ```
//! use idpool_table::{OffsetTable, TableError};
//!
//! // A VNI pool [5000, 5999].
//! let vnis: OffsetTable<&str> = OffsetTable::new(5000, 5999);
//! vnis.claim(5000, "fabric").unwrap();
//!
//! assert_eq!(vnis.claim_free("tenant-a").unwrap(), 5001);
//! assert_eq!(
//!     vnis.claim(5000, "dup"),
//!     Err(TableError::Exists(5000)),
//! );
//! ```

#![warn(missing_docs)]

mod error;
mod iter;
mod offset;
mod table;
mod vlan;

pub use error::{Errors, TableError};
pub use iter::{FreeIter, TableIter};
pub use offset::{OffsetTable, OffsetTableBuilder};
pub use table::{Table, TableBuilder, ValidateFn};
pub use vlan::{VlanTable, VLAN_DEFAULT, VLAN_RESERVED, VLAN_UNTAGGED};
