//! VLAN table: the 0–4095 window with the protocol-reserved IDs held
//! back.

use idpool_prefix::{Entry, LabelMap, Pid, Selector};

use crate::error::TableError;
use crate::table::Table;

/// The untagged VLAN.
pub const VLAN_UNTAGGED: u16 = 0;
/// The default VLAN.
pub const VLAN_DEFAULT: u16 = 1;
/// The reserved top VLAN.
pub const VLAN_RESERVED: u16 = 4095;

const VLAN_COUNT: u64 = 4096;

fn reserved_word(id: u64) -> Option<&'static str> {
    match id {
        0 => Some("untagged"),
        1 => Some("default"),
        4095 => Some("reserved"),
        _ => None,
    }
}

fn validate_vlan(id: u64) -> Result<(), String> {
    match reserved_word(id) {
        Some(word) => Err(format!(
            "VLAN {id} is the {word} VLAN, cannot be added to the database"
        )),
        None => Ok(()),
    }
}

/// A dense-table VLAN store over the full 0–4095 range.
///
/// VLANs 0, 1 and 4095 are pre-claimed at construction and refused by
/// the claim validator with per-ID messages. Entries carry the claimed
/// ID as a full-width 32-bit prefix plus the caller's labels.
///
/// # Example
///
/// ```
/// use idpool_prefix::labels;
/// use idpool_table::VlanTable;
///
/// let vlans = VlanTable::new();
/// assert!(vlans.claim(0, labels::<&str, &str>([])).is_err());   // untagged
/// vlans.claim(10, labels([("site", "lab")])).unwrap();
/// assert_eq!(vlans.find_free().unwrap(), 2);
/// ```
pub struct VlanTable {
    table: Table<Entry<u32>>,
}

fn vlan_entry(id: u64, labels: LabelMap) -> Entry<u32> {
    Entry::new(Pid::new(id as u32, 32), labels)
}

impl VlanTable {
    /// Creates the table with the three reserved VLANs pre-claimed.
    pub fn new() -> Self {
        let reserved = [VLAN_UNTAGGED, VLAN_DEFAULT, VLAN_RESERVED].map(|id| {
            let id = u64::from(id);
            let word = reserved_word(id).expect("reserved id");
            (
                id,
                vlan_entry(id, idpool_prefix::labels([("vlan.reserved", word)])),
            )
        });
        let table = Table::builder(VLAN_COUNT)
            .entries(reserved)
            .validator(validate_vlan)
            .build()
            .expect("reserved VLAN ids fit the table");
        Self { table }
    }

    /// Number of claimed VLANs, reservations included.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether no VLAN is claimed. Never true: the reservations are
    /// always present.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The entry claimed for `id`.
    pub fn get(&self, id: u16) -> Result<Entry<u32>, TableError> {
        self.table.get(u64::from(id))
    }

    /// Whether `id` is claimed.
    pub fn has(&self, id: u16) -> bool {
        self.table.has(u64::from(id))
    }

    /// Whether `id` is claimable.
    pub fn is_free(&self, id: u16) -> bool {
        self.table.is_free(u64::from(id))
    }

    /// Claims `id` with `labels`. Reserved VLANs are refused with their
    /// dedicated message.
    pub fn claim(&self, id: u16, labels: LabelMap) -> Result<(), TableError> {
        self.table
            .claim(u64::from(id), vlan_entry(u64::from(id), labels))
    }

    /// Claims the lowest free VLAN and returns its entry.
    pub fn claim_free(&self, labels: LabelMap) -> Result<Entry<u32>, TableError> {
        let id = self
            .table
            .claim_dynamic_with(|id| vlan_entry(id, labels))?;
        self.table.get(id)
    }

    /// Releases `id`.
    pub fn release(&self, id: u16) -> Result<(), TableError> {
        self.table.release(u64::from(id))
    }

    /// Replaces the labels of a claimed VLAN.
    pub fn update(&self, id: u16, labels: LabelMap) -> Result<(), TableError> {
        self.table
            .update(u64::from(id), vlan_entry(u64::from(id), labels))
    }

    /// The lowest claimable VLAN ID.
    pub fn find_free(&self) -> Result<u16, TableError> {
        self.table.find_free().map(|id| id as u16)
    }

    /// Every claimed entry in ascending VLAN order.
    pub fn get_all(&self) -> Vec<Entry<u32>> {
        self.table.get_all().into_iter().map(|(_, e)| e).collect()
    }

    /// Claimed entries whose labels the selector matches.
    pub fn get_by_label<S: Selector + ?Sized>(&self, selector: &S) -> Vec<Entry<u32>> {
        self.get_all()
            .into_iter()
            .filter(|e| selector.matches(e.labels()))
            .collect()
    }
}

impl Default for VlanTable {
    fn default() -> Self {
        Self::new()
    }
}
