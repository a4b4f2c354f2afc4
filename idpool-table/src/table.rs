//! Dense indexed table: a fixed-size logical slot array with claim,
//! release and free-slot queries.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::error::{Errors, TableError};
use crate::iter::{FreeIter, TableIter};

/// Per-ID validator invoked on claims (never on constructor bulk-load).
///
/// Returning `Err(message)` rejects the claim with that message, letting
/// façades reserve domain-specific IDs.
pub type ValidateFn = Box<dyn Fn(u64) -> Result<(), String> + Send + Sync>;

/// A fixed-size sparse slot table over `[0, size)`.
///
/// Claims, releases and lookups are O(log n); free-slot scans walk the
/// complement of the key-set in ascending order. A reader-writer lock
/// serializes access; iterators snapshot under the read lock.
///
/// # Example
///
/// ```
/// use idpool_table::Table;
///
/// let t: Table<&str> = Table::new(1000);
/// t.claim(10, "a").unwrap();
/// assert_eq!(t.find_free().unwrap(), 0);
/// assert_eq!(t.claim_dynamic("b").unwrap(), 0);
/// assert_eq!(t.len(), 2);
/// ```
pub struct Table<T> {
    entries: RwLock<BTreeMap<u64, T>>,
    size: u64,
    validate: Option<ValidateFn>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for Table<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("entries", &self.entries)
            .field("size", &self.size)
            .field("validate", &self.validate.as_ref().map(|_| "Fn"))
            .finish()
    }
}

/// Configures a [`Table`] with initial entries and a validator.
///
/// ```
/// use idpool_table::Table;
///
/// let t: Table<&str> = Table::builder(4096)
///     .entries([(0, "reserved")])
///     .validator(|id| if id == 0 { Err("id 0 is reserved".into()) } else { Ok(()) })
///     .build()
///     .unwrap();
///
/// assert!(t.has(0));               // loaded past the validator
/// assert!(t.claim(0, "x").is_err());
/// ```
pub struct TableBuilder<T> {
    size: u64,
    entries: Vec<(u64, T)>,
    validate: Option<ValidateFn>,
}

impl<T> TableBuilder<T> {
    /// Adds initial entries, loaded without consulting the validator.
    pub fn entries(mut self, entries: impl IntoIterator<Item = (u64, T)>) -> Self {
        self.entries.extend(entries);
        self
    }

    /// Sets the per-ID claim validator.
    pub fn validator(
        mut self,
        f: impl Fn(u64) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.validate = Some(Box::new(f));
        self
    }

    /// Builds the table, bulk-loading the initial entries.
    ///
    /// Load failures (out-of-bounds or duplicate indices) accumulate into
    /// one composite error rather than stopping at the first.
    pub fn build(self) -> Result<Table<T>, TableError> {
        assert!(self.size > 0, "table size must be > 0");
        let max = self.size - 1;
        let mut map = BTreeMap::new();
        let mut errs = Vec::new();
        for (id, value) in self.entries {
            if id > max {
                errs.push(TableError::OutOfBounds { id, max });
                continue;
            }
            if map.contains_key(&id) {
                errs.push(TableError::Exists(id));
                continue;
            }
            map.insert(id, value);
        }
        if !errs.is_empty() {
            return Err(TableError::Multiple(Errors(errs)));
        }
        Ok(Table {
            entries: RwLock::new(map),
            size: self.size,
            validate: self.validate,
        })
    }
}

impl<T> Table<T> {
    /// Creates an empty table with `size` logical slots.
    ///
    /// # Panics
    ///
    /// Panics if `size` is 0.
    pub fn new(size: u64) -> Self {
        Table::builder(size).build().expect("no entries to load")
    }

    /// Starts building a table with initial entries or a validator.
    pub fn builder(size: u64) -> TableBuilder<T> {
        TableBuilder {
            size,
            entries: Vec::new(),
            validate: None,
        }
    }

    /// The logical slot count.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn check_bounds(&self, id: u64) -> Result<(), TableError> {
        if id > self.size - 1 {
            return Err(TableError::OutOfBounds {
                id,
                max: self.size - 1,
            });
        }
        Ok(())
    }

    fn check_claim(&self, id: u64) -> Result<(), TableError> {
        self.check_bounds(id)?;
        if let Some(validate) = &self.validate {
            validate(id).map_err(TableError::Rejected)?;
        }
        Ok(())
    }

    /// Whether `id` is claimed.
    pub fn has(&self, id: u64) -> bool {
        self.entries.read().contains_key(&id)
    }

    /// Whether `id` is unclaimed.
    pub fn is_free(&self, id: u64) -> bool {
        !self.has(id)
    }

    /// Releases `id`; an empty slot is an error.
    pub fn release(&self, id: u64) -> Result<(), TableError> {
        self.check_bounds(id)?;
        self.entries
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or(TableError::NotFound(id))
    }

    /// Overwrites the value at an occupied slot.
    pub fn update(&self, id: u64, value: T) -> Result<(), TableError> {
        self.check_bounds(id)?;
        match self.entries.write().get_mut(&id) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(TableError::NotFound(id)),
        }
    }

    /// Claims `id`; fails on occupied slots, out-of-bounds indices and
    /// validator rejections.
    pub fn claim(&self, id: u64, value: T) -> Result<(), TableError> {
        self.check_claim(id)?;
        let mut entries = self.entries.write();
        if entries.contains_key(&id) {
            return Err(TableError::Exists(id));
        }
        entries.insert(id, value);
        Ok(())
    }

    /// Claims the lowest free slot and returns its index.
    pub fn claim_dynamic(&self, value: T) -> Result<u64, TableError> {
        self.claim_dynamic_with(|_| value)
    }

    /// Claims the lowest free slot, storing a value built from its index.
    ///
    /// Lets callers embed the allocated index in the stored value without
    /// a find-then-claim race.
    pub fn claim_dynamic_with(&self, make: impl FnOnce(u64) -> T) -> Result<u64, TableError> {
        let mut entries = self.entries.write();
        let id = first_free(&entries, self.size).ok_or(TableError::NoFreeEntry)?;
        if let Some(validate) = &self.validate {
            validate(id).map_err(TableError::Rejected)?;
        }
        entries.insert(id, make(id));
        Ok(id)
    }

    /// The lowest free slot index.
    pub fn find_free(&self) -> Result<u64, TableError> {
        first_free(&self.entries.read(), self.size).ok_or(TableError::NoFreeEntry)
    }

    /// The strictly consecutive free run `[start, start + size)`.
    ///
    /// The first free index at or above `start` must be `start` itself
    /// and every following free index must be exactly one higher, through
    /// `start + size - 1`. A break yields the violating free index.
    pub fn find_free_range(&self, start: u64, size: u64) -> Result<Vec<u64>, TableError> {
        self.free_range_in(&self.entries.read(), start, size)
    }

    fn free_range_in(
        &self,
        entries: &BTreeMap<u64, T>,
        start: u64,
        size: u64,
    ) -> Result<Vec<u64>, TableError> {
        if size == 0 {
            return Err(TableError::NoFreeRange { start, size });
        }
        let max = self.size - 1;
        let end = start + size - 1;
        if start > max {
            return Err(TableError::OutOfBounds { id: start, max });
        }
        if end > max {
            return Err(TableError::OutOfBounds { id: end, max });
        }

        let mut out = Vec::with_capacity(size as usize);
        let mut expected = start;
        for id in (start..self.size).filter(|i| !entries.contains_key(i)) {
            if id > end {
                break;
            }
            if id != expected {
                return Err(TableError::InUse { id, start, end });
            }
            out.push(id);
            if id == end {
                return Ok(out);
            }
            expected += 1;
        }
        Err(TableError::NoFreeRange { start, size })
    }

    /// The first `size` free slots, regardless of contiguity.
    pub fn find_free_size(&self, size: u64) -> Result<Vec<u64>, TableError> {
        self.free_size_in(&self.entries.read(), size)
    }

    fn free_size_in(&self, entries: &BTreeMap<u64, T>, size: u64) -> Result<Vec<u64>, TableError> {
        if size > self.size {
            return Err(TableError::OutOfBounds {
                id: size,
                max: self.size,
            });
        }
        if size == 0 {
            return Ok(Vec::new());
        }
        let mut out = Vec::with_capacity(size as usize);
        for id in (0..self.size).filter(|i| !entries.contains_key(i)) {
            out.push(id);
            if out.len() == size as usize {
                return Ok(out);
            }
        }
        Err(TableError::NoFreeSize(size))
    }
}

impl<T: Clone> Table<T> {
    /// The value at an occupied slot.
    pub fn get(&self, id: u64) -> Result<T, TableError> {
        self.check_bounds(id)?;
        self.entries
            .read()
            .get(&id)
            .cloned()
            .ok_or(TableError::NotFound(id))
    }

    /// Claims the strictly consecutive free run `[start, start + size)`,
    /// storing a clone of `value` in each slot.
    ///
    /// Validator rejections mid-run accumulate into one composite error;
    /// slots already claimed in this call stay claimed.
    pub fn claim_range(&self, start: u64, size: u64, value: T) -> Result<(), TableError> {
        let mut entries = self.entries.write();
        let ids = self.free_range_in(&entries, start, size)?;
        self.claim_all(&mut entries, ids, value)
    }

    /// Claims the first `size` free slots, contiguous or not.
    pub fn claim_size(&self, size: u64, value: T) -> Result<(), TableError> {
        let mut entries = self.entries.write();
        let ids = self.free_size_in(&entries, size)?;
        self.claim_all(&mut entries, ids, value)
    }

    fn claim_all(
        &self,
        entries: &mut BTreeMap<u64, T>,
        ids: Vec<u64>,
        value: T,
    ) -> Result<(), TableError> {
        let mut errs = Vec::new();
        for id in ids {
            if let Some(validate) = &self.validate {
                if let Err(msg) = validate(id) {
                    errs.push(TableError::Rejected(msg));
                    continue;
                }
            }
            entries.insert(id, value.clone());
        }
        if errs.is_empty() {
            Ok(())
        } else {
            Err(TableError::Multiple(Errors(errs)))
        }
    }

    /// Every occupied slot in ascending order.
    pub fn get_all(&self) -> Vec<(u64, T)> {
        self.entries
            .read()
            .iter()
            .map(|(&k, v)| (k, v.clone()))
            .collect()
    }

    /// Snapshot iterator over occupied slots, ascending.
    pub fn iter(&self) -> TableIter<T> {
        TableIter::new(self.get_all())
    }

    /// Snapshot iterator over free slots, ascending.
    ///
    /// Walks the whole logical range; cost is proportional to `size`.
    pub fn iter_free(&self) -> FreeIter {
        let entries = self.entries.read();
        FreeIter::new((0..self.size).filter(|i| !entries.contains_key(i)).collect())
    }
}

/// Lowest index in `[0, size)` absent from the sorted key-set.
fn first_free<T>(entries: &BTreeMap<u64, T>, size: u64) -> Option<u64> {
    let mut expected = 0u64;
    for &k in entries.keys() {
        if k > expected {
            break;
        }
        expected = k + 1;
    }
    (expected < size).then_some(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Table<&'static str> {
        Table::builder(1000)
            .entries([(0, "a"), (1, "b"), (999, "c")])
            .build()
            .unwrap()
    }

    #[test]
    fn new_without_entries() {
        let t: Table<&str> = Table::new(1000);
        assert_eq!(t.len(), 0);
        assert_eq!(t.size(), 1000);
        assert!(t.is_empty());
    }

    #[test]
    fn new_with_entries() {
        let t = seeded();
        assert_eq!(t.len(), 3);
        assert!(t.has(0));
        assert!(t.has(999));
    }

    #[test]
    fn build_rejects_out_of_bounds_entries() {
        let err = Table::builder(100)
            .entries([(0, "a"), (1, "b"), (999, "c")])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            TableError::Multiple(Errors(vec![TableError::OutOfBounds { id: 999, max: 99 }]))
        );
    }

    #[test]
    fn build_reports_every_failure() {
        let err = Table::builder(10)
            .entries([(3, "a"), (3, "b"), (40, "c"), (50, "d")])
            .build()
            .unwrap_err();
        match err {
            TableError::Multiple(Errors(errs)) => assert_eq!(errs.len(), 3),
            other => panic!("expected composite error, got {other}"),
        }
    }

    #[test]
    fn build_bypasses_the_validator() {
        let t = Table::builder(10)
            .entries([(0, "reserved")])
            .validator(|_| Err("always rejected".into()))
            .build()
            .unwrap();
        assert!(t.has(0));
    }

    #[test]
    fn claim_success_and_collision() {
        let t = seeded();
        t.claim(10, "x").unwrap();
        t.claim(11, "y").unwrap();
        assert_eq!(t.len(), 5);

        assert_eq!(t.claim(10, "z"), Err(TableError::Exists(10)));
        assert_eq!(
            t.claim(1000, "z"),
            Err(TableError::OutOfBounds { id: 1000, max: 999 })
        );
        assert!(!t.has(1000));
    }

    #[test]
    fn claim_consults_the_validator() {
        let t: Table<&str> = Table::builder(10)
            .validator(|id| {
                if id == 5 {
                    Err("id 5 is reserved".into())
                } else {
                    Ok(())
                }
            })
            .build()
            .unwrap();
        assert_eq!(
            t.claim(5, "x"),
            Err(TableError::Rejected("id 5 is reserved".into()))
        );
        t.claim(6, "x").unwrap();
    }

    #[test]
    fn get_found_and_missing() {
        let t = seeded();
        assert_eq!(t.get(0), Ok("a"));
        assert_eq!(t.get(2), Err(TableError::NotFound(2)));
        assert_eq!(
            t.get(5000),
            Err(TableError::OutOfBounds { id: 5000, max: 999 })
        );
    }

    #[test]
    fn release_and_reclaim() {
        let t = seeded();
        t.claim(10, "x").unwrap();
        t.release(0).unwrap();
        t.release(10).unwrap();
        assert_eq!(t.len(), 2);
        assert!(t.is_free(0));

        // released slots are claimable again
        t.claim(0, "again").unwrap();
        assert_eq!(t.get(0), Ok("again"));
    }

    #[test]
    fn release_missing_fails() {
        let t = seeded();
        assert_eq!(t.release(20), Err(TableError::NotFound(20)));
        assert_eq!(
            t.release(5000),
            Err(TableError::OutOfBounds { id: 5000, max: 999 })
        );
    }

    #[test]
    fn update_requires_presence() {
        let t = seeded();
        t.update(0, "a2").unwrap();
        assert_eq!(t.get(0), Ok("a2"));
        assert_eq!(t.update(2, "x"), Err(TableError::NotFound(2)));
    }

    #[test]
    fn claim_dynamic_takes_lowest_free() {
        let t = seeded();
        assert_eq!(t.claim_dynamic("x"), Ok(2));
        assert_eq!(t.claim_dynamic("y"), Ok(3));
        assert!(t.has(2));
        assert!(t.has(3));
    }

    #[test]
    fn claim_dynamic_exhaustion() {
        let t: Table<&str> = Table::new(2);
        t.claim_dynamic("a").unwrap();
        t.claim_dynamic("b").unwrap();
        assert_eq!(t.claim_dynamic("c"), Err(TableError::NoFreeEntry));
    }

    #[test]
    fn find_free_skips_leading_run() {
        let t = seeded();
        assert_eq!(t.find_free(), Ok(2));

        let empty: Table<&str> = Table::new(10);
        assert_eq!(empty.find_free(), Ok(0));

        let full: Table<&str> = Table::new(1);
        full.claim(0, "x").unwrap();
        assert_eq!(full.find_free(), Err(TableError::NoFreeEntry));
    }

    #[test]
    fn claim_range_normal() {
        let t: Table<&str> = Table::new(10);
        t.claim_range(5, 5, "a").unwrap();
        assert_eq!(t.len(), 5);
        for id in 5..10 {
            assert!(t.has(id));
        }
    }

    #[test]
    fn claim_range_beyond_the_end() {
        let t: Table<&str> = Table::new(10);
        assert_eq!(
            t.claim_range(5, 6, "a"),
            Err(TableError::OutOfBounds { id: 10, max: 9 })
        );
        assert_eq!(t.len(), 0);
    }

    #[test]
    fn claim_range_broken_by_occupied_slot() {
        let t = seeded();
        // 0 and 1 are occupied: the first free index >= 0 is 2, not 0
        assert_eq!(
            t.claim_range(0, 5, "a"),
            Err(TableError::InUse { id: 2, start: 0, end: 4 })
        );
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn claim_range_requires_start_free() {
        let t: Table<&str> = Table::new(10);
        t.claim(3, "x").unwrap();
        assert_eq!(
            t.claim_range(3, 2, "a"),
            Err(TableError::InUse { id: 4, start: 3, end: 4 })
        );
    }

    #[test]
    fn claim_range_exhausted_tail() {
        let t: Table<&str> = Table::new(10);
        for id in 5..10 {
            t.claim(id, "x").unwrap();
        }
        assert_eq!(
            t.claim_range(5, 3, "a"),
            Err(TableError::NoFreeRange { start: 5, size: 3 })
        );
    }

    #[test]
    fn claim_size_fills_gaps() {
        let t = seeded();
        t.claim_size(4, "s").unwrap();
        // first four free: 2, 3, 4, 5
        for id in 2..6 {
            assert_eq!(t.get(id), Ok("s"));
        }
        assert_eq!(t.len(), 7);
    }

    #[test]
    fn claim_size_whole_table() {
        let t: Table<&str> = Table::new(1000);
        t.claim_size(1000, "a").unwrap();
        assert_eq!(t.len(), 1000);
    }

    #[test]
    fn claim_size_too_large() {
        let t: Table<&str> = Table::new(10);
        assert_eq!(
            t.claim_size(11, "a"),
            Err(TableError::OutOfBounds { id: 11, max: 10 })
        );
        let t2: Table<&str> = Table::new(10);
        t2.claim(0, "x").unwrap();
        assert_eq!(t2.claim_size(10, "a"), Err(TableError::NoFreeSize(10)));
    }

    #[test]
    fn iterate_yields_ascending_keys() {
        let t = seeded();
        let keys: Vec<u64> = t.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![0, 1, 999]);

        let empty: Table<&str> = Table::new(10);
        assert_eq!(empty.iter().count(), 0);
    }

    #[test]
    fn iter_free_is_the_complement() {
        let t: Table<&str> = Table::new(6);
        t.claim(1, "a").unwrap();
        t.claim(4, "b").unwrap();
        let free: Vec<u64> = t.iter_free().collect();
        assert_eq!(free, vec![0, 2, 3, 5]);
    }

    #[test]
    fn iterators_are_snapshots() {
        let t: Table<&str> = Table::new(10);
        t.claim(0, "a").unwrap();
        let iter = t.iter();
        t.claim(1, "b").unwrap();
        assert_eq!(iter.count(), 1);
    }

    #[test]
    fn get_all_is_sorted() {
        let t = seeded();
        assert_eq!(t.get_all(), vec![(0, "a"), (1, "b"), (999, "c")]);
    }
}
