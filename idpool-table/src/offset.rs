//! Range-offset façade: an external ID window over a zero-based table.

use crate::error::TableError;
use crate::iter::TableIter;
use crate::table::{Table, TableBuilder};

/// A dense table exposed through an external ID window `[start, end]`.
///
/// External IDs translate to `external - start` before delegation and
/// back on the way out, so VXLAN VNIs, AS numbers or any other offset
/// range map onto a zero-based slot table.
///
/// # Example
///
/// ```
/// use idpool_table::OffsetTable;
///
/// // VNI window [100, 199]
/// let t: OffsetTable<&str> = OffsetTable::new(100, 199);
/// t.claim(100, "a").unwrap();
/// assert_eq!(t.find_free().unwrap(), 101);
/// assert!(t.claim(500, "b").is_err());
/// ```
pub struct OffsetTable<T> {
    table: Table<T>,
    start: u64,
    end: u64,
}

/// Configures an [`OffsetTable`] with initial entries and a validator,
/// both in external ID terms.
pub struct OffsetTableBuilder<T> {
    inner: TableBuilder<T>,
    start: u64,
    end: u64,
}

impl<T> OffsetTableBuilder<T> {
    /// Adds initial entries keyed by external ID, loaded without
    /// consulting the validator.
    pub fn entries(mut self, entries: impl IntoIterator<Item = (u64, T)>) -> Self {
        let start = self.start;
        self.inner = self
            .inner
            .entries(entries.into_iter().map(move |(id, v)| (id.wrapping_sub(start), v)));
        self
    }

    /// Sets the per-ID claim validator, called with external IDs.
    pub fn validator(
        mut self,
        f: impl Fn(u64) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        let start = self.start;
        self.inner = self.inner.validator(move |idx| f(idx + start));
        self
    }

    /// Builds the façade, bulk-loading the initial entries.
    pub fn build(self) -> Result<OffsetTable<T>, TableError> {
        let start = self.start;
        let table = self.inner.build().map_err(|e| externalize(e, start))?;
        Ok(OffsetTable {
            table,
            start: self.start,
            end: self.end,
        })
    }
}

/// Maps slot indices inside errors back to external IDs.
fn externalize(err: TableError, start: u64) -> TableError {
    match err {
        TableError::OutOfBounds { id, max } => TableError::OutOfBounds {
            id: id.wrapping_add(start),
            max: max + start,
        },
        TableError::Exists(id) => TableError::Exists(id + start),
        TableError::NotFound(id) => TableError::NotFound(id + start),
        TableError::InUse { id, start: s, end } => TableError::InUse {
            id: id + start,
            start: s + start,
            end: end + start,
        },
        TableError::Multiple(errs) => TableError::Multiple(crate::error::Errors(
            errs.0.into_iter().map(|e| externalize(e, start)).collect(),
        )),
        other => other,
    }
}

impl<T> OffsetTable<T> {
    /// Creates an empty window `[start, end]`, both bounds claimed IDs.
    ///
    /// # Panics
    ///
    /// Panics if `end < start`.
    pub fn new(start: u64, end: u64) -> Self {
        Self::builder(start, end)
            .build()
            .expect("no entries to load")
    }

    /// Starts building a window with initial entries or a validator.
    ///
    /// # Panics
    ///
    /// Panics if `end < start`.
    pub fn builder(start: u64, end: u64) -> OffsetTableBuilder<T> {
        assert!(end >= start, "window end must not precede start");
        OffsetTableBuilder {
            inner: Table::builder(end - start + 1),
            start,
            end,
        }
    }

    /// The window's first external ID.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// The window's last external ID.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of claimed IDs.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether nothing is claimed.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn index(&self, id: u64) -> Result<u64, TableError> {
        if id < self.start || id > self.end {
            return Err(TableError::OutOfWindow {
                id,
                start: self.start,
                end: self.end,
            });
        }
        Ok(id - self.start)
    }

    /// Whether `id` is claimed. Out-of-window IDs are neither claimed
    /// nor free.
    pub fn has(&self, id: u64) -> bool {
        self.index(id).map(|idx| self.table.has(idx)).unwrap_or(false)
    }

    /// Whether `id` is claimable. Out-of-window IDs are neither claimed
    /// nor free.
    pub fn is_free(&self, id: u64) -> bool {
        self.index(id).map(|idx| self.table.is_free(idx)).unwrap_or(false)
    }

    /// Releases `id`.
    pub fn release(&self, id: u64) -> Result<(), TableError> {
        let idx = self.index(id)?;
        self.table
            .release(idx)
            .map_err(|e| externalize(e, self.start))
    }

    /// Overwrites the value at a claimed ID.
    pub fn update(&self, id: u64, value: T) -> Result<(), TableError> {
        let idx = self.index(id)?;
        self.table
            .update(idx, value)
            .map_err(|e| externalize(e, self.start))
    }

    /// Claims `id` with `value`.
    pub fn claim(&self, id: u64, value: T) -> Result<(), TableError> {
        let idx = self.index(id)?;
        self.table
            .claim(idx, value)
            .map_err(|e| externalize(e, self.start))
    }

    /// Claims the lowest free ID in the window and returns it.
    pub fn claim_free(&self, value: T) -> Result<u64, TableError> {
        let start = self.start;
        self.table
            .claim_dynamic_with(|_| value)
            .map(|idx| idx + start)
            .map_err(|e| externalize(e, start))
    }

    /// Claims the lowest free ID, storing a value built from it.
    pub fn claim_free_with(&self, make: impl FnOnce(u64) -> T) -> Result<u64, TableError> {
        let start = self.start;
        self.table
            .claim_dynamic_with(|idx| make(idx + start))
            .map(|idx| idx + start)
            .map_err(|e| externalize(e, start))
    }

    /// The lowest free external ID.
    pub fn find_free(&self) -> Result<u64, TableError> {
        self.table
            .find_free()
            .map(|idx| idx + self.start)
            .map_err(|e| externalize(e, self.start))
    }
}

impl<T: Clone> OffsetTable<T> {
    /// The value at a claimed ID.
    pub fn get(&self, id: u64) -> Result<T, TableError> {
        let idx = self.index(id)?;
        self.table.get(idx).map_err(|e| externalize(e, self.start))
    }

    /// Every claimed ID and value, ascending by external ID.
    pub fn get_all(&self) -> Vec<(u64, T)> {
        self.table
            .get_all()
            .into_iter()
            .map(|(idx, v)| (idx + self.start, v))
            .collect()
    }

    /// Snapshot iterator over claimed IDs, ascending, in external terms.
    pub fn iter(&self) -> TableIter<T> {
        TableIter::new(self.get_all())
    }
}
