//! Typed tree façade: a windowed, label-aware allocator over the radix
//! core.

use idpool_prefix::{Entry, Key, LabelMap, Pid, PidRange, PidSetBuilder, Selector};
use parking_lot::RwLock;

use crate::error::{Errors, TreeError};
use crate::radix::RadixTree;

/// A concurrent ID allocator backed by a radix tree of width `U`.
///
/// External keys are full-width; the allocation length `L` bounds the
/// window to `[0, 2^L)` and is the granularity [`claim_free`]
/// (Self::claim_free) searches at. Reads take a shared lock, mutations an
/// exclusive one.
///
/// # Example
///
/// ```
/// use idpool_prefix::{labels, Pid};
/// use idpool_tree::IdTree16;
///
/// let vlans = IdTree16::new(12).unwrap();           // window [0, 4096)
/// vlans.claim(Pid::new(100, 16), labels([("site", "lab")])).unwrap();
///
/// let e = vlans.claim_free(labels([("site", "lab")])).unwrap();
/// assert_ne!(e.id().value(), 100);
/// ```
pub struct IdTree<U: Key> {
    inner: RwLock<RadixTree<U, Entry<U>>>,
    length: u8,
    max: u64,
}

/// Width-16 tree (VLAN-sized key-spaces).
pub type IdTree16 = IdTree<u16>;
/// Width-32 tree (VNIs, AS numbers).
pub type IdTree32 = IdTree<u32>;
/// Width-64 tree.
pub type IdTree64 = IdTree<u64>;

fn entry_eq<U: Key>(a: &Entry<U>, b: &Entry<U>) -> bool {
    a == b
}

impl<U: Key> IdTree<U> {
    /// Creates a tree whose window is `[0, 2^length)`.
    ///
    /// Fails when `length` exceeds the key width.
    pub fn new(length: u8) -> Result<Self, TreeError> {
        if length > U::BITS_U8 {
            return Err(TreeError::LengthTooLarge {
                got: length,
                max: U::BITS_U8,
            });
        }
        let max = if length == 64 {
            u64::MAX
        } else {
            (1u64 << length) - 1
        };
        Ok(Self {
            inner: RwLock::new(RadixTree::new()),
            length,
            max,
        })
    }

    /// The allocation length `L` the window was created with.
    pub fn allocation_length(&self) -> u8 {
        self.length
    }

    fn validate(&self, id: &Pid<U>) -> Result<(), TreeError> {
        if id.value().to_u64() > self.max {
            return Err(TreeError::OutOfBounds {
                id: id.value().to_u64(),
                max: self.max,
            });
        }
        Ok(())
    }

    /// The entry exactly matching `id` in value and length.
    pub fn get(&self, id: &Pid<U>) -> Result<Entry<U>, TreeError> {
        let tree = self.inner.read();
        find(&tree, id).ok_or_else(|| TreeError::NotFound(id.to_string()))
    }

    /// Whether an entry exactly matching `id` exists.
    pub fn has(&self, id: &Pid<U>) -> bool {
        find(&self.inner.read(), id).is_some()
    }

    /// Claims `id` with `labels`; fails if it is already claimed or lies
    /// outside the window.
    pub fn claim(&self, id: Pid<U>, labels: LabelMap) -> Result<(), TreeError> {
        self.validate(&id)?;
        let mut tree = self.inner.write();
        if find(&tree, &id).is_some() {
            return Err(TreeError::Exists(id.to_string()));
        }
        tree.set(id, Entry::new(id, labels));
        Ok(())
    }

    /// Claims or overwrites `id` with `labels`.
    pub fn update(&self, id: Pid<U>, labels: LabelMap) -> Result<(), TreeError> {
        self.validate(&id)?;
        let mut tree = self.inner.write();
        tree.set(id, Entry::new(id, labels));
        Ok(())
    }

    /// Claims the next free full-width ID in the window.
    ///
    /// Builds the prefix-set of the window minus everything claimed
    /// inside it and pulls one full-width prefix out. Fails with
    /// [`TreeError::Exhausted`] when the window is full.
    pub fn claim_free(&self, labels: LabelMap) -> Result<Entry<U>, TreeError> {
        let mut tree = self.inner.write();
        let id = find_free(&tree, self.length).ok_or(TreeError::Exhausted)?;
        self.validate(&id)?;
        let entry = Entry::new(id, labels);
        tree.set(id, entry.clone());
        Ok(entry)
    }

    /// Claims every ID in the `"from-to"` range, stored as the range's
    /// minimal prefix decomposition.
    ///
    /// Individual window violations accumulate into a composite error
    /// while the remaining prefixes are still claimed; entries already
    /// inserted stay.
    pub fn claim_range(&self, range: &str, labels: &LabelMap) -> Result<(), TreeError> {
        let range = PidRange::<U>::parse(range).map_err(TreeError::Prefix)?;
        let mut errs = Vec::new();
        let mut tree = self.inner.write();
        for id in range.prefixes() {
            if let Err(e) = self.validate(&id) {
                errs.push(e);
                continue;
            }
            tree.set(id, Entry::new(id, labels.clone()));
        }
        if errs.is_empty() {
            Ok(())
        } else {
            Err(TreeError::Multiple(Errors(errs)))
        }
    }

    /// Releases the entry exactly matching `id`.
    pub fn release(&self, id: &Pid<U>) -> Result<(), TreeError> {
        self.validate(id)?;
        let mut tree = self.inner.write();
        let entry = find(&tree, id).ok_or_else(|| TreeError::NotFound(id.to_string()))?;
        tree.delete(*id, entry_eq, &entry);
        Ok(())
    }

    /// Releases every entry the selector matches.
    pub fn release_by_label<S: Selector + ?Sized>(&self, selector: &S) -> Result<(), TreeError> {
        let mut tree = self.inner.write();
        let doomed: Vec<Entry<U>> = entries(&tree)
            .into_iter()
            .filter(|e| selector.matches(e.labels()))
            .collect();
        for e in doomed {
            tree.delete(e.id(), entry_eq, &e);
        }
        Ok(())
    }

    /// Entries overlapping `id` with a strictly longer prefix.
    pub fn children(&self, id: &Pid<U>) -> Vec<Entry<U>> {
        let tree = self.inner.read();
        children_of(&tree, id)
    }

    /// Entries overlapping `id` with a strictly shorter prefix.
    pub fn parents(&self, id: &Pid<U>) -> Vec<Entry<U>> {
        let tree = self.inner.read();
        entries(&tree)
            .into_iter()
            .filter(|e| e.id().overlaps(id) && e.id().length() < id.length())
            .collect()
    }

    /// Entries whose labels the selector matches.
    pub fn get_by_label<S: Selector + ?Sized>(&self, selector: &S) -> Vec<Entry<U>> {
        let tree = self.inner.read();
        entries(&tree)
            .into_iter()
            .filter(|e| selector.matches(e.labels()))
            .collect()
    }

    /// Every entry, in depth-first key order.
    pub fn get_all(&self) -> Vec<Entry<U>> {
        entries(&self.inner.read())
    }

    /// A snapshot iterator over every entry.
    ///
    /// The snapshot is taken under the read lock; later mutations do not
    /// affect it.
    pub fn iter(&self) -> impl Iterator<Item = Entry<U>> {
        self.get_all().into_iter()
    }

    /// Number of claimed entries.
    pub fn len(&self) -> usize {
        self.inner.read().iter().count()
    }

    /// Whether nothing is claimed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<U: Key> Clone for IdTree<U> {
    /// Deep copy taken under the shared lock; the clone is independently
    /// lockable.
    fn clone(&self) -> Self {
        let inner = self.inner.read().clone();
        Self {
            inner: RwLock::new(inner),
            length: self.length,
            max: self.max,
        }
    }
}

/// Exact (value, length) lookup by linear scan.
fn find<U: Key>(tree: &RadixTree<U, Entry<U>>, id: &Pid<U>) -> Option<Entry<U>> {
    for node in tree.iter() {
        if let Some(e) = tree.first_val(node) {
            if e.id().value() == id.value() && e.id().length() == id.length() {
                return Some(e.clone());
            }
        }
    }
    None
}

/// All entries in depth-first order. The façade stores one entry per
/// node.
fn entries<U: Key>(tree: &RadixTree<U, Entry<U>>) -> Vec<Entry<U>> {
    tree.iter()
        .filter_map(|node| tree.first_val(node).cloned())
        .collect()
}

fn children_of<U: Key>(tree: &RadixTree<U, Entry<U>>, id: &Pid<U>) -> Vec<Entry<U>> {
    entries(tree)
        .into_iter()
        .filter(|e| e.id().overlaps(id) && e.id().length() > id.length())
        .collect()
}

/// The next free full-width ID inside the window `0/length`.
fn find_free<U: Key>(tree: &RadixTree<U, Entry<U>>, length: u8) -> Option<Pid<U>> {
    let window = Pid::new(U::ZERO, length);
    let mut builder = PidSetBuilder::new();
    builder.add_id(window);
    for e in children_of(tree, &window) {
        builder.remove_id(e.id());
    }
    let set = builder.finish();
    set.remove_free_prefix(U::BITS_U8).map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use idpool_prefix::labels;

    #[test]
    fn new_rejects_overlong_allocation_length() {
        assert!(matches!(
            IdTree16::new(17),
            Err(TreeError::LengthTooLarge { got: 17, max: 16 })
        ));
        assert!(IdTree16::new(16).is_ok());
        assert!(IdTree64::new(64).is_ok());
    }

    #[test]
    fn claim_get_roundtrip() {
        let t = IdTree32::new(30).unwrap();
        let l = labels([("owner", "a")]);
        t.claim(Pid::new(10, 32), l.clone()).unwrap();
        t.claim(Pid::new(11, 32), l.clone()).unwrap();

        let e = t.get(&Pid::new(10, 32)).unwrap();
        assert_eq!(e.id(), Pid::new(10, 32));
        assert_eq!(e.labels(), &l);
        assert_eq!(t.len(), 2);
        assert!(t.has(&Pid::new(11, 32)));
        assert!(!t.has(&Pid::new(12, 32)));
    }

    #[test]
    fn claim_outside_window_fails() {
        let t = IdTree32::new(30).unwrap();
        let err = t.claim(Pid::new(2_000_000_000, 32), labels([("a", "b")]));
        assert_eq!(
            err,
            Err(TreeError::OutOfBounds {
                id: 2_000_000_000,
                max: (1 << 30) - 1
            })
        );
        assert!(t.is_empty());
    }

    #[test]
    fn claim_collision_fails() {
        let t = IdTree16::new(12).unwrap();
        t.claim(Pid::new(100, 16), labels([("a", "1")])).unwrap();
        assert_eq!(
            t.claim(Pid::new(100, 16), labels([("a", "2")])),
            Err(TreeError::Exists("100/16".into()))
        );
        // the first claim's labels stay
        assert_eq!(
            t.get(&Pid::new(100, 16)).unwrap().labels(),
            &labels([("a", "1")])
        );
    }

    #[test]
    fn update_overwrites() {
        let t = IdTree16::new(12).unwrap();
        t.claim(Pid::new(100, 16), labels([("a", "1")])).unwrap();
        t.update(Pid::new(100, 16), labels([("a", "2")])).unwrap();
        assert_eq!(
            t.get(&Pid::new(100, 16)).unwrap().labels(),
            &labels([("a", "2")])
        );
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn get_missing_fails() {
        let t = IdTree16::new(12).unwrap();
        assert_eq!(
            t.get(&Pid::new(7, 16)),
            Err(TreeError::NotFound("7/16".into()))
        );
    }

    #[test]
    fn claim_free_returns_unclaimed_ids() {
        let t = IdTree16::new(8).unwrap();
        let mut seen = Vec::new();
        for _ in 0..10 {
            let e = t.claim_free(labels([("pool", "x")])).unwrap();
            assert_eq!(e.id().length(), 16);
            assert!(!seen.contains(&e.id().value()));
            seen.push(e.id().value());
        }
        assert_eq!(t.len(), 10);
    }

    #[test]
    fn claim_free_skips_claimed_ids() {
        let t = IdTree16::new(8).unwrap();
        for v in 0..=3u16 {
            t.claim(Pid::new(v, 16), labels([("static", "y")])).unwrap();
        }
        let e = t.claim_free(labels([("pool", "x")])).unwrap();
        assert_eq!(e.id().value(), 4);
    }

    #[test]
    fn claim_free_exhausts_the_window() {
        let t = IdTree16::new(8).unwrap();
        for _ in 0..256 {
            t.claim_free(labels([("pool", "x")])).unwrap();
        }
        assert_eq!(t.len(), 256);
        assert_eq!(
            t.claim_free(labels([("pool", "x")])),
            Err(TreeError::Exhausted)
        );
    }

    #[test]
    #[ignore = "walks a full 4096-entry window"]
    fn claim_free_exhausts_a_vlan_sized_window() {
        let t = IdTree16::new(12).unwrap();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..4096 {
            let e = t.claim_free(labels::<&str, &str>([])).unwrap();
            assert_eq!(e.id().length(), 16);
            assert!(seen.insert(e.id().value()));
        }
        assert_eq!(t.claim_free(labels::<&str, &str>([])), Err(TreeError::Exhausted));
    }

    #[test]
    fn claim_range_stores_the_decomposition() {
        let t = IdTree16::new(16).unwrap();
        let l = labels([("range", "lab")]);
        t.claim_range("1000-2000", &l).unwrap();

        // the decomposition entry covering the low end is claimed exactly
        let e = t.get(&Pid::new(1000, 13)).unwrap();
        assert_eq!(e.labels(), &l);

        // every covering prefix the decomposition created shows up as a
        // parent of a full-width ID inside it
        let parents = t.parents(&Pid::new(1000, 16));
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].id(), Pid::new(1000, 13));

        let parents = t.parents(&Pid::new(1500, 16));
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].id(), Pid::new(1024, 7));

        // the whole decomposition is present
        let all = t.get_all();
        let ids: Vec<Pid<u16>> = all.iter().map(|e| e.id()).collect();
        assert_eq!(
            ids,
            vec![
                Pid::new(1000, 13),
                Pid::new(1008, 12),
                Pid::new(1024, 7),
                Pid::new(1536, 8),
                Pid::new(1792, 9),
                Pid::new(1920, 10),
                Pid::new(1984, 12),
                Pid::new(2000, 16),
            ]
        );
    }

    #[test]
    fn claim_range_rejects_malformed_strings() {
        let t = IdTree16::new(16).unwrap();
        assert!(matches!(
            t.claim_range("10001000", &labels::<&str, &str>([])),
            Err(TreeError::Prefix(_))
        ));
        assert!(matches!(
            t.claim_range("2000-1000", &labels::<&str, &str>([])),
            Err(TreeError::Prefix(_))
        ));
        assert!(t.is_empty());
    }

    #[test]
    fn claim_range_accumulates_window_violations() {
        // window [0, 1024): the tail of the range lies outside
        let t = IdTree16::new(10).unwrap();
        let err = t.claim_range("1020-1030", &labels::<&str, &str>([])).unwrap_err();
        match err {
            TreeError::Multiple(Errors(errs)) => assert!(!errs.is_empty()),
            other => panic!("expected composite error, got {other}"),
        }
        // the in-window prefixes were still claimed
        assert!(t.has(&Pid::new(1020, 14)));
    }

    #[test]
    fn release_frees_the_id() {
        let t = IdTree16::new(12).unwrap();
        let id = Pid::new(100, 16);
        t.claim(id, labels([("a", "b")])).unwrap();
        t.release(&id).unwrap();
        assert!(!t.has(&id));
        assert_eq!(t.len(), 0);

        // and the id is claimable again
        t.claim(id, labels([("a", "c")])).unwrap();
    }

    #[test]
    fn release_missing_fails() {
        let t = IdTree16::new(12).unwrap();
        assert_eq!(
            t.release(&Pid::new(9, 16)),
            Err(TreeError::NotFound("9/16".into()))
        );
    }

    #[test]
    fn release_by_label_releases_matches_only() {
        let t = IdTree16::new(12).unwrap();
        t.claim(Pid::new(1, 16), labels([("tier", "edge")])).unwrap();
        t.claim(Pid::new(2, 16), labels([("tier", "core")])).unwrap();
        t.claim(Pid::new(3, 16), labels([("tier", "edge")])).unwrap();

        let edge = |l: &LabelMap| l.get("tier").map(String::as_str) == Some("edge");
        t.release_by_label(&edge).unwrap();

        assert_eq!(t.len(), 1);
        assert!(t.has(&Pid::new(2, 16)));
    }

    #[test]
    fn children_and_parents_are_strict() {
        let t = IdTree16::new(16).unwrap();
        let block = Pid::new(0x1200, 8);
        let host = Pid::new(0x1234, 16);
        t.claim(block, labels([("kind", "block")])).unwrap();
        t.claim(host, labels([("kind", "host")])).unwrap();

        let children = t.children(&block);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id(), host);

        let parents = t.parents(&host);
        assert_eq!(parents.len(), 1);
        assert_eq!(parents[0].id(), block);

        // an entry is neither its own child nor parent
        assert!(t.children(&host).is_empty());
        assert!(t.parents(&block).is_empty());
    }

    #[test]
    fn get_by_label_filters() {
        let t = IdTree32::new(20).unwrap();
        t.claim(Pid::new(1, 32), labels([("site", "a")])).unwrap();
        t.claim(Pid::new(2, 32), labels([("site", "b")])).unwrap();

        let site_a = |l: &LabelMap| l.get("site").map(String::as_str) == Some("a");
        let hits = t.get_by_label(&site_a);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), Pid::new(1, 32));
    }

    #[test]
    fn clone_is_independent() {
        let t = IdTree16::new(12).unwrap();
        t.claim(Pid::new(5, 16), labels([("a", "b")])).unwrap();
        let snapshot = t.clone();

        t.release(&Pid::new(5, 16)).unwrap();
        assert!(t.is_empty());
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.has(&Pid::new(5, 16)));
    }

    #[test]
    fn iter_is_a_snapshot() {
        let t = IdTree16::new(12).unwrap();
        t.claim(Pid::new(1, 16), labels::<&str, &str>([])).unwrap();
        let iter = t.iter();
        t.claim(Pid::new(2, 16), labels::<&str, &str>([])).unwrap();
        assert_eq!(iter.count(), 1);
    }
}
