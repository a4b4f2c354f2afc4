//! Prefix sets: sorted, disjoint, minimal range covers with subtraction.

use crate::key::Key;
use crate::pid::Pid;
use crate::range::{merge_ranges, PidRange};

/// Incremental builder for a [`PidSet`].
///
/// Additions and removals accumulate lazily; [`finish`](Self::finish)
/// normalizes them into the minimal sorted cover of "added minus removed".
///
/// # Example
///
/// ```
/// use idpool_prefix::{Pid, PidSetBuilder};
///
/// let mut b: PidSetBuilder<u16> = PidSetBuilder::new();
/// b.add_id(Pid::new(0, 4));       // the window [0, 4096)
/// b.remove_id(Pid::new(0, 16));   // id 0 is taken
/// let set = b.finish();
///
/// let (free, _rest) = set.remove_free_prefix(16).unwrap();
/// assert_eq!(free, Pid::new(1, 16));
/// ```
#[derive(Clone, Debug, Default)]
pub struct PidSetBuilder<U: Key> {
    incl: Vec<PidRange<U>>,
    excl: Vec<PidRange<U>>,
}

impl<U: Key> PidSetBuilder<U> {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            incl: Vec::new(),
            excl: Vec::new(),
        }
    }

    /// Adds every key covered by `pid`.
    pub fn add_id(&mut self, pid: Pid<U>) {
        self.add_range(PidRange::of_prefix(&pid));
    }

    /// Removes every key covered by `pid`.
    pub fn remove_id(&mut self, pid: Pid<U>) {
        self.remove_range(PidRange::of_prefix(&pid));
    }

    /// Adds every key in `r`.
    pub fn add_range(&mut self, r: PidRange<U>) {
        // Pending removals must apply to what came before, not to this
        // addition.
        if !self.excl.is_empty() {
            self.normalize();
        }
        self.incl.push(r);
    }

    /// Removes every key in `r`.
    pub fn remove_range(&mut self, r: PidRange<U>) {
        self.excl.push(r);
    }

    /// Adds every range of an existing set.
    pub fn add_set(&mut self, set: &PidSet<U>) {
        for r in set.ranges() {
            self.add_range(*r);
        }
    }

    /// Collapses `incl` minus `excl` into the canonical minimal form.
    fn normalize(&mut self) {
        let incl = merge_ranges(std::mem::take(&mut self.incl));
        let excl = merge_ranges(std::mem::take(&mut self.excl));

        // Both lists are sorted and internally disjoint; one parallel walk
        // subtracts excl from incl. `trimmed` stands in for the current
        // head of incl once a removal has eaten into it.
        let mut min: Vec<PidRange<U>> = Vec::with_capacity(incl.len());
        let mut i = 0;
        let mut j = 0;
        let mut trimmed: Option<PidRange<U>> = None;

        while i < incl.len() && j < excl.len() {
            let rin = trimmed.unwrap_or(incl[i]);
            let rout = excl[j];

            if rout.entirely_before(&rin) {
                //    out         in
                // f-------t   f-------t
                j += 1;
            } else if rin.entirely_before(&rout) {
                //    in         out
                // f------t   f-------t
                min.push(rin);
                i += 1;
                trimmed = None;
            } else if rin.covered_by(&rout) {
                //       out
                // f-------------t
                //    f------t
                //       in
                i += 1;
                trimmed = None;
            } else if rout.in_middle_of(&rin) {
                //       in
                // f-------------t
                //    f------t
                //       out
                min.push(PidRange::raw(rin.from(), rout.from().prev()));
                // The right-hand remainder stays current; later removals
                // may trim it further.
                trimmed = Some(rin.with_from(rout.to().next()));
                j += 1;
            } else if rout.overlaps_start_of(&rin) {
                //   out
                // f------t
                //    f------t
                //       in
                trimmed = Some(rin.with_from(rout.to().next()));
                j += 1;
            } else if rout.overlaps_end_of(&rin) {
                //           out
                //        f------t
                //    f------t
                //       in
                min.push(PidRange::raw(rin.from(), rout.from().prev()));
                i += 1;
                trimmed = None;
            } else {
                unreachable!("interval relations are pairwise exhaustive");
            }
        }

        if let Some(r) = trimmed {
            min.push(r);
            i += 1;
        }
        min.extend_from_slice(&incl[i.min(incl.len())..]);

        self.incl = min;
        self.excl.clear();
    }

    /// Normalizes and returns the resulting set.
    pub fn finish(mut self) -> PidSet<U> {
        self.normalize();
        PidSet { ranges: self.incl }
    }
}

/// A normalized set of keys: sorted, disjoint, non-adjacent ranges.
///
/// Produced by [`PidSetBuilder::finish`]; every method relies on the
/// normalized form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PidSet<U: Key> {
    ranges: Vec<PidRange<U>>,
}

impl<U: Key> PidSet<U> {
    /// The minimal sorted ranges covering the set.
    pub fn ranges(&self) -> &[PidRange<U>] {
        &self.ranges
    }

    /// Whether the set covers no keys.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The minimal sorted prefix cover of the set.
    pub fn prefixes(&self) -> Vec<Pid<U>> {
        let mut out = Vec::with_capacity(self.ranges.len());
        for r in &self.ranges {
            r.append_prefixes(&mut out);
        }
        out
    }

    /// Splits off a free prefix of exactly `bitlen` bits.
    ///
    /// Scans the set for the longest contained prefix no longer than
    /// `bitlen` (an exact-length hit ends the scan), re-lengthens it to
    /// `bitlen`, and returns it together with the set minus that prefix.
    /// Returns `None` when no aligned block of the requested size fits.
    pub fn remove_free_prefix(&self, bitlen: u8) -> Option<(Pid<U>, PidSet<U>)> {
        let mut best: Option<Pid<U>> = None;
        'ranges: for r in &self.ranges {
            for id in r.prefixes() {
                if id.length() > bitlen {
                    continue;
                }
                if best.map_or(true, |b| id.length() > b.length()) {
                    best = Some(id);
                    if id.length() == bitlen {
                        // exact fit, done
                        break 'ranges;
                    }
                }
            }
        }

        // The containing prefix is at most bitlen long, so its value is
        // already aligned for the narrower block.
        let free = Pid::new(best?.value(), bitlen);

        let mut b = PidSetBuilder::new();
        b.add_set(self);
        b.remove_id(free);
        Some((free, b.finish()))
    }
}
