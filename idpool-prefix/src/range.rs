//! Closed ranges of key values and their minimal prefix covers.

use core::fmt;

use crate::error::PrefixError;
use crate::key::Key;
use crate::pid::Pid;

/// An inclusive range `[from, to]` of IDs at equal prefix length.
///
/// Valid by construction: both bounds share a length and `from <= to`.
/// In set algebra both bounds are full-width keys.
///
/// # Example
///
/// ```
/// use idpool_prefix::{Pid, PidRange};
///
/// let r: PidRange<u32> = PidRange::parse("1024-2047").unwrap();
/// assert_eq!(r.prefixes(), vec![Pid::new(1024, 22)]);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PidRange<U: Key> {
    from: Pid<U>,
    to: Pid<U>,
}

impl<U: Key> PidRange<U> {
    /// Creates a range from two bounds of equal length.
    ///
    /// Fails when the lengths differ or the bounds are reversed.
    pub fn new(from: Pid<U>, to: Pid<U>) -> Result<Self, PrefixError> {
        if from.length() != to.length() || to.value() < from.value() {
            return Err(PrefixError::InvalidRange {
                from: from.value().to_u64(),
                to: to.value().to_u64(),
            });
        }
        Ok(Self { from, to })
    }

    /// Creates a full-width range from two key values.
    pub fn from_values(a: U, b: U) -> Result<Self, PrefixError> {
        Self::new(Pid::new(a, U::BITS_U8), Pid::new(b, U::BITS_U8))
    }

    /// The full-width range of keys a prefix covers.
    pub fn of_prefix(pid: &Pid<U>) -> Self {
        let masked = pid.masked();
        Self {
            from: masked.first(),
            to: masked.last(),
        }
    }

    /// Parses the `<from>-<to>` form, decimal bounds in the key width.
    pub fn parse(s: &str) -> Result<Self, PrefixError> {
        let (from, to) = s
            .split_once('-')
            .ok_or_else(|| PrefixError::NoHyphen(s.to_string()))?;
        let from_err = || PrefixError::InvalidFrom {
            id: from.to_string(),
            range: s.to_string(),
        };
        let to_err = || PrefixError::InvalidTo {
            id: to.to_string(),
            range: s.to_string(),
        };
        let a = from
            .parse::<u64>()
            .ok()
            .and_then(U::from_u64)
            .ok_or_else(from_err)?;
        let b = to
            .parse::<u64>()
            .ok()
            .and_then(U::from_u64)
            .ok_or_else(to_err)?;
        Self::from_values(a, b)
    }

    /// The lower bound.
    #[inline]
    pub fn from(&self) -> Pid<U> {
        self.from
    }

    /// The upper bound.
    #[inline]
    pub fn to(&self) -> Pid<U> {
        self.to
    }

    #[inline]
    pub(crate) fn with_from(self, from: Pid<U>) -> Self {
        Self { from, ..self }
    }

    pub(crate) fn raw(from: Pid<U>, to: Pid<U>) -> Self {
        Self { from, to }
    }

    // Interval relations used by the set-builder merge walk. Together the
    // five cases (plus their mirror images) are exhaustive for a pair of
    // overlapping closed intervals.

    /// Whether `self` lies entirely before `other`.
    #[inline]
    pub fn entirely_before(&self, other: &Self) -> bool {
        self.to < other.from
    }

    /// Whether `self` is entirely contained within `other`.
    #[inline]
    pub fn covered_by(&self, other: &Self) -> bool {
        other.from <= self.from && self.to <= other.to
    }

    /// Whether `self` is inside `other` without touching either edge.
    #[inline]
    pub fn in_middle_of(&self, other: &Self) -> bool {
        other.from < self.from && self.to < other.to
    }

    /// Whether `self` overlaps the start of `other` but not all of it.
    #[inline]
    pub fn overlaps_start_of(&self, other: &Self) -> bool {
        self.from <= other.from && self.to < other.to
    }

    /// Whether `self` overlaps the end of `other` but not all of it.
    #[inline]
    pub fn overlaps_end_of(&self, other: &Self) -> bool {
        other.from < self.from && other.to <= self.to
    }

    /// The minimal sorted prefix cover of this range.
    pub fn prefixes(&self) -> Vec<Pid<U>> {
        let mut out = Vec::new();
        self.append_prefixes(&mut out);
        out
    }

    /// Appends the minimal prefix cover of this range to `dst`.
    ///
    /// Classic divide-and-conquer: if `[from, to]` is exactly one aligned
    /// block, emit it; otherwise split below the first differing bit and
    /// recurse on both halves. At most `2 * BITS` prefixes per range.
    pub fn append_prefixes(&self, dst: &mut Vec<Pid<U>>) {
        append_values(dst, self.from.value(), self.to.value());
    }
}

fn append_values<U: Key>(dst: &mut Vec<Pid<U>>, a: U, b: U) {
    let (common, aligned) = common_span(a, b);
    if aligned {
        dst.push(Pid::new(a, common));
        return;
    }
    append_values(dst, a, a.bits_set_from(common + 1));
    append_values(dst, b.bits_cleared_from(common + 1), b);
}

/// Length of the shared bit prefix of `a` and `b`, and whether `[a, b]`
/// is exactly the aligned block of that length (`a` ends in zeros, `b`
/// in ones).
fn common_span<U: Key>(a: U, b: U) -> (u8, bool) {
    let common = (a ^ b).leading_zero_bits();
    if common == U::BITS_U8 {
        return (common, true);
    }
    let mask = U::left_mask(common);
    let a_tail_zero = a ^ (a & mask) == U::ZERO;
    let b_tail_ones = (b | mask) == U::ONES;
    (common, a_tail_zero && b_tail_ones)
}

/// Sorts and coalesces ranges into the minimal sorted disjoint cover.
///
/// Adjacent ranges (`prev.to.next() == cur.from`) merge as well as
/// overlapping ones.
pub(crate) fn merge_ranges<U: Key>(mut rr: Vec<PidRange<U>>) -> Vec<PidRange<U>> {
    if rr.len() <= 1 {
        return rr;
    }
    // Equal starts: the wider range first, so narrower ones fold into it.
    rr.sort_by(|a, b| a.from.cmp(&b.from).then_with(|| b.to.cmp(&a.to)));

    let mut out: Vec<PidRange<U>> = Vec::with_capacity(rr.len());
    out.push(rr[0]);
    for r in rr.into_iter().skip(1) {
        let prev = out.last_mut().expect("out is never empty here");
        if prev.to.next() == r.from {
            // prev and r touch, merge them.
            prev.to = r.to;
        } else if prev.to < r.from {
            // disjoint, not adjacent
            out.push(r);
        } else if prev.to < r.to {
            // partial overlap, extend prev
            prev.to = r.to;
        }
        // else: r entirely contained in prev
    }
    out
}

impl<U: Key> fmt::Display for PidRange<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from.value(), self.to.value())
    }
}

impl<U: Key> fmt::Debug for PidRange<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from.value(), self.to.value())
    }
}
