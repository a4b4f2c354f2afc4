//! Label maps and the selector seam.
//!
//! Entries carry an opaque `key=value` label map. Matching labels against
//! a query is deliberately external: façades only ever call
//! [`Selector::matches`], so any matcher language can be plugged in.

use std::collections::BTreeMap;

/// A set of `key=value` labels attached to an entry.
///
/// A `BTreeMap` keeps the canonical string form deterministic, which entry
/// equality relies on.
pub type LabelMap = BTreeMap<String, String>;

/// Builds a [`LabelMap`] from anything yielding string pairs.
///
/// ```
/// use idpool_prefix::labels;
///
/// let l = labels([("site", "lab"), ("tier", "edge")]);
/// assert_eq!(l.get("site").map(String::as_str), Some("lab"));
/// ```
pub fn labels<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> LabelMap
where
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// The canonical `k1=v1,k2=v2` form of a label map.
pub fn label_string(labels: &LabelMap) -> String {
    let mut out = String::new();
    for (k, v) in labels {
        if !out.is_empty() {
            out.push(',');
        }
        out.push_str(k);
        out.push('=');
        out.push_str(v);
    }
    out
}

/// A predicate over label maps.
///
/// The only operation façades need from a labelling system. Implemented
/// for closures, so ad-hoc selectors read naturally:
///
/// ```
/// use idpool_prefix::{labels, Selector};
///
/// let site = |l: &idpool_prefix::LabelMap| l.get("site").map(String::as_str) == Some("lab");
/// assert!(site.matches(&labels([("site", "lab")])));
/// ```
pub trait Selector {
    /// Whether an entry with these labels is selected.
    fn matches(&self, labels: &LabelMap) -> bool;
}

impl<F> Selector for F
where
    F: Fn(&LabelMap) -> bool,
{
    #[inline]
    fn matches(&self, labels: &LabelMap) -> bool {
        self(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_string_is_sorted_and_stable() {
        let l = labels([("b", "2"), ("a", "1"), ("c", "3")]);
        assert_eq!(label_string(&l), "a=1,b=2,c=3");
        assert_eq!(label_string(&LabelMap::new()), "");
    }

    #[test]
    fn closure_selector() {
        let l = labels([("vlan", "10")]);
        let yes = |m: &LabelMap| m.contains_key("vlan");
        let no = |m: &LabelMap| m.contains_key("vni");
        assert!(yes.matches(&l));
        assert!(!no.matches(&l));
    }
}
