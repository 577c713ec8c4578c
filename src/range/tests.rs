use assert_matches::assert_matches;
use proptest::prelude::*;

use super::{Range, RangeSet};
use crate::errors::Error;

fn set_from(pairs: &[(u64, u64)]) -> RangeSet {
    pairs.iter().fold(RangeSet::new(), |acc, &(s, e)| {
        acc.add(Range::new(s, e).unwrap())
    })
}

fn covers(set: &RangeSet, offset: u64) -> bool {
    set.iter().any(|r| r.start() <= offset && offset < r.end())
}

#[test]
fn range_rejects_empty_and_inverted() {
    assert_matches!(Range::new(5, 5), Err(Error::InvalidRange { start: 5, end: 5 }));
    assert_matches!(Range::new(5, 3), Err(Error::InvalidRange { start: 5, end: 3 }));
}

#[test]
fn add_merges_overlap() {
    let set = set_from(&[(0, 10), (5, 15)]);
    assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![Range::new(0, 15).unwrap()]);
}

#[test]
fn add_merges_adjacent() {
    let set = set_from(&[(0, 10), (10, 20)]);
    assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![Range::new(0, 20).unwrap()]);
}

#[test]
fn add_keeps_disjoint_ranges_separate() {
    let set = set_from(&[(0, 10), (20, 30)]);
    assert_eq!(
        set.iter().copied().collect::<Vec<_>>(),
        vec![Range::new(0, 10).unwrap(), Range::new(20, 30).unwrap()]
    );
}

#[test]
fn uncovered_exact_member_is_empty() {
    let set = set_from(&[(10, 30)]);
    assert!(set.uncovered_within(Range::new(10, 30).unwrap()).is_empty());
}

#[test]
fn uncovered_straddling_gap_yields_one_range() {
    let set = set_from(&[(0, 10), (20, 30)]);
    let uncovered = set.uncovered_within(Range::new(5, 25).unwrap());
    assert_eq!(uncovered, vec![Range::new(10, 20).unwrap()]);
}

#[test]
fn uncovered_entirely_outside_set() {
    let set = RangeSet::new();
    let uncovered = set.uncovered_within(Range::new(0, 100).unwrap());
    assert_eq!(uncovered, vec![Range::new(0, 100).unwrap()]);
}

proptest! {
    #[test]
    fn canonicalization_is_ordered_and_disjoint(
        ranges in proptest::collection::vec((0_u64..200, 1_u64..50), 0..20)
    ) {
        let set = ranges.into_iter().fold(RangeSet::new(), |acc, (start, len)| {
            acc.add(Range::new(start, start + len).unwrap())
        });

        let members: Vec<_> = set.iter().copied().collect();
        for w in members.windows(2) {
            prop_assert!(w[0].end() < w[1].start(), "members must be strictly ordered and non-adjacent");
        }
    }

    #[test]
    fn add_is_idempotent(start in 0_u64..200, len in 1_u64..50) {
        let r = Range::new(start, start + len).unwrap();
        let once = RangeSet::new().add(r);
        let twice = once.add(r);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn add_commutes(
        a_start in 0_u64..200, a_len in 1_u64..50,
        b_start in 0_u64..200, b_len in 1_u64..50,
    ) {
        let a = Range::new(a_start, a_start + a_len).unwrap();
        let b = Range::new(b_start, b_start + b_len).unwrap();

        let ab = RangeSet::new().add(a).add(b);
        let ba = RangeSet::new().add(b).add(a);
        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn uncovered_partition_is_exact(
        ranges in proptest::collection::vec((0_u64..200, 1_u64..50), 0..20),
        query_start in 0_u64..200, query_len in 1_u64..80,
    ) {
        let set = ranges.into_iter().fold(RangeSet::new(), |acc, (start, len)| {
            acc.add(Range::new(start, start + len).unwrap())
        });
        let query = Range::new(query_start, query_start + query_len).unwrap();
        let uncovered = set.uncovered_within(query);

        for offset in query.start()..query.end() {
            let in_set = covers(&set, offset);
            let in_uncovered = uncovered.iter().any(|r| r.start() <= offset && offset < r.end());
            prop_assert!(in_set != in_uncovered, "offset {} must be covered by exactly one of set/uncovered", offset);
        }
    }
}
