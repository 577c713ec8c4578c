// Copyright 2024 The pcachefs Authors.
// See the "LICENSE.txt" file at the top-level directory of this distribution.
//
// Licensed under the MIT license. This file may not be copied, modified,
// or distributed except according to those terms.

//! A set of half-open byte intervals, canonicalized under union.
//!
//! This is the data structure the caching engine consults before every read,
//! to work out which portions of a file still need to come from the origin.

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// A half-open interval `[start, end)` over non-negative file offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Range {
    start: u64,
    end: u64,
}

impl Range {
    /// Constructs a range. Fails with [`Error::InvalidRange`] if `end <= start`.
    pub fn new(start: u64, end: u64) -> Result<Self> {
        if end <= start {
            return Err(Error::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The first offset covered by this range.
    #[must_use]
    pub fn start(&self) -> u64 {
        self.start
    }

    /// One past the last offset covered by this range.
    #[must_use]
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of bytes covered by this range.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.end - self.start
    }

    fn is_adjacent_or_overlapping(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    fn union(&self, other: &Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Intersection of two ranges, if they overlap (touching does not count).
    fn intersection(&self, other: &Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start < end).then_some(Self { start, end })
    }
}

/// A canonicalized, finite set of [`Range`]s over a single file.
///
/// Members never overlap, never touch (adjacent ranges are merged), and are
/// kept sorted by `start`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSet {
    members: Vec<Range>,
}

impl RangeSet {
    /// The empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterates over the canonicalized members, in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &Range> {
        self.members.iter()
    }

    /// Returns a new set containing every offset covered by `self` or by `r`.
    #[must_use]
    pub fn add(&self, r: Range) -> Self {
        let mut merged: Vec<Range> = Vec::with_capacity(self.members.len() + 1);
        let mut pending = r;
        let mut inserted = false;

        for &existing in &self.members {
            if inserted {
                merged.push(existing);
                continue;
            }
            if existing.is_adjacent_or_overlapping(&pending) {
                pending = pending.union(&existing);
            } else if existing.end < pending.start {
                merged.push(existing);
            } else {
                merged.push(pending);
                merged.push(existing);
                inserted = true;
            }
        }
        if !inserted {
            merged.push(pending);
        }

        Self { members: merged }
    }

    /// Returns a new set containing every offset covered by `self` or by `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let mut result = self.clone();
        for &r in &other.members {
            result = result.add(r);
        }
        result
    }

    /// Returns the maximal sub-ranges of `query` not covered by this set, in
    /// ascending order. Empty iff `query` is fully covered.
    #[must_use]
    pub fn uncovered_within(&self, query: Range) -> Vec<Range> {
        let mut uncovered = Vec::new();
        let mut cursor = query.start;

        for &member in &self.members {
            if member.end <= cursor {
                continue;
            }
            if member.start >= query.end {
                break;
            }
            if member.start > cursor {
                let gap_end = member.start.min(query.end);
                if cursor < gap_end {
                    uncovered.push(Range {
                        start: cursor,
                        end: gap_end,
                    });
                }
            }
            cursor = cursor.max(member.end);
            if cursor >= query.end {
                break;
            }
        }

        if cursor < query.end {
            uncovered.push(Range {
                start: cursor,
                end: query.end,
            });
        }

        uncovered
    }

    /// Whether any member of this set intersects `query`.
    #[must_use]
    pub fn intersects(&self, query: Range) -> bool {
        self.members.iter().any(|m| m.intersection(&query).is_some())
    }

    /// Whether this set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests;
