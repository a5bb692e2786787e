//
// Copyright (c) The yangc Core Contributors
//
// SPDX-License-Identifier: MIT
//

//! Numeric range and string length restriction sets.
//!
//! A range set is a sorted list of disjoint inclusive intervals. Refining a
//! base set must stay within it: every refined interval has to fit inside a
//! base interval, where two integer intervals separated by a gap of exactly
//! one absent value count as contiguous. Decimal64 intervals are never
//! contiguous, since real-valued gaps exist between them.

use std::fmt;

use num_traits::One;

/// Value type usable inside a [`RangeSet`].
pub trait RangeNum: Copy + Ord + fmt::Display {
    /// Whether intervals separated by a gap of exactly one value merge.
    const CONTIGUOUS: bool;

    /// The successor value, if any.
    fn succ(self) -> Option<Self>;
}

impl RangeNum for i64 {
    const CONTIGUOUS: bool = true;

    fn succ(self) -> Option<Self> {
        self.checked_add(One::one())
    }
}

impl RangeNum for u64 {
    const CONTIGUOUS: bool = true;

    fn succ(self) -> Option<Self> {
        self.checked_add(One::one())
    }
}

/// A decimal64 value scaled to an integral number of fraction-digit units.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct Dec64 {
    pub units: i64,
    pub fraction_digits: u8,
}

impl Dec64 {
    pub fn new(units: i64, fraction_digits: u8) -> Dec64 {
        Dec64 {
            units,
            fraction_digits,
        }
    }
}

impl fmt::Display for Dec64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = 10i128.pow(self.fraction_digits as u32);
        let units = self.units as i128;
        let int = units / scale;
        let frac = (units % scale).abs();
        let sign = if units < 0 && int == 0 { "-" } else { "" };
        write!(
            f,
            "{}{}.{:0width$}",
            sign,
            int,
            frac,
            width = self.fraction_digits as usize
        )
    }
}

impl RangeNum for Dec64 {
    const CONTIGUOUS: bool = false;

    fn succ(self) -> Option<Self> {
        None
    }
}

/// An inclusive interval.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Interval<T> {
    pub start: T,
    pub end: T,
}

/// A sorted list of disjoint inclusive intervals.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RangeSet<T> {
    intervals: Vec<Interval<T>>,
}

impl<T: RangeNum> RangeSet<T> {
    /// The full span `[min..max]`.
    pub fn span(min: T, max: T) -> RangeSet<T> {
        RangeSet {
            intervals: vec![Interval {
                start: min,
                end: max,
            }],
        }
    }

    pub fn intervals(&self) -> &[Interval<T>] {
        &self.intervals
    }

    /// Overall minimum of the set.
    pub fn min(&self) -> T {
        self.intervals.first().expect("empty range set").start
    }

    /// Overall maximum of the set.
    pub fn max(&self) -> T {
        self.intervals.last().expect("empty range set").end
    }

    /// Whether `value` lies inside one of the intervals.
    pub fn contains(&self, value: T) -> bool {
        self.intervals
            .iter()
            .any(|iv| iv.start <= value && value <= iv.end)
    }

    /// Parse a range argument (`"1..5 | 7..12 | 20"`) as a refinement of
    /// `base`. The `min`/`max` sentinels expand to the base's overall
    /// bounds; `parse_value` converts a single literal.
    pub fn parse(
        arg: &str,
        base: &RangeSet<T>,
        parse_value: impl Fn(&str) -> Option<T>,
    ) -> Result<RangeSet<T>, String> {
        let mut intervals = Vec::new();
        for part in arg.split('|') {
            let part = part.trim();
            let (lo, hi) = match part.split_once("..") {
                Some((lo, hi)) => (lo.trim(), hi.trim()),
                None => (part, part),
            };
            let start = parse_bound(lo, base, &parse_value)?;
            let end = parse_bound(hi, base, &parse_value)?;
            if end < start {
                return Err(format!("invalid range {}", part));
            }
            intervals.push(Interval { start, end });
        }
        if intervals.is_empty() {
            return Err(format!("invalid range {}", arg));
        }

        let set = RangeSet { intervals };
        set.check_ordered()?;
        set.check_within(base)?;
        Ok(set)
    }

    // Refined intervals must be ascending and pairwise disjoint.
    fn check_ordered(&self) -> Result<(), String> {
        for pair in self.intervals.windows(2) {
            if pair[1].start < pair[0].start {
                return Err("ranges must be in ascending order".to_string());
            }
            if pair[1].start <= pair[0].end {
                return Err("ranges must be disjoint".to_string());
            }
        }
        Ok(())
    }

    // Every refined interval must fit inside a base interval, merging
    // integer base intervals separated by exactly one absent value.
    fn check_within(&self, base: &RangeSet<T>) -> Result<(), String> {
        let merged = base.merged_contiguous();
        for iv in &self.intervals {
            let fits = merged
                .iter()
                .any(|b| b.start <= iv.start && iv.end <= b.end);
            if !fits {
                return Err("derived range must be restrictive".to_string());
            }
        }
        Ok(())
    }

    fn merged_contiguous(&self) -> Vec<Interval<T>> {
        let mut merged: Vec<Interval<T>> = Vec::new();
        for iv in &self.intervals {
            if T::CONTIGUOUS {
                if let Some(last) = merged.last_mut() {
                    let gap_of_one =
                        last.end.succ().and_then(RangeNum::succ)
                            == Some(iv.start);
                    if gap_of_one {
                        last.end = iv.end;
                        continue;
                    }
                }
            }
            merged.push(*iv);
        }
        merged
    }
}

fn parse_bound<T: RangeNum>(
    text: &str,
    base: &RangeSet<T>,
    parse_value: &impl Fn(&str) -> Option<T>,
) -> Result<T, String> {
    match text {
        "min" => Ok(base.min()),
        "max" => Ok(base.max()),
        _ => parse_value(text)
            .ok_or_else(|| format!("invalid range value {}", text)),
    }
}

impl<T: RangeNum> fmt::Display for RangeSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for iv in &self.intervals {
            if !first {
                write!(f, " | ")?;
            }
            first = false;
            if iv.start == iv.end {
                write!(f, "{}", iv.start)?;
            } else {
                write!(f, "{}..{}", iv.start, iv.end)?;
            }
        }
        Ok(())
    }
}
