//! Keep-set parsing: which singular components survive a mask.
//!
//! A keep-set is written as a list of tokens, each either a single index `i`
//! or an inclusive range `a:b`. Tokens are unioned into sorted, disjoint
//! ranges; indices are only enumerated below a caller-supplied bound, so a
//! range as wide as `0:18446744073709551615` costs nothing to hold.
//!
//! ```rust
//! use sonance_config::KeepSet;
//!
//! let keep = KeepSet::parse(["0", "3:5", "4"])?;
//! assert_eq!(keep.to_string(), "0,3:5");
//! assert_eq!(keep.iter_below(5).collect::<Vec<_>>(), vec![0, 3, 4]);
//! # Ok::<(), sonance_config::ConfigError>(())
//! ```

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::error::ConfigError;

/// Singular component indices as sorted, disjoint, non-adjacent ranges.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeepSet(Vec<RangeInclusive<usize>>);

impl KeepSet {
    /// Parse and union a list of tokens.
    pub fn parse<I, S>(tokens: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ranges = Vec::new();
        for token in tokens {
            let token = token.as_ref().trim();
            let range = match token.split_once(':') {
                Some((start, end)) => {
                    let start = parse_index(token, start)?;
                    let end = parse_index(token, end)?;
                    if end < start {
                        return Err(ConfigError::keep_set(token, "range end precedes start"));
                    }
                    start..=end
                }
                None => {
                    let index = parse_index(token, token)?;
                    index..=index
                }
            };
            ranges.push(range);
        }
        Ok(Self(merge(ranges)))
    }

    /// The merged ranges, ascending.
    pub fn ranges(&self) -> &[RangeInclusive<usize>] {
        &self.0
    }

    /// Kept indices strictly below `bound`, ascending.
    pub fn iter_below(&self, bound: usize) -> impl Iterator<Item = usize> + '_ {
        self.0
            .iter()
            .take_while(move |range| *range.start() < bound)
            .flat_map(move |range| *range.start()..=(*range.end()).min(bound - 1))
    }

    /// Number of kept indices strictly below `bound`.
    pub fn count_below(&self, bound: usize) -> usize {
        self.0
            .iter()
            .take_while(|range| *range.start() < bound)
            .map(|range| (*range.end()).min(bound - 1) - *range.start() + 1)
            .sum()
    }

    /// Largest kept index.
    pub fn max(&self) -> Option<usize> {
        self.0.last().map(|range| *range.end())
    }

    /// True when nothing is kept.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `index` is kept.
    pub fn contains(&self, index: usize) -> bool {
        let after = self.0.partition_point(|range| *range.end() < index);
        self.0.get(after).is_some_and(|range| range.contains(&index))
    }
}

fn merge(mut ranges: Vec<RangeInclusive<usize>>) -> Vec<RangeInclusive<usize>> {
    ranges.sort_by_key(|range| *range.start());
    let mut merged: Vec<RangeInclusive<usize>> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            // overlapping or adjacent
            Some(last) if *range.start() <= last.end().saturating_add(1) => {
                if range.end() > last.end() {
                    *last = *last.start()..=*range.end();
                }
            }
            _ => merged.push(range),
        }
    }
    merged
}

fn parse_index(token: &str, part: &str) -> Result<usize, ConfigError> {
    let part = part.trim();
    if part.is_empty() {
        return Err(ConfigError::keep_set(token, "missing index"));
    }
    part.parse().map_err(|_| {
        ConfigError::keep_set(token, format!("'{part}' is not a non-negative integer"))
    })
}

/// Parses comma- or whitespace-separated tokens, e.g. `"0, 2:4"`.
impl FromStr for KeepSet {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.split(|c: char| c == ',' || c.is_whitespace()).filter(|t| !t.is_empty()))
    }
}

/// Prints the merged tokens, e.g. `0,3:5`.
impl fmt::Display for KeepSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|range| match (range.start(), range.end()) {
                (start, end) if start == end => start.to_string(),
                (start, end) => format!("{start}:{end}"),
            })
            .collect();
        write!(f, "{}", parts.join(","))
    }
}
