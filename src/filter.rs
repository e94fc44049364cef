//! Multiset filtering module
//!
//! Provides the frequency-map filters applied between pipeline stages:
//! retain/remove lists, minimum frequency, length range, regex patterns,
//! mask keyspace/complexity limits and top-N selection.

use crate::error::{Result, TransformError};
use crate::mask::{calculate_keyspace, test_mask_complexity};
use crate::multiset::Multiset;
use crate::transform::IndexRange;
use log::debug;
use regex::Regex;

/// Keep keys in `retain` (when non-empty) and not in `remove` (when non-empty)
///
/// Fails with `EmptyResult` when a non-empty input is filtered down to
/// nothing by a non-empty retain or remove list.
pub fn retain_remove(input: &Multiset, retain: &Multiset, remove: &Multiset) -> Result<Multiset> {
    let mut output = input.clone();
    output.retain(|key, _| {
        (retain.is_empty() || retain.contains(key)) && (remove.is_empty() || !remove.contains(key))
    });

    let filtered = !retain.is_empty() || !remove.is_empty();
    if filtered && output.is_empty() && !input.is_empty() {
        return Err(TransformError::EmptyResult);
    }

    Ok(output)
}

/// Keep keys seen at least `minimum` times
pub fn remove_minimum_frequency(input: &Multiset, minimum: u64) -> Multiset {
    let mut output = input.clone();
    output.retain(|_, count| count >= minimum);
    output
}

/// Keep keys whose character length lies in `range`
pub fn remove_length_range(input: &Multiset, range: IndexRange) -> Multiset {
    let mut output = input.clone();
    output.retain(|key, _| range.contains(char_length(key)));
    output
}

#[inline]
fn char_length(word: &str) -> usize {
    // Fast byte-length path for ASCII
    if word.is_ascii() {
        word.len()
    } else {
        word.chars().count()
    }
}

/// Keep the `n` keys with the highest counts
///
/// Ties are broken by key in ascending byte order.
pub fn filter_top_n(input: &Multiset, n: usize) -> Multiset {
    input
        .sorted()
        .into_iter()
        .take(n)
        .map(|(key, count)| (key.to_string(), count))
        .collect()
}

/// Keep keys whose additive mask keyspace is at most `maximum`
pub fn filter_max_keyspace(input: &Multiset, maximum: u64) -> Multiset {
    let mut output = input.clone();
    output.retain(|key, _| calculate_keyspace(key) <= maximum);
    output
}

/// Keep keys whose mask complexity is at least `minimum`
pub fn filter_min_complexity(input: &Multiset, minimum: u8) -> Multiset {
    let mut output = input.clone();
    output.retain(|key, _| test_mask_complexity(key) >= minimum);
    output
}

/// Regex filter over keys
pub struct PatternFilter {
    pattern: Regex,
}

impl PatternFilter {
    pub fn new(pattern: &str) -> anyhow::Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| anyhow::anyhow!("Invalid regex pattern '{}': {}", pattern, e))?;

        Ok(Self { pattern: regex })
    }

    #[inline]
    pub fn matches(&self, word: &str) -> bool {
        self.pattern.is_match(word)
    }

    pub fn pattern_str(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn apply(&self, input: &Multiset) -> Multiset {
        let mut output = input.clone();
        output.retain(|key, _| self.matches(key));
        output
    }
}

/// Helper to validate a regex pattern before use
pub fn validate_pattern(pattern: &str) -> anyhow::Result<()> {
    Regex::new(pattern)
        .map_err(|e| anyhow::anyhow!("Invalid regex pattern '{}': {}", pattern, e))?;
    Ok(())
}

/// Filters applied to the final multiset, in order
#[derive(Default)]
pub struct FilterConfig {
    pub retain: Multiset,
    pub remove: Multiset,
    pub min_frequency: u64,
    pub length: Option<IndexRange>,
    pub pattern: Option<PatternFilter>,
    pub max_keyspace: Option<u64>,
    pub min_complexity: Option<u8>,
    pub top_n: Option<usize>,
}

impl FilterConfig {
    /// Check if any filter is active
    pub fn has_filters(&self) -> bool {
        !self.retain.is_empty()
            || !self.remove.is_empty()
            || self.min_frequency > 1
            || self.length.is_some()
            || self.pattern.is_some()
            || self.max_keyspace.is_some()
            || self.min_complexity.is_some()
            || self.top_n.is_some()
    }

    /// Apply every configured filter
    pub fn apply(&self, input: Multiset) -> Result<Multiset> {
        let mut set = input;

        if !self.retain.is_empty() || !self.remove.is_empty() {
            set = retain_remove(&set, &self.retain, &self.remove)?;
            debug!("After retain/remove: {} keys", set.len());
        }
        if self.min_frequency > 1 {
            set = remove_minimum_frequency(&set, self.min_frequency);
            debug!("After minimum frequency {}: {} keys", self.min_frequency, set.len());
        }
        if let Some(range) = self.length {
            set = remove_length_range(&set, range);
            debug!("After length range {}: {} keys", range, set.len());
        }
        if let Some(ref pattern) = self.pattern {
            set = pattern.apply(&set);
            debug!("After pattern {}: {} keys", pattern.pattern_str(), set.len());
        }
        if let Some(maximum) = self.max_keyspace {
            set = filter_max_keyspace(&set, maximum);
            debug!("After keyspace <= {}: {} keys", maximum, set.len());
        }
        if let Some(minimum) = self.min_complexity {
            set = filter_min_complexity(&set, minimum);
            debug!("After complexity >= {}: {} keys", minimum, set.len());
        }
        if let Some(n) = self.top_n {
            set = filter_top_n(&set, n);
            debug!("After top {}: {} keys", n, set.len());
        }

        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Multiset {
        Multiset::from_iter([("password", 5), ("pass", 3), ("123456", 3), ("hëllo", 1)])
    }

    #[test]
    fn test_retain_remove() {
        let retain = Multiset::from_iter([("password", 1), ("pass", 1)]);
        let remove = Multiset::from_iter([("pass", 1)]);
        let output = retain_remove(&sample(), &retain, &remove).unwrap();

        assert_eq!(output, Multiset::from_iter([("password", 5)]));
    }

    #[test]
    fn test_retain_remove_empty_result() {
        let input = Multiset::from_iter([("a", 1), ("b", 2)]);
        let remove = Multiset::from_iter([("a", 1), ("b", 2)]);
        let err = retain_remove(&input, &Multiset::new(), &remove).unwrap_err();

        assert!(matches!(err, TransformError::EmptyResult));
    }

    #[test]
    fn test_retain_remove_no_lists() {
        let output = retain_remove(&sample(), &Multiset::new(), &Multiset::new()).unwrap();
        assert_eq!(output, sample());
    }

    #[test]
    fn test_minimum_frequency() {
        let output = remove_minimum_frequency(&sample(), 3);
        assert_eq!(output.len(), 3);
        assert!(!output.contains("hëllo"));
    }

    #[test]
    fn test_length_range_unicode() {
        let output = remove_length_range(&sample(), IndexRange::new(4, 5).unwrap());
        assert!(output.contains("pass"));
        assert!(output.contains("hëllo")); // 5 chars, 6 bytes
        assert_eq!(output.len(), 2);
    }

    #[test]
    fn test_top_n_ties() {
        let output = filter_top_n(&sample(), 2);
        assert!(output.contains("password"));
        assert!(output.contains("123456")); // ties with "pass", sorts first
        assert_eq!(output.len(), 2);
    }

    #[test]
    fn test_mask_filters() {
        let masks = Multiset::from_iter([("?l?l?l?l", 4), ("?u?l?d?d?s", 1), ("?b?b", 1)]);

        let cheap = filter_max_keyspace(&masks, 104);
        assert_eq!(cheap, Multiset::from_iter([("?l?l?l?l", 4)]));

        let complex = filter_min_complexity(&masks, 3);
        assert_eq!(complex, Multiset::from_iter([("?u?l?d?d?s", 1)]));
    }

    #[test]
    fn test_pattern_filter() {
        let filter = PatternFilter::new(r"^[a-z]{4}[0-9]{4}$").unwrap();

        assert!(filter.matches("pass1234"));
        assert!(!filter.matches("password"));
        assert!(PatternFilter::new("(unclosed").is_err());
    }

    #[test]
    fn test_filter_config_order() {
        let config = FilterConfig {
            min_frequency: 2,
            length: Some(IndexRange::new(4, 8).unwrap()),
            top_n: Some(1),
            ..FilterConfig::default()
        };

        assert!(config.has_filters());
        let output = config.apply(sample()).unwrap();
        assert_eq!(output, Multiset::from_iter([("password", 5)]));
    }
}
