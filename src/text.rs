//! Text utility transformations
//!
//! Reversal, splitting, substring replacement and extraction, word n-grams
//! and passphrase recombination.

use crate::multiset::Multiset;
use crate::transform::IndexRange;

/// Separators tried when recombining passphrase words
const PASSPHRASE_SEPARATORS: [&str; 5] = ["", " ", "-", "_", "."];

/// Reverse a string by characters
pub fn reverse_string(s: &str) -> String {
    s.chars().rev().collect()
}

pub fn reverse_map(input: &Multiset) -> Multiset {
    let mut output = Multiset::with_capacity(input.len());
    for (key, &count) in input {
        output.add(reverse_string(key), count);
    }
    output
}

/// Split keys containing `separator` into their non-empty parts
pub fn split_map(input: &Multiset, separator: &str) -> Multiset {
    let mut output = Multiset::new();
    if separator.is_empty() {
        return output;
    }

    for (key, &count) in input {
        if !key.contains(separator) {
            continue;
        }
        for part in key.split(separator) {
            output.add(part, count);
        }
    }

    output
}

/// A substring substitution read from an `old:new` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacePair {
    pub from: String,
    pub to: String,
}

impl ReplacePair {
    /// Parse `old:new`, splitting on the first colon
    pub fn parse(line: &str) -> Option<Self> {
        let (from, to) = line.split_once(':')?;
        if from.is_empty() {
            return None;
        }
        Some(Self {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}

/// Replacement pairs from the keys of a donor set, in a stable order
pub fn parse_replacements(donor: &Multiset) -> Vec<ReplacePair> {
    let mut pairs: Vec<ReplacePair> = donor.keys().filter_map(ReplacePair::parse).collect();
    pairs.sort_by(|a, b| a.from.cmp(&b.from).then_with(|| a.to.cmp(&b.to)));
    pairs
}

fn replace_map<F>(input: &Multiset, pairs: &[ReplacePair], replace: F) -> Multiset
where
    F: Fn(&str, &ReplacePair) -> String,
{
    let mut output = Multiset::new();
    for (key, &count) in input {
        for pair in pairs {
            if !key.contains(&pair.from) {
                continue;
            }
            let replaced = replace(key, pair);
            if replaced != *key {
                output.add(replaced, count);
            }
        }
    }
    output
}

/// One output per applicable pair, replacing the first occurrence
pub fn replace_first_map(input: &Multiset, pairs: &[ReplacePair]) -> Multiset {
    replace_map(input, pairs, |key, pair| key.replacen(&pair.from, &pair.to, 1))
}

/// One output per applicable pair, replacing every occurrence
pub fn replace_all_map(input: &Multiset, pairs: &[ReplacePair]) -> Multiset {
    replace_map(input, pairs, |key, pair| key.replace(&pair.from, &pair.to))
}

/// Characters `start..end` of `s` (end exclusive, clamped to the length)
pub fn substring(s: &str, range: IndexRange) -> Option<String> {
    let sub: String = s
        .chars()
        .skip(range.start)
        .take(range.end.saturating_sub(range.start))
        .collect();
    (!sub.is_empty()).then_some(sub)
}

pub fn substring_map(input: &Multiset, range: IndexRange) -> Multiset {
    let mut output = Multiset::new();
    for (key, &count) in input {
        if let Some(sub) = substring(key, range) {
            output.add(sub, count);
        }
    }
    output
}

/// Space-joined word n-grams for every n in `sizes`
pub fn ngrams(s: &str, sizes: IndexRange) -> Vec<String> {
    let words: Vec<&str> = s.split_whitespace().collect();
    let mut grams = Vec::new();

    for n in sizes.iter() {
        if n == 0 || n > words.len() {
            continue;
        }
        grams.extend(words.windows(n).map(|window| window.join(" ")));
    }

    grams
}

pub fn ngram_map(input: &Multiset, sizes: IndexRange) -> Multiset {
    let mut output = Multiset::new();
    for (key, &count) in input {
        for gram in ngrams(key, sizes) {
            output.add(gram, count);
        }
    }
    output
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Recombinations of a multi-word phrase with separators and casing
///
/// Phrases whose word count falls outside `words`, or with fewer than two
/// words, produce nothing. The unchanged input is never returned.
pub fn passphrases(s: &str, words: IndexRange) -> Vec<String> {
    let parts: Vec<&str> = s.split_whitespace().collect();
    if parts.len() < 2 || !words.contains(parts.len()) {
        return Vec::new();
    }

    let casings: [Vec<String>; 3] = [
        parts.iter().map(|w| w.to_string()).collect(),
        parts.iter().map(|w| w.to_lowercase()).collect(),
        parts.iter().map(|w| title_case(w)).collect(),
    ];

    let mut phrases: Vec<String> = Vec::new();
    for casing in &casings {
        for separator in PASSPHRASE_SEPARATORS {
            let phrase = casing.join(separator);
            if phrase != s && !phrases.contains(&phrase) {
                phrases.push(phrase);
            }
        }
    }

    phrases
}

pub fn passphrase_map(input: &Multiset, words: IndexRange) -> Multiset {
    let mut output = Multiset::new();
    for (key, &count) in input {
        for phrase in passphrases(key, words) {
            output.add(phrase, count);
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: usize, end: usize) -> IndexRange {
        IndexRange::new(start, end).unwrap()
    }

    #[test]
    fn test_reverse() {
        assert_eq!(reverse_string("abc爱"), "爱cba");
        assert_eq!(reverse_string(&reverse_string("p@ss")), "p@ss");

        let output = reverse_map(&Multiset::from_iter([("abc", 2)]));
        assert_eq!(output.get("cba"), Some(2));
    }

    #[test]
    fn test_split_map() {
        let input = Multiset::from_iter([("john smith", 2), ("single", 1), ("a  b", 1)]);
        let output = split_map(&input, " ");

        assert_eq!(output.get("john"), Some(2));
        assert_eq!(output.get("smith"), Some(2));
        assert_eq!(output.get("a"), Some(1));
        assert!(!output.contains("single"));
        assert_eq!(output.len(), 4);
    }

    #[test]
    fn test_replace_pair_parse() {
        assert_eq!(
            ReplacePair::parse("a:@"),
            Some(ReplacePair { from: "a".into(), to: "@".into() })
        );
        assert_eq!(
            ReplacePair::parse("s:$:x"),
            Some(ReplacePair { from: "s".into(), to: "$:x".into() })
        );
        assert_eq!(ReplacePair::parse(":x"), None);
        assert_eq!(ReplacePair::parse("nocolon"), None);
    }

    #[test]
    fn test_replace_first_and_all() {
        let input = Multiset::from_iter([("banana", 3)]);
        let pairs = vec![ReplacePair { from: "a".into(), to: "4".into() }];

        let first = replace_first_map(&input, &pairs);
        assert_eq!(first.get("b4nana"), Some(3));

        let all = replace_all_map(&input, &pairs);
        assert_eq!(all.get("b4n4n4"), Some(3));
    }

    #[test]
    fn test_substring() {
        assert_eq!(substring("password", range(0, 4)).as_deref(), Some("pass"));
        assert_eq!(substring("password", range(4, 20)).as_deref(), Some("word"));
        assert_eq!(substring("pw", range(5, 8)), None);
        assert_eq!(substring("爱test", range(0, 2)).as_deref(), Some("爱t"));
    }

    #[test]
    fn test_ngrams() {
        let grams = ngrams("the quick brown fox", range(2, 3));
        assert_eq!(
            grams,
            vec!["the quick", "quick brown", "brown fox", "the quick brown", "quick brown fox"]
        );
        assert!(ngrams("single", range(2, 2)).is_empty());
    }

    #[test]
    fn test_passphrases() {
        let phrases = passphrases("Correct horse", range(1, 3));
        assert!(phrases.contains(&"Correcthorse".to_string()));
        assert!(phrases.contains(&"correct-horse".to_string()));
        assert!(phrases.contains(&"Correct_Horse".to_string()));
        assert!(!phrases.contains(&"Correct horse".to_string()));

        assert!(passphrases("one two three four", range(1, 3)).is_empty());
        assert!(passphrases("single", range(1, 3)).is_empty());
    }
}
