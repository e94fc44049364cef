//! Mask engine
//!
//! Classifies characters into the five mask classes (`?l`, `?u`, `?d`, `?s`,
//! `?b`) and provides masking, retain/match masking, boundary splitting,
//! template shuffling and mask statistics over [`Multiset`]s.
//!
//! Multibyte characters are masked one `?b` token per UTF-8 byte so that a
//! mask lines up with the byte-addressed rule engine.

use crate::error::{Result, TransformError};
use crate::multiset::Multiset;
use bitflags::bitflags;
use hashbrown::HashMap;

/// Class of a single character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    Lower,
    Upper,
    Digit,
    Special,
    Multibyte,
}

impl CharClass {
    pub const ALL: [CharClass; 5] = [
        CharClass::Lower,
        CharClass::Upper,
        CharClass::Digit,
        CharClass::Special,
        CharClass::Multibyte,
    ];

    /// Letter used after `?` in a mask token
    pub fn letter(self) -> char {
        match self {
            CharClass::Lower => 'l',
            CharClass::Upper => 'u',
            CharClass::Digit => 'd',
            CharClass::Special => 's',
            CharClass::Multibyte => 'b',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'l' => Some(CharClass::Lower),
            'u' => Some(CharClass::Upper),
            'd' => Some(CharClass::Digit),
            's' => Some(CharClass::Special),
            'b' => Some(CharClass::Multibyte),
            _ => None,
        }
    }

    /// The two-byte mask token, e.g. `?l`
    pub fn token(self) -> &'static str {
        match self {
            CharClass::Lower => "?l",
            CharClass::Upper => "?u",
            CharClass::Digit => "?d",
            CharClass::Special => "?s",
            CharClass::Multibyte => "?b",
        }
    }

    /// Number of values one token of this class can take
    pub fn size(self) -> u64 {
        match self {
            CharClass::Lower | CharClass::Upper => 26,
            CharClass::Digit => 10,
            CharClass::Special => 33,
            CharClass::Multibyte => 256,
        }
    }

    pub fn flag(self) -> MaskClasses {
        match self {
            CharClass::Lower => MaskClasses::LOWER,
            CharClass::Upper => MaskClasses::UPPER,
            CharClass::Digit => MaskClasses::DIGIT,
            CharClass::Special => MaskClasses::SPECIAL,
            CharClass::Multibyte => MaskClasses::MULTIBYTE,
        }
    }
}

bitflags! {
    /// Set of classes a masking operation replaces with tokens.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MaskClasses: u8 {
        const LOWER     = 1 << 0;
        const UPPER     = 1 << 1;
        const DIGIT     = 1 << 2;
        const SPECIAL   = 1 << 3;
        const MULTIBYTE = 1 << 4;
    }
}

impl MaskClasses {
    /// Parse a class list such as `luds` or `lub`
    pub fn from_letters(letters: &str) -> Result<Self> {
        let mut classes = MaskClasses::empty();
        for letter in letters.chars() {
            let class = CharClass::from_letter(letter).ok_or_else(|| {
                TransformError::InvalidArgument(format!(
                    "unknown mask class '{}' in '{}' (expected any of l, u, d, s, b)",
                    letter, letters
                ))
            })?;
            classes |= class.flag();
        }
        Ok(classes)
    }

    #[inline]
    pub fn enables(self, class: CharClass) -> bool {
        self.contains(class.flag())
    }

    /// Class letters in canonical `ludsb` order
    pub fn letters(self) -> String {
        CharClass::ALL
            .iter()
            .filter(|c| self.enables(**c))
            .map(|c| c.letter())
            .collect()
    }
}

/// Classify a character
///
/// Returns `None` for ASCII characters outside the four ASCII classes
/// (control characters, tab), which masking leaves verbatim.
#[inline]
pub fn classify(c: char) -> Option<CharClass> {
    if !c.is_ascii() {
        Some(CharClass::Multibyte)
    } else if c.is_ascii_lowercase() {
        Some(CharClass::Lower)
    } else if c.is_ascii_uppercase() {
        Some(CharClass::Upper)
    } else if c.is_ascii_digit() {
        Some(CharClass::Digit)
    } else if c.is_ascii_punctuation() || c == ' ' {
        Some(CharClass::Special)
    } else {
        None
    }
}

/// One element of a masked string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskSegment {
    Token(CharClass),
    Literal(char),
}

/// Split a masked string into tokens and literals, with byte offsets
///
/// `?` followed by a class letter is a token; any other `?` is a literal.
pub fn mask_segments(mask: &str) -> Vec<(usize, MaskSegment)> {
    let mut segments = Vec::with_capacity(mask.len());
    let mut chars = mask.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        if c == '?' {
            if let Some(class) = chars.peek().and_then(|&(_, n)| CharClass::from_letter(n)) {
                chars.next();
                segments.push((offset, MaskSegment::Token(class)));
                continue;
            }
        }
        segments.push((offset, MaskSegment::Literal(c)));
    }

    segments
}

/// Replace every character whose class is enabled with its mask token
///
/// Characters of disabled classes pass through verbatim, so a key that
/// already contains `?l` keeps it when `s` is disabled and the result reads
/// as a token. Enable `s` when keys may contain literal `?`.
pub fn make_masked_string(s: &str, enabled: MaskClasses) -> String {
    let mut masked = String::with_capacity(s.len() * 2);

    for c in s.chars() {
        match classify(c) {
            Some(class) if enabled.enables(class) => {
                let repeat = if class == CharClass::Multibyte { c.len_utf8() } else { 1 };
                for _ in 0..repeat {
                    masked.push_str(class.token());
                }
            }
            _ => masked.push(c),
        }
    }

    masked
}

/// Mask every key; keys collapsing to the same mask sum their counts
pub fn make_masked_map(input: &Multiset, enabled: MaskClasses) -> Multiset {
    let mut output = Multiset::with_capacity(input.len());
    for (key, &count) in input {
        output.add(make_masked_string(key, enabled), count);
    }
    output
}

/// Mask every key except one occurrence of each retained substring
///
/// A key yields one output per retained substring it contains. The first
/// occurrence of the substring is passed through verbatim.
pub fn make_retain_masked_map(input: &Multiset, enabled: MaskClasses, retain: &Multiset) -> Multiset {
    let mut output = Multiset::new();

    for (key, &count) in input {
        for keep in retain.keys() {
            let Some(start) = key.find(keep) else {
                continue;
            };
            let end = start + keep.len();

            let mut masked = make_masked_string(&key[..start], enabled);
            masked.push_str(keep);
            masked.push_str(&make_masked_string(&key[end..], enabled));

            output.add(masked, count);
        }
    }

    output
}

/// Keep keys whose mask appears in `patterns`
pub fn make_matched_masked_map(input: &Multiset, enabled: MaskClasses, patterns: &Multiset) -> Multiset {
    let mut output = Multiset::new();
    for (key, &count) in input {
        if patterns.contains(&make_masked_string(key, enabled)) {
            output.add(key.as_str(), count);
        }
    }
    output
}

/// Emit every maximal same-class run whose class is enabled
///
/// Each run occurrence contributes a count of one, independent of the
/// source key's count.
pub fn boundary_split_pop_map(input: &Multiset, enabled: MaskClasses) -> Multiset {
    let mut output = Multiset::new();

    for key in input.keys() {
        for run in class_runs(key) {
            if run.class.is_some_and(|class| enabled.enables(class)) {
                output.add(&key[run.start..run.end], 1);
            }
        }
    }

    output
}

struct ClassRun {
    class: Option<CharClass>,
    start: usize,
    end: usize,
}

/// Maximal runs of characters sharing a class
fn class_runs(s: &str) -> Vec<ClassRun> {
    let mut runs: Vec<ClassRun> = Vec::new();

    for (offset, c) in s.char_indices() {
        let class = classify(c);
        let end = offset + c.len_utf8();
        match runs.last_mut() {
            Some(run) if run.class == class => run.end = end,
            _ => runs.push(ClassRun { class, start: offset, end }),
        }
    }

    runs
}

/// Fill runs of mask tokens with donor strings of the same shape
///
/// For each contiguous token run in a key, every donor whose mask under
/// `enabled` equals that run produces one output with the run replaced by
/// the donor. Other runs in the key stay masked. Keys without tokens are
/// dropped.
pub fn shuffle_map(input: &Multiset, enabled: MaskClasses, donor: &Multiset) -> Multiset {
    let mut by_shape: HashMap<String, Vec<&str>> = HashMap::new();
    for word in donor.keys() {
        let shape = make_masked_string(word, enabled);
        if is_mask_a_full_mask(&shape) {
            by_shape.entry(shape).or_default().push(word);
        }
    }

    let mut output = Multiset::new();
    if by_shape.is_empty() {
        return output;
    }

    for (key, &count) in input {
        for (start, end) in token_runs(key) {
            let Some(words) = by_shape.get(&key[start..end]) else {
                continue;
            };
            for word in words {
                let mut filled = String::with_capacity(key.len());
                filled.push_str(&key[..start]);
                filled.push_str(word);
                filled.push_str(&key[end..]);
                output.add(filled, count);
            }
        }
    }

    output
}

/// Byte ranges of contiguous mask token runs
fn token_runs(mask: &str) -> Vec<(usize, usize)> {
    let mut runs: Vec<(usize, usize)> = Vec::new();
    let mut open: Option<usize> = None;

    for (offset, segment) in mask_segments(mask) {
        match segment {
            MaskSegment::Token(_) => {
                open.get_or_insert(offset);
            }
            MaskSegment::Literal(_) => {
                if let Some(start) = open.take() {
                    runs.push((start, offset));
                }
            }
        }
    }
    if let Some(start) = open {
        runs.push((start, mask.len()));
    }

    runs
}

/// Mask each key, then strip the tokens, leaving the literal residue
///
/// With `b` enabled, every byte of a multibyte character left in the
/// residue becomes a `?b` token. Fully masked keys leave an empty residue,
/// which is kept.
pub fn remove_masked_characters(input: &Multiset, enabled: MaskClasses) -> Multiset {
    let ascii_classes = enabled - MaskClasses::MULTIBYTE;
    let mut output = Multiset::new();

    for (key, &count) in input {
        let masked = make_masked_string(key, ascii_classes);
        let mut residue = String::with_capacity(masked.len());

        for (_, segment) in mask_segments(&masked) {
            match segment {
                MaskSegment::Literal(c) if !c.is_ascii() && enabled.contains(MaskClasses::MULTIBYTE) => {
                    for _ in 0..c.len_utf8() {
                        residue.push_str(CharClass::Multibyte.token());
                    }
                }
                MaskSegment::Literal(c) => residue.push(c),
                MaskSegment::Token(_) => {}
            }
        }
        output.add_allow_empty(residue, count);
    }

    output
}

/// Additive keyspace of a mask: class size per token, one per literal
pub fn calculate_keyspace(mask: &str) -> u64 {
    mask_segments(mask)
        .into_iter()
        .map(|(_, segment)| match segment {
            MaskSegment::Token(class) => class.size(),
            MaskSegment::Literal(_) => 1,
        })
        .sum()
}

/// Number of distinct token classes, plus one if literals remain (max 5)
pub fn test_mask_complexity(mask: &str) -> u8 {
    let mut classes = MaskClasses::empty();
    let mut literal = false;

    for (_, segment) in mask_segments(mask) {
        match segment {
            MaskSegment::Token(class) => classes |= class.flag(),
            MaskSegment::Literal(_) => literal = true,
        }
    }

    let complexity = classes.bits().count_ones() as u8 + u8::from(literal);
    complexity.min(5)
}

/// True when a non-empty mask consists of tokens only
pub fn is_mask_a_full_mask(mask: &str) -> bool {
    !mask.is_empty()
        && mask_segments(mask)
            .iter()
            .all(|(_, segment)| matches!(segment, MaskSegment::Token(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn luds() -> MaskClasses {
        MaskClasses::from_letters("luds").unwrap()
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify('a'), Some(CharClass::Lower));
        assert_eq!(classify('Z'), Some(CharClass::Upper));
        assert_eq!(classify('7'), Some(CharClass::Digit));
        assert_eq!(classify('!'), Some(CharClass::Special));
        assert_eq!(classify(' '), Some(CharClass::Special));
        assert_eq!(classify('~'), Some(CharClass::Special));
        assert_eq!(classify('爱'), Some(CharClass::Multibyte));
        assert_eq!(classify('\t'), None);
    }

    #[test]
    fn test_mask_classes_parse() {
        let classes = MaskClasses::from_letters("lub").unwrap();
        assert!(classes.enables(CharClass::Lower));
        assert!(classes.enables(CharClass::Multibyte));
        assert!(!classes.enables(CharClass::Digit));
        assert_eq!(classes.letters(), "lub");
        assert!(MaskClasses::from_letters("lx").is_err());
    }

    #[test]
    fn test_masked_string() {
        assert_eq!(make_masked_string("Pass123!", luds()), "?u?l?l?l?d?d?d?s");
        assert_eq!(
            make_masked_string("pass123", MaskClasses::DIGIT),
            "pass?d?d?d"
        );
        assert_eq!(
            make_masked_string("a爱", MaskClasses::all()),
            "?l?b?b?b"
        );
        assert_eq!(make_masked_string("a爱", luds()), "?l爱");
    }

    #[test]
    fn test_masked_map_collapses() {
        let input = Multiset::from_iter([("abc", 1), ("ABC", 2), ("ABCabc123!!!", 3), ("xyz", 4)]);
        let output = make_masked_map(&input, luds());

        assert_eq!(output.get("?l?l?l"), Some(5));
        assert_eq!(output.get("?u?u?u"), Some(2));
        assert_eq!(output.get("?u?u?u?l?l?l?d?d?d?s?s?s"), Some(3));
        assert_eq!(output.len(), 3);
    }

    #[test]
    fn test_retain_masked_map() {
        let input = Multiset::from_iter([("password123", 2), ("hello", 1)]);
        let retain = Multiset::from_iter([("pass", 1), ("123", 1), ("zzz", 1)]);
        let output = make_retain_masked_map(&input, luds(), &retain);

        assert_eq!(output.get("pass?l?l?l?l?d?d?d"), Some(2));
        assert_eq!(output.get("?l?l?l?l?l?l?l?l123"), Some(2));
        assert_eq!(output.len(), 2);
    }

    #[test]
    fn test_matched_masked_map() {
        let input = Multiset::from_iter([("pass123", 2), ("hello", 1), ("abc1234", 5)]);
        let patterns = Multiset::from_iter([("?l?l?l?l?d?d?d", 1)]);
        let output = make_matched_masked_map(&input, luds(), &patterns);

        assert_eq!(output.get("pass123"), Some(2));
        assert_eq!(output.len(), 1);
    }

    #[test]
    fn test_boundary_split() {
        let input = Multiset::from_iter([("abc123", 1), ("ABC", 2), ("ABCabc123!!!", 3)]);
        let output = boundary_split_pop_map(&input, luds());

        assert_eq!(output.get("!!!"), Some(1));
        assert_eq!(output.get("ABC"), Some(2));
        assert_eq!(output.get("abc"), Some(2));
        assert_eq!(output.get("123"), Some(2));
        assert_eq!(output.len(), 4);
    }

    #[test]
    fn test_boundary_split_only_enabled_classes() {
        let input = Multiset::from_iter([("abc123def", 1)]);
        let output = boundary_split_pop_map(&input, MaskClasses::DIGIT);

        assert_eq!(output.get("123"), Some(1));
        assert_eq!(output.len(), 1);
    }

    #[test]
    fn test_shuffle_map() {
        let input = Multiset::from_iter([("pass?d?d?d", 2), ("?u?l?l", 1), ("literal", 9)]);
        let donor = Multiset::from_iter([("123", 1), ("999", 1), ("12", 1), ("Abc", 1)]);
        let output = shuffle_map(&input, luds(), &donor);

        assert_eq!(output.get("pass123"), Some(2));
        assert_eq!(output.get("pass999"), Some(2));
        assert_eq!(output.get("Abc"), Some(1));
        assert_eq!(output.len(), 3);
    }

    #[test]
    fn test_shuffle_map_multiple_runs() {
        let input = Multiset::from_iter([("?d?d-?d?d", 1)]);
        let donor = Multiset::from_iter([("42", 1)]);
        let output = shuffle_map(&input, luds(), &donor);

        assert_eq!(output.get("42-?d?d"), Some(1));
        assert_eq!(output.get("?d?d-42"), Some(1));
        assert_eq!(output.len(), 2);
    }

    #[test]
    fn test_shuffle_map_multibyte_donor() {
        let input = Multiset::from_iter([("i?b?b?bu", 3), ("?l?b?b?b!", 1), ("?b?b", 2)]);
        let donor = Multiset::from_iter([("爱", 1), ("a爱", 1), ("é", 1)]);
        let output = shuffle_map(&input, MaskClasses::all(), &donor);

        assert_eq!(output.get("i爱u"), Some(3));
        assert_eq!(output.get("a爱!"), Some(1));
        assert_eq!(output.get("é"), Some(2));
        assert_eq!(output.len(), 3);
    }

    #[test]
    fn test_remove_masked_characters() {
        let input = Multiset::from_iter([("pass123", 1), ("1234", 2)]);
        let output = remove_masked_characters(&input, MaskClasses::DIGIT);

        assert_eq!(output.get("pass"), Some(1));
        assert_eq!(output.get(""), Some(2));
    }

    #[test]
    fn test_remove_masked_multibyte_residue() {
        let lb = MaskClasses::LOWER | MaskClasses::MULTIBYTE;
        let input = Multiset::from_iter([("a爱", 1), ("é1", 2)]);
        let output = remove_masked_characters(&input, lb);

        assert_eq!(output.get("?b?b?b"), Some(1));
        assert_eq!(output.get("?b?b1"), Some(2));
        assert_eq!(output.len(), 2);

        // Without `b` the multibyte text stays literal
        let output = remove_masked_characters(&input, MaskClasses::LOWER);
        assert_eq!(output.get("爱"), Some(1));
        assert_eq!(output.get("é1"), Some(2));
    }

    #[test]
    fn test_literal_question_mark_needs_special() {
        assert_eq!(make_masked_string("?l1", MaskClasses::DIGIT), "?l?d");
        assert_eq!(make_masked_string("?l1", MaskClasses::DIGIT | MaskClasses::SPECIAL), "?sl?d");
    }

    #[test]
    fn test_keyspace() {
        assert_eq!(calculate_keyspace("?l?u?d?s?b"), 26 + 26 + 10 + 33 + 256);
        assert_eq!(calculate_keyspace("pass?d?d"), 4 + 20);
        assert_eq!(calculate_keyspace(""), 0);
    }

    #[test]
    fn test_mask_complexity() {
        assert_eq!(super::test_mask_complexity("?l?l?l"), 1);
        assert_eq!(super::test_mask_complexity("?u?l?d?s"), 4);
        assert_eq!(super::test_mask_complexity("pass?d"), 2);
        assert_eq!(super::test_mask_complexity("?l?u?d?s?b!x"), 5);
        assert_eq!(super::test_mask_complexity(""), 0);
    }

    #[test]
    fn test_full_mask() {
        assert!(is_mask_a_full_mask("?l?u?d"));
        assert!(!is_mask_a_full_mask("?lx?d"));
        assert!(!is_mask_a_full_mask("?x"));
        assert!(!is_mask_a_full_mask(""));
    }

    #[test]
    fn test_literal_question_mark() {
        let segments = mask_segments("??l?");
        assert_eq!(
            segments,
            vec![
                (0, MaskSegment::Literal('?')),
                (1, MaskSegment::Token(CharClass::Lower)),
                (3, MaskSegment::Literal('?')),
            ]
        );
    }
}
