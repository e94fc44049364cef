//! Rule synthesis
//!
//! Turns candidate strings into programs for the hashcat-style rule engine:
//! append (`$c`), prepend (`^c`), insert (`iPc`), overwrite (`oPc`), toggle
//! (`TP`) and the delete-last / delete-first prefixes (`]` / `[`).
//!
//! The rule engine is byte-addressed, so every opcode consumes one byte of
//! the input. Bytes outside ASCII are written as `\xHH` and each takes its
//! own position index.

use crate::multiset::Multiset;
use crate::transform::IndexRange;

/// Longest rule program (exclusive) the target engine accepts
pub const DEFAULT_MAX_RULE_LENGTH: usize = 93;

/// Highest position expressible with a single position character
pub const MAX_POSITION: usize = 35;

/// Rule opcodes emitted by the synthesizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOp {
    Append,
    Prepend,
    Insert,
    Overwrite,
    Toggle,
    DeleteLast,
    DeleteFirst,
}

impl RuleOp {
    pub fn symbol(self) -> char {
        match self {
            RuleOp::Append => '$',
            RuleOp::Prepend => '^',
            RuleOp::Insert => 'i',
            RuleOp::Overwrite => 'o',
            RuleOp::Toggle => 'T',
            RuleOp::DeleteLast => ']',
            RuleOp::DeleteFirst => '[',
        }
    }
}

/// Base-36 position character: `0`-`9` then `A`-`Z`
#[inline]
pub fn position_char(position: usize) -> Option<char> {
    match position {
        0..=9 => Some((b'0' + position as u8) as char),
        10..=MAX_POSITION => Some((b'A' + (position - 10) as u8) as char),
        _ => None,
    }
}

/// Render one byte as a rule argument
fn push_byte_arg(opcode: &mut String, byte: u8) {
    if byte.is_ascii() {
        opcode.push(byte as char);
    } else {
        opcode.push_str("\\x");
        opcode.push_str(&hex::encode_upper([byte]));
    }
}

/// One `op c` opcode per byte; prepend consumes the bytes in reverse
pub fn char_to_rule(s: &str, op: RuleOp) -> Vec<String> {
    let bytes: Box<dyn Iterator<Item = u8>> = if op == RuleOp::Prepend {
        Box::new(s.bytes().rev())
    } else {
        Box::new(s.bytes())
    };

    bytes
        .map(|byte| {
            let mut opcode = String::with_capacity(5);
            opcode.push(op.symbol());
            push_byte_arg(&mut opcode, byte);
            opcode
        })
        .collect()
}

/// `op` repeated once per byte of `s`
pub fn len_to_rule(s: &str, op: RuleOp) -> Vec<String> {
    vec![op.symbol().to_string(); s.len()]
}

/// `op P c` per byte, with positions counting up from `base`
///
/// Returns `None` when a position would exceed [`MAX_POSITION`].
pub fn char_to_iterating_rule(s: &str, op: RuleOp, base: usize) -> Option<Vec<String>> {
    s.bytes()
        .enumerate()
        .map(|(offset, byte)| {
            let position = position_char(base + offset)?;
            let mut opcode = String::with_capacity(6);
            opcode.push(op.symbol());
            opcode.push(position);
            push_byte_arg(&mut opcode, byte);
            Some(opcode)
        })
        .collect()
}

/// `op P` for every uppercase byte, with positions counting up from `base`
pub fn string_to_toggle_rule(s: &str, op: RuleOp, base: usize) -> Option<Vec<String>> {
    s.bytes()
        .enumerate()
        .filter(|(_, byte)| byte.is_ascii_uppercase())
        .map(|(offset, _)| {
            let position = position_char(base + offset)?;
            Some(format!("{}{}", op.symbol(), position))
        })
        .collect()
}

/// Join opcodes into a rule program
///
/// A final append-space opcode `$ ` has its space replaced with `:`. Any
/// other program ending in a space argument gets a trailing `:` so the space
/// survives whitespace trimming. Programs of `max_length` bytes or more are
/// dropped.
pub fn format_rule_program(opcodes: &[String], max_length: usize) -> Option<String> {
    if opcodes.is_empty() {
        return None;
    }

    let mut program = opcodes.join(" ");
    if program.ends_with(' ') {
        if opcodes.last().is_some_and(|op| op == "$ ") {
            program.pop();
        }
        program.push(':');
    }

    (program.len() < max_length).then_some(program)
}

fn synthesize<F>(input: &Multiset, max_length: usize, mut build: F) -> Multiset
where
    F: FnMut(&str) -> Option<Vec<String>>,
{
    let mut output = Multiset::with_capacity(input.len());
    for (key, &count) in input {
        if let Some(program) = build(key).and_then(|ops| format_rule_program(&ops, max_length)) {
            output.add(program, count);
        }
    }
    output
}

/// `$c` programs appending each key
pub fn append_rules(input: &Multiset, max_length: usize) -> Multiset {
    synthesize(input, max_length, |key| Some(char_to_rule(key, RuleOp::Append)))
}

/// `]` per byte, then `$c` programs: replace the tail with each key
pub fn append_remove_rules(input: &Multiset, max_length: usize) -> Multiset {
    synthesize(input, max_length, |key| {
        let mut ops = len_to_rule(key, RuleOp::DeleteLast);
        ops.extend(char_to_rule(key, RuleOp::Append));
        Some(ops)
    })
}

/// `^c` programs prepending each key
pub fn prepend_rules(input: &Multiset, max_length: usize) -> Multiset {
    synthesize(input, max_length, |key| Some(char_to_rule(key, RuleOp::Prepend)))
}

/// `[` per byte, then `^c` programs: replace the head with each key
pub fn prepend_remove_rules(input: &Multiset, max_length: usize) -> Multiset {
    synthesize(input, max_length, |key| {
        let mut ops = len_to_rule(key, RuleOp::DeleteFirst);
        ops.extend(char_to_rule(key, RuleOp::Prepend));
        Some(ops)
    })
}

fn positional_rules(input: &Multiset, op: RuleOp, range: IndexRange, max_length: usize) -> Multiset {
    let mut output = Multiset::new();
    for base in range.iter() {
        let programs = synthesize(input, max_length, |key| match op {
            RuleOp::Toggle => string_to_toggle_rule(key, op, base),
            _ => char_to_iterating_rule(key, op, base),
        });
        output.merge(&programs);
    }
    output
}

/// `iPc` programs inserting each key at every start position in `range`
pub fn insert_rules(input: &Multiset, range: IndexRange, max_length: usize) -> Multiset {
    positional_rules(input, RuleOp::Insert, range, max_length)
}

/// `oPc` programs overwriting with each key at every start position in `range`
pub fn overwrite_rules(input: &Multiset, range: IndexRange, max_length: usize) -> Multiset {
    positional_rules(input, RuleOp::Overwrite, range, max_length)
}

/// `TP` programs reproducing each key's uppercase positions, offset by `range`
pub fn toggle_rules(input: &Multiset, range: IndexRange, max_length: usize) -> Multiset {
    positional_rules(input, RuleOp::Toggle, range, max_length)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(&str, u64)]) -> Multiset {
        pairs.iter().map(|&(k, v)| (k, v)).collect()
    }

    #[test]
    fn test_position_char() {
        assert_eq!(position_char(0), Some('0'));
        assert_eq!(position_char(9), Some('9'));
        assert_eq!(position_char(10), Some('A'));
        assert_eq!(position_char(35), Some('Z'));
        assert_eq!(position_char(36), None);
    }

    #[test]
    fn test_append_rules() {
        let output = append_rules(&set(&[("abc", 1), ("efg", 2)]), DEFAULT_MAX_RULE_LENGTH);
        assert_eq!(output, set(&[("$a $b $c", 1), ("$e $f $g", 2)]));
    }

    #[test]
    fn test_prepend_rules_reverse() {
        let output = prepend_rules(&set(&[("abc", 1)]), DEFAULT_MAX_RULE_LENGTH);
        assert_eq!(output, set(&[("^c ^b ^a", 1)]));
    }

    #[test]
    fn test_prepend_multibyte() {
        let output = prepend_rules(&set(&[("爱test", 1)]), DEFAULT_MAX_RULE_LENGTH);
        assert_eq!(output.get(r"^t ^s ^e ^t ^\xB1 ^\x88 ^\xE7"), Some(1));
    }

    #[test]
    fn test_append_multibyte() {
        let ops = char_to_rule("a爱", RuleOp::Append);
        assert_eq!(ops, vec!["$a", r"$\xE7", r"$\x88", r"$\xB1"]);
    }

    #[test]
    fn test_remove_variants() {
        let output = append_remove_rules(&set(&[("abc", 1)]), DEFAULT_MAX_RULE_LENGTH);
        assert_eq!(output.get("] ] ] $a $b $c"), Some(1));

        let output = prepend_remove_rules(&set(&[("abc", 1)]), DEFAULT_MAX_RULE_LENGTH);
        assert_eq!(output.get("[ [ [ ^c ^b ^a"), Some(1));
    }

    #[test]
    fn test_insert_range() {
        let output = insert_rules(
            &set(&[("abc", 1)]),
            IndexRange::new(6, 8).unwrap(),
            DEFAULT_MAX_RULE_LENGTH,
        );
        assert_eq!(
            output,
            set(&[("i6a i7b i8c", 1), ("i7a i8b i9c", 1), ("i8a i9b iAc", 1)])
        );
    }

    #[test]
    fn test_overwrite_multibyte_positions() {
        let output = overwrite_rules(
            &set(&[("a爱", 1)]),
            IndexRange::new(0, 0).unwrap(),
            DEFAULT_MAX_RULE_LENGTH,
        );
        assert_eq!(output.get(r"o0a o1\xE7 o2\x88 o3\xB1"), Some(1));
    }

    #[test]
    fn test_positions_past_z_dropped() {
        let output = insert_rules(
            &set(&[("abc", 1)]),
            IndexRange::new(33, 34).unwrap(),
            DEFAULT_MAX_RULE_LENGTH,
        );
        assert_eq!(output, set(&[("iXa iYb iZc", 1)]));
    }

    #[test]
    fn test_toggle_rules() {
        let output = toggle_rules(
            &set(&[("aBc", 1), ("EfG", 2), ("lower", 3)]),
            IndexRange::new(0, 0).unwrap(),
            DEFAULT_MAX_RULE_LENGTH,
        );
        assert_eq!(output, set(&[("T1", 1), ("T0 T2", 2)]));
    }

    #[test]
    fn test_trailing_space_argument() {
        let output = append_rules(&set(&[("a ", 1)]), DEFAULT_MAX_RULE_LENGTH);
        assert_eq!(output.get("$a $:"), Some(1));
        assert_eq!(output.len(), 1);

        let output = append_remove_rules(&set(&[(" ", 1)]), DEFAULT_MAX_RULE_LENGTH);
        assert_eq!(output.get("] $:"), Some(1));

        let output = prepend_rules(&set(&[(" a", 1)]), DEFAULT_MAX_RULE_LENGTH);
        assert_eq!(output.get("^a ^ :"), Some(1));

        let output = insert_rules(&set(&[("a ", 1)]), IndexRange::new(2, 2).unwrap(), DEFAULT_MAX_RULE_LENGTH);
        assert_eq!(output.get("i2a i3 :"), Some(1));

        let output = overwrite_rules(&set(&[(" ", 1)]), IndexRange::new(0, 0).unwrap(), DEFAULT_MAX_RULE_LENGTH);
        assert_eq!(output.get("o0 :"), Some(1));
    }

    #[test]
    fn test_length_cap() {
        // 31 opcodes of 2 bytes plus 30 spaces = 92 bytes
        let fits = "a".repeat(31);
        assert_eq!(append_rules(&set(&[(fits.as_str(), 1)]), DEFAULT_MAX_RULE_LENGTH).len(), 1);

        let too_long = "a".repeat(32);
        assert!(append_rules(&set(&[(too_long.as_str(), 1)]), DEFAULT_MAX_RULE_LENGTH).is_empty());
    }
}
