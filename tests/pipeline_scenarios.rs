//! End-to-end pipeline scenarios driven through the mode dispatcher

use wordlist_transform::codec::{ascii_escape_unicode, dehex_map};
use wordlist_transform::filter::retain_remove;
use wordlist_transform::mask::MaskClasses;
use wordlist_transform::{transform, IndexRange, Multiset, TransformContext, TransformError};

fn run(input: &Multiset, mode: &str, ctx: &TransformContext) -> Multiset {
    transform(input, mode, ctx, None).unwrap()
}

fn with_range(start: usize, end: usize) -> TransformContext {
    TransformContext {
        index_range: IndexRange::new(start, end).unwrap(),
        ..TransformContext::default()
    }
}

#[test]
fn masking() {
    let input = Multiset::from_iter([("abc", 1), ("ABC", 2), ("ABCabc123!!!", 3)]);
    let output = run(&input, "mask", &TransformContext::default());

    assert_eq!(
        output,
        Multiset::from_iter([("?l?l?l", 1), ("?u?u?u", 2), ("?u?u?u?l?l?l?d?d?d?s?s?s", 3)])
    );
}

#[test]
fn hex_round_trip() {
    let input = Multiset::from_iter([("love", 1), ("world", 2), ("hello", 3)]);
    let encoded = run(&input, "hex", &TransformContext::default());

    assert_eq!(
        encoded,
        Multiset::from_iter([
            ("$HEX[6c6f7665]", 1),
            ("$HEX[776f726c64]", 2),
            ("$HEX[68656c6c6f]", 3),
        ])
    );
    assert_eq!(dehex_map(&encoded), input);
}

#[test]
fn append_rule_synthesis() {
    let input = Multiset::from_iter([("abc", 1), ("efg", 2)]);
    let output = run(&input, "append", &TransformContext::default());

    assert_eq!(output, Multiset::from_iter([("$a $b $c", 1), ("$e $f $g", 2)]));
}

#[test]
fn prepend_with_multibyte() {
    let input = Multiset::from_iter([("爱test", 1)]);
    let output = run(&input, "prepend", &TransformContext::default());

    assert_eq!(output.get(r"^t ^s ^e ^t ^\xB1 ^\x88 ^\xE7"), Some(1));
}

#[test]
fn insert_range() {
    let input = Multiset::from_iter([("abc", 1)]);
    let output = run(&input, "insert", &with_range(6, 8));

    assert_eq!(
        output,
        Multiset::from_iter([("i6a i7b i8c", 1), ("i7a i8b i9c", 1), ("i8a i9b iAc", 1)])
    );
}

#[test]
fn toggle() {
    let input = Multiset::from_iter([("aBc", 1), ("EfG", 2)]);
    let output = run(&input, "toggle", &with_range(0, 0));

    assert_eq!(output, Multiset::from_iter([("T1", 1), ("T0 T2", 2)]));
}

#[test]
fn boundary_split() {
    let input = Multiset::from_iter([("abc123", 1), ("ABC", 2), ("ABCabc123!!!", 3)]);
    let output = run(&input, "boundary-split", &TransformContext::default());

    assert_eq!(
        output,
        Multiset::from_iter([("!!!", 1), ("ABC", 2), ("abc", 2), ("123", 2)])
    );
    assert_eq!(run(&input, "mask-pop", &TransformContext::default()), output);
}

#[test]
fn unicode_escape() {
    assert_eq!(ascii_escape_unicode("a爱test"), "a\\u7231test");
}

#[test]
fn retain_remove_emptiness() {
    let input = Multiset::from_iter([("a", 1), ("b", 2)]);
    let remove = Multiset::from_iter([("a", 1), ("b", 2)]);
    let err = retain_remove(&input, &Multiset::new(), &remove).unwrap_err();

    assert!(matches!(err, TransformError::EmptyResult));
}

#[test]
fn mask_with_partial_classes() {
    let input = Multiset::from_iter([("Pass12!", 4)]);
    let ctx = TransformContext {
        classes: MaskClasses::DIGIT | MaskClasses::SPECIAL,
        ..TransformContext::default()
    };

    assert_eq!(run(&input, "mask", &ctx), Multiset::from_iter([("Pass?d?d?s", 4)]));
}

#[test]
fn donor_modes_require_donor() {
    let input = Multiset::from_iter([("abc", 1)]);
    for mode in ["retain-mask", "match-mask", "fuzzy-swap", "replace-all"] {
        let err = transform(&input, mode, &TransformContext::default(), None).unwrap_err();
        assert!(matches!(err, TransformError::MissingDonor { .. }), "mode {}", mode);
    }
}

#[test]
fn unknown_mode_is_empty() {
    let input = Multiset::from_iter([("abc", 1)]);
    assert!(run(&input, "no-such-mode", &TransformContext::default()).is_empty());
}

#[test]
fn chained_stages_do_not_mutate_input() {
    let input = Multiset::from_iter([("Summer2024!", 3), ("summer2024", 1)]);
    let before = input.clone();
    let ctx = TransformContext::default();

    let masks = run(&input, "mask", &ctx);
    let rules = run(&input, "append", &ctx);

    assert_eq!(input, before);
    assert_eq!(masks.total(), 4);
    assert_eq!(rules.len(), 2);
}
