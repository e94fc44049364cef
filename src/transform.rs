//! Transformation dispatcher
//!
//! A [`Transformation`] is a tagged pipeline stage built from a mode name and
//! the run's [`TransformContext`]. Stages never mutate their input; each
//! call allocates a fresh output [`Multiset`].

use crate::codec;
use crate::error::{Result, TransformError};
use crate::mask::{self, MaskClasses};
use crate::multiset::Multiset;
use crate::rules::{self, DEFAULT_MAX_RULE_LENGTH};
use crate::text::{self, ReplacePair};
use log::{debug, warn};
use std::fmt;
use std::ops::RangeInclusive;

/// Inclusive range of positions, indices or word counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRange {
    pub start: usize,
    pub end: usize,
}

impl IndexRange {
    pub fn new(start: usize, end: usize) -> Result<Self> {
        if start > end {
            return Err(TransformError::InvalidArgument(format!(
                "invalid range: start ({}) must be <= end ({})",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Range containing a single value
    pub fn single(value: usize) -> Self {
        Self { start: value, end: value }
    }

    /// Parse `N` or `START-END`
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        let parse_bound = |part: &str| {
            part.trim().parse::<usize>().map_err(|_| {
                TransformError::InvalidArgument(format!("invalid range value '{}' in '{}'", part, text))
            })
        };

        match text.split_once('-') {
            Some((start, end)) => Self::new(parse_bound(start)?, parse_bound(end)?),
            None => Ok(Self::single(parse_bound(text)?)),
        }
    }

    pub fn iter(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    pub fn contains(&self, value: usize) -> bool {
        self.start <= value && value <= self.end
    }
}

impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Read-only configuration shared by every stage of one run
#[derive(Debug, Clone)]
pub struct TransformContext {
    /// Log per-stage details
    pub debug: bool,
    /// Classes masked by the mask-engine modes
    pub classes: MaskClasses,
    /// Positions for insert/overwrite/toggle and the substring range
    pub index_range: IndexRange,
    /// Word counts for n-gram and passphrase modes
    pub word_range: IndexRange,
    /// Separator for split mode
    pub separator: String,
    /// Rule programs this long or longer are dropped
    pub max_rule_length: usize,
}

impl Default for TransformContext {
    fn default() -> Self {
        Self {
            debug: false,
            classes: MaskClasses::LOWER | MaskClasses::UPPER | MaskClasses::DIGIT | MaskClasses::SPECIAL,
            index_range: IndexRange::single(0),
            word_range: IndexRange { start: 1, end: 3 },
            separator: " ".to_string(),
            max_rule_length: DEFAULT_MAX_RULE_LENGTH,
        }
    }
}

/// Mode names accepted by [`Transformation::from_mode`]
pub const MODES: &[&str] = &[
    "append",
    "append-remove",
    "prepend",
    "prepend-remove",
    "insert",
    "overwrite",
    "toggle",
    "mask",
    "retain-mask",
    "match-mask",
    "boundary-split",
    "mask-pop",
    "fuzzy-swap",
    "mask-swap",
    "remove",
    "mask-remove",
    "encode",
    "decode",
    "hex",
    "dehex",
    "reverse",
    "split",
    "replace-first",
    "replace-all",
    "substring",
    "ngram",
    "passphrase",
];

/// One pipeline stage
#[derive(Debug, Clone)]
pub enum Transformation {
    Append,
    AppendRemove,
    Prepend,
    PrependRemove,
    Insert(IndexRange),
    Overwrite(IndexRange),
    Toggle(IndexRange),
    Mask(MaskClasses),
    RetainMask { classes: MaskClasses, donor: Multiset },
    MatchMask { classes: MaskClasses, donor: Multiset },
    BoundarySplit(MaskClasses),
    FuzzySwap { classes: MaskClasses, donor: Multiset },
    Remove(MaskClasses),
    Encode,
    Decode,
    Hex,
    Dehex,
    Reverse,
    Split(String),
    ReplaceFirst(Vec<ReplacePair>),
    ReplaceAll(Vec<ReplacePair>),
    Substring(IndexRange),
    Ngram(IndexRange),
    Passphrase(IndexRange),
}

impl Transformation {
    /// Build the stage for a mode name
    ///
    /// Returns `Ok(None)` for an unknown mode and `MissingDonor` when a
    /// donor-consuming mode has no donor.
    pub fn from_mode(mode: &str, ctx: &TransformContext, donor: Option<&Multiset>) -> Result<Option<Self>> {
        let require_donor = || {
            donor.cloned().ok_or_else(|| TransformError::MissingDonor {
                mode: mode.to_string(),
            })
        };
        let classes = ctx.classes;

        let stage = match mode {
            "append" => Self::Append,
            "append-remove" => Self::AppendRemove,
            "prepend" => Self::Prepend,
            "prepend-remove" => Self::PrependRemove,
            "insert" => Self::Insert(ctx.index_range),
            "overwrite" => Self::Overwrite(ctx.index_range),
            "toggle" => Self::Toggle(ctx.index_range),
            "mask" => Self::Mask(classes),
            "retain-mask" => Self::RetainMask { classes, donor: require_donor()? },
            "match-mask" => Self::MatchMask { classes, donor: require_donor()? },
            "boundary-split" | "mask-pop" => Self::BoundarySplit(classes),
            "fuzzy-swap" | "mask-swap" => Self::FuzzySwap { classes, donor: require_donor()? },
            "remove" | "mask-remove" => Self::Remove(classes),
            "encode" => Self::Encode,
            "decode" => Self::Decode,
            "hex" => Self::Hex,
            "dehex" => Self::Dehex,
            "reverse" => Self::Reverse,
            "split" => Self::Split(ctx.separator.clone()),
            "replace-first" => Self::ReplaceFirst(text::parse_replacements(&require_donor()?)),
            "replace-all" => Self::ReplaceAll(text::parse_replacements(&require_donor()?)),
            "substring" => Self::Substring(ctx.index_range),
            "ngram" => Self::Ngram(ctx.word_range),
            "passphrase" => Self::Passphrase(ctx.word_range),
            _ => return Ok(None),
        };

        Ok(Some(stage))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::AppendRemove => "append-remove",
            Self::Prepend => "prepend",
            Self::PrependRemove => "prepend-remove",
            Self::Insert(_) => "insert",
            Self::Overwrite(_) => "overwrite",
            Self::Toggle(_) => "toggle",
            Self::Mask(_) => "mask",
            Self::RetainMask { .. } => "retain-mask",
            Self::MatchMask { .. } => "match-mask",
            Self::BoundarySplit(_) => "boundary-split",
            Self::FuzzySwap { .. } => "fuzzy-swap",
            Self::Remove(_) => "remove",
            Self::Encode => "encode",
            Self::Decode => "decode",
            Self::Hex => "hex",
            Self::Dehex => "dehex",
            Self::Reverse => "reverse",
            Self::Split(_) => "split",
            Self::ReplaceFirst(_) => "replace-first",
            Self::ReplaceAll(_) => "replace-all",
            Self::Substring(_) => "substring",
            Self::Ngram(_) => "ngram",
            Self::Passphrase(_) => "passphrase",
        }
    }

    /// Run the stage over `input`
    pub fn apply(&self, input: &Multiset, ctx: &TransformContext) -> Multiset {
        let max = ctx.max_rule_length;

        match self {
            Self::Append => rules::append_rules(input, max),
            Self::AppendRemove => rules::append_remove_rules(input, max),
            Self::Prepend => rules::prepend_rules(input, max),
            Self::PrependRemove => rules::prepend_remove_rules(input, max),
            Self::Insert(range) => rules::insert_rules(input, *range, max),
            Self::Overwrite(range) => rules::overwrite_rules(input, *range, max),
            Self::Toggle(range) => rules::toggle_rules(input, *range, max),
            Self::Mask(classes) => mask::make_masked_map(input, *classes),
            Self::RetainMask { classes, donor } => mask::make_retain_masked_map(input, *classes, donor),
            Self::MatchMask { classes, donor } => mask::make_matched_masked_map(input, *classes, donor),
            Self::BoundarySplit(classes) => mask::boundary_split_pop_map(input, *classes),
            Self::FuzzySwap { classes, donor } => mask::shuffle_map(input, *classes, donor),
            Self::Remove(classes) => mask::remove_masked_characters(input, *classes),
            Self::Encode => codec::encode_input_map(input),
            Self::Decode => codec::decode_input_map(input),
            Self::Hex => codec::hex_encode_map(input),
            Self::Dehex => codec::dehex_map(input),
            Self::Reverse => text::reverse_map(input),
            Self::Split(separator) => text::split_map(input, separator),
            Self::ReplaceFirst(pairs) => text::replace_first_map(input, pairs),
            Self::ReplaceAll(pairs) => text::replace_all_map(input, pairs),
            Self::Substring(range) => text::substring_map(input, *range),
            Self::Ngram(range) => text::ngram_map(input, *range),
            Self::Passphrase(range) => text::passphrase_map(input, *range),
        }
    }
}

/// Route `input` through the named mode
///
/// Unknown modes yield an empty multiset.
pub fn transform(input: &Multiset, mode: &str, ctx: &TransformContext, donor: Option<&Multiset>) -> Result<Multiset> {
    let Some(stage) = Transformation::from_mode(mode, ctx, donor)? else {
        warn!("Unknown transformation mode '{}'", mode);
        return Ok(Multiset::new());
    };

    let output = stage.apply(input, ctx);

    if ctx.debug {
        debug!(
            "[{}] {} keys ({} total) -> {} keys ({} total)",
            stage.name(),
            input.len(),
            input.total(),
            output.len(),
            output.total()
        );
        for (key, count) in output.sorted().into_iter().take(10) {
            debug!("[{}]   {} {}", stage.name(), count, key);
        }
    }

    Ok(output)
}
