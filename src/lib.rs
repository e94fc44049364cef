//! # Wordlist Transform
//!
//! Password-analysis transformation pipeline over frequency maps of strings.
//!
//! ## Features
//!
//! - **Masks**: Hashcat-style masks per character class, with retain/match
//!   filters, boundary splitting, donor-based fuzzy swapping and mask metrics
//! - **Rules**: Append, prepend, insert, overwrite and toggle rule programs
//! - **Codecs**: URL, HTML, `\uXXXX` and `$HEX[...]` encoding and decoding
//! - **Text utilities**: Reversal, splitting, replacement, substrings,
//!   n-grams and passphrase recombination
//! - **Filters**: Retain/remove lists, frequency, length, regex, keyspace,
//!   complexity and top-N
//! - **Templates**: JSON step lists with per-step overrides
//!
//! ## Usage
//!
//! ```bash
//! # Masks of every password, most common first
//! wordlist-transform -i leaked.txt -t mask -v
//!
//! # Insert rules for positions 0 to 3
//! wordlist-transform -i leaked.txt -t insert --index 0-3
//! ```
//!
//! ## Example
//!
//! ```rust
//! use wordlist_transform::{transform, Multiset, TransformContext};
//!
//! let input = Multiset::from_iter([("Pass123", 2), ("word99", 1)]);
//! let masks = transform(&input, "mask", &TransformContext::default(), None).unwrap();
//!
//! assert_eq!(masks.get("?u?l?l?l?d?d?d"), Some(2));
//! ```

pub mod cli;
pub mod codec;
pub mod encoding;
pub mod error;
pub mod filter;
pub mod mask;
pub mod multiset;
pub mod output;
pub mod processor;
pub mod progress;
pub mod rules;
pub mod template;
pub mod text;
pub mod transform;

pub use cli::Args;
pub use error::{Result, TransformError};
pub use multiset::{combine_maps, Multiset};
pub use processor::{Processor, ProcessorConfig};
pub use transform::{transform, IndexRange, TransformContext, Transformation};
