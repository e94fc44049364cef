//! Encoders and decoders
//!
//! URL percent-encoding, HTML entities, `\uXXXX` escapes and the
//! `$HEX[...]` wrapper used by cracking tools for non-printable candidates.
//! Decoders return `None` when a key cannot be decoded; map operators drop
//! such keys silently, except that hex literals holding non-UTF-8 bytes stay
//! wrapped.

use crate::multiset::Multiset;
use regex::Regex;
use std::sync::LazyLock;

static HTML_ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#([0-9]{1,7})|#[xX]([0-9a-fA-F]{1,6})|(amp|lt|gt|quot|apos));")
        .expect("html entity regex")
});

static UNICODE_ESCAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\u([0-9a-fA-F]{4})").expect("unicode escape regex"));

const HEX_PREFIX: &str = "$HEX[";
const HEX_SUFFIX: &str = "]";

/// Percent-encode every byte outside the RFC 3986 unreserved set
pub fn url_encode(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len() * 3);
    for byte in s.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~') {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    encoded
}

/// Decode `%HH` sequences; a `%` not followed by two hex digits is literal
pub fn url_decode(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                decoded.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8(decoded).ok()
}

fn hex_value(digit: u8) -> Option<u8> {
    (digit as char).to_digit(16).map(|v| v as u8)
}

/// Escape the five HTML special characters
pub fn html_encode(s: &str) -> String {
    let mut encoded = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => encoded.push_str("&amp;"),
            '<' => encoded.push_str("&lt;"),
            '>' => encoded.push_str("&gt;"),
            '"' => encoded.push_str("&quot;"),
            '\'' => encoded.push_str("&#39;"),
            _ => encoded.push(c),
        }
    }
    encoded
}

/// Decode named and numeric HTML entities
///
/// Unknown entities stay literal. A numeric entity naming an invalid code
/// point makes the whole key undecodable.
pub fn html_decode(s: &str) -> Option<String> {
    let mut decoded = String::with_capacity(s.len());
    let mut last = 0;

    for caps in HTML_ENTITY_RE.captures_iter(s) {
        let whole = caps.get(0)?;
        decoded.push_str(&s[last..whole.start()]);

        let c = if let Some(dec) = caps.get(1) {
            char::from_u32(dec.as_str().parse().ok()?)?
        } else if let Some(hex) = caps.get(2) {
            char::from_u32(u32::from_str_radix(hex.as_str(), 16).ok()?)?
        } else {
            match caps.get(3)?.as_str() {
                "amp" => '&',
                "lt" => '<',
                "gt" => '>',
                "quot" => '"',
                _ => '\'',
            }
        };

        decoded.push(c);
        last = whole.end();
    }

    decoded.push_str(&s[last..]);
    Some(decoded)
}

/// Escape every code point above 0x7F as `\uXXXX`
///
/// Code points outside the basic multilingual plane become a surrogate pair
/// of two escapes.
pub fn ascii_escape_unicode(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    let mut units = [0u16; 2];

    for c in s.chars() {
        if c.is_ascii() {
            escaped.push(c);
            continue;
        }
        for unit in c.encode_utf16(&mut units) {
            escaped.push_str(&format!("\\u{:04x}", unit));
        }
    }

    escaped
}

/// Reverse [`ascii_escape_unicode`]
///
/// Surrogate pairs must appear as two adjacent escapes; a lone surrogate
/// makes the key undecodable.
pub fn unescape_unicode(s: &str) -> Option<String> {
    let mut decoded = String::with_capacity(s.len());
    let mut last = 0;
    let mut pending_high: Option<(u16, usize)> = None;

    for caps in UNICODE_ESCAPE_RE.captures_iter(s) {
        let whole = caps.get(0)?;
        let unit = u16::from_str_radix(&caps[1], 16).ok()?;

        if let Some((high, end)) = pending_high.take() {
            if end != whole.start() || !(0xDC00..=0xDFFF).contains(&unit) {
                return None;
            }
            let code = 0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(unit) - 0xDC00);
            decoded.push(char::from_u32(code)?);
            last = whole.end();
            continue;
        }

        decoded.push_str(&s[last..whole.start()]);
        match unit {
            0xD800..=0xDBFF => pending_high = Some((unit, whole.end())),
            0xDC00..=0xDFFF => return None,
            _ => decoded.push(char::from_u32(u32::from(unit))?),
        }
        last = whole.end();
    }

    if pending_high.is_some() {
        return None;
    }

    decoded.push_str(&s[last..]);
    Some(decoded)
}

/// Wrap a key's bytes as `$HEX[...]` with lowercase digits
pub fn hex_encode(s: &str) -> String {
    hex_encode_bytes(s.as_bytes())
}

/// Wrap raw bytes as `$HEX[...]` with lowercase digits
pub fn hex_encode_bytes(bytes: &[u8]) -> String {
    format!("{}{}{}", HEX_PREFIX, hex::encode(bytes), HEX_SUFFIX)
}

/// True for a well-formed `$HEX[...]` literal
pub fn is_hex_wrapped(s: &str) -> bool {
    s.strip_prefix(HEX_PREFIX)
        .and_then(|rest| rest.strip_suffix(HEX_SUFFIX))
        .is_some_and(|digits| digits.len() % 2 == 0 && digits.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Bytes named by a `$HEX[...]` literal
pub fn hex_decode_bytes(s: &str) -> Option<Vec<u8>> {
    if !is_hex_wrapped(s) {
        return None;
    }
    let digits = &s[HEX_PREFIX.len()..s.len() - HEX_SUFFIX.len()];
    hex::decode(digits).ok()
}

/// Strip the `$HEX[...]` wrapper and decode the digits as UTF-8
pub fn hex_decode(s: &str) -> Option<String> {
    String::from_utf8(hex_decode_bytes(s)?).ok()
}

/// Add each distinct result that differs from the source key
fn add_variants(output: &mut Multiset, key: &str, count: u64, variants: impl IntoIterator<Item = String>) {
    let mut seen: Vec<String> = Vec::with_capacity(3);
    for variant in variants {
        if variant != key && !seen.contains(&variant) {
            seen.push(variant);
        }
    }
    for variant in seen {
        output.add(variant, count);
    }
}

/// URL, HTML and Unicode-escape encodings of every key
pub fn encode_input_map(input: &Multiset) -> Multiset {
    let mut output = Multiset::new();
    for (key, &count) in input {
        let variants = [url_encode(key), html_encode(key), ascii_escape_unicode(key)];
        add_variants(&mut output, key, count, variants);
    }
    output
}

/// URL, HTML and Unicode-escape decodings of every key
pub fn decode_input_map(input: &Multiset) -> Multiset {
    let mut output = Multiset::new();
    for (key, &count) in input {
        let variants = [url_decode(key), html_decode(key), unescape_unicode(key)];
        add_variants(&mut output, key, count, variants.into_iter().flatten());
    }
    output
}

/// `$HEX[...]` form of every key
pub fn hex_encode_map(input: &Multiset) -> Multiset {
    let mut output = Multiset::with_capacity(input.len());
    for (key, &count) in input {
        output.add(hex_encode(key), count);
    }
    output
}

/// Decoded form of every `$HEX[...]` key; anything else is dropped
///
/// Literals whose bytes are not UTF-8 cannot become a plain key. They are
/// kept wrapped, normalized to lowercase digits.
pub fn dehex_map(input: &Multiset) -> Multiset {
    let mut output = Multiset::with_capacity(input.len());
    for (key, &count) in input {
        let Some(bytes) = hex_decode_bytes(key) else {
            continue;
        };
        match String::from_utf8(bytes) {
            Ok(decoded) => add_variants(&mut output, key, count, [decoded]),
            Err(e) => output.add(hex_encode_bytes(e.as_bytes()), count),
        }
    }
    output
}
