//! Input decoding module
//!
//! Reads candidate lines from files and stdin, detecting the source encoding
//! and transcoding to UTF-8 before lines are counted into a [`Multiset`].
//! Lines that cannot be decoded are kept byte-exact as `$HEX[...]` literals.

use crate::codec::hex_encode_bytes;
use crate::multiset::Multiset;
use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use encoding_rs_io::DecodeReaderBytesBuilder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Result of encoding detection
#[derive(Debug, Clone)]
pub struct EncodingInfo {
    /// Detected encoding name
    pub name: &'static str,
    /// Confidence level (0.0 - 1.0)
    pub confidence: f32,
    /// The encoding_rs Encoding reference
    pub encoding: &'static Encoding,
}

impl Default for EncodingInfo {
    fn default() -> Self {
        Self {
            name: "UTF-8",
            confidence: 1.0,
            encoding: encoding_rs::UTF_8,
        }
    }
}

/// Detect the encoding of a file by sampling its content
pub fn detect_encoding(path: &Path) -> anyhow::Result<EncodingInfo> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    // Read sample for detection (first 64KB should be enough)
    let mut sample = vec![0u8; 64 * 1024];
    let bytes_read = reader.read(&mut sample)?;
    sample.truncate(bytes_read);

    if bytes_read == 0 {
        return Ok(EncodingInfo::default());
    }

    if let Some(encoding) = detect_bom(&sample) {
        return Ok(EncodingInfo {
            name: encoding.name(),
            confidence: 1.0,
            encoding,
        });
    }

    // Valid UTF-8 wins, allowing a character cut off at the sample boundary
    match std::str::from_utf8(&sample) {
        Ok(_) => return Ok(EncodingInfo::default()),
        Err(e) if e.error_len().is_none() => return Ok(EncodingInfo::default()),
        Err(_) => {}
    }

    let mut detector = EncodingDetector::new();
    detector.feed(&sample, true);
    let encoding = detector.guess(None, true);

    Ok(EncodingInfo {
        name: encoding.name(),
        confidence: 0.8,
        encoding,
    })
}

/// Detect BOM (Byte Order Mark) at the start of content
fn detect_bom(content: &[u8]) -> Option<&'static Encoding> {
    if content.len() >= 3 && content[0..3] == [0xEF, 0xBB, 0xBF] {
        return Some(encoding_rs::UTF_8);
    }
    if content.len() >= 2 {
        if content[0..2] == [0xFE, 0xFF] {
            return Some(encoding_rs::UTF_16BE);
        }
        if content[0..2] == [0xFF, 0xFE] {
            return Some(encoding_rs::UTF_16LE);
        }
    }
    None
}

/// Strip a trailing `\n` and `\r`
#[inline]
fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Decode one line; bytes the encoding cannot represent keep the raw line as a `$HEX[...]` literal
fn decode_line(line: &[u8], encoding: &'static Encoding) -> String {
    if encoding == encoding_rs::UTF_8 {
        return match std::str::from_utf8(line) {
            Ok(s) => s.to_string(),
            Err(_) => hex_encode_bytes(line),
        };
    }

    let (decoded, had_errors) = encoding.decode_without_bom_handling(line);
    if had_errors {
        log::debug!("Undecodable {} line kept as hex literal", encoding.name());
        return hex_encode_bytes(line);
    }
    decoded.into_owned()
}

/// A line iterator over any buffered reader
pub struct EncodedLineIterator<R: BufRead> {
    reader: R,
    encoding: &'static Encoding,
    line_buffer: Vec<u8>,
}

impl<R: BufRead> EncodedLineIterator<R> {
    /// Create with a specific encoding
    pub fn with_encoding(reader: R, encoding: &'static Encoding) -> Self {
        Self {
            reader,
            encoding,
            line_buffer: Vec::with_capacity(4096),
        }
    }

    /// Get the encoding lines are decoded from
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }
}

impl EncodedLineIterator<BufReader<Box<dyn Read>>> {
    /// Lines from any reader, transcoded to UTF-8 when it starts with a BOM
    pub fn from_reader(reader: impl Read + 'static) -> Self {
        let decoder = DecodeReaderBytesBuilder::new().build(reader);
        let boxed: Box<dyn Read> = Box::new(decoder);
        Self::with_encoding(BufReader::with_capacity(64 * 1024, boxed), encoding_rs::UTF_8)
    }
}

impl<R: BufRead> Iterator for EncodedLineIterator<R> {
    type Item = anyhow::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.line_buffer.clear();

        match self.reader.read_until(b'\n', &mut self.line_buffer) {
            Ok(0) => None, // EOF
            Ok(_) => Some(Ok(decode_line(trim_line_ending(&self.line_buffer), self.encoding))),
            Err(e) => Some(Err(e.into())),
        }
    }
}

/// Memory-mapped file reader for large files
pub struct MmapLineIterator {
    mmap: Option<memmap2::Mmap>,
    encoding: &'static Encoding,
    position: usize,
}

impl MmapLineIterator {
    /// Create a new memory-mapped line iterator
    pub fn new(path: &Path) -> anyhow::Result<Self> {
        let encoding_info = detect_encoding(path)?;
        let file = File::open(path)?;

        if file.metadata()?.len() == 0 {
            return Ok(Self {
                mmap: None,
                encoding: encoding_info.encoding,
                position: 0,
            });
        }

        // SAFETY: the map is read-only and lives no longer than this iterator
        let mmap = unsafe { memmap2::Mmap::map(&file)? };

        // Skip BOM if present
        let position = if mmap.len() >= 3 && mmap[0..3] == [0xEF, 0xBB, 0xBF] {
            3
        } else if mmap.len() >= 2 && (mmap[0..2] == [0xFE, 0xFF] || mmap[0..2] == [0xFF, 0xFE]) {
            2
        } else {
            0
        };

        Ok(Self {
            mmap: Some(mmap),
            encoding: encoding_info.encoding,
            position,
        })
    }

    /// Get the detected encoding
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }
}

impl Iterator for MmapLineIterator {
    type Item = anyhow::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mmap = self.mmap.as_ref()?;
        if self.position >= mmap.len() {
            return None;
        }

        let remaining = &mmap[self.position..];

        // UTF-16 splits on the two-byte newline unit
        if self.encoding == encoding_rs::UTF_16LE || self.encoding == encoding_rs::UTF_16BE {
            let newline: [u8; 2] = if self.encoding == encoding_rs::UTF_16LE { [b'\n', 0] } else { [0, b'\n'] };
            let end = remaining
                .chunks(2)
                .position(|unit| unit == newline)
                .map(|i| i * 2 + 2)
                .unwrap_or(remaining.len());
            self.position += end;
            let (decoded, _) = self.encoding.decode_without_bom_handling(&remaining[..end]);
            return Some(Ok(decoded.trim_end_matches(['\n', '\r']).to_string()));
        }

        let line_end = memchr::memchr(b'\n', remaining)
            .map(|i| i + 1)
            .unwrap_or(remaining.len());
        self.position += line_end;

        Some(Ok(decode_line(trim_line_ending(&remaining[..line_end]), self.encoding)))
    }
}

/// Count every non-blank line of an iterator into `set`
///
/// Returns the number of lines read; undecodable lines are skipped.
pub fn count_lines<I>(lines: I, set: &mut Multiset) -> u64
where
    I: Iterator<Item = anyhow::Result<String>>,
{
    let mut read = 0;
    for line in lines {
        match line {
            Ok(line) => {
                read += 1;
                set.insert(&line);
            }
            Err(e) => log::warn!("Skipping unreadable line: {}", e),
        }
    }
    read
}

/// Read a file's lines into `set`
pub fn read_file_into(path: &Path, set: &mut Multiset) -> anyhow::Result<u64> {
    let iter = MmapLineIterator::new(path)?;
    log::debug!("Reading {:?} as {}", path, iter.encoding().name());
    Ok(count_lines(iter, set))
}

/// Read a whole file into a new multiset
pub fn read_file(path: &Path) -> anyhow::Result<Multiset> {
    let mut set = Multiset::new();
    read_file_into(path, &mut set)?;
    Ok(set)
}

/// Read stdin's lines into `set`
pub fn read_stdin_into(set: &mut Multiset) -> u64 {
    count_lines(EncodedLineIterator::from_reader(io::stdin()), set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn test_utf8_detection() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Hello, World!").unwrap();
        writeln!(file, "Привет мир!").unwrap();

        let info = detect_encoding(file.path()).unwrap();
        assert_eq!(info.name, "UTF-8");
    }

    #[test]
    fn test_reader_lines() {
        let iter = EncodedLineIterator::from_reader(Cursor::new(b"line1\r\nline2\n\nline3".to_vec()));
        let lines: Vec<_> = iter.filter_map(|r| r.ok()).collect();

        assert_eq!(lines, vec!["line1", "line2", "", "line3"]);
    }

    #[test]
    fn test_invalid_utf8_line_kept_as_hex() {
        let iter = EncodedLineIterator::from_reader(Cursor::new(b"ok\n\xff\x80\n".to_vec()));
        let mut set = Multiset::new();

        assert_eq!(count_lines(iter, &mut set), 2);
        assert_eq!(set.get("ok"), Some(1));
        assert_eq!(set.get("$HEX[ff80]"), Some(1));
    }

    #[test]
    fn test_read_file_counts() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "password").unwrap();
        writeln!(file, "password").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "爱test").unwrap();

        let set = read_file(file.path()).unwrap();
        assert_eq!(set.get("password"), Some(2));
        assert_eq!(set.get("爱test"), Some(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_read_utf16_file() {
        let mut file = NamedTempFile::new().unwrap();
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "abc\nabc\n".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        file.write_all(&bytes).unwrap();

        let set = read_file(file.path()).unwrap();
        assert_eq!(set.get("abc"), Some(2));
    }

    #[test]
    fn test_empty_file() {
        let file = NamedTempFile::new().unwrap();
        assert!(read_file(file.path()).unwrap().is_empty());
    }
}
