//! Output management module
//!
//! Writes the final multiset to stdout or a file, sorted by descending
//! frequency, with buffering for performance.

use crate::codec::hex_encode;
use crate::multiset::Multiset;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Default buffer size for writing (8MB)
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024 * 1024;

/// How each key is rendered
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFormat {
    /// Prefix each line with its count
    pub verbose: bool,
    /// Wrap keys containing control characters as `$HEX[...]`
    pub hex_output: bool,
}

impl OutputFormat {
    /// Render one output line without its newline
    pub fn format_line(&self, key: &str, count: u64) -> String {
        let key = if self.hex_output && needs_hex(key) {
            hex_encode(key)
        } else {
            key.to_string()
        };

        if self.verbose {
            format!("{} {}", count, key)
        } else {
            key
        }
    }
}

/// Keys a line-oriented consumer could not read back verbatim
#[inline]
fn needs_hex(key: &str) -> bool {
    key.chars().any(char::is_control)
}

/// Buffered output writer over stdout or a file
pub struct OutputWriter {
    writer: BufWriter<Box<dyn Write>>,
    path: Option<PathBuf>,
    lines_written: u64,
    bytes_written: u64,
}

impl OutputWriter {
    /// Create a writer to the given file, truncating it
    pub fn file(path: PathBuf, buffer_size: usize) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_output_dir(parent)?;
        }

        let file: File = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        Ok(Self::from_writer(Box::new(file), Some(path), buffer_size))
    }

    /// Create a writer to stdout
    pub fn stdout(buffer_size: usize) -> Self {
        Self::from_writer(Box::new(io::stdout()), None, buffer_size)
    }

    /// Create a writer to `path`, or stdout when there is none
    pub fn new(path: Option<PathBuf>, buffer_size: usize) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::file(path, buffer_size),
            None => Ok(Self::stdout(buffer_size)),
        }
    }

    fn from_writer(inner: Box<dyn Write>, path: Option<PathBuf>, buffer_size: usize) -> Self {
        Self {
            writer: BufWriter::with_capacity(buffer_size, inner),
            path,
            lines_written: 0,
            bytes_written: 0,
        }
    }

    /// Write a line to the output
    pub fn write_line(&mut self, line: &str) -> anyhow::Result<()> {
        writeln!(self.writer, "{}", line)?;
        self.lines_written += 1;
        self.bytes_written += line.len() as u64 + 1; // +1 for newline
        Ok(())
    }

    /// Write every key of `set`, highest count first
    pub fn write_multiset(&mut self, set: &Multiset, format: OutputFormat) -> anyhow::Result<()> {
        for (key, count) in set.sorted() {
            self.write_line(&format.format_line(key, count))?;
        }
        self.flush()
    }

    /// Flush the buffer
    pub fn flush(&mut self) -> anyhow::Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Get the output path, if writing to a file
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Get number of lines written
    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    /// Get bytes written
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

impl Drop for OutputWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Ensure output directory exists
pub fn ensure_output_dir(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
