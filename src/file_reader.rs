//! Address list input for batch lookups
//!
//! Lists are plain text with one address per line. Files ending in `.gz` are
//! decompressed on the fly and the path `-` reads stdin. Blank lines and lines
//! starting with `#` are skipped.
//!
//! ```rust,no_run
//! use ipdb_field::file_reader;
//!
//! for entry in file_reader::addresses("clients.txt.gz")? {
//!     let entry = entry?;
//!     println!("{}: {}", entry.line, entry.text);
//! }
//! # Ok::<(), std::io::Error>(())
//! ```

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, stdin, BufRead, BufReader};
use std::path::Path;

const BUFFER_SIZE: usize = 64 * 1024;

/// Open `path` for line reading
///
/// `-` is stdin; a `.gz` extension (any case) selects gzip decoding.
pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead + Send>> {
    let path = path.as_ref();

    if path.to_str() == Some("-") {
        return Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, stdin())));
    }

    let file = File::open(path)?;
    let is_gzip = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"));

    if is_gzip {
        Ok(Box::new(BufReader::with_capacity(
            BUFFER_SIZE,
            GzDecoder::new(file),
        )))
    } else {
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
    }
}

/// One non-blank input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressLine {
    /// One-based line number in the source
    pub line: usize,
    /// Trimmed line text
    pub text: String,
}

/// Iterate the address lines of `path`
pub fn addresses<P: AsRef<Path>>(
    path: P,
) -> io::Result<impl Iterator<Item = io::Result<AddressLine>>> {
    Ok(address_lines(open(path)?))
}

/// Iterate the address lines of an open reader
pub fn address_lines<R: BufRead>(reader: R) -> impl Iterator<Item = io::Result<AddressLine>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(i, line)| match line {
            Ok(line) => {
                let text = line.trim();
                if text.is_empty() || text.starts_with('#') {
                    None
                } else {
                    Some(Ok(AddressLine {
                        line: i + 1,
                        text: text.to_string(),
                    }))
                }
            }
            Err(e) => Some(Err(e)),
        })
}
