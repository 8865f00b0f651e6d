//! Text pixel source
//!
//! One record per line, `R:G:B:A`, each channel an unsigned 8-bit decimal.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::error::{LogoError, LogoResult};

/// Field separator inside a record
pub const RECORD_DELIMITER: char = ':';

/// One pixel as stored in the source, straight RGBA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelRecord {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl PixelRecord {
    /// Parse a single `R:G:B:A` line; the trailing newline is optional
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields = line
            .trim_end_matches(['\n', '\r'])
            .split(RECORD_DELIMITER)
            .map(|field| field.trim().parse::<u8>());

        let r = fields.next()?.ok()?;
        let g = fields.next()?.ok()?;
        let b = fields.next()?.ok()?;
        let a = fields.next()?.ok()?;
        if fields.next().is_some() {
            return None;
        }

        Some(Self { r, g, b, a })
    }

    /// Byte order of an ARGB8888 pixel in little-endian memory
    pub fn to_bgra(self) -> [u8; 4] {
        [self.b, self.g, self.r, self.a]
    }
}

/// Reads records from any buffered reader
pub struct PixelReader<R> {
    reader: R,
    line: String,
    line_no: usize,
}

impl<R: BufRead> PixelReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_no: 0,
        }
    }

    /// Number of records handed out so far
    pub fn records_read(&self) -> usize {
        self.line_no
    }

    /// Next record, `Ok(None)` once the source is exhausted
    pub fn next_record(&mut self) -> LogoResult<Option<PixelRecord>> {
        self.line.clear();
        let n = self
            .reader
            .read_line(&mut self.line)
            .map_err(|e| LogoError::io("<pixel source>", e))?;
        if n == 0 {
            return Ok(None);
        }

        self.line_no += 1;
        PixelRecord::parse(&self.line)
            .map(Some)
            .ok_or_else(|| LogoError::MalformedRecord {
                line: self.line_no,
                content: self.line.trim_end().to_string(),
            })
    }
}

/// Pixel data stored in a file, reopened on every render
#[derive(Debug, Clone)]
pub struct FilePixelSource {
    path: PathBuf,
}

impl FilePixelSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn open(&self) -> LogoResult<PixelReader<BufReader<File>>> {
        let file = File::open(&self.path).map_err(|e| LogoError::io(&self.path, e))?;
        Ok(PixelReader::new(BufReader::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_record() {
        assert_eq!(
            PixelRecord::parse("10:20:30:255\n"),
            Some(PixelRecord { r: 10, g: 20, b: 30, a: 255 })
        );
        assert_eq!(
            PixelRecord::parse("0:0:0:0"),
            Some(PixelRecord::default())
        );
    }

    #[test]
    fn test_parse_rejects_bad_records() {
        assert_eq!(PixelRecord::parse(""), None);
        assert_eq!(PixelRecord::parse("1:2:3"), None);
        assert_eq!(PixelRecord::parse("1:2:3:4:5"), None);
        assert_eq!(PixelRecord::parse("256:0:0:0"), None);
        assert_eq!(PixelRecord::parse("-1:0:0:0"), None);
        assert_eq!(PixelRecord::parse("a:b:c:d"), None);
    }

    #[test]
    fn test_bgra_swaps_red_and_blue() {
        let px = PixelRecord { r: 1, g: 2, b: 3, a: 4 };
        assert_eq!(px.to_bgra(), [3, 2, 1, 4]);
    }

    #[test]
    fn test_reader_reports_line_of_bad_record() {
        let mut reader = PixelReader::new(Cursor::new("1:2:3:4\nnope\n"));
        assert!(reader.next_record().unwrap().is_some());

        match reader.next_record() {
            Err(LogoError::MalformedRecord { line, content }) => {
                assert_eq!(line, 2);
                assert_eq!(content, "nope");
            }
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }

    #[test]
    fn test_reader_ends_cleanly() {
        let mut reader = PixelReader::new(Cursor::new("1:2:3:4\n"));
        assert!(reader.next_record().unwrap().is_some());
        assert!(reader.next_record().unwrap().is_none());
        assert_eq!(reader.records_read(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = FilePixelSource::new("/nonexistent/logo.dat");
        assert!(matches!(source.open(), Err(LogoError::Io { .. })));
    }
}
