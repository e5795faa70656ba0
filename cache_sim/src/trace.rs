//! Memory trace records and the trace line grammar
//!
//! One access per line: `<I|D> <hex address>`, e.g. `I 0x8cda3fa8` or
//! `D 8158bf94`. Blank lines are skipped.

use std::{
    fmt,
    fs::File,
    io::{BufRead, BufReader, Lines},
    path::Path,
};

use nom::{
    bytes::complete::tag_no_case,
    character::complete::{anychar, hex_digit1, space0, space1},
    combinator::{eof, map_res, opt},
    IResult,
};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use thiserror::Error;

/// kind of access, keyed by its tag character in the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum AccessKind {
    Instruction = b'I',
    Data = b'D',
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessKind::Instruction => write!(f, "instruction"),
            AccessKind::Data => write!(f, "data"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryAccessRecord {
    pub address: u32,
    pub kind: AccessKind,
}

impl MemoryAccessRecord {
    pub fn new(kind: AccessKind, address: u32) -> Self {
        Self { address, kind }
    }
    pub fn parse(line: &str) -> Result<Self, nom::Err<nom::error::Error<&str>>> {
        let (_, record) = read_record(line)?;
        Ok(record)
    }
}

impl fmt::Display for MemoryAccessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind: u8 = self.kind.into();
        write!(f, "{} {:#010x}", kind as char, self.address)
    }
}

fn read_kind(input: &str) -> IResult<&str, AccessKind> {
    map_res(anychar, |c: char| {
        u8::try_from(c)
            .ok()
            .and_then(|b| AccessKind::try_from(b).ok())
            .ok_or(c)
    })(input)
}

fn read_address(input: &str) -> IResult<&str, u32> {
    let (input, _) = opt(tag_no_case("0x"))(input)?;
    map_res(hex_digit1, |h: &str| u32::from_str_radix(h, 16))(input)
}

fn read_record(input: &str) -> IResult<&str, MemoryAccessRecord> {
    let (input, _) = space0(input)?;
    let (input, kind) = read_kind(input)?;
    let (input, _) = space1(input)?;
    let (input, address) = read_address(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = eof(input)?;
    Ok((input, MemoryAccessRecord { address, kind }))
}

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("malformed trace record at line {line}: `{content}`")]
    Malformed { line: usize, content: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Streams records out of a line-oriented trace.
///
/// Yields `None` once the input is exhausted; a zero address is an ordinary
/// record.
pub struct TraceReader<R> {
    lines: Lines<R>,
    line: usize,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }
}

impl TraceReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<MemoryAccessRecord, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let read = self.lines.next()?;
            self.line += 1;
            let line = match read {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            let content = line.trim_end();
            if content.trim_start().is_empty() {
                continue;
            }
            return Some(MemoryAccessRecord::parse(content).map_err(|e| {
                log::debug!("line {}: {e}", self.line);
                TraceError::Malformed {
                    line: self.line,
                    content: content.to_owned(),
                }
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_record() {
        assert_eq!(
            MemoryAccessRecord::new(AccessKind::Instruction, 0x8cda3fa8),
            MemoryAccessRecord::parse("I 8cda3fa8").unwrap()
        );
        assert_eq!(
            MemoryAccessRecord::new(AccessKind::Data, 0x8158bf94),
            MemoryAccessRecord::parse("D 0x8158BF94").unwrap()
        );
        assert_eq!(
            MemoryAccessRecord::new(AccessKind::Data, 0),
            MemoryAccessRecord::parse("  D\t0  ").unwrap()
        );
    }
    #[test]
    fn test_parse_rejects() {
        for line in [
            "X 8cda3fa8",
            "I",
            "I8cda3fa8",
            "I 0x",
            "I 1ffffffff",
            "I 8cda3fa8 D",
            "i 8cda3fa8",
            "\u{0249} 8cda3fa8",
        ] {
            assert!(MemoryAccessRecord::parse(line).is_err(), "line: {line:?}");
        }
    }
    #[test]
    fn test_access_kind_byte() {
        assert_eq!(Some(AccessKind::Instruction), AccessKind::try_from(b'I').ok());
        assert_eq!(Some(AccessKind::Data), AccessKind::try_from(b'D').ok());
        assert!(AccessKind::try_from(b'W').is_err());
        assert_eq!(b'D', u8::from(AccessKind::Data));
    }
    #[test]
    fn test_reader_does_not_stop_at_zero() {
        let trace = "I 0\nD 00000000\n\nI 8cda3fa8\n";
        let records: Vec<_> = TraceReader::new(trace.as_bytes())
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            vec![
                MemoryAccessRecord::new(AccessKind::Instruction, 0),
                MemoryAccessRecord::new(AccessKind::Data, 0),
                MemoryAccessRecord::new(AccessKind::Instruction, 0x8cda3fa8),
            ],
            records
        );
    }
    #[test]
    fn test_reader_reports_line() {
        let trace = "I 10\r\n\nD zz\nI 20\n";
        let mut reader = TraceReader::new(trace.as_bytes());
        assert!(reader.next().unwrap().is_ok());
        match reader.next().unwrap() {
            Err(TraceError::Malformed { line, content }) => {
                assert_eq!(3, line);
                assert_eq!("D zz", content);
            }
            r => panic!("unexpected: {r:?}"),
        }
        assert_eq!(
            MemoryAccessRecord::new(AccessKind::Instruction, 0x20),
            reader.next().unwrap().unwrap()
        );
        assert!(reader.next().is_none());
    }
    #[test]
    fn test_reader_counts_unreadable_line() {
        let mut reader = TraceReader::new(&b"I 10\n\xff\xfe\nD zz\n"[..]);
        assert!(reader.next().unwrap().is_ok());
        assert!(matches!(reader.next().unwrap(), Err(TraceError::Io(_))));
        match reader.next().unwrap() {
            Err(TraceError::Malformed { line, content }) => {
                assert_eq!(3, line);
                assert_eq!("D zz", content);
            }
            r => panic!("unexpected: {r:?}"),
        }
        assert!(reader.next().is_none());
    }
    #[test]
    fn test_display() {
        let r = MemoryAccessRecord::new(AccessKind::Data, 0x40);
        assert_eq!("D 0x00000040", r.to_string());
    }
}
