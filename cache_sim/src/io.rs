use std::io::BufRead;

use crate::trace::{MemoryAccessRecord, TraceError, TraceReader};

pub trait TraceSource {
    /// next record, `Ok(None)` once the trace is exhausted.
    fn next_access(&mut self) -> Result<Option<MemoryAccessRecord>, TraceError>;
}

impl<R: BufRead> TraceSource for TraceReader<R> {
    fn next_access(&mut self) -> Result<Option<MemoryAccessRecord>, TraceError> {
        self.next().transpose()
    }
}

pub struct EmptyTrace {}

impl EmptyTrace {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for EmptyTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceSource for EmptyTrace {
    fn next_access(&mut self) -> Result<Option<MemoryAccessRecord>, TraceError> {
        Ok(None)
    }
}

/// Records already held in memory.
pub struct RecordTrace {
    content: Vec<MemoryAccessRecord>,
    read_index: usize,
}

impl RecordTrace {
    pub fn new(content: Vec<MemoryAccessRecord>) -> Self {
        Self {
            content,
            read_index: 0,
        }
    }
}

impl FromIterator<MemoryAccessRecord> for RecordTrace {
    fn from_iter<T: IntoIterator<Item = MemoryAccessRecord>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl TraceSource for RecordTrace {
    fn next_access(&mut self) -> Result<Option<MemoryAccessRecord>, TraceError> {
        let record = self.content.get(self.read_index).copied();
        if record.is_some() {
            self.read_index += 1;
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::AccessKind;

    #[test]
    fn test_record_trace() {
        let mut t: RecordTrace = [0, 0x40]
            .into_iter()
            .map(|a| MemoryAccessRecord::new(AccessKind::Data, a))
            .collect();
        assert_eq!(0, t.next_access().unwrap().unwrap().address);
        assert_eq!(0x40, t.next_access().unwrap().unwrap().address);
        assert!(t.next_access().unwrap().is_none());
        assert!(t.next_access().unwrap().is_none());
    }
    #[test]
    fn test_reader_source() {
        let mut t = TraceReader::new("I 0\nbad\n".as_bytes());
        assert!(t.next_access().unwrap().is_some());
        assert!(matches!(
            t.next_access(),
            Err(TraceError::Malformed { line: 2, .. })
        ));
        assert!(t.next_access().unwrap().is_none());
        assert!(EmptyTrace::new().next_access().unwrap().is_none());
    }
}
