use core::fmt;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use postcard::{
    from_bytes_cobs,
    ser_flavors::{Cobs, Slice},
    serialize_with_flavor,
};

use crate::{util::elapsed, Millis};

pub const RECORD_BUFFER_SIZE: usize = 16;
pub const MEMORY_STORE_SIZE: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord<E> {
    pub code: E,
    /// Milliseconds since the first event of the log, saturating.
    pub time_ms: u16,
    pub param: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogError {
    Serialize,
    StoreFull,
    Corrupt,
}

impl fmt::Display for LogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogError::Serialize => write!(f, "event record does not serialize"),
            LogError::StoreFull => write!(f, "event store is full"),
            LogError::Corrupt => write!(f, "event log image is corrupt"),
        }
    }
}

impl core::error::Error for LogError {}

/// Non-volatile sink for committed event logs.
pub trait EventStore {
    /// Starts a new log image and returns its sequence number.
    fn begin(&mut self) -> Result<u16, LogError>;
    fn write(&mut self, bytes: &[u8]) -> Result<(), LogError>;
    fn finish(&mut self) -> Result<(), LogError>;
}

/// Fixed-capacity event recorder. Records are kept in RAM while a run is in
/// progress and written out in one go by `commit`.
pub struct EventLog<E, const N: usize> {
    records: [Option<EventRecord<E>>; N],
    len: usize,
    dropped: u16,
    base_t: Option<Millis>,
    enabled: bool,
}

impl<E, const N: usize> EventLog<E, N>
where
    E: Copy + Serialize + DeserializeOwned,
{
    pub fn new() -> Self {
        Self {
            records: [None; N],
            len: 0,
            dropped: 0,
            base_t: None,
            enabled: false,
        }
    }

    /// Clears the log and starts recording.
    pub fn enable(&mut self) {
        self.records = [None; N];
        self.len = 0;
        self.dropped = 0;
        self.base_t = None;
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record(&mut self, code: E, param: u16, now: Millis) {
        if !self.enabled {
            return;
        }

        let base_t = *self.base_t.get_or_insert(now);
        let time_ms = elapsed(now, base_t).min(u16::MAX as Millis) as u16;

        match self.records.get_mut(self.len) {
            Some(slot) => {
                *slot = Some(EventRecord { code, time_ms, param });
                self.len += 1;
            }
            None => self.dropped = self.dropped.saturating_add(1),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Events recorded after the log filled up.
    pub fn dropped(&self) -> u16 {
        self.dropped
    }

    pub fn records(&self) -> impl Iterator<Item = &EventRecord<E>> {
        self.records[..self.len].iter().flatten()
    }

    /// Writes the log to `store` if recording is enabled, then stops
    /// recording. Returns the store's sequence number for the image.
    pub fn commit(&mut self, store: &mut dyn EventStore) -> Result<Option<u16>, LogError> {
        if !self.enabled {
            return Ok(None);
        }
        self.enabled = false;

        let sequence = store.begin()?;
        for record in self.records() {
            let mut data_buffer = [0u8; RECORD_BUFFER_SIZE];
            let serialized_size =
                Self::serialize_record(record, &mut data_buffer).ok_or(LogError::Serialize)?;

            store.write(&[serialized_size as u8])?;
            store.write(&data_buffer[..serialized_size])?;
        }
        store.finish()?;

        Ok(Some(sequence))
    }

    /// Reads back a committed image, calling `on_record` for each record.
    /// Returns the number of records read.
    pub fn decode(image: &[u8], mut on_record: impl FnMut(EventRecord<E>)) -> Result<usize, LogError> {
        let mut bytes = image.iter();
        let mut count = 0;

        while let Some(&size) = bytes.next() {
            let size = size as usize;
            if size > RECORD_BUFFER_SIZE {
                return Err(LogError::Corrupt);
            }

            let mut working_buffer = [0u8; RECORD_BUFFER_SIZE];
            for byte in working_buffer.iter_mut().take(size) {
                *byte = *bytes.next().ok_or(LogError::Corrupt)?;
            }

            let record = from_bytes_cobs(&mut working_buffer[..size]).map_err(|_| LogError::Corrupt)?;
            on_record(record);
            count += 1;
        }

        Ok(count)
    }

    fn serialize_record(record: &EventRecord<E>, buffer: &mut [u8]) -> Option<usize> {
        let flavor = Cobs::try_new(Slice::new(buffer)).ok()?;
        serialize_with_flavor::<EventRecord<E>, Cobs<Slice>, &mut [u8]>(record, flavor)
            .ok()
            .map(|output_buffer| output_buffer.len())
    }
}

impl<E, const N: usize> Default for EventLog<E, N>
where
    E: Copy + Serialize + DeserializeOwned,
{
    fn default() -> Self {
        Self::new()
    }
}

/// RAM-backed `EventStore` holding the most recent image.
pub struct MemoryEventStore {
    bytes: [u8; MEMORY_STORE_SIZE],
    len: usize,
    sequence: u16,
}

impl MemoryEventStore {
    pub const fn new() -> Self {
        Self {
            bytes: [0; MEMORY_STORE_SIZE],
            len: 0,
            sequence: 0,
        }
    }

    pub fn image(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Sequence number of the last image started, 0 if none.
    pub fn sequence(&self) -> u16 {
        self.sequence
    }
}

impl EventStore for MemoryEventStore {
    fn begin(&mut self) -> Result<u16, LogError> {
        self.sequence = self.sequence.wrapping_add(1);
        self.len = 0;
        Ok(self.sequence)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), LogError> {
        let end = self.len + bytes.len();
        let slot = self.bytes.get_mut(self.len..end).ok_or(LogError::StoreFull)?;

        slot.copy_from_slice(bytes);
        self.len = end;

        Ok(())
    }

    fn finish(&mut self) -> Result<(), LogError> {
        Ok(())
    }
}

impl Default for MemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    enum Code {
        IgStart,
        MainOpen,
        Abort,
    }

    #[test]
    fn test_disabled_log_ignores_events() {
        let mut log: EventLog<Code, 4> = EventLog::new();
        log.record(Code::IgStart, 0, 10);

        assert!(log.is_empty());
        assert_eq!(log.commit(&mut MemoryEventStore::new()), Ok(None));
    }

    #[test]
    fn test_times_are_relative_to_first_event() {
        let mut log: EventLog<Code, 4> = EventLog::new();
        log.enable();
        log.record(Code::IgStart, 0, 5000);
        log.record(Code::MainOpen, 7, 5250);
        log.record(Code::Abort, 1, 500_000);

        let times: Vec<u16> = log.records().map(|r| r.time_ms).collect();
        assert_eq!(times, vec![0, 250, u16::MAX]);
    }

    #[test]
    fn test_overflow_is_counted() {
        let mut log: EventLog<Code, 2> = EventLog::new();
        log.enable();
        for now in 0..5 {
            log.record(Code::Abort, now as u16, now);
        }

        assert_eq!(log.len(), 2);
        assert_eq!(log.dropped(), 3);

        log.enable();
        assert!(log.is_empty());
        assert_eq!(log.dropped(), 0);
    }

    #[test]
    fn test_commit_writes_readable_image() {
        let mut store = MemoryEventStore::new();
        let mut log: EventLog<Code, 8> = EventLog::new();
        log.enable();
        log.record(Code::IgStart, 0, 100);
        log.record(Code::MainOpen, 412, 180);
        log.record(Code::Abort, 0xbeef, 300);

        assert_eq!(log.commit(&mut store), Ok(Some(1)));
        assert!(!log.is_enabled());
        assert_eq!(log.commit(&mut store), Ok(None));

        let mut decoded = Vec::new();
        let count = EventLog::<Code, 8>::decode(store.image(), |record| decoded.push(record)).unwrap();

        assert_eq!(count, 3);
        assert_eq!(decoded, log.records().copied().collect::<Vec<_>>());
        assert_eq!(decoded[1], EventRecord { code: Code::MainOpen, time_ms: 80, param: 412 });
    }

    #[test]
    fn test_truncated_image_is_corrupt() {
        let mut store = MemoryEventStore::new();
        let mut log: EventLog<Code, 8> = EventLog::new();
        log.enable();
        log.record(Code::Abort, 9, 0);
        log.commit(&mut store).unwrap();

        let image = store.image();
        let result = EventLog::<Code, 8>::decode(&image[..image.len() - 1], |_| {});
        assert_eq!(result, Err(LogError::Corrupt));
    }
}
