//! Bus transport contract and an in-memory register bank.
//!
//! The driver depends only on [`RegisterBus`]: a transport that reads and
//! writes fixed-size word sequences at given offsets. Framing, CRC,
//! addressing, and retries belong to the transport implementation, not to
//! this crate.

use std::collections::HashMap;

use thiserror::Error;

/// A transport-level failure.
///
/// Any variant surfaced from a read leaves the affected channels at their
/// last good value; surfaced from a write, the pending commands are kept
/// for retry on the next eligible flush.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// The transport returned fewer (or more) words than requested.
    #[error("short read at offset {offset}: expected {expected} words, got {got}")]
    ShortRead {
        offset: u16,
        expected: usize,
        got: usize,
    },

    /// The requested register range is not served by the remote device.
    #[error("register range {offset}+{words} is not mapped")]
    Unmapped { offset: u16, words: usize },

    /// Any other I/O failure (timeout, connection loss, framing error).
    #[error("bus i/o failure: {0}")]
    Io(String),
}

/// Polled field-bus transport delivering 16-bit word sequences.
///
/// Calls are synchronous: they complete (or fault) before returning, so
/// the driver never suspends mid-cycle.
pub trait RegisterBus {
    /// Reads `count` consecutive words starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns a [`BusError`] on any transport failure. Implementations
    /// must not return partial data.
    fn read_words(&mut self, offset: u16, count: usize) -> Result<Vec<u16>, BusError>;

    /// Writes `words` consecutively starting at `offset`, atomically from
    /// the device's perspective.
    ///
    /// # Errors
    ///
    /// Returns a [`BusError`] if the write is not acknowledged.
    fn write_words(&mut self, offset: u16, words: &[u16]) -> Result<(), BusError>;
}

/// An in-memory register bank implementing [`RegisterBus`].
///
/// Useful for tests and host-less operation. Reads of unpopulated
/// registers return zero, matching a device that serves its whole
/// address space.
#[derive(Debug, Default)]
pub struct MemoryBus {
    registers: HashMap<u16, u16>,
}

impl MemoryBus {
    /// Creates an empty register bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a single register value.
    pub fn set(&mut self, offset: u16, value: u16) {
        self.registers.insert(offset, value);
    }

    /// Sets consecutive register values starting at `offset`.
    pub fn load(&mut self, offset: u16, words: &[u16]) {
        for (i, &w) in words.iter().enumerate() {
            self.registers.insert(offset + i as u16, w);
        }
    }

    /// Returns a single register value, zero if never written.
    pub fn get(&self, offset: u16) -> u16 {
        self.registers.get(&offset).copied().unwrap_or(0)
    }
}

impl RegisterBus for MemoryBus {
    fn read_words(&mut self, offset: u16, count: usize) -> Result<Vec<u16>, BusError> {
        Ok((0..count).map(|i| self.get(offset + i as u16)).collect())
    }

    fn write_words(&mut self, offset: u16, words: &[u16]) -> Result<(), BusError> {
        self.load(offset, words);
        Ok(())
    }
}
