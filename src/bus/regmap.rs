//! Register bindings, read/write groups, and map validation.
//!
//! A [`RegisterMap`] is the declarative table binding channels to wire
//! offsets. Read groups are polled as one bus transaction each, at one
//! of two priorities; write groups are written atomically from the
//! device's perspective, and only when at least one bound channel has a
//! pending command.

use tracing::warn;

use crate::bus::codec::{self, RegisterKind};
use crate::bus::transport::{BusError, RegisterBus};
use crate::channel::{ChannelKey, ChannelStore};
use crate::fault::Fault;

/// Poll priority of a read group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Polled every cycle.
    High,
    /// Polled when the host schedules a low-frequency round.
    Low,
}

/// Binds one channel (or padding) to a wire offset and encoding.
#[derive(Debug, Clone)]
pub struct RegisterBinding<K> {
    /// Bound channel; `None` marks a padding placeholder.
    pub channel: Option<K>,
    /// Word offset on the wire.
    pub offset: u16,
    /// Wire encoding.
    pub kind: RegisterKind,
}

impl<K> RegisterBinding<K> {
    /// Binds `channel` at `offset` with the given encoding.
    pub fn new(channel: K, offset: u16, kind: RegisterKind) -> Self {
        Self {
            channel: Some(channel),
            offset,
            kind,
        }
    }

    /// A placeholder consuming `words` wire words, bound to no channel.
    pub fn padding(offset: u16, words: usize) -> Self {
        Self {
            channel: None,
            offset,
            kind: RegisterKind::Pad(words),
        }
    }
}

/// An ordered run of bindings polled as one bus transaction.
#[derive(Debug, Clone)]
pub struct ReadGroup<K> {
    /// First wire offset of the group.
    pub start: u16,
    /// Poll priority class.
    pub priority: Priority,
    /// Bindings in wire order.
    pub bindings: Vec<RegisterBinding<K>>,
}

/// An ordered run of bindings written together.
#[derive(Debug, Clone)]
pub struct WriteGroup<K> {
    /// First wire offset of the group.
    pub start: u16,
    /// Bindings in wire order.
    pub bindings: Vec<RegisterBinding<K>>,
}

impl<K> ReadGroup<K> {
    /// Total wire words this group occupies.
    pub fn word_count(&self) -> usize {
        self.bindings.iter().map(|b| b.kind.words()).sum()
    }
}

impl<K> WriteGroup<K> {
    /// Total wire words this group occupies.
    pub fn word_count(&self) -> usize {
        self.bindings.iter().map(|b| b.kind.words()).sum()
    }
}

/// Declarative register table of one device: read groups plus write
/// groups.
#[derive(Debug, Clone)]
pub struct RegisterMap<K> {
    /// Groups polled from the device.
    pub read_groups: Vec<ReadGroup<K>>,
    /// Groups written to the device.
    pub write_groups: Vec<WriteGroup<K>>,
}

impl<K: ChannelKey> RegisterMap<K> {
    /// Builds a map after validating every group.
    ///
    /// Within a group, offsets must be strictly increasing and
    /// contiguous: each binding starts exactly where the previous one
    /// ends, so a wire gap must be an explicit padding placeholder.
    /// Write groups additionally reject padding and text bindings.
    ///
    /// # Errors
    ///
    /// Returns a configuration fault describing the first violation.
    pub fn new(
        read_groups: Vec<ReadGroup<K>>,
        write_groups: Vec<WriteGroup<K>>,
    ) -> Result<Self, Fault> {
        for group in &read_groups {
            Self::validate_layout(group.start, &group.bindings)?;
        }
        for group in &write_groups {
            Self::validate_layout(group.start, &group.bindings)?;
            for binding in &group.bindings {
                match binding.kind {
                    RegisterKind::Pad(_) => {
                        return Err(Fault::config(format!(
                            "write group at {} contains padding at offset {}",
                            group.start, binding.offset
                        )));
                    }
                    RegisterKind::Text(_) => {
                        return Err(Fault::config(format!(
                            "write group at {} contains a text binding at offset {}",
                            group.start, binding.offset
                        )));
                    }
                    _ => {}
                }
            }
        }
        Ok(Self {
            read_groups,
            write_groups,
        })
    }

    fn validate_layout(start: u16, bindings: &[RegisterBinding<K>]) -> Result<(), Fault> {
        if bindings.is_empty() {
            return Err(Fault::config(format!("group at {start} has no bindings")));
        }
        let mut expected = start;
        for binding in bindings {
            if binding.offset != expected {
                return Err(Fault::config(format!(
                    "group at {start}: binding at offset {} should start at {expected} \
                     (gaps require explicit padding)",
                    binding.offset
                )));
            }
            expected = expected
                .checked_add(binding.kind.words() as u16)
                .ok_or_else(|| Fault::config(format!("group at {start} overflows the address space")))?;
        }
        Ok(())
    }
}

/// Polls one read group and decodes it into the store's "next" buffer.
///
/// The word count is verified before anything is decoded: a short or
/// failed read updates no channel, so stale committed values are
/// retained rather than partially overwritten.
///
/// # Errors
///
/// Returns a transport fault on bus failure or word-count mismatch.
pub fn poll_group<K: ChannelKey>(
    bus: &mut dyn RegisterBus,
    group: &ReadGroup<K>,
    store: &mut ChannelStore<K>,
) -> Result<(), Fault> {
    let expected = group.word_count();
    let words = bus.read_words(group.start, expected)?;
    if words.len() != expected {
        return Err(Fault::Transport(BusError::ShortRead {
            offset: group.start,
            expected,
            got: words.len(),
        }));
    }

    let mut idx = 0;
    for binding in &group.bindings {
        let n = binding.kind.words();
        if let (Some(key), Some(value)) =
            (binding.channel, codec::decode(&words[idx..idx + n], binding.kind))
        {
            store.set_next(key, value);
        }
        idx += n;
    }
    Ok(())
}

/// Flushes one write group if any bound channel has a pending command.
///
/// Bindings without a pending command are filled from the channel's
/// committed value (zero if unknown) so the group write stays atomic on
/// the wire. Pending commands are consumed after the bus acknowledges
/// the write; a transport fault retains them for retry, while a value
/// that fails range validation is dropped.
///
/// # Errors
///
/// Returns a validation fault if a pending value does not fit its field,
/// or a transport fault if the bus rejects the write.
pub fn flush_group<K: ChannelKey>(
    bus: &mut dyn RegisterBus,
    group: &WriteGroup<K>,
    store: &mut ChannelStore<K>,
) -> Result<bool, Fault> {
    let has_pending = group
        .bindings
        .iter()
        .any(|b| b.channel.is_some_and(|k| store.pending_write(k).is_some()));
    if !has_pending {
        return Ok(false);
    }

    let mut words = Vec::with_capacity(group.word_count());
    for binding in &group.bindings {
        let Some(key) = binding.channel else { continue };
        let value = store
            .pending_write(key)
            .or_else(|| store.current_int(key))
            .unwrap_or(0);
        match codec::encode_int(value, binding.kind) {
            Ok(encoded) => words.extend(encoded),
            Err(e) => {
                // An out-of-range command can never succeed; consume the
                // group's pendings rather than re-encoding every cycle.
                for binding in &group.bindings {
                    if let Some(key) = binding.channel {
                        store.clear_pending_write(key);
                    }
                }
                return Err(e);
            }
        }
    }

    bus.write_words(group.start, &words)?;
    for binding in &group.bindings {
        if let Some(key) = binding.channel {
            store.clear_pending_write(key);
        }
    }
    Ok(true)
}

/// Polls every read group of the given priority, isolating faults per
/// group: a failed group is logged and skipped, later groups still run.
///
/// Returns the number of faulted groups.
pub fn poll_priority<K: ChannelKey>(
    bus: &mut dyn RegisterBus,
    map: &RegisterMap<K>,
    priority: Priority,
    store: &mut ChannelStore<K>,
) -> usize {
    let mut faults = 0;
    for group in map.read_groups.iter().filter(|g| g.priority == priority) {
        if let Err(e) = poll_group(bus, group, store) {
            warn!(group = group.start, error = %e, "read group poll failed, retaining stale values");
            faults += 1;
        }
    }
    faults
}

/// Flushes every write group with pending commands, isolating faults per
/// group. Returns the number of groups actually written.
pub fn flush_pending<K: ChannelKey>(
    bus: &mut dyn RegisterBus,
    map: &RegisterMap<K>,
    store: &mut ChannelStore<K>,
) -> usize {
    let mut written = 0;
    for group in &map.write_groups {
        match flush_group(bus, group, store) {
            Ok(true) => written += 1,
            Ok(false) => {}
            Err(e @ Fault::Transport(_)) => {
                warn!(group = group.start, error = %e, "write group flush failed, command stays pending");
            }
            Err(e) => {
                warn!(group = group.start, error = %e, "write command rejected and dropped");
            }
        }
    }
    written
}
