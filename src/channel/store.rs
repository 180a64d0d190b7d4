//! Double-buffered channel store with synchronous update observers.
//!
//! Each cell carries two timelines: the value computed this cycle
//! ("next") and the value exposed to consumers after the cycle commits
//! ("current"). Consumers within a tick read "current", set at the end
//! of the previous cycle; decode and control logic write "next". The
//! host calls [`ChannelStore::commit`] once per cycle boundary, so
//! readers never observe a partially-updated set of values from a single
//! bus round-trip.

use std::collections::{HashMap, HashSet};

use crate::channel::{ChannelKey, Value};
use crate::fault::Fault;

type ObserverFn<K> = Box<dyn FnMut(&mut ChannelStore<K>)>;

struct Observer<K: ChannelKey> {
    keys: Vec<K>,
    callback: ObserverFn<K>,
}

#[derive(Debug, Default, Clone)]
struct Cell {
    current: Option<Value>,
    next: Option<Value>,
    pending_write: Option<i64>,
}

/// Owned registry of channel cells, indexed by a driver's channel enum.
pub struct ChannelStore<K: ChannelKey> {
    cells: HashMap<K, Cell>,
    writable: HashSet<K>,
    observers: Vec<Observer<K>>,
}

impl<K: ChannelKey> ChannelStore<K> {
    /// Creates a store holding one cell per declared channel.
    ///
    /// `writable` names the channels that accept write commands; any
    /// other channel rejects [`ChannelStore::command`] with a validation
    /// fault.
    pub fn new(writable: impl IntoIterator<Item = K>) -> Self {
        Self {
            cells: K::ALL.iter().map(|&k| (k, Cell::default())).collect(),
            writable: writable.into_iter().collect(),
            observers: Vec::new(),
        }
    }

    /// Registers an observer invoked synchronously whenever the "next"
    /// value of any of `keys` is set.
    ///
    /// Observers read latest-known "next" values and may set other
    /// channels' "next" values; a burst of contributing updates triggers
    /// one invocation per update.
    pub fn observe(&mut self, keys: impl Into<Vec<K>>, callback: impl FnMut(&mut Self) + 'static) {
        self.observers.push(Observer {
            keys: keys.into(),
            callback: Box::new(callback),
        });
    }

    /// Sets the "next" value of a channel and notifies observers.
    pub fn set_next(&mut self, key: K, value: Value) {
        if let Some(cell) = self.cells.get_mut(&key) {
            cell.next = Some(value);
        }
        self.notify(key);
    }

    /// Returns the committed ("current") value of a channel.
    pub fn current(&self, key: K) -> Option<&Value> {
        self.cells.get(&key).and_then(|c| c.current.as_ref())
    }

    /// Returns the committed integer value of a channel.
    pub fn current_int(&self, key: K) -> Option<i64> {
        self.current(key).and_then(Value::as_int)
    }

    /// Returns the in-flight ("next") value of a channel.
    pub fn next(&self, key: K) -> Option<&Value> {
        self.cells.get(&key).and_then(|c| c.next.as_ref())
    }

    /// Returns the in-flight integer value of a channel.
    pub fn next_int(&self, key: K) -> Option<i64> {
        self.next(key).and_then(Value::as_int)
    }

    /// Queues a write command for a writable channel.
    ///
    /// # Errors
    ///
    /// Returns a validation fault if the channel accepts no commands.
    pub fn command(&mut self, key: K, value: i64) -> Result<(), Fault> {
        if !self.writable.contains(&key) {
            return Err(Fault::validation(format!(
                "channel {key:?} accepts no write commands"
            )));
        }
        if let Some(cell) = self.cells.get_mut(&key) {
            cell.pending_write = Some(value);
        }
        Ok(())
    }

    /// Returns the pending write command of a channel, without consuming
    /// it.
    pub fn pending_write(&self, key: K) -> Option<i64> {
        self.cells.get(&key).and_then(|c| c.pending_write)
    }

    /// Consumes the pending write command of a channel after a
    /// successful bus write.
    pub fn clear_pending_write(&mut self, key: K) {
        if let Some(cell) = self.cells.get_mut(&key) {
            cell.pending_write = None;
        }
    }

    /// Commits the cycle: every cell's "next" value becomes "current".
    ///
    /// Called by the host once per cycle boundary. Cells whose "next"
    /// was never set keep their committed value (stale, never cleared).
    pub fn commit(&mut self) {
        for cell in self.cells.values_mut() {
            if cell.next.is_some() {
                cell.current = cell.next.clone();
            }
        }
    }

    fn notify(&mut self, key: K) {
        // Take the observer list so callbacks can borrow the store
        // mutably; a set_next inside a callback sees an empty list and
        // cannot recurse.
        let mut observers = std::mem::take(&mut self.observers);
        for obs in observers.iter_mut() {
            if obs.keys.contains(&key) {
                (obs.callback)(self);
            }
        }
        // Keep observers registered during notification, if any.
        observers.append(&mut self.observers);
        self.observers = observers;
    }
}
