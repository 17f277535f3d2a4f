//! # Store
//! Holds the one writable copy of an app state. Every dispatched event is applied
//! copy-on-write: the previous `Rc<S>` handed out to callers is never touched, so comparing
//! versions (or pointers) is enough to detect a change.
//!
//! Neither the sink nor the listeners are called from inside `dispatch`. The store only
//! marks itself dirty; the host drains the due callbacks once it no longer holds a borrow
//! of the store, so a callback is free to read the store again.

use std::rc::Rc;

use chrono::{DateTime, Utc};

use crate::AppState;
use crate::PartialAppState;
use crate::data_model::{ListenerKey, Timestamped};

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("storage is unavailable: {0}")]
    Unavailable(String),
    #[error("storage quota exceeded")]
    QuotaExceeded,
    #[error("could not encode state: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Receives the latest state after changes. Fire-and-forget: a failure is logged and does
/// not roll the state back.
pub trait PersistenceSink<S> {
    fn persist(&self, state: &S) -> Result<(), SinkError>;
}

impl<S, F> PersistenceSink<S> for F
where
    F: Fn(&S) -> Result<(), SinkError>,
{
    fn persist(&self, state: &S) -> Result<(), SinkError> {
        self(state)
    }
}

pub struct Store<S: PartialAppState> {
    state: Rc<S>,
    version: u64,
    dirty: bool,
    listeners: slotmap::SlotMap<slotmap::DefaultKey, Rc<dyn Fn(ListenerKey)>>,
    sink: Option<Rc<dyn PersistenceSink<S>>>,
}

impl<S> Store<S>
where
    S: AppState + Clone,
{
    pub fn new(initial_state: S) -> Self {
        Self {
            state: Rc::new(initial_state),
            version: 0,
            dirty: false,
            listeners: Default::default(),
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: impl PersistenceSink<S> + 'static) -> Self {
        self.sink = Some(Rc::new(sink));
        self
    }

    pub fn state(&self) -> Rc<S> {
        Rc::clone(&self.state)
    }

    /// Incremented by every dispatch and every replace.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn dispatch(&mut self, event: S::Event, timestamp: DateTime<Utc>) -> Rc<S> {
        let stamped = Timestamped {
            timestamp,
            index: self.version as usize,
            event,
        };
        let next = S::clone(&self.state).apply_event(&stamped);
        log::debug!("Applied event at version {}", self.version);
        self.commit(next)
    }

    /// Swaps in a whole new state, e.g. one restored from a snapshot or the default state
    /// on reset.
    pub fn replace(&mut self, state: S) -> Rc<S> {
        self.commit(state)
    }

    /// Back to the default state. The only way to undo what events have done.
    pub fn reset(&mut self) -> Rc<S>
    where
        S: Default,
    {
        log::info!("Resetting state");
        self.replace(S::default())
    }

    fn commit(&mut self, next: S) -> Rc<S> {
        self.state = Rc::new(next);
        self.version += 1;
        self.dirty = true;
        Rc::clone(&self.state)
    }

    pub fn register_listener(&mut self, listener: impl Fn(ListenerKey) + 'static) -> ListenerKey {
        let key = self.listeners.insert(Rc::new(listener));
        ListenerKey(key)
    }

    pub fn unregister_listener(&mut self, key: ListenerKey) {
        self.listeners.remove(key.0);
    }

    /// Everything owed since the last drain: one write of the latest state to the sink,
    /// then one call per listener. Run them after releasing the store.
    pub fn drain_due_notifications(&mut self) -> Vec<Box<dyn FnOnce()>>
    where
        S: 'static,
    {
        let mut notifications: Vec<Box<dyn FnOnce()>> = Vec::new();
        if !self.dirty {
            return notifications;
        }
        self.dirty = false;

        if let Some(sink) = &self.sink {
            let sink = Rc::clone(sink);
            let state = Rc::clone(&self.state);
            let version = self.version;
            notifications.push(Box::new(move || {
                if let Err(e) = sink.persist(&state) {
                    log::error!("Failed to persist state at version {version}: {e}");
                }
            }));
        }

        for (key, listener) in self.listeners.iter() {
            let listener_key = ListenerKey(key);
            let listener = listener.clone();
            notifications.push(Box::new(move || listener(listener_key)));
        }
        notifications
    }
}
