//! Local-first state keeping for a single user in a single session.
//!
//! Model:
//! 1. The app never mutates its state directly. User actions become "events".
//! 2. Each event is stamped with the time it happened and the store version it was
//!    dispatched at.
//! 3. Applying an event consumes the old state and returns a new one, so anyone holding
//!    the previous state keeps an unchanged copy.
//! 4. After every applied event the [`data_model::Store`] marks itself dirty. The host then
//!    drains the due callbacks (persisting the new state, notifying listeners) once it no
//!    longer borrows the store.

pub mod data_model;

use crate::data_model::Timestamped;

/// Core trait for partial event processing without derived state computation
pub trait PartialAppState: Sized {
    type Event;

    /// The intermediate state type returned by process_event.
    /// For simple cases, this can just be Self.
    type Partial: Sized;

    /// Process an event partially, without computing derived state.
    fn process_event(partial: Self::Partial, event: &Timestamped<Self::Event>) -> Self::Partial;

    /// Compute any derived state. Called once after a batch of events.
    fn finalize(partial: Self::Partial) -> Self;
}

/// Extension trait that applies a single event, including finalization
pub trait AppState: PartialAppState {
    fn apply_event(self, event: &Timestamped<Self::Event>) -> Self;
}

/// Anything that can convert Self -> Partial gets apply_event automatically
impl<T> AppState for T
where
    T: PartialAppState,
    T::Partial: From<T>,
{
    fn apply_event(self, event: &Timestamped<Self::Event>) -> Self {
        let partial = T::Partial::from(self);
        let partial = T::process_event(partial, event);
        T::finalize(partial)
    }
}
