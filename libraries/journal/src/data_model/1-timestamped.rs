//! # Timestamped
//! Events are applied together with the instant they happened and their `index`: the
//! version of the store at the moment the event was dispatched.

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Timestamped<E> {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub index: usize,
    pub event: E,
}
