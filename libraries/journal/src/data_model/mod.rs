#[path = "1-timestamped.rs"]
mod timestamped;

#[path = "2-store.rs"]
mod store;

pub use store::*;
pub use timestamped::*;

#[cfg_attr(target_arch = "wasm32", wasm_bindgen::prelude::wasm_bindgen)]
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ListenerKey(pub(crate) slotmap::DefaultKey);
