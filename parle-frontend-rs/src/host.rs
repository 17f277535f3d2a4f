//! Adapters from JS callbacks to the capability traits.

use journal::data_model::{PersistenceSink, SinkError};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

use crate::lesson_player::AudioPlayer;
use crate::progress::Progress;

/// Calls `persist(snapshotJson)` once the changes of a call have been applied.
pub(crate) struct JsSnapshotSink {
    pub(crate) persist: js_sys::Function,
}

impl PersistenceSink<Progress> for JsSnapshotSink {
    fn persist(&self, progress: &Progress) -> Result<(), SinkError> {
        let snapshot = serde_json::to_string(progress)?;
        #[cfg(target_arch = "wasm32")]
        {
            self.persist
                .call1(&JsValue::null(), &JsValue::from_str(&snapshot))
                .map_err(|e| SinkError::Unavailable(format!("{e:?}")))?;
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (&self.persist, snapshot);
        }
        Ok(())
    }
}

/// Calls `speak(text, rate)`, e.g. a wrapper around `speechSynthesis`.
pub(crate) struct JsAudioPlayer {
    pub(crate) speak: js_sys::Function,
}

impl AudioPlayer for JsAudioPlayer {
    fn speak(&mut self, text: &str, rate: f64) {
        #[cfg(target_arch = "wasm32")]
        {
            let _ = self
                .speak
                .call2(&JsValue::null(), &JsValue::from_str(text), &JsValue::from_f64(rate))
                .inspect_err(|e| log::error!("Error playing audio: {e:?}"));
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (&self.speak, text, rate);
        }
    }
}
