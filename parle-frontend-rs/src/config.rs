use lesson_utils::DifficultyBand;
use lesson_utils::grading::GradingThresholds;

use crate::lesson_player::PlaybackSettings;
use crate::stats::RECOMMENDATION_LIMIT;

/// Host-supplied tuning. Every field is optional in the JSON and falls back to the
/// calibrated defaults.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[serde(rename_all = "camelCase", default)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ParleConfig {
    pub thresholds: GradingThresholds,
    pub bands: Vec<DifficultyBand>,
    pub playback: PlaybackSettings,
    pub recommendation_limit: usize,
}

impl Default for ParleConfig {
    fn default() -> Self {
        Self {
            thresholds: GradingThresholds::default(),
            bands: DifficultyBand::standard(),
            playback: PlaybackSettings::default(),
            recommendation_limit: RECOMMENDATION_LIMIT,
        }
    }
}

impl ParleConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).inspect_err(|e| log::error!("Error parsing config: {e}"))
    }
}
