//! Run state carried between pipeline runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The persisted record of the last run.
///
/// Serialized as `{"last_row_count": 42, "watermark": "2024-01-10T00:00:00Z"}`;
/// `watermark` is `null` when no run has published rows yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub last_row_count: u64,
    #[serde(default)]
    pub watermark: Option<DateTime<Utc>>,
}

impl RunState {
    pub fn new(last_row_count: u64, watermark: Option<DateTime<Utc>>) -> Self {
        Self {
            last_row_count,
            watermark,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn round_trips_without_precision_loss() {
        let watermark = Utc
            .with_ymd_and_hms(2024, 1, 10, 8, 30, 15)
            .unwrap()
            .checked_add_signed(chrono::Duration::nanoseconds(123_456_789))
            .unwrap();
        let state = RunState::new(42, Some(watermark));
        let json = serde_json::to_string(&state).unwrap();
        let back: RunState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn missing_watermark_is_absent() {
        let state: RunState = serde_json::from_str(r#"{"last_row_count": 3}"#).unwrap();
        assert_eq!(state, RunState::new(3, None));
    }
}
