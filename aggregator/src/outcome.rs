use serde::{Serialize, Serializer};
use std::time::Duration;

/// Data extracted from one successful upstream call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessDetail {
    /// From this call's dispatch to the end of its extraction
    #[serde(rename = "latencyMs", serialize_with = "serialize_millis")]
    pub latency: Duration,
    pub entity_count: u64,
    pub available_count: u64,
    #[serde(rename = "sizeMB")]
    pub size_mb: f64,
}

impl SuccessDetail {
    /// Latency truncated to whole milliseconds, the unit every aggregate is computed in.
    pub fn latency_ms(&self) -> u64 {
        self.latency.as_millis() as u64
    }
}

/// The settled result of one dispatched call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Success(SuccessDetail),
    Failure { reason: String },
}

impl CallOutcome {
    pub fn failure(reason: impl Into<String>) -> Self {
        CallOutcome::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success(_))
    }
}

fn serialize_millis<S: Serializer>(latency: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(latency.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_detail_json_field_names() {
        let detail = SuccessDetail {
            latency: Duration::from_micros(42_900),
            entity_count: 3,
            available_count: 2,
            size_mb: 1.5,
        };

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "latencyMs": 42,
                "entityCount": 3,
                "availableCount": 2,
                "sizeMB": 1.5,
            })
        );
        assert_eq!(detail.latency_ms(), 42);
    }
}
