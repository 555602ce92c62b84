//! Wire envelopes. Every success has the same shape, whether the record was
//! served from cache, refreshed or computed for the first time.

use crate::database::PerformanceRecord;
use crate::service::ServiceError;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceEnvelope {
    pub beatmap_md5: String,
    pub beatmap_id: Option<u32>,
    pub mods: u32,
    pub accuracy: f64,
    pub performance_points: f64,
    /// Unix timestamp.
    pub last_computed_at: i64,
}

impl From<&PerformanceRecord> for PerformanceEnvelope {
    fn from(record: &PerformanceRecord) -> Self {
        Self {
            beatmap_md5: record.content_hash.clone(),
            beatmap_id: record.resource_id,
            mods: record.modifier_flags,
            accuracy: record.accuracy_percent,
            performance_points: record.performance_value,
            last_computed_at: record.last_computed_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEnvelope {
    pub error_code: u16,
    pub message: String,
}

impl From<&ServiceError> for ErrorEnvelope {
    fn from(err: &ServiceError) -> Self {
        Self {
            error_code: err.code(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let record = PerformanceRecord {
            id: 3,
            content_hash: "abc123".to_string(),
            resource_id: Some(75),
            performance_value: 321.5,
            accuracy_percent: 99.0,
            modifier_flags: 8,
            last_computed_at: 1_700_000_000,
        };
        let json = serde_json::to_value(PerformanceEnvelope::from(&record)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "beatmap_md5": "abc123",
                "beatmap_id": 75,
                "mods": 8,
                "accuracy": 99.0,
                "performance_points": 321.5,
                "last_computed_at": 1_700_000_000i64,
            })
        );
    }

    #[test]
    fn test_error_envelope_shape() {
        let err = ServiceError::FetchFailed("status=404".to_string());
        let json = serde_json::to_value(ErrorEnvelope::from(&err)).unwrap();
        assert_eq!(json["error_code"], 502);
        assert_eq!(json["message"], "Could not download beatmap: status=404");
    }
}
