//! Inbound request shapes and their normalization.
//!
//! Field names follow the public API: `md5`, `beatmap_id`, `mods`,
//! `accuracy`, `combo`, `300`, `100`, `50`, `Miss`.

use crate::difficulty::{Attempt, HitOverrides};
use crate::service::ServiceError;
use serde::Deserialize;

/// Body of `POST /pp`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PerformanceRequest {
    #[serde(default, rename = "md5", alias = "beatmap_md5")]
    pub content_hash: Option<String>,
    #[serde(default, rename = "beatmap_id")]
    pub resource_id: Option<u32>,
    #[serde(default, rename = "mods")]
    pub modifier_flags: u32,
    #[serde(default, rename = "accuracy")]
    pub target_accuracy_percent: Option<f64>,
    #[serde(default, rename = "combo")]
    pub combo_achieved: Option<u32>,
    #[serde(default, rename = "300")]
    pub count_full: Option<u32>,
    #[serde(default, rename = "100")]
    pub count_mid: Option<u32>,
    #[serde(default, rename = "50")]
    pub count_low: Option<u32>,
    #[serde(default, rename = "Miss", alias = "miss")]
    pub miss_count: Option<u32>,
}

/// Query of `GET /pp`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LookupQuery {
    #[serde(default)]
    pub md5: Option<String>,
    #[serde(default)]
    pub beatmap_id: Option<u32>,
}

/// The identifiers of one beatmap. At least one is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub content_hash: Option<String>,
    pub resource_id: Option<u32>,
}

impl Identity {
    /// Normalizes raw identifiers: hashes are trimmed and lower-cased, empty
    /// hashes and zero ids count as absent.
    pub fn new(content_hash: Option<&str>, resource_id: Option<u32>) -> Result<Self, ServiceError> {
        let content_hash = content_hash
            .map(|h| h.trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty());
        let resource_id = resource_id.filter(|id| *id > 0);

        if content_hash.is_none() && resource_id.is_none() {
            return Err(ServiceError::MalformedRequest(
                "expected at least 'md5' or 'beatmap_id'".to_string(),
            ));
        }

        Ok(Self {
            content_hash,
            resource_id,
        })
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.content_hash, self.resource_id) {
            (Some(hash), Some(id)) => write!(f, "md5={} id={}", hash, id),
            (Some(hash), None) => write!(f, "md5={}", hash),
            (None, Some(id)) => write!(f, "id={}", id),
            (None, None) => write!(f, "<none>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRequest {
    pub identity: Identity,
    pub attempt: Attempt,
}

impl PerformanceRequest {
    pub fn from_json(body: &[u8]) -> Result<Self, ServiceError> {
        serde_json::from_slice(body)
            .map_err(|e| ServiceError::MalformedRequest(format!("undecodable body: {}", e)))
    }

    pub fn normalize(&self) -> Result<NormalizedRequest, ServiceError> {
        let identity = Identity::new(self.content_hash.as_deref(), self.resource_id)?;

        let target_accuracy = match self.target_accuracy_percent {
            Some(acc) if !(0.0..=100.0).contains(&acc) => {
                return Err(ServiceError::MalformedRequest(format!(
                    "accuracy {} outside 0..100",
                    acc
                )));
            }
            Some(acc) if acc > 0.0 => Some(acc),
            _ => None,
        };

        Ok(NormalizedRequest {
            identity,
            attempt: Attempt {
                mods: self.modifier_flags,
                target_accuracy,
                combo: self.combo_achieved.filter(|c| *c > 0),
                overrides: HitOverrides {
                    n300: self.count_full,
                    n100: self.count_mid,
                    n50: self.count_low,
                },
                misses: self.miss_count.unwrap_or(0),
            },
        })
    }
}

impl LookupQuery {
    pub fn identity(&self) -> Result<Identity, ServiceError> {
        Identity::new(self.md5.as_deref(), self.beatmap_id)
    }
}
