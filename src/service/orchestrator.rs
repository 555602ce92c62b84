//! The cache orchestrator: decides per request whether to serve a stored
//! value, refresh it, or compute it for the first time.
//!
//! Lookup → {fresh hit, stale hit, miss} → resolve → fetch → reconstruct →
//! compute → persist. A failure at any step aborts the request and nothing is
//! persisted. There is no per-key lock: two concurrent misses for the same
//! beatmap both compute and the store's upsert keeps the last write.

use crate::beatmaps::{
    BeatmapLookup, BeatmapOrigin, ResourceFetcher, ResourceResolver, hash_file,
};
use crate::database::{Database, NewPerformance, PerformanceRecord};
use crate::difficulty::{self, PerformanceCalculator};
use crate::service::{Identity, PerformanceRequest, ServiceError};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// How a successful evaluation was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Stored value younger than the staleness window, nothing recomputed.
    Fresh,
    /// Stored value was stale and has been recomputed in place.
    Refreshed,
    /// No stored value; a new record was inserted.
    Computed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub record: PerformanceRecord,
    pub status: CacheStatus,
}

pub struct CacheOrchestrator<L, O, C> {
    db: Database,
    resolver: ResourceResolver<L>,
    fetcher: ResourceFetcher<O>,
    calculator: Arc<C>,
}

pub fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

impl<L, O, C> CacheOrchestrator<L, O, C>
where
    L: BeatmapLookup,
    O: BeatmapOrigin,
    C: PerformanceCalculator + 'static,
{
    pub fn new(
        db: Database,
        resolver: ResourceResolver<L>,
        fetcher: ResourceFetcher<O>,
        calculator: C,
    ) -> Self {
        Self {
            db,
            resolver,
            fetcher,
            calculator: Arc::new(calculator),
        }
    }

    pub async fn record_count(&self) -> Result<i64, ServiceError> {
        Ok(self.db.count().await?)
    }

    /// Finds the record for `identity`: by hash first, then by beatmap id.
    pub async fn lookup(&self, identity: &Identity) -> Result<Option<PerformanceRecord>, ServiceError> {
        if let Some(hash) = &identity.content_hash {
            if let Some(record) = self.db.find_by_hash(hash).await? {
                return Ok(Some(record));
            }
        }

        let Some(resource_id) = identity.resource_id else {
            return Ok(None);
        };

        let mut matches = self.db.find_by_resource_id(resource_id).await?;
        if matches.len() > 1 {
            return Err(ServiceError::IntegrityViolation(format!(
                "several records carry beatmap id {}",
                resource_id
            )));
        }
        Ok(matches.pop())
    }

    pub async fn evaluate(&self, request: &PerformanceRequest) -> Result<Evaluation, ServiceError> {
        self.evaluate_at(request, now_unix()).await
    }

    /// Evaluates `request` as if the current time were `now` (unix seconds).
    pub async fn evaluate_at(
        &self,
        request: &PerformanceRequest,
        now: i64,
    ) -> Result<Evaluation, ServiceError> {
        let normalized = request.normalize()?;
        let identity = normalized.identity;

        let existing = self.lookup(&identity).await?;
        if let Some(record) = existing.as_ref().filter(|r| r.is_fresh(now)) {
            log::debug!("CACHE: fresh hit {}", identity);
            return Ok(Evaluation {
                record: record.clone(),
                status: CacheStatus::Fresh,
            });
        }

        match &existing {
            Some(record) => log::debug!(
                "CACHE: stale hit {} ({}h old)",
                identity,
                record.age_secs(now) / 3600
            ),
            None => log::debug!("CACHE: miss {}", identity),
        }

        let resource_id = match identity
            .resource_id
            .or_else(|| existing.as_ref().and_then(|r| r.resource_id))
        {
            Some(id) => id,
            None => {
                let Some(hash) = identity.content_hash.as_deref() else {
                    return Err(ServiceError::MalformedRequest(
                        "no identifier to resolve".to_string(),
                    ));
                };
                self.resolver.resolve(hash).await?
            }
        };

        let path = self.fetcher.ensure(resource_id).await?;

        let (existing, content_hash) = match existing {
            Some(record) => {
                let hash = record.content_hash.clone();
                (Some(record), hash)
            }
            None => match identity.content_hash {
                Some(hash) => (None, hash),
                None => {
                    // Only the id was given: the file's MD5 is the record key.
                    let hash = hash_file(&path).await?;
                    let found = self.db.find_by_hash(&hash).await?;
                    if let Some(record) = found.as_ref().filter(|r| r.is_fresh(now)) {
                        let record = match record.resource_id {
                            Some(_) => record.clone(),
                            None => self.db.backfill_resource_id(record.id, resource_id).await?,
                        };
                        return Ok(Evaluation {
                            record,
                            status: CacheStatus::Fresh,
                        });
                    }
                    (found, hash)
                }
            },
        };

        // The engine is CPU bound and runs on the blocking pool.
        let calculator = Arc::clone(&self.calculator);
        let attempt = normalized.attempt;
        let (outcome, config) = tokio::task::spawn_blocking(move || {
            difficulty::evaluate_file(calculator.as_ref(), &path, &attempt)
        })
        .await
        .map_err(|e| ServiceError::ComputeFailed(format!("calculator task failed: {}", e)))??;

        log::info!(
            "CACHE: computed {} id={} -> {:.2}pp ({:.2}%, {:?})",
            content_hash,
            resource_id,
            outcome.performance_value,
            outcome.accuracy_percent,
            config.hits
        );

        let new = NewPerformance {
            content_hash,
            resource_id: Some(resource_id),
            performance_value: outcome.performance_value,
            accuracy_percent: outcome.accuracy_percent,
            modifier_flags: config.mods,
            computed_at: now,
        };

        let evaluation = match existing {
            Some(record) => Evaluation {
                record: self.db.update(record.id, &new).await?,
                status: CacheStatus::Refreshed,
            },
            None => {
                let holders = self.db.find_by_resource_id(resource_id).await?;
                if let Some(other) = holders.iter().find(|r| r.content_hash != new.content_hash) {
                    log::warn!(
                        "CACHE: beatmap {} is already recorded under {}, adding {} as a second row",
                        resource_id,
                        other.content_hash,
                        new.content_hash
                    );
                }
                Evaluation {
                    record: self.db.insert(&new).await?,
                    status: CacheStatus::Computed,
                }
            }
        };
        Ok(evaluation)
    }
}
