//! Content hash → beatmap id resolution.

use crate::database::Database;
use serde::Deserialize;
use std::future::Future;

#[derive(Debug, Clone, PartialEq)]
pub enum LookupError {
    /// The lookup service could not be reached or answered with an error.
    Unavailable(String),
    /// The service answered but the payload was not understood.
    BadResponse(String),
    /// The service knows no beatmap with this hash.
    NoCandidates(String),
}

impl std::fmt::Display for LookupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupError::Unavailable(msg) => write!(f, "Lookup unavailable: {}", msg),
            LookupError::BadResponse(msg) => write!(f, "Unexpected lookup response: {}", msg),
            LookupError::NoCandidates(hash) => write!(f, "No beatmap found for hash {}", hash),
        }
    }
}

impl std::error::Error for LookupError {}

#[derive(Debug)]
pub enum ResolveError {
    Store(sqlx::Error),
    Lookup(LookupError),
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::Store(e) => write!(f, "Store error: {}", e),
            ResolveError::Lookup(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ResolveError {}

/// One beatmap matching a content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeatmapCandidate {
    pub beatmap_id: u32,
    pub file_md5: Option<String>,
}

/// External hash → id lookup service.
pub trait BeatmapLookup: Send + Sync {
    fn lookup_by_hash(
        &self,
        content_hash: &str,
    ) -> impl Future<Output = Result<Vec<BeatmapCandidate>, LookupError>> + Send;
}

/// osu! API v1 `get_beatmaps?h=<md5>`.
#[derive(Debug, Clone)]
pub struct OsuApiLookup {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

/// The v1 API returns every field as a string.
#[derive(Debug, Deserialize)]
struct ApiBeatmap {
    beatmap_id: String,
    #[serde(default)]
    file_md5: Option<String>,
}

impl OsuApiLookup {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn parse(body: &[u8]) -> Result<Vec<BeatmapCandidate>, LookupError> {
        let raw: Vec<ApiBeatmap> =
            serde_json::from_slice(body).map_err(|e| LookupError::BadResponse(e.to_string()))?;
        raw.into_iter()
            .map(|b| {
                let beatmap_id = b.beatmap_id.parse::<u32>().map_err(|_| {
                    LookupError::BadResponse(format!("beatmap_id {:?}", b.beatmap_id))
                })?;
                Ok(BeatmapCandidate {
                    beatmap_id,
                    file_md5: b.file_md5,
                })
            })
            .collect()
    }
}

impl BeatmapLookup for OsuApiLookup {
    async fn lookup_by_hash(&self, content_hash: &str) -> Result<Vec<BeatmapCandidate>, LookupError> {
        let url = format!("{}/get_beatmaps", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("k", self.api_key.as_str()), ("h", content_hash)])
            .send()
            .await
            .map_err(|e| LookupError::Unavailable(e.without_url().to_string()))?;

        if !resp.status().is_success() {
            return Err(LookupError::Unavailable(format!("status={}", resp.status())));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| LookupError::Unavailable(format!("read body failed: {}", e)))?;
        Self::parse(&body)
    }
}

/// Resolves content hashes to beatmap ids, consulting the record store first.
#[derive(Debug, Clone)]
pub struct ResourceResolver<L> {
    lookup: L,
    db: Database,
}

impl<L: BeatmapLookup> ResourceResolver<L> {
    pub fn new(lookup: L, db: Database) -> Self {
        Self { lookup, db }
    }

    /// Returns the beatmap id for `content_hash`.
    ///
    /// A stored record that already carries an id answers without any
    /// external call. Otherwise the first lookup candidate is used. Nothing is
    /// persisted here.
    pub async fn resolve(&self, content_hash: &str) -> Result<u32, ResolveError> {
        let stored = self
            .db
            .find_by_hash(content_hash)
            .await
            .map_err(ResolveError::Store)?;

        if let Some(resource_id) = stored.and_then(|r| r.resource_id) {
            log::debug!("RESOLVE: {} -> {} (stored)", content_hash, resource_id);
            return Ok(resource_id);
        }

        let candidates = self
            .lookup
            .lookup_by_hash(content_hash)
            .await
            .map_err(ResolveError::Lookup)?;

        let first = candidates
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::Lookup(LookupError::NoCandidates(content_hash.to_string())))?;

        if first
            .file_md5
            .as_deref()
            .is_some_and(|md5| !md5.eq_ignore_ascii_case(content_hash))
        {
            log::warn!(
                "RESOLVE: beatmap {} reports md5 {:?}, asked for {}",
                first.beatmap_id,
                first.file_md5,
                content_hash
            );
        }

        log::info!("RESOLVE: {} -> {} (lookup)", content_hash, first.beatmap_id);
        Ok(first.beatmap_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::NewPerformance;
    use crate::service::testing::{FakeLookup, serve_fixture};
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use std::collections::HashMap;

    /// API fixture echoing the requested hash; key `good` succeeds, any other key gets a 401.
    async fn fixture_api() -> String {
        async fn get_beatmaps(Query(params): Query<HashMap<String, String>>) -> (StatusCode, String) {
            if params.get("k").map(String::as_str) != Some("good") {
                return (StatusCode::UNAUTHORIZED, String::new());
            }
            let hash = params.get("h").cloned().unwrap_or_default();
            (
                StatusCode::OK,
                format!(r#"[{{"beatmap_id":"75","file_md5":"{}"}}]"#, hash),
            )
        }

        let base = serve_fixture(axum::Router::new().route("/api/get_beatmaps", get(get_beatmaps))).await;
        format!("{}/api/", base)
    }

    #[test]
    fn test_parse_api_payload() {
        let body = br#"[{"beatmap_id":"75","file_md5":"a5b99395a42bd55bc5eb1d2411cbdf8b","title":"DISCO PRINCE"},{"beatmap_id":"76"}]"#;
        let candidates = OsuApiLookup::parse(body).unwrap();
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].beatmap_id, 75);
        assert_eq!(
            candidates[0].file_md5.as_deref(),
            Some("a5b99395a42bd55bc5eb1d2411cbdf8b")
        );
        assert_eq!(candidates[1].file_md5, None);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            OsuApiLookup::parse(b"{\"error\":\"Please provide a valid API key.\"}"),
            Err(LookupError::BadResponse(_))
        ));
        assert!(matches!(
            OsuApiLookup::parse(br#"[{"beatmap_id":"abc"}]"#),
            Err(LookupError::BadResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_first_candidate_wins() {
        let db = Database::in_memory().await.unwrap();
        let lookup = FakeLookup::with_ids(&[10, 20]);
        let resolver = ResourceResolver::new(lookup.clone(), db);

        assert_eq!(resolver.resolve("abc").await.unwrap(), 10);
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test]
    async fn test_stored_id_skips_lookup() {
        let db = Database::in_memory().await.unwrap();
        db.insert(&NewPerformance {
            content_hash: "abc".to_string(),
            resource_id: Some(33),
            performance_value: 1.0,
            accuracy_percent: 100.0,
            modifier_flags: 0,
            computed_at: 0,
        })
        .await
        .unwrap();

        let lookup = FakeLookup::with_ids(&[99]);
        let resolver = ResourceResolver::new(lookup.clone(), db);

        assert_eq!(resolver.resolve("abc").await.unwrap(), 33);
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_candidates_fails() {
        let db = Database::in_memory().await.unwrap();
        let resolver = ResourceResolver::new(FakeLookup::with_ids(&[]), db);

        assert!(matches!(
            resolver.resolve("abc").await,
            Err(ResolveError::Lookup(LookupError::NoCandidates(_)))
        ));
    }

    #[tokio::test]
    async fn test_lookup_error_propagates() {
        let db = Database::in_memory().await.unwrap();
        let resolver = ResourceResolver::new(FakeLookup::failing(), db);

        assert!(matches!(
            resolver.resolve("abc").await,
            Err(ResolveError::Lookup(LookupError::Unavailable(_)))
        ));
    }

    #[tokio::test]
    async fn test_api_lookup_sends_key_and_hash() {
        let api = OsuApiLookup::new(crate::beatmaps::http_client(), &fixture_api().await, "good");

        let candidates = api.lookup_by_hash("abc").await.unwrap();
        assert_eq!(
            candidates,
            vec![BeatmapCandidate {
                beatmap_id: 75,
                file_md5: Some("abc".to_string()),
            }]
        );
    }

    #[tokio::test]
    async fn test_api_error_status_is_unavailable() {
        let api = OsuApiLookup::new(crate::beatmaps::http_client(), &fixture_api().await, "bad");
        let db = Database::in_memory().await.unwrap();
        let resolver = ResourceResolver::new(api, db);

        let err = resolver.resolve("abc").await.unwrap_err();
        assert!(matches!(
            &err,
            ResolveError::Lookup(LookupError::Unavailable(msg)) if msg.contains("401")
        ));
        assert!(matches!(
            crate::service::ServiceError::from(err),
            crate::service::ServiceError::ResolutionFailed(_)
        ));
    }
}
