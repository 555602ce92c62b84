//! In-crate fakes for the external collaborators, with call counters.

use crate::beatmaps::resolver::{BeatmapCandidate, LookupError};
use crate::beatmaps::{BeatmapLookup, BeatmapOrigin, FetchError};
use crate::difficulty::{CalcError, ComputeConfiguration, PerformanceCalculator};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct FakeLookup {
    ids: Option<Vec<u32>>,
    calls: Arc<AtomicUsize>,
}

impl FakeLookup {
    pub fn with_ids(ids: &[u32]) -> Self {
        Self {
            ids: Some(ids.to_vec()),
            calls: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BeatmapLookup for FakeLookup {
    async fn lookup_by_hash(&self, _content_hash: &str) -> Result<Vec<BeatmapCandidate>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.ids {
            Some(ids) => Ok(ids
                .iter()
                .map(|id| BeatmapCandidate {
                    beatmap_id: *id,
                    file_md5: None,
                })
                .collect()),
            None => Err(LookupError::Unavailable("connection refused".to_string())),
        }
    }
}

#[derive(Debug, Clone)]
enum OriginMode {
    Serve(String),
    Fail,
    PartialThenFail(String),
}

#[derive(Debug, Clone)]
pub struct FakeOrigin {
    mode: OriginMode,
    calls: Arc<AtomicUsize>,
}

impl FakeOrigin {
    pub fn serving(body: &str) -> Self {
        Self {
            mode: OriginMode::Serve(body.to_string()),
            calls: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            mode: OriginMode::Fail,
            calls: Arc::default(),
        }
    }

    /// Writes `body` to the destination, then reports a broken connection.
    pub fn partial_then_fail(body: &str) -> Self {
        Self {
            mode: OriginMode::PartialThenFail(body.to_string()),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BeatmapOrigin for FakeOrigin {
    async fn download(&self, _beatmap_id: u32, dest: &Path) -> Result<(), FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            OriginMode::Serve(body) => tokio::fs::write(dest, body)
                .await
                .map_err(|e| FetchError::Unwritable(e.to_string())),
            OriginMode::Fail => Err(FetchError::Origin("status=404 Not Found".to_string())),
            OriginMode::PartialThenFail(body) => {
                tokio::fs::write(dest, body)
                    .await
                    .map_err(|e| FetchError::Unwritable(e.to_string()))?;
                Err(FetchError::Origin("connection reset".to_string()))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum CalcMode {
    #[default]
    Score,
    Fail,
    Panic,
    Slow(Duration),
}

/// Calculator over maps of the form `objects=<n>`.
///
/// pp is `n300 * 1.0 + n100 * 0.5 + n50 * 0.25`, plus `mods` as a bonus so
/// different mods give different values.
#[derive(Debug, Clone, Default)]
pub struct FakeCalculator {
    calls: Arc<AtomicUsize>,
    last_config: Arc<Mutex<Option<ComputeConfiguration>>>,
    mode: CalcMode,
}

impl FakeCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            mode: CalcMode::Fail,
            ..Self::default()
        }
    }

    pub fn panicking() -> Self {
        Self {
            mode: CalcMode::Panic,
            ..Self::default()
        }
    }

    /// Blocks the calling thread for `delay` before scoring.
    pub fn slow(delay: Duration) -> Self {
        Self {
            mode: CalcMode::Slow(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_config(&self) -> Option<ComputeConfiguration> {
        *self.last_config.lock().unwrap()
    }
}

impl PerformanceCalculator for FakeCalculator {
    type Map = u32;
    type Attributes = u32;

    fn id(&self) -> &str {
        "fake"
    }

    fn load(&self, path: &Path) -> Result<u32, CalcError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CalcError::InvalidBeatmap(e.to_string()))?;
        content
            .trim()
            .strip_prefix("objects=")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| CalcError::InvalidBeatmap(content.clone()))
    }

    fn object_count(&self, map: &u32) -> u32 {
        *map
    }

    fn difficulty(&self, map: &u32, _mods: u32) -> u32 {
        *map
    }

    fn max_combo(&self, attributes: &u32) -> u32 {
        *attributes
    }

    fn calculate(&self, _attributes: u32, config: &ComputeConfiguration) -> Result<f64, CalcError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_config.lock().unwrap() = Some(*config);
        match self.mode {
            CalcMode::Score => {}
            CalcMode::Fail => {
                return Err(CalcError::CalculationFailed("engine exploded".to_string()));
            }
            CalcMode::Panic => panic!("engine panicked"),
            CalcMode::Slow(delay) => std::thread::sleep(delay),
        }
        let hits = config.hits;
        Ok(hits.n300 as f64 + hits.n100 as f64 * 0.5 + hits.n50 as f64 * 0.25 + config.mods as f64)
    }
}

/// Serves `router` on an ephemeral local port and returns its base url.
pub async fn serve_fixture(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    url
}
