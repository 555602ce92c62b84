//! Fetch-once beatmap file storage.
//!
//! Beatmaps live at `{beatmap_dir}/{beatmap_id}.osu`. A file that exists is
//! trusted as is. Downloads go to a unique `.part` file next to the target
//! and are renamed into place once complete, so the target path is either
//! absent or whole.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::AsyncWriteExt;

static PART_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The origin was unreachable, answered with an error, or sent nothing.
    Origin(String),
    /// Local storage could not be created or written.
    Unwritable(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Origin(msg) => write!(f, "Download failed: {}", msg),
            FetchError::Unwritable(msg) => write!(f, "Cannot write beatmap: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

/// Source of raw `.osu` files.
pub trait BeatmapOrigin: Send + Sync {
    /// Streams beatmap `beatmap_id` into a new file at `dest`.
    fn download(
        &self,
        beatmap_id: u32,
        dest: &Path,
    ) -> impl Future<Output = Result<(), FetchError>> + Send;
}

/// `https://osu.ppy.sh/osu/{id}`.
#[derive(Debug, Clone)]
pub struct HttpOrigin {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOrigin {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl BeatmapOrigin for HttpOrigin {
    async fn download(&self, beatmap_id: u32, dest: &Path) -> Result<(), FetchError> {
        let url = format!("{}/{}", self.base_url, beatmap_id);
        let mut resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Origin(format!("{}: {}", url, e)))?;

        if !resp.status().is_success() {
            return Err(FetchError::Origin(format!(
                "status={} url={}",
                resp.status(),
                url
            )));
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| FetchError::Unwritable(format!("{}: {}", dest.display(), e)))?;

        let mut written = 0usize;
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| FetchError::Origin(format!("read body failed: {}", e)))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| FetchError::Unwritable(format!("{}: {}", dest.display(), e)))?;
            written += chunk.len();
        }

        // Unknown ids come back as an empty 200.
        if written == 0 {
            return Err(FetchError::Origin(format!("empty body url={}", url)));
        }

        file.flush()
            .await
            .map_err(|e| FetchError::Unwritable(format!("{}: {}", dest.display(), e)))?;
        Ok(())
    }
}

/// Guarantees a local copy of each beatmap, downloading it at most once.
#[derive(Debug, Clone)]
pub struct ResourceFetcher<O> {
    origin: O,
    beatmap_dir: PathBuf,
}

impl<O: BeatmapOrigin> ResourceFetcher<O> {
    pub fn new(origin: O, beatmap_dir: PathBuf) -> Self {
        Self {
            origin,
            beatmap_dir,
        }
    }

    /// Deterministic location of beatmap `beatmap_id`.
    pub fn path_for(&self, beatmap_id: u32) -> PathBuf {
        self.beatmap_dir.join(format!("{}.osu", beatmap_id))
    }

    /// Returns the local path of beatmap `beatmap_id`, downloading it first if needed.
    pub async fn ensure(&self, beatmap_id: u32) -> Result<PathBuf, FetchError> {
        let path = self.path_for(beatmap_id);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(path);
        }

        tokio::fs::create_dir_all(&self.beatmap_dir)
            .await
            .map_err(|e| FetchError::Unwritable(format!("{}: {}", self.beatmap_dir.display(), e)))?;

        let part = self.beatmap_dir.join(format!(
            "{}.osu.{}-{}.part",
            beatmap_id,
            std::process::id(),
            PART_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        log::info!("FETCH: downloading beatmap {}", beatmap_id);
        if let Err(e) = self.origin.download(beatmap_id, &part).await {
            let _ = tokio::fs::remove_file(&part).await;
            log::warn!("FETCH: beatmap {} failed: {}", beatmap_id, e);
            return Err(e);
        }

        // A concurrent download of the same id may rename first; both copies are whole.
        if let Err(e) = tokio::fs::rename(&part, &path).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(FetchError::Unwritable(format!("{}: {}", path.display(), e)));
        }

        Ok(path)
    }
}

/// Lower-case hex MD5 of a file, the content hash osu! uses for beatmaps.
pub async fn hash_file(path: &Path) -> Result<String, FetchError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| FetchError::Unwritable(format!("{}: {}", path.display(), e)))?;
    Ok(format!("{:x}", md5::compute(&bytes)))
}
