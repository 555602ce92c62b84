//! Beatmap acquisition: hash → id resolution and fetch-once file storage.

pub mod fetcher;
pub mod resolver;

pub use fetcher::{BeatmapOrigin, FetchError, HttpOrigin, ResourceFetcher, hash_file};
pub use resolver::{BeatmapLookup, OsuApiLookup, ResolveError, ResourceResolver};

/// HTTP client shared by the osu! API lookup and the beatmap origin.
///
/// No client-side timeout: the server bounds each request end to end.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("osu-pp-cache/", env!("CARGO_PKG_VERSION")))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}
