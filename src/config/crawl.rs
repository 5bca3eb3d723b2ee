//! Crawl engine configuration

use std::path::PathBuf;

/// Configuration for the crawl engine
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Directory for per-document artifact files
    pub data_dir: PathBuf,
    /// Path the checkpoint engine snapshots to
    pub checkpoint_path: PathBuf,
    /// Seconds between stats lines
    pub stats_refresh_interval: u64,
    /// Expected total number of URLs, sizing the scheduled-set
    pub expected_num_urls: usize,
    /// Seconds between periodic checkpoints
    pub checkpoint_interval: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            checkpoint_path: PathBuf::from("crawl.checkpoint"),
            stats_refresh_interval: 5,
            expected_num_urls: 1_000_000,
            checkpoint_interval: 600,
        }
    }
}
