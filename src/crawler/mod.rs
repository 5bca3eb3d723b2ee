//! Crawl engine: frontier, scheduler, worker pool, background tasks
//!
//! Workers pull scored batches off the shared frontier, fetch and parse each
//! document, write the artifact file, and hand every discovered link to the
//! shard router. Background threads garbage-collect the frontier, print
//! stats, snapshot state, and age the robots.txt cache. Everything observes a
//! single process-wide `running` flag for shutdown.

pub mod checkpoint;
pub mod frontier;
pub mod robots;

pub use checkpoint::{load_checkpoint, write_checkpoint, CheckpointError};
pub use frontier::{Frontier, FRONTIER_SIZE_LIMIT};
pub use robots::RobotsCatalog;

use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::CrawlConfig;
use crate::html::{HtmlInfo, HtmlParser, TagInfo};
use crate::net::{HttpClient, HttpError, HttpResponse, Url};
use crate::routing::BloomFilter;
use crate::util::file_size_to_string;

/// False positive rate of the scheduled-set
const FILTER_FALSE_POSITIVE_RATE: f64 = 1e-3;
/// Per-host dispatch cap within one hits-cache window
const HOST_HIT_RATE_LIMIT: u32 = 2_048;
/// Seconds between garbage-collection passes
const GC_INTERVAL: u64 = 30;
/// URLs a worker dequeues at a time
const BATCH_SIZE: usize = 5;
/// The scheduler samples `BATCH_SIZE * SAMPLE_FACTOR` candidates per batch
const SAMPLE_FACTOR: usize = 2;

#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("the crawler is already running")]
    AlreadyRunning,
    #[error("the crawler is not running")]
    NotRunning,
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),
}

/// Capability for dispatching a URL to the node that owns its shard.
///
/// The crawler consumes this interface; the distributed layer implements it
/// and holds the crawler, which breaks what would otherwise be a cycle.
pub trait UrlRouter: Send + Sync {
    fn route(&self, url: &Url);
}

/// The crawl engine
pub struct Crawler {
    config: CrawlConfig,
    running: AtomicBool,
    total_crawled: AtomicU64,
    crawled_last_interval: AtomicU64,
    client: HttpClient,
    parser: HtmlParser,
    robots: RobotsCatalog,
    frontier: Frontier,
    scheduled: Mutex<BloomFilter>,
    hits_cache: Mutex<HashMap<String, u32>>,
    router: RwLock<Option<Arc<dyn UrlRouter>>>,
    threads: Mutex<Vec<JoinHandle<()>>>,
}

impl Crawler {
    /// A crawler whose frontier starts from a seed list.
    pub fn from_seeds(seeds: Vec<Url>, config: CrawlConfig) -> Self {
        let crawler = Self::with_config(config);
        {
            let mut guard = crawler.frontier.guard();
            for seed in seeds {
                guard.insert(seed);
            }
        }
        crawler
    }

    /// A crawler restored from a checkpoint snapshot.
    pub fn from_checkpoint(path: &Path, config: CrawlConfig) -> Result<Self, CheckpointError> {
        let begin = Instant::now();
        info!("checkpoint loading is in progress...");

        let crawler = Self::with_config(config);
        let loaded = {
            let mut scheduled = crawler.scheduled.lock();
            checkpoint::load_checkpoint(path, &mut scheduled)?
        };
        crawler
            .total_crawled
            .store(loaded.total_crawled, Ordering::Relaxed);
        *crawler.frontier.guard() = loaded.frontier;

        let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        info!(
            "checkpoint loading finished in {} s [{}]",
            begin.elapsed().as_secs(),
            file_size_to_string(size)
        );
        Ok(crawler)
    }

    fn with_config(config: CrawlConfig) -> Self {
        let scheduled = BloomFilter::new(config.expected_num_urls, FILTER_FALSE_POSITIVE_RATE);
        Self {
            config,
            running: AtomicBool::new(false),
            total_crawled: AtomicU64::new(0),
            crawled_last_interval: AtomicU64::new(0),
            client: HttpClient::new(),
            parser: HtmlParser::with_link_filter(filter_link),
            robots: RobotsCatalog::new(),
            frontier: Frontier::new(),
            scheduled: Mutex::new(scheduled),
            hits_cache: Mutex::new(HashMap::new()),
            router: RwLock::new(None),
            threads: Mutex::new(Vec::new()),
        }
    }

    /// Start the worker pool and the background threads.
    pub fn begin_crawl(self: &Arc<Self>, num_threads: usize) -> Result<(), CrawlerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(CrawlerError::AlreadyRunning);
        }

        let mut threads = self.threads.lock();
        for worker_id in 0..num_threads {
            let crawler = Arc::clone(self);
            threads.push(thread::spawn(move || crawler.worker_loop(worker_id)));
        }

        let crawler = Arc::clone(self);
        threads.push(thread::spawn(move || crawler.gc_loop()));
        let crawler = Arc::clone(self);
        threads.push(thread::spawn(move || crawler.stats_loop()));
        let crawler = Arc::clone(self);
        threads.push(thread::spawn(move || crawler.checkpoint_loop()));
        let crawler = Arc::clone(self);
        threads.push(thread::spawn(move || crawler.robots_refresh_loop()));
        Ok(())
    }

    /// Stop every loop and join the worker and background threads.
    pub fn end_crawl(&self) -> Result<(), CrawlerError> {
        let mut threads = self.threads.lock();
        if threads.is_empty() {
            return Err(CrawlerError::NotRunning);
        }
        self.request_shutdown();
        for handle in threads.drain(..) {
            let _ = handle.join();
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Clear the running flag and wake anything blocked on the frontier.
    /// Idempotent; also invoked by the peer layer on a `kill` frame.
    pub fn request_shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.frontier.wake_all();
    }

    /// Insert a URL into the local frontier unless the scheduled-set already
    /// knows it. Entry point for both seed routing and peer-forwarded URLs.
    pub fn insert_frontier(&self, url: &Url) {
        if !url.is_absolute() {
            return;
        }
        let mut guard = self.frontier.guard();
        let scheduled = self.scheduled.lock();
        if !scheduled.contains(url.as_str().as_bytes()) {
            guard.insert(url.clone());
            drop(scheduled);
            drop(guard);
            self.frontier.wake_one();
        }
    }

    /// Bind the shard router once the distributed layer exists.
    pub fn bind_router(&self, router: Arc<dyn UrlRouter>) {
        *self.router.write() = Some(router);
    }

    /// Dispatch a URL through the shard router, or keep it local when no
    /// router is bound (single-node operation).
    pub fn route(&self, url: &Url) {
        let router = self.router.read().clone();
        match router {
            Some(router) => router.route(url),
            None => self.insert_frontier(url),
        }
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }

    pub fn total_crawled(&self) -> u64 {
        self.total_crawled.load(Ordering::Relaxed)
    }

    fn worker_loop(&self, worker: usize) {
        while self.is_running() {
            let batch = self.next_url_batch(BATCH_SIZE, SAMPLE_FACTOR);
            if batch.is_empty() {
                // Whole sample was rate-limited; back off until hosts free up.
                thread::sleep(Duration::from_millis(100));
                continue;
            }
            for request_url in &batch {
                if !self.is_running() {
                    return;
                }
                self.crawl_one(worker, request_url);
            }
        }
    }

    /// Dequeue a scored batch.
    ///
    /// Waits until the frontier holds a full sample, filters out URLs the
    /// scheduled-set already claims, rate-limits per host through the hits
    /// cache, sorts the sample by score, returns the top `batch_size`, puts
    /// the leftover back, and marks the returned URLs as scheduled.
    ///
    /// Lock order: frontier, then scheduled-set, then hits cache.
    fn next_url_batch(&self, batch_size: usize, sample_factor: usize) -> Vec<Url> {
        let sample_size = batch_size * sample_factor;

        let mut guard = self.frontier.guard();
        self.frontier
            .wait_until(&mut guard, |set| !self.is_running() || set.len() >= sample_size);
        if !self.is_running() {
            return Vec::new();
        }

        let mut sample = Vec::with_capacity(sample_size);
        {
            let scheduled = self.scheduled.lock();
            let mut hits = self.hits_cache.lock();
            let mut already_scheduled = Vec::new();
            for url in guard.iter() {
                if sample.len() >= sample_size {
                    break;
                }
                if scheduled.contains(url.as_str().as_bytes()) {
                    already_scheduled.push(url.clone());
                    continue;
                }
                let count = hits.entry(url.host().to_string()).or_insert(0);
                if *count < HOST_HIT_RATE_LIMIT {
                    *count += 1;
                    sample.push(url.clone());
                }
            }
            for url in &already_scheduled {
                guard.remove(url);
            }
            for url in &sample {
                guard.remove(url);
            }
        }
        drop(guard);

        sample.sort_by_key(|url| std::cmp::Reverse(url_score(url)));
        let leftover = sample.split_off(batch_size.min(sample.len()));
        self.frontier.insert_all(leftover);

        let mut scheduled = self.scheduled.lock();
        for url in &sample {
            scheduled.insert(url.as_str().as_bytes());
        }
        sample
    }

    fn crawl_one(&self, worker: usize, request_url: &Url) {
        let response = match self.fetch(request_url) {
            Ok(response) => response,
            Err(HttpError::RobotsDisallowed) => {
                info!(worker, "Ign: disallowed by robots.txt {request_url}");
                return;
            }
            Err(error) => {
                warn!(worker, "Err: {error} {request_url}");
                return;
            }
        };

        // Permanent redirects re-enter through the shard layer: the target
        // may belong to another node.
        if response.status == 301 || response.status == 308 {
            match response.location.as_deref().map(|l| request_url.resolve(l)) {
                Some(Ok(target)) => {
                    self.route(&target);
                    info!(worker, "Ign: permanently redirected {request_url} -> {target}");
                }
                _ => warn!(worker, "Err: malformed permanent redirect {request_url}"),
            }
            return;
        }

        let size = file_size_to_string(response.body.len() as u64);

        if let Some(language) = &response.content_language {
            if !language.contains("en") {
                info!(worker, "Ign: content language not English {request_url} [{size}]");
                return;
            }
        }
        if let Some(content_type) = &response.content_type {
            if !content_type.contains("text/html") {
                info!(worker, "Ign: content type not HTML {request_url} [{size}]");
                return;
            }
        }

        let html = match self.parser.parse(&response.body) {
            Ok(html) => html,
            Err(error) => {
                warn!(worker, "Err: {error} {request_url} [{size}]");
                return;
            }
        };

        if let Err(error) = self.write_artifact(request_url, &html) {
            warn!(worker, "Err: cannot write artifact ({error}) {request_url}");
            return;
        }
        self.crawled_last_interval.fetch_add(1, Ordering::Relaxed);
        info!(worker, "Get: {request_url} [{size}]");

        for link in &html.links {
            let resolved = if link.url.is_absolute() {
                link.url.clone()
            } else {
                match Url::combine(request_url, link.url.as_str()) {
                    Ok(url) => url,
                    Err(_) => continue,
                }
            };
            let already = self.scheduled.lock().contains(resolved.as_str().as_bytes());
            if !already {
                self.route(&resolved);
            }
        }
    }

    /// Robots check plus HTTP GET. Responses with status 301/308 come back
    /// `Ok` for the caller to re-route.
    fn fetch(&self, url: &Url) -> Result<HttpResponse, HttpError> {
        if !self.robots.is_allowed(url) {
            return Err(HttpError::RobotsDisallowed);
        }
        self.client.get(url)
    }

    /// Write `<dataDir>/<seq>.txt` with the request URL line and the parsed
    /// document body. The sequence counter is global and zero-padded to ten
    /// digits.
    fn write_artifact(&self, request_url: &Url, html: &HtmlInfo) -> io::Result<()> {
        let seq = self.total_crawled.fetch_add(1, Ordering::Relaxed);
        let path = self.config.data_dir.join(format!("{seq:010}.txt"));
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "{request_url}")?;
        html.write_to(&mut writer)?;
        writer.flush()
    }

    /// Snapshot the frontier and the scheduled-set (stop-the-world: both
    /// locks stay held across the file write).
    pub fn create_checkpoint(&self) -> Result<(), CrawlerError> {
        let guard = self.frontier.guard();
        let scheduled = self.scheduled.lock();
        let begin = Instant::now();
        info!("checkpoint creation is in progress...");

        checkpoint::write_checkpoint(
            &self.config.checkpoint_path,
            self.total_crawled.load(Ordering::Relaxed),
            &guard,
            &scheduled,
        )?;
        drop(scheduled);
        drop(guard);

        let size = fs::metadata(&self.config.checkpoint_path)
            .map(|m| m.len())
            .unwrap_or(0);
        info!(
            "checkpoint creation finished in {} s [{}]",
            begin.elapsed().as_secs(),
            file_size_to_string(size)
        );
        Ok(())
    }

    fn gc_loop(&self) {
        while self.is_running() {
            self.sleep_while_running(Duration::from_secs(GC_INTERVAL));
            if !self.is_running() {
                break;
            }
            let evicted = self.frontier.evict_excess(FRONTIER_SIZE_LIMIT);
            if evicted > 0 {
                info!("GC evicted {evicted} frontier URLs");
            }
            self.hits_cache.lock().clear();
        }
    }

    fn stats_loop(&self) {
        while self.is_running() {
            let begin = Instant::now();
            self.sleep_while_running(Duration::from_secs(self.config.stats_refresh_interval));
            if !self.is_running() {
                break;
            }
            let elapsed = begin.elapsed().as_secs().max(1);
            let crawled = self.crawled_last_interval.swap(0, Ordering::Relaxed);
            info!(
                "Stats: speed {}/s, total {}, frontier size {}",
                crawled / elapsed,
                self.total_crawled.load(Ordering::Relaxed),
                self.frontier.len()
            );
        }
    }

    fn checkpoint_loop(&self) {
        while self.is_running() {
            self.sleep_while_running(Duration::from_secs(self.config.checkpoint_interval));
            if !self.is_running() {
                break;
            }
            if let Err(error) = self.create_checkpoint() {
                warn!("checkpoint creation failed: {error}");
            }
        }
    }

    fn robots_refresh_loop(&self) {
        while self.is_running() {
            self.sleep_while_running(Duration::from_secs(robots::CACHE_REFRESH_INTERVAL));
            if !self.is_running() {
                break;
            }
            self.robots.refresh();
        }
    }

    /// Sleep in short slices so shutdown is observed promptly.
    fn sleep_while_running(&self, total: Duration) {
        let deadline = Instant::now() + total;
        while self.is_running() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep((deadline - now).min(Duration::from_millis(200)));
        }
    }

    #[cfg(test)]
    pub(crate) fn set_running_for_tests(&self, value: bool) {
        self.running.store(value, Ordering::SeqCst);
    }
}

/// Score a URL for scheduling priority. Integer sum of cheap heuristics;
/// higher crawls sooner.
fn url_score(url: &Url) -> i32 {
    let mut score = 0;

    if url.scheme() == "https" {
        score += 1;
    }
    if url.host().len() <= 20 {
        score += 1;
    }
    if [".edu", ".gov", ".org"]
        .iter()
        .any(|domain| url.host().ends_with(domain))
    {
        score += 1;
    }
    if url.path().len() <= 10 {
        score += 1;
    }
    if url
        .path()
        .chars()
        .filter(|c| !c.is_alphabetic())
        .count()
        > 10
    {
        score -= 1;
    }
    if url.query().is_empty() {
        score += 1;
    }
    if url.query().len() > 20 {
        score -= 1;
    }
    if url.query().len() > 40 {
        score -= 1;
    }

    score
}

/// Link extensions that never lead to HTML documents
const NON_HTML_EXTENSIONS: &[&str] = &[
    "gif", "jpeg", "jpg", "json", "mp3", "mp4", "ogg", "ogv", "pdf", "png", "rdf", "rss", "svg",
    "tiff", "ttf", "txt", "webm", "xml", "zip",
];

/// Host-name first labels marking non-English language editions
/// (wikipedia-style subdomains); sorted for binary search.
const NON_ENGLISH_HOST_PREFIXES: &[&str] = &[
    "aa", "ab", "ace", "af", "ak", "als", "am", "an", "ang", "ar", "arc", "arz", "as", "ast",
    "az", "azb", "ba", "bar", "bcl", "be", "be-tarask", "bg", "bh", "bn", "br", "bs", "ca", "ce",
    "ceb", "chr", "cs", "csb", "cy", "da", "de", "diq", "el", "eo", "es", "et", "eu", "fa", "fi",
    "fo", "fr", "frr", "fy", "ga", "gd", "gl", "gn", "gom", "gu", "ha", "hak", "he", "hi", "hr",
    "hsb", "ht", "hu", "hy", "hyw", "ia", "id", "ie", "io", "is", "it", "ja", "jv", "ka", "kk",
    "kl", "kn", "ko", "ks", "ku", "ky", "la", "lad", "li", "lij", "lo", "lt", "lv", "mg", "min",
    "mk", "ml", "mr", "ms", "mt", "my", "na", "nah", "nap", "nl", "nn", "no", "oc", "or", "pa",
    "pfl", "pl", "pms", "ps", "pt", "ro", "ru", "sa", "sah", "sd", "sh", "sk", "sl", "sq", "sr",
    "sv", "sw", "ta", "te", "tg", "th", "tr", "tt", "uk", "ur", "uz", "vec", "vi", "vo", "wa",
    "war", "yi", "zh", "zh-min-nan", "zh-yue",
];

/// Keep a discovered link only if it plausibly leads to an English HTML page.
fn filter_link(url: &Url, tag: &TagInfo) -> bool {
    // Non-HTML content by URL suffix.
    let path = if url.is_absolute() {
        url.path()
    } else {
        let raw = url.as_str();
        &raw[..raw.find(['?', '#']).unwrap_or(raw.len())]
    };
    if let Some(dot) = path.rfind('.') {
        let suffix = path[dot + 1..].to_ascii_lowercase();
        if NON_HTML_EXTENSIONS.binary_search(&suffix.as_str()).is_ok() {
            return false;
        }
    }

    // Non-English content by tag attributes.
    let language = tag.attr("hreflang").or_else(|| tag.attr("lang"));
    if let Some(language) = language {
        if !language.contains("en") {
            return false;
        }
    }

    // Non-English content by host prefix.
    if url.is_absolute() {
        let host = url.host();
        let prefix = &host[..host.find('.').unwrap_or(host.len())];
        if NON_ENGLISH_HOST_PREFIXES.binary_search(&prefix).is_ok() {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::TagInfo;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> CrawlConfig {
        CrawlConfig {
            data_dir: dir.path().to_path_buf(),
            checkpoint_path: dir.path().join("crawl.checkpoint"),
            ..CrawlConfig::default()
        }
    }

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn score_prefers_clean_https_urls() {
        let good = url("https://mit.edu/");
        let bad = url("http://averylonghostname.example.xyz/some/deep/path-1/2?session=abcdefghijklmnopqrstuvwxyz0123456789abcdef");
        assert!(url_score(&good) > url_score(&bad));
    }

    #[test]
    fn score_components() {
        // https + short host + .org + short path + empty query
        assert_eq!(url_score(&url("https://rust.org/")), 5);
        // A query longer than 40 characters loses both query penalties.
        let long_query = format!("http://example.com/?q={}", "x".repeat(50));
        assert_eq!(url_score(&url(&long_query)), 0);
        assert_eq!(url_score(&url("http://example.com/?q=1")), 2);
    }

    #[test]
    fn link_filter_rejects_media_extensions() {
        let tag = TagInfo::parse("<a href=\"/x\">").unwrap();
        assert!(!filter_link(&url("http://example.com/photo.JPG"), &tag));
        assert!(!filter_link(&url("http://example.com/feed.xml"), &tag));
        assert!(filter_link(&url("http://example.com/page.html"), &tag));
        // Relative links are filtered on their raw path.
        assert!(!filter_link(&url("images/logo.png"), &tag));
        assert!(filter_link(&url("articles/today"), &tag));
    }

    #[test]
    fn link_filter_rejects_language_hints() {
        let url_ok = url("http://example.com/page");
        let english = TagInfo::parse("<a hreflang=\"en-US\" href=\"/x\">").unwrap();
        let german = TagInfo::parse("<a hreflang=\"de\" href=\"/x\">").unwrap();
        assert!(filter_link(&url_ok, &english));
        assert!(!filter_link(&url_ok, &german));

        let plain = TagInfo::parse("<a href=\"/x\">").unwrap();
        assert!(!filter_link(&url("https://de.wikipedia.org/wiki/Haus"), &plain));
        assert!(filter_link(&url("https://en.wikipedia.org/wiki/House"), &plain));
    }

    #[test]
    fn batch_respects_size_and_marks_scheduled() {
        let dir = TempDir::new().unwrap();
        let crawler = Crawler::from_seeds(
            (0..10).map(|i| url(&format!("http://host{i}.test/page"))).collect(),
            test_config(&dir),
        );
        crawler.set_running_for_tests(true);

        let batch = crawler.next_url_batch(5, 2);
        assert_eq!(batch.len(), 5);
        assert_eq!(crawler.frontier_len(), 5);

        // Everything handed out is now scheduled and never re-dispatched.
        {
            let scheduled = crawler.scheduled.lock();
            for url in &batch {
                assert!(scheduled.contains(url.as_str().as_bytes()));
            }
        }
        for url in &batch {
            crawler.insert_frontier(url);
        }
        assert_eq!(crawler.frontier_len(), 5);
    }

    #[test]
    fn batch_is_sorted_by_score() {
        let dir = TempDir::new().unwrap();
        let seeds = vec![
            url("https://short.org/a"),
            url(&format!(
                "http://averyveryverylonghostname.example/{}?q={}",
                "p".repeat(40),
                "x".repeat(50)
            )),
            url("https://also.org/b"),
            url("http://plain.example.com/some/longer/path/here"),
        ];
        let crawler = Crawler::from_seeds(seeds, test_config(&dir));
        crawler.set_running_for_tests(true);

        let batch = crawler.next_url_batch(2, 2);
        assert_eq!(batch.len(), 2);
        for window in batch.windows(2) {
            assert!(url_score(&window[0]) >= url_score(&window[1]));
        }
        assert!(batch.iter().all(|u| u.host().ends_with(".org")));
    }

    #[test]
    fn host_rate_limit_caps_one_batch() {
        let dir = TempDir::new().unwrap();
        let crawler = Crawler::from_seeds(
            (0..10).map(|i| url(&format!("http://same-host.test/{i}"))).collect(),
            test_config(&dir),
        );
        crawler.set_running_for_tests(true);

        // Pretend the host exhausted its window.
        crawler
            .hits_cache
            .lock()
            .insert("same-host.test".to_string(), HOST_HIT_RATE_LIMIT);

        let before = crawler.frontier_len();

        // The sample never blocks (the frontier is full enough) but every
        // candidate is rate-limited, so nothing dispatches.
        let batch = crawler.next_url_batch(5, 2);
        assert!(batch.is_empty());
        assert_eq!(crawler.frontier_len(), before);

        // After the GC window clears the cache, dispatch resumes.
        crawler.hits_cache.lock().clear();
        let batch = crawler.next_url_batch(5, 2);
        assert_eq!(batch.len(), 5);
    }

    #[test]
    fn insert_frontier_skips_scheduled_urls() {
        let dir = TempDir::new().unwrap();
        let crawler = Crawler::from_seeds(Vec::new(), test_config(&dir));
        let target = url("http://example.com/a");

        crawler.scheduled.lock().insert(target.as_str().as_bytes());
        crawler.insert_frontier(&target);
        assert_eq!(crawler.frontier_len(), 0);

        crawler.insert_frontier(&url("http://example.com/b"));
        assert_eq!(crawler.frontier_len(), 1);

        // Relative URLs never enter the frontier.
        crawler.insert_frontier(&url("relative/path"));
        assert_eq!(crawler.frontier_len(), 1);
    }

    #[test]
    fn checkpoint_round_trip_through_crawler() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let seeds: Vec<Url> = (0..10).map(|i| url(&format!("https://seed{i}.test/"))).collect();
        let crawler = Crawler::from_seeds(seeds.clone(), config.clone());
        crawler
            .scheduled
            .lock()
            .insert(url("https://done.test/").as_str().as_bytes());

        crawler.create_checkpoint().unwrap();

        let checkpoint_path = config.checkpoint_path.clone();
        let restored = Crawler::from_checkpoint(&checkpoint_path, config).unwrap();
        assert_eq!(restored.frontier_len(), 10);
        assert_eq!(
            *restored.frontier.guard(),
            seeds.into_iter().collect::<std::collections::HashSet<_>>()
        );
        assert!(restored
            .scheduled
            .lock()
            .contains(url("https://done.test/").as_str().as_bytes()));
    }
}
