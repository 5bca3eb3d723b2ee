//! robots.txt catalog
//!
//! Rules are fetched lazily per host and cached with a hit counter. A
//! background task decays the counters on a fixed interval and evicts entries
//! that went cold, so the cache tracks the hosts the crawl is actually
//! touching. Fetch failures degrade to an empty rule set: an unreachable
//! origin must not block the crawl.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::net::{HttpClient, Url};

/// Seconds between decay passes over the cache
pub const CACHE_REFRESH_INTERVAL: u64 = 5;
/// Hits an entry must collect per refresh interval to stay cached
const CACHE_HIT_RATE_THRESHOLD: i64 = 1;

/// Directive kind of one robots.txt rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Allow,
    Disallow,
}

/// One rule: directive plus the verbatim path pattern
#[derive(Debug, Clone)]
pub struct Rule {
    pub kind: RuleKind,
    pub pattern: String,
}

#[derive(Debug)]
struct CacheEntry {
    rules: Arc<Vec<Rule>>,
    hits: i64,
}

/// Per-host robots.txt cache with aging
pub struct RobotsCatalog {
    client: HttpClient,
    cache: Mutex<HashMap<String, CacheEntry>>,
}

impl Default for RobotsCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl RobotsCatalog {
    pub fn new() -> Self {
        let mut client = HttpClient::new();
        client.headers.accept = Some("text/plain".to_string());
        Self {
            client,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Whether the URL may be crawled, fetching the host's robots.txt on the
    /// first query.
    pub fn is_allowed(&self, url: &Url) -> bool {
        let host = url.host().to_string();

        let mut cache = self.cache.lock();
        if !cache.contains_key(&host) {
            // Fetch without the lock held; losing a race just refetches.
            drop(cache);
            let rules = Arc::new(self.fetch_rules(url));
            cache = self.cache.lock();
            cache
                .entry(host.clone())
                .or_insert(CacheEntry { rules, hits: 0 });
        }

        let entry = cache.get_mut(&host).expect("entry inserted above");
        entry.hits += 1;
        let rules = Arc::clone(&entry.rules);
        drop(cache);

        decide(&rules, url.path())
    }

    /// Decay hit counters and evict entries that went cold.
    pub fn refresh(&self) {
        let mut cache = self.cache.lock();
        for entry in cache.values_mut() {
            entry.hits = (entry.hits - CACHE_HIT_RATE_THRESHOLD * CACHE_REFRESH_INTERVAL as i64)
                .max(0);
        }
        let before = cache.len();
        cache.retain(|_, entry| entry.hits > 0);
        if cache.len() < before {
            debug!(evicted = before - cache.len(), "aged out cold robots.txt entries");
        }
    }

    fn fetch_rules(&self, url: &Url) -> Vec<Rule> {
        let Ok(robots_url) = Url::combine(url, "/robots.txt") else {
            return Vec::new();
        };
        match self.client.get(&robots_url) {
            Ok(response) if response.status == 200 => parse_rules(&response.body),
            // Any HTTP failure means no rules: stay permissive.
            _ => Vec::new(),
        }
    }

    #[cfg(test)]
    fn put_rules(&self, host: &str, rules: Vec<Rule>) {
        self.cache.lock().insert(
            host.to_string(),
            CacheEntry {
                rules: Arc::new(rules),
                hits: 0,
            },
        );
    }
}

/// Walk the rules in file order. Any matching Allow wins immediately; a
/// matching Disallow only loses if no later Allow matches. No match allows.
fn decide(rules: &[Rule], path: &str) -> bool {
    let mut disallowed = false;
    for rule in rules {
        if starts_with_pattern(path, &rule.pattern) {
            match rule.kind {
                RuleKind::Allow => return true,
                RuleKind::Disallow => disallowed = true,
            }
        }
    }
    !disallowed
}

/// Parse a robots.txt body into the rules of the `*` user-agent group.
///
/// Group tracking is intentionally simple: a rule line counts only while the
/// most recent `user-agent` line was exactly `*`.
pub fn parse_rules(robots: &str) -> Vec<Rule> {
    let mut rules = Vec::new();
    let mut current_user_agent = String::new();

    for line in robots.lines() {
        let line = line.trim_end();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.to_lowercase();
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        if name == "user-agent" {
            current_user_agent = value.to_string();
        }
        if current_user_agent != "*" {
            continue;
        }

        match name.as_str() {
            "allow" => rules.push(Rule {
                kind: RuleKind::Allow,
                pattern: value.to_string(),
            }),
            "disallow" => rules.push(Rule {
                kind: RuleKind::Disallow,
                pattern: value.to_string(),
            }),
            _ => {}
        }
    }
    rules
}

/// Prefix match where `*` in the pattern spans zero or more bytes.
///
/// The empty pattern matches everything; the empty path matches only the
/// patterns `""` and `"*"`. Recursion with backtracking over `*`.
pub fn starts_with_pattern(path: &str, pattern: &str) -> bool {
    fn matches(path: &[u8], pattern: &[u8]) -> bool {
        if pattern.is_empty() {
            return true;
        }
        if path.is_empty() {
            return pattern == b"*";
        }
        if path[0] == pattern[0] {
            return matches(&path[1..], &pattern[1..]);
        }
        if pattern[0] == b'*' {
            return matches(path, &pattern[1..]) || matches(&path[1..], pattern);
        }
        false
    }
    matches(path.as_bytes(), pattern.as_bytes())
}
