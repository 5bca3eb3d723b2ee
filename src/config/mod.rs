//! Configuration for the crawl node

mod crawl;
mod logging;
mod node;

pub use crawl::CrawlConfig;
pub use logging::init_logging;
pub use node::{read_hosts, NodeConfig};

/// User agent sent with every HTTP request
pub const DEFAULT_USER_AGENT: &str = "UMichBot";
