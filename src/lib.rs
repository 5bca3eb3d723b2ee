//! dcrawl: distributed multi-threaded web crawler
//!
//! A fleet of nodes discovers HTML documents across the public web, extracts
//! text and outbound links, and writes per-document artifact files. Each node
//! owns a deterministic shard of the URL space; cross-shard discoveries are
//! forwarded to their owner over persistent TCP connections.
//!
//! Key components:
//! - `net`: URL model and the blocking HTTP/1.1 client (TLS via native-tls)
//! - `html`: streaming tag scanner and the artifact format
//! - `crawler`: frontier, batch scheduler, worker pool, robots catalog,
//!   checkpoint engine, background tasks
//! - `routing`: Bloom-filter scheduled-set and shard assignment
//! - `distributed`: peer send queues, accept loop, fleet handshake

pub mod config;
pub mod crawler;
pub mod distributed;
pub mod html;
pub mod net;
pub mod routing;
pub mod util;

pub use config::CrawlConfig;
pub use crawler::Crawler;
pub use distributed::Distributed;
pub use net::Url;
