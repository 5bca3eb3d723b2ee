//! Fleet-level integration tests
//!
//! These run a real single-node fleet on the peer port: handshake, local
//! routing, frame handling, and the kill command.

use std::io::Write;
use std::net::TcpStream;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use dcrawl::config::CrawlConfig;
use dcrawl::distributed::PEER_PORT;
use dcrawl::{Crawler, Distributed, Url};

fn wait_for<F: Fn() -> bool>(condition: F, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    condition()
}

#[test]
fn single_node_fleet_forms_routes_and_kills() {
    let dir = TempDir::new().unwrap();
    let config = CrawlConfig {
        data_dir: dir.path().to_path_buf(),
        checkpoint_path: dir.path().join("crawl.checkpoint"),
        ..CrawlConfig::default()
    };
    let crawler = Arc::new(Crawler::from_seeds(Vec::new(), config));

    // A fleet of one: the node dials itself and accepts its own connection.
    let distributed =
        Distributed::start(vec!["127.0.0.1".to_string()], 0, Arc::clone(&crawler)).unwrap();

    // With one shard, every routed URL stays local.
    crawler.route(&Url::parse("https://example.com/a").unwrap());
    assert_eq!(crawler.frontier_len(), 1);

    // A frame arriving on the peer port inserts into the frontier.
    {
        let mut stream = TcpStream::connect(("127.0.0.1", PEER_PORT)).unwrap();
        stream.write_all(b"https://example.com/b\0").unwrap();
        stream.flush().unwrap();
        assert!(
            wait_for(|| crawler.frontier_len() == 2, Duration::from_secs(5)),
            "forwarded URL never reached the frontier"
        );
    }

    // Background threads only; no fetch workers in this test.
    crawler.begin_crawl(0).unwrap();
    assert!(crawler.is_running());

    // The kill command initiates shutdown.
    {
        let mut stream = TcpStream::connect(("127.0.0.1", PEER_PORT)).unwrap();
        stream.write_all(b"kill\0").unwrap();
        stream.flush().unwrap();
    }
    assert!(
        wait_for(|| !crawler.is_running(), Duration::from_secs(5)),
        "kill frame did not stop the crawler"
    );

    crawler.end_crawl().unwrap();
    distributed.shutdown();
}
