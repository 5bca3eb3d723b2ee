//! Peer-to-peer URL forwarding across the static fleet
//!
//! Every node dials every fleet member (itself included) on the peer port and
//! accepts one inbound connection per member before crawling starts. After the
//! handshake, a fresh accept loop runs indefinitely for reconnects, and one
//! send thread per remote peer drains that peer's queue over a persistent
//! connection with 1 s reconnect back-off.
//!
//! The crawler consumes this layer through the [`UrlRouter`] capability, and
//! this layer feeds URLs back through [`Crawler::insert_frontier`]; the
//! circular shape is resolved by binding the router after construction.

mod peer;
mod wire;

pub use peer::{PeerQueue, PEER_QUEUE_CAP};
pub use wire::{decode_frame, encode_frame, PeerCommand, KILL_COMMAND};

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;
use tracing::{info, warn};

use crate::crawler::{Crawler, UrlRouter};
use crate::net::Url;
use crate::routing::shard_for;

/// TCP port every fleet member listens on
pub const PEER_PORT: u16 = 8888;
/// Listen backlog for the peer listener
const LISTEN_BACKLOG: i32 = 10;
/// Back-off between reconnect attempts
const RECONNECT_BACKOFF: Duration = Duration::from_secs(1);
/// Consecutive receive errors before an inbound peer is dropped
const MAX_RECV_ERRORS: u32 = 10;

#[derive(Debug, Error)]
pub enum DistributedError {
    #[error("server id {server_id} is out of range for a fleet of {fleet}")]
    InvalidServerId { server_id: usize, fleet: usize },
    #[error("cannot bind the peer listener: {0}")]
    Bind(std::io::Error),
}

/// Shard router and peer connection manager
pub struct Distributed {
    hosts: Vec<String>,
    server_id: usize,
    crawler: Arc<Crawler>,
    /// Lifecycle flag for peer loops; handlers run before the crawl starts,
    /// so this is distinct from the crawler's running flag
    alive: Arc<AtomicBool>,
    /// One queue per fleet member; this node's own slot stays empty
    queues: Vec<PeerQueue>,
    /// Outbound sockets, replaced atomically on reconnect
    sockets: Vec<Mutex<Option<TcpStream>>>,
    send_threads: Mutex<Vec<JoinHandle<()>>>,
}

impl Distributed {
    /// Bind the peer port, perform the fleet handshake, and start the send
    /// loops. Blocks until every fleet member is connected both ways.
    pub fn start(
        hosts: Vec<String>,
        server_id: usize,
        crawler: Arc<Crawler>,
    ) -> Result<Arc<Self>, DistributedError> {
        if server_id >= hosts.len() {
            return Err(DistributedError::InvalidServerId {
                server_id,
                fleet: hosts.len(),
            });
        }

        let alive = Arc::new(AtomicBool::new(true));
        let listener = bind_listener().map_err(DistributedError::Bind)?;

        // Handshake: expect one inbound connection per fleet member (every
        // node dials every host, itself included).
        let expected = hosts.len();
        let handshake = {
            let listener = listener.try_clone().map_err(DistributedError::Bind)?;
            let crawler = Arc::clone(&crawler);
            let alive = Arc::clone(&alive);
            thread::spawn(move || accept_connections(listener, crawler, alive, Some(expected)))
        };

        let mut sockets = Vec::with_capacity(hosts.len());
        for host in &hosts {
            info!("connecting to peer {host}:{PEER_PORT}...");
            let stream = loop {
                match TcpStream::connect((host.as_str(), PEER_PORT)) {
                    Ok(stream) => break stream,
                    Err(_) => thread::sleep(RECONNECT_BACKOFF),
                }
            };
            sockets.push(Mutex::new(Some(stream)));
        }

        let _ = handshake.join();
        info!("all {} fleet members connected; cluster formed", hosts.len());

        // Fresh accept loop for reconnecting peers, detached for the rest of
        // the process lifetime.
        {
            let crawler = Arc::clone(&crawler);
            let alive = Arc::clone(&alive);
            thread::spawn(move || accept_connections(listener, crawler, alive, None));
        }

        let queues = hosts.iter().map(|_| PeerQueue::new()).collect();
        let distributed = Arc::new(Self {
            hosts,
            server_id,
            crawler: Arc::clone(&crawler),
            alive,
            queues,
            sockets,
            send_threads: Mutex::new(Vec::new()),
        });

        let router: Arc<dyn UrlRouter> = distributed.clone();
        crawler.bind_router(router);

        let mut senders = distributed.send_threads.lock();
        for peer in 0..distributed.hosts.len() {
            if peer == distributed.server_id {
                continue;
            }
            let distributed = Arc::clone(&distributed);
            senders.push(thread::spawn(move || distributed.send_loop(peer)));
        }
        drop(senders);

        Ok(distributed)
    }

    /// Stop the send loops and join them. Inbound handler threads observe the
    /// cleared flag on their next read timeout.
    pub fn shutdown(&self) {
        self.alive.store(false, Ordering::SeqCst);
        for queue in &self.queues {
            queue.wake_all();
        }
        for handle in self.send_threads.lock().drain(..) {
            let _ = handle.join();
        }
    }

    /// Drain one peer's queue over its persistent connection.
    fn send_loop(&self, peer: usize) {
        while self.alive.load(Ordering::SeqCst) {
            let Some(url) = self.queues[peer].pop_wait(|| self.alive.load(Ordering::SeqCst))
            else {
                break;
            };
            let frame = encode_frame(&url);

            loop {
                let sent = {
                    let mut socket = self.sockets[peer].lock();
                    match socket.as_mut() {
                        Some(stream) => stream.write_all(&frame).is_ok(),
                        None => false,
                    }
                };
                if sent {
                    break;
                }
                warn!("sending to peer {} failed; reconnecting", self.hosts[peer]);
                if !self.reconnect(peer) {
                    return;
                }
            }
        }
    }

    /// Re-dial a peer with back-off until connected, trimming its queue while
    /// it is away. Returns false if shutdown interrupts the attempt.
    fn reconnect(&self, peer: usize) -> bool {
        loop {
            if !self.alive.load(Ordering::SeqCst) {
                return false;
            }
            match TcpStream::connect((self.hosts[peer].as_str(), PEER_PORT)) {
                Ok(stream) => {
                    *self.sockets[peer].lock() = Some(stream);
                    info!("reconnected to peer {}", self.hosts[peer]);
                    return true;
                }
                Err(_) => {
                    let evicted = self.queues[peer].trim_overflow();
                    if evicted > 0 {
                        warn!(
                            "evicted {evicted} queued URLs for unreachable peer {}",
                            self.hosts[peer]
                        );
                    }
                    thread::sleep(RECONNECT_BACKOFF);
                }
            }
        }
    }

    #[cfg(test)]
    fn stub(hosts: Vec<String>, server_id: usize, crawler: Arc<Crawler>) -> Arc<Self> {
        let queues = hosts.iter().map(|_| PeerQueue::new()).collect();
        let sockets = hosts.iter().map(|_| Mutex::new(None)).collect();
        Arc::new(Self {
            hosts,
            server_id,
            crawler,
            alive: Arc::new(AtomicBool::new(true)),
            queues,
            sockets,
            send_threads: Mutex::new(Vec::new()),
        })
    }
}

impl UrlRouter for Distributed {
    /// Insert locally or enqueue for the owning peer, per `hash(url) mod N`.
    fn route(&self, url: &Url) {
        if !self.alive.load(Ordering::SeqCst) || !url.is_absolute() {
            return;
        }
        let shard = shard_for(url, self.hosts.len());
        if shard == self.server_id {
            self.crawler.insert_frontier(url);
        } else {
            self.queues[shard].push(url.clone());
        }
    }
}

fn bind_listener() -> std::io::Result<TcpListener> {
    let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    let address: SocketAddr = ([0, 0, 0, 0], PEER_PORT).into();
    socket.bind(&address.into())?;
    socket.listen(LISTEN_BACKLOG)?;
    Ok(socket.into())
}

/// Accept inbound peer connections, spawning one detached handler per
/// connection. With `limit` set, return after that many accepts (the
/// handshake); otherwise run until shutdown.
fn accept_connections(
    listener: TcpListener,
    crawler: Arc<Crawler>,
    alive: Arc<AtomicBool>,
    limit: Option<usize>,
) {
    let mut remaining = limit;
    loop {
        if remaining == Some(0) {
            break;
        }
        match listener.accept() {
            Ok((stream, peer_addr)) => {
                info!("accepted peer connection from {peer_addr}");
                let crawler = Arc::clone(&crawler);
                let alive = Arc::clone(&alive);
                thread::spawn(move || handle_peer(stream, crawler, alive));
                if let Some(n) = &mut remaining {
                    *n -= 1;
                }
            }
            Err(error) => {
                warn!("peer accept failed: {error}");
                if !alive.load(Ordering::SeqCst) {
                    break;
                }
            }
        }
    }
}

/// Read NUL-terminated frames one byte at a time and apply them. Gives up on
/// the peer after ten consecutive receive errors within one frame.
fn handle_peer(mut stream: TcpStream, crawler: Arc<Crawler>, alive: Arc<AtomicBool>) {
    // Short read timeout so the handler observes shutdown.
    let _ = stream.set_read_timeout(Some(Duration::from_secs(1)));

    while alive.load(Ordering::SeqCst) {
        let mut payload = Vec::new();
        let mut errors = 0u32;
        loop {
            let mut byte = [0u8; 1];
            match stream.read(&mut byte) {
                Ok(0) => return, // peer closed the connection
                Ok(_) => {
                    if byte[0] == 0 {
                        break;
                    }
                    payload.push(byte[0]);
                }
                Err(e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    // Poll timeout, not a failure.
                    if !alive.load(Ordering::SeqCst) {
                        return;
                    }
                }
                Err(error) => {
                    errors += 1;
                    warn!("peer receive failed ({error}), attempt {errors}");
                    if errors > MAX_RECV_ERRORS {
                        warn!("giving up on peer connection");
                        return;
                    }
                }
            }
        }

        if payload.is_empty() {
            continue;
        }
        match decode_frame(&payload) {
            PeerCommand::Shutdown => {
                info!("received kill command; initiating shutdown");
                alive.store(false, Ordering::SeqCst);
                crawler.request_shutdown();
                return;
            }
            PeerCommand::Insert(url) => crawler.insert_frontier(&url),
            PeerCommand::Ignore => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlConfig;
    use tempfile::TempDir;

    fn test_crawler(dir: &TempDir) -> Arc<Crawler> {
        let config = CrawlConfig {
            data_dir: dir.path().to_path_buf(),
            checkpoint_path: dir.path().join("crawl.checkpoint"),
            ..CrawlConfig::default()
        };
        Arc::new(Crawler::from_seeds(Vec::new(), config))
    }

    #[test]
    fn routes_remote_shards_to_peer_queues() {
        let dir = TempDir::new().unwrap();
        let crawler = test_crawler(&dir);
        let hosts: Vec<String> = (0..3).map(|i| format!("node-{i}.internal")).collect();

        // Find a URL owned by some shard, then pose as a different node.
        let url = Url::parse("https://example.com/remote").unwrap();
        let owner = shard_for(&url, hosts.len());
        let server_id = (owner + 1) % hosts.len();

        let distributed = Distributed::stub(hosts, server_id, Arc::clone(&crawler));
        distributed.route(&url);

        assert!(distributed.queues[owner].contains(&url));
        assert_eq!(crawler.frontier_len(), 0);
    }

    #[test]
    fn routes_local_shard_to_frontier() {
        let dir = TempDir::new().unwrap();
        let crawler = test_crawler(&dir);
        let hosts: Vec<String> = (0..3).map(|i| format!("node-{i}.internal")).collect();

        let url = Url::parse("https://example.com/local").unwrap();
        let owner = shard_for(&url, hosts.len());

        let distributed = Distributed::stub(hosts, owner, Arc::clone(&crawler));
        distributed.route(&url);

        assert_eq!(crawler.frontier_len(), 1);
        assert!(distributed.queues.iter().all(|q| q.is_empty()));
    }

    #[test]
    fn forwarded_frame_inserts_on_the_receiving_node() {
        let dir = TempDir::new().unwrap();
        let receiver = test_crawler(&dir);

        let url = Url::parse("https://example.com/forwarded").unwrap();
        let frame = encode_frame(&url);
        match decode_frame(&frame[..frame.len() - 1]) {
            PeerCommand::Insert(received) => receiver.insert_frontier(&received),
            other => panic!("expected Insert, got {other:?}"),
        }
        assert_eq!(receiver.frontier_len(), 1);
    }

    #[test]
    fn relative_urls_never_route() {
        let dir = TempDir::new().unwrap();
        let crawler = test_crawler(&dir);
        let distributed = Distributed::stub(
            vec!["node-0.internal".to_string()],
            0,
            Arc::clone(&crawler),
        );

        distributed.route(&Url::parse("relative/only").unwrap());
        assert_eq!(crawler.frontier_len(), 0);
    }
}
