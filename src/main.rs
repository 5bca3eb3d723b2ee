//! Command-line driver for a dcrawl node

use std::fs;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use dcrawl::config::{init_logging, read_hosts, CrawlConfig, NodeConfig};
use dcrawl::{Crawler, Distributed, Url};

/// Recommended open-file limit for a crawl node
#[cfg(unix)]
const RECOMMENDED_FD_LIMIT: u64 = 65_536;

#[derive(Parser)]
#[command(name = "dcrawl")]
#[command(about = "Distributed multi-threaded web crawler")]
#[command(version)]
struct Cli {
    /// File with seed URLs, one per line
    #[arg(long = "seed_file")]
    seed_file: Option<PathBuf>,

    /// Number of worker threads
    #[arg(long = "num_threads", default_value_t = 1)]
    num_threads: usize,

    /// Log file path (stderr if omitted)
    #[arg(long = "log_path")]
    log_path: Option<PathBuf>,

    /// Directory for per-document artifact files
    #[arg(long = "data_dir", default_value = "data")]
    data_dir: PathBuf,

    /// Checkpoint file path
    #[arg(long = "checkpoint_path", default_value = "crawl.checkpoint")]
    checkpoint_path: PathBuf,

    /// Seconds between stats lines
    #[arg(long = "stats_refresh_interval", default_value_t = 5)]
    stats_refresh_interval: u64,

    /// Expected total number of URLs (sizes the scheduled-set)
    #[arg(long = "expected_num_urls", default_value_t = 1_000_000)]
    expected_num_urls: usize,

    /// Seconds between periodic checkpoints
    #[arg(long = "checkpoint_interval", default_value_t = 600)]
    checkpoint_interval: u64,

    /// This node's index into the hostname list
    #[arg(long = "serverID", default_value_t = 0)]
    server_id: usize,

    /// File with fleet hostnames, one per line; single-node when omitted
    #[arg(long = "hostname_path")]
    hostname_path: Option<PathBuf>,

    /// Answer yes to every confirmation prompt
    #[arg(long = "assume_yes")]
    assume_yes: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_path.as_deref())?;

    #[cfg(unix)]
    {
        ignore_sigpipe();
        raise_fd_limit(cli.assume_yes)?;
    }

    if !cli.data_dir.exists() {
        println!(
            "The data directory {} does not exist. Create it? [Y/n]",
            cli.data_dir.display()
        );
        if confirm(cli.assume_yes) {
            fs::create_dir_all(&cli.data_dir)
                .with_context(|| format!("cannot create data directory {}", cli.data_dir.display()))?;
            println!("Created data directory {}.", cli.data_dir.display());
        }
    }

    let config = CrawlConfig {
        data_dir: cli.data_dir,
        checkpoint_path: cli.checkpoint_path,
        stats_refresh_interval: cli.stats_refresh_interval,
        expected_num_urls: cli.expected_num_urls,
        checkpoint_interval: cli.checkpoint_interval,
    };

    // Resume from the checkpoint when one exists and the user agrees;
    // otherwise seed a fresh frontier.
    let mut crawler = None;
    if config.checkpoint_path.exists() {
        println!(
            "A checkpoint file was found at {}. Load it? [Y/n]",
            config.checkpoint_path.display()
        );
        if confirm(cli.assume_yes) {
            let checkpoint_path = config.checkpoint_path.clone();
            crawler = Some(
                Crawler::from_checkpoint(&checkpoint_path, config.clone())
                    .context("cannot load the checkpoint file")?,
            );
        }
    }
    let crawler = Arc::new(match crawler {
        Some(crawler) => crawler,
        None => {
            let seed_file = cli
                .seed_file
                .context("--seed_file is required when starting without a checkpoint")?;
            Crawler::from_seeds(read_seeds(&seed_file)?, config)
        }
    });

    let node = match cli.hostname_path {
        Some(path) => NodeConfig {
            server_id: cli.server_id,
            hosts: read_hosts(&path)
                .with_context(|| format!("cannot read hostname file {}", path.display()))?,
        },
        None => NodeConfig::standalone(),
    };
    if node.hosts.is_empty() {
        bail!("the hostname file lists no hosts");
    }

    let distributed = Distributed::start(node.hosts, node.server_id, Arc::clone(&crawler))
        .context("cannot start the peer layer")?;

    crawler.begin_crawl(cli.num_threads)?;
    info!("the crawler has begun crawling; press Enter to stop");

    // Either the operator or a peer's kill frame stops the run.
    watch_stdin(Arc::clone(&crawler));
    while crawler.is_running() {
        std::thread::sleep(Duration::from_millis(200));
    }

    if let Err(error) = crawler.end_crawl() {
        warn!("teardown: {error}");
    }
    distributed.shutdown();
    info!("shutdown complete");
    Ok(())
}

/// Parse the seed file, one URL per line; malformed lines abort startup.
fn read_seeds(path: &std::path::Path) -> Result<Vec<Url>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("cannot open seed file {}", path.display()))?;
    let mut seeds = Vec::new();
    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let url = Url::parse(line).with_context(|| format!("malformed seed URL {line}"))?;
        if !url.is_absolute() {
            bail!("seed URL {line} is not absolute");
        }
        seeds.push(url);
    }
    Ok(seeds)
}

/// Ask the operator for a y/n answer, auto-answering yes under --assume_yes.
fn confirm(assume_yes: bool) -> bool {
    if assume_yes {
        return true;
    }
    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "" | "y" | "Y" | "yes" | "Yes")
}

/// Dedicated thread turning an Enter keypress into a shutdown request.
fn watch_stdin(crawler: Arc<Crawler>) {
    std::thread::spawn(move || {
        let mut line = String::new();
        let _ = std::io::stdin().lock().read_line(&mut line);
        crawler.request_shutdown();
    });
}

/// Writes to a dropped peer raise SIGPIPE on unix; the send loops handle the
/// write error instead.
#[cfg(unix)]
fn ignore_sigpipe() {
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_IGN);
    }
}

/// File descriptors scale with workers, peers, and inbound handlers; offer to
/// raise the soft limit when it is below the recommended value.
#[cfg(unix)]
fn raise_fd_limit(assume_yes: bool) -> Result<()> {
    let mut limit = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    if unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut limit) } != 0 {
        bail!("getrlimit failed: {}", std::io::Error::last_os_error());
    }
    if limit.rlim_cur >= RECOMMENDED_FD_LIMIT {
        return Ok(());
    }

    println!(
        "The open-file limit is low ({}). Raise it to {}? [Y/n]",
        limit.rlim_cur, RECOMMENDED_FD_LIMIT
    );
    if !confirm(assume_yes) {
        return Ok(());
    }

    limit.rlim_cur = RECOMMENDED_FD_LIMIT.min(limit.rlim_max);
    if unsafe { libc::setrlimit(libc::RLIMIT_NOFILE, &limit) } != 0 {
        warn!(
            "cannot raise the open-file limit: {}",
            std::io::Error::last_os_error()
        );
    } else {
        println!("The open-file limit is now {}.", limit.rlim_cur);
    }
    Ok(())
}
