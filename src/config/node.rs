//! Node identity within the static peer fleet

use std::fs;
use std::io;
use std::path::Path;

/// This node's place in the fleet
///
/// The host list is ordered and identical on every node; `server_id` indexes
/// this node's own entry. Membership is static for the lifetime of a run.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub server_id: usize,
    pub hosts: Vec<String>,
}

impl NodeConfig {
    /// A single-node fleet, used when no hostname file is given.
    pub fn standalone() -> Self {
        Self {
            server_id: 0,
            hosts: vec!["127.0.0.1".to_string()],
        }
    }
}

/// Read the peer host list, one host per line; blank lines are skipped.
pub fn read_hosts(path: &Path) -> io::Result<Vec<String>> {
    Ok(fs::read_to_string(path)?
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_host_list() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("hosts");
        fs::write(&path, "node-a.internal\n\nnode-b.internal\nnode-c.internal\n").unwrap();
        let hosts = read_hosts(&path).unwrap();
        assert_eq!(hosts, ["node-a.internal", "node-b.internal", "node-c.internal"]);
    }
}
