//! Peer wire protocol
//!
//! Frames are ASCII canonical URL strings, each terminated by a single NUL
//! byte; no other framing. The literal payload `kill` instructs the receiver
//! to initiate shutdown.

use crate::net::Url;

/// Payload that triggers shutdown on the receiving node
pub const KILL_COMMAND: &[u8] = b"kill";

/// Decoded inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum PeerCommand {
    /// The sender asked this node to shut down
    Shutdown,
    /// A URL forwarded into this node's shard
    Insert(Url),
    /// Unparseable or non-absolute payload; the frame is dropped
    Ignore,
}

/// Encode one outbound frame: canonical URL bytes plus the NUL terminator.
pub fn encode_frame(url: &Url) -> Vec<u8> {
    let mut frame = Vec::with_capacity(url.as_str().len() + 1);
    frame.extend_from_slice(url.as_str().as_bytes());
    frame.push(0);
    frame
}

/// Decode one frame payload (without its NUL terminator).
pub fn decode_frame(payload: &[u8]) -> PeerCommand {
    if payload == KILL_COMMAND {
        return PeerCommand::Shutdown;
    }
    let Ok(text) = std::str::from_utf8(payload) else {
        return PeerCommand::Ignore;
    };
    match Url::parse(text) {
        Ok(url) if url.is_absolute() => PeerCommand::Insert(url),
        _ => PeerCommand::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_round_trip() {
        let url = Url::parse("https://example.com/a?b=c").unwrap();
        let frame = encode_frame(&url);
        assert_eq!(frame.last(), Some(&0));
        assert_eq!(
            decode_frame(&frame[..frame.len() - 1]),
            PeerCommand::Insert(url)
        );
    }

    #[test]
    fn kill_payload_requests_shutdown() {
        assert_eq!(decode_frame(b"kill"), PeerCommand::Shutdown);
    }

    #[test]
    fn junk_payloads_are_ignored() {
        assert_eq!(decode_frame(b"relative/path"), PeerCommand::Ignore);
        assert_eq!(decode_frame(b"ftp://example.com/x"), PeerCommand::Ignore);
        assert_eq!(decode_frame(&[0xff, 0xfe]), PeerCommand::Ignore);
    }
}
