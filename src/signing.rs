//! MAVLink 2 message signing: per-stream monotonic timestamp tracking and the
//! truncated-SHA-256 signature itself. Ported closely from the reference
//! implementation's signing state machine (`mavlink-core/src/signing.rs`).

use sha2::{Digest, Sha256};

pub const SIGNATURE_SIZE: usize = 13;
const MAVLINK_EPOCH_OFFSET_MICROS: u128 = 1_420_070_400u128 * 1_000_000;

/// A 32-byte shared secret used to sign and verify frames on a channel.
#[derive(Clone)]
pub struct SigningKey([u8; 32]);

impl SigningKey {
    pub fn new(key: [u8; 32]) -> Self {
        Self(key)
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKey(..)")
    }
}

/// Per-channel signing state: the channel's own monotonic clock and, per
/// observed `(link_id, system_id, component_id)` stream, the last accepted
/// timestamp (for replay rejection on decode).
#[derive(Debug, Default)]
pub struct SigningState {
    timestamp: u64,
    stream_timestamps: std::collections::HashMap<(u8, u8, u8), u64>,
}

impl SigningState {
    /// Advances the channel's clock to the greater of its current value and
    /// the current wall-clock time, then returns a timestamp that is
    /// strictly greater than the last one this function returned — bumping
    /// by 1 when the wall clock has not advanced (`SPEC_FULL.md` §4.3 step 8).
    pub fn next_outbound_timestamp(&mut self) -> u64 {
        self.timestamp = self.timestamp.max(current_mavlink_timestamp());
        let ts = self.timestamp;
        self.timestamp += 1;
        ts
    }

    /// Checks an inbound timestamp for staleness/replay without recording it:
    /// a stream's first timestamp must be within one minute of the channel's
    /// clock; subsequent timestamps must strictly increase. Does not mutate
    /// any state — callers must only commit via [`Self::commit_inbound_timestamp`]
    /// once the signature itself has verified, so a forged frame (unknown
    /// key, fabricated timestamp) can never poison the replay baseline for a
    /// stream's legitimate future frames.
    pub fn check_inbound_timestamp(&mut self, stream: (u8, u8, u8), timestamp: u64) -> bool {
        self.timestamp = self.timestamp.max(current_mavlink_timestamp());
        match self.stream_timestamps.get(&stream) {
            Some(&last) => timestamp > last,
            None => timestamp + 60 * 1000 * 100 >= self.timestamp,
        }
    }

    /// Records an inbound timestamp as the new replay baseline for `stream`.
    /// Mirrors `SigningData::verify_signature`'s `if result { ... }` gating:
    /// call this only after the signature has cryptographically verified.
    pub fn commit_inbound_timestamp(&mut self, stream: (u8, u8, u8), timestamp: u64) {
        self.stream_timestamps.insert(stream, timestamp);
        self.timestamp = self.timestamp.max(timestamp);
    }
}

/// Microseconds since the MAVLink signing epoch (2015-01-01T00:00:00Z),
/// divided by 10 to fit the 48-bit wire field with margin until 2104.
fn current_mavlink_timestamp() -> u64 {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_micros())
        .unwrap_or(0);
    (now.checked_sub(MAVLINK_EPOCH_OFFSET_MICROS).unwrap_or(0) / 10) as u64
}

/// Computes the 6-byte signature over `key || 0xFD || header || payload ||
/// checksum || link_id || timestamp`, matching the reference
/// implementation's `MAVLinkV2MessageRaw::calculate_signature` byte order.
pub fn compute_signature(
    key: &SigningKey,
    header_and_payload_and_checksum: &[u8],
    link_id: u8,
    timestamp: u64,
) -> [u8; 6] {
    let mut hasher = Sha256::new();
    hasher.update(key.0);
    hasher.update([0xFDu8]);
    hasher.update(header_and_payload_and_checksum);
    hasher.update([link_id]);
    hasher.update(timestamp.to_le_bytes()[..6].iter());
    let digest = hasher.finalize();
    let mut out = [0u8; 6];
    out.copy_from_slice(&digest[..6]);
    out
}
