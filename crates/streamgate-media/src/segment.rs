//! Deterministic segment synthesis.
//!
//! Pre-encoded segments are out of scope, so segment requests are answered
//! with a synthesized MPEG-TS-shaped payload. The contract that matters for
//! the transport layer is stability: fixed size, and identical bytes for the
//! same `(asset, quality, index)` on every fetch.

use bytes::Bytes;
use streamgate_common::{AssetId, QualityTier};

/// MPEG-TS packet size in bytes.
const TS_PACKET_LEN: usize = 188;

/// Packets per synthesized segment.
const TS_PACKETS_PER_SEGMENT: usize = 256;

/// Fixed size of every synthesized segment payload.
pub const SEGMENT_PAYLOAD_LEN: usize = TS_PACKET_LEN * TS_PACKETS_PER_SEGMENT;

/// Synthesize the payload for one segment.
///
/// Each 188-byte packet starts with the TS sync byte (0x47); the remaining
/// bytes come from a splitmix-style generator seeded from the triple, so the
/// content is stable per `(asset, quality, index)` and distinct across
/// triples.
#[must_use]
pub fn segment_payload(asset: AssetId, quality: QualityTier, index: u32) -> Bytes {
    let mut state = seed(asset, quality, index);
    let mut payload = Vec::with_capacity(SEGMENT_PAYLOAD_LEN);

    for _ in 0..TS_PACKETS_PER_SEGMENT {
        payload.push(0x47);
        let mut written = 1;
        while written < TS_PACKET_LEN {
            let word = next_u64(&mut state);
            for byte in word.to_le_bytes() {
                if written == TS_PACKET_LEN {
                    break;
                }
                payload.push(byte);
                written += 1;
            }
        }
    }

    Bytes::from(payload)
}

fn seed(asset: AssetId, quality: QualityTier, index: u32) -> u64 {
    let mut state = 0x9e37_79b9_7f4a_7c15u64;
    for component in [
        asset.value() as u64,
        quality.bandwidth() as u64,
        u64::from(index),
    ] {
        state ^= component.wrapping_mul(0xff51_afd7_ed55_8ccd);
        state = next_u64(&mut state);
    }
    state
}

// splitmix64 step
fn next_u64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_has_fixed_size() {
        let payload = segment_payload(AssetId::new(1), QualityTier::Q720, 0);
        assert_eq!(payload.len(), SEGMENT_PAYLOAD_LEN);
    }

    #[test]
    fn test_payload_is_deterministic() {
        let a = segment_payload(AssetId::new(3), QualityTier::Q1080, 12);
        let b = segment_payload(AssetId::new(3), QualityTier::Q1080, 12);
        assert_eq!(a, b);
    }

    #[test]
    fn test_payload_varies_across_triples() {
        let base = segment_payload(AssetId::new(3), QualityTier::Q1080, 12);
        assert_ne!(base, segment_payload(AssetId::new(4), QualityTier::Q1080, 12));
        assert_ne!(base, segment_payload(AssetId::new(3), QualityTier::Q720, 12));
        assert_ne!(base, segment_payload(AssetId::new(3), QualityTier::Q1080, 13));
    }

    #[test]
    fn test_packets_carry_sync_bytes() {
        let payload = segment_payload(AssetId::new(9), QualityTier::Q360, 1);
        for packet in payload.chunks(TS_PACKET_LEN) {
            assert_eq!(packet[0], 0x47);
        }
    }
}
