//! Read-only, monotonic statistics counters exposed by a channel. Plain
//! `u64` fields, not atomics: channel access is already externally
//! serialized (`SPEC_FULL.md` §5), matching the reference implementation's
//! own non-atomic per-connection counters.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Statistics {
    pub frames_decoded: u64,
    pub bad_checksum: u64,
    pub bad_length: u64,
    pub bad_signature: u64,
    pub bad_protocol: u64,
    pub unknown_message: u64,
    pub frames_encoded: u64,
}
