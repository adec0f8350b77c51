//! X.25 CRC-16 accumulator used both to fold dialect CRC_EXTRA seeds and to
//! checksum frames on the wire (polynomial 0x1021, init 0xFFFF, reflected, no
//! final XOR — `crc_any`'s `crc16mcrf4cc` variant).

use crc_any::CRCu16;

/// An in-progress checksum accumulation.
///
/// `update` may be called byte-by-byte or with whole slices; `finalize` folds
/// in the message's CRC_EXTRA seed the same way the wire checksum does.
pub struct Checksum(CRCu16);

impl Checksum {
    pub fn init() -> Self {
        Self(CRCu16::crc16mcrf4cc())
    }

    #[inline]
    pub fn update(&mut self, byte: u8) {
        self.0.digest(&[byte]);
    }

    #[inline]
    pub fn update_slice(&mut self, bytes: &[u8]) {
        self.0.digest(bytes);
    }

    /// Folds in the message's CRC_EXTRA seed and returns the final 16-bit CRC.
    pub fn finalize(mut self, crc_extra: u8) -> u16 {
        self.0.digest(&[crc_extra]);
        self.0.get_crc()
    }

    /// The raw 16-bit CRC without folding in a CRC_EXTRA seed, used by the
    /// dialect compiler when computing CRC_EXTRA itself (see
    /// [`crate::dialect::crc_extra`]).
    pub fn finalize_raw(self) -> u16 {
        self.0.get_crc()
    }
}

/// Computes the frame checksum over `data` (header-from-length through
/// payload) finalized with `crc_extra`.
pub fn frame_crc(data: &[u8], crc_extra: u8) -> u16 {
    let mut crc = Checksum::init();
    crc.update_slice(data);
    crc.finalize(crc_extra)
}
