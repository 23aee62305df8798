//! Byte-order handling shared by the integer, float and UTF-16/32 codecs.

use std::sync::OnceLock;

/// Byte order for a multi-byte value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Endianness {
    #[default]
    Big,
    Little,
    Native,
}

impl Endianness {
    /// Resolve `Native` to `Big`/`Little` for the running process; `Big`
    /// and `Little` pass through unchanged.
    ///
    /// The native order is detected once, at first use, by inspecting the
    /// byte layout of a known multi-byte integer, then cached for the
    /// lifetime of the process (§4.2).
    pub fn resolve(self) -> ResolvedEndianness {
        match self {
            Endianness::Big => ResolvedEndianness::Big,
            Endianness::Little => ResolvedEndianness::Little,
            Endianness::Native => native_endianness(),
        }
    }

    pub fn is_little(self) -> bool {
        self.resolve() == ResolvedEndianness::Little
    }
}

/// `Endianness` with `Native` already resolved to a concrete byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolvedEndianness {
    Big,
    Little,
}

static NATIVE: OnceLock<ResolvedEndianness> = OnceLock::new();

fn native_endianness() -> ResolvedEndianness {
    *NATIVE.get_or_init(|| {
        let probe: u16 = 0x0102;
        let bytes = probe.to_ne_bytes();
        if bytes[0] == 0x01 {
            ResolvedEndianness::Big
        } else {
            ResolvedEndianness::Little
        }
    })
}

/// Serialize an unsigned integer of `size_bits` (one of 16/32/64) into
/// big/little-endian bytes.
pub fn encode_uint(value: u64, size_bits: u32, endianness: Endianness) -> Vec<u8> {
    let full = value.to_be_bytes();
    let start = full.len() - (size_bits as usize / 8);
    let mut bytes = full[start..].to_vec();
    if endianness.resolve() == ResolvedEndianness::Little {
        bytes.reverse();
    }
    bytes
}

/// Deserialize an unsigned integer of `size_bits` (one of 16/32/64) from
/// big/little-endian bytes.
pub fn decode_uint(bytes: &[u8], endianness: Endianness) -> u64 {
    let mut buf = bytes.to_vec();
    if endianness.resolve() == ResolvedEndianness::Little {
        buf.reverse();
    }
    let mut padded = [0u8; 8];
    let start = 8 - buf.len();
    padded[start..].copy_from_slice(&buf);
    u64::from_be_bytes(padded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_is_resolved_consistently() {
        let a = Endianness::Native.resolve();
        let b = Endianness::Native.resolve();
        assert_eq!(a, b);
    }

    #[test]
    fn encode_decode_u16_big() {
        let bytes = encode_uint(0x1234, 16, Endianness::Big);
        assert_eq!(bytes, vec![0x12, 0x34]);
        assert_eq!(decode_uint(&bytes, Endianness::Big), 0x1234);
    }

    #[test]
    fn encode_decode_u16_little() {
        let bytes = encode_uint(0x1234, 16, Endianness::Little);
        assert_eq!(bytes, vec![0x34, 0x12]);
        assert_eq!(decode_uint(&bytes, Endianness::Little), 0x1234);
    }

    #[test]
    fn little_endian_build_decode_big_is_byteswap() {
        // Scenario S2.
        let bytes = encode_uint(0x1234, 16, Endianness::Little);
        assert_eq!(bytes, vec![0x34, 0x12]);
        assert_eq!(decode_uint(&bytes, Endianness::Big), 0x3412);
    }

    #[test]
    fn encode_decode_u64() {
        let bytes = encode_uint(0x0102030405060708, 64, Endianness::Big);
        assert_eq!(bytes, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(
            decode_uint(&bytes, Endianness::Big),
            0x0102030405060708
        );
    }
}
