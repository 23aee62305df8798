//! Bit concatenation helper shared by the builder and matcher drivers.
//!
//! `BitBuffer`'s own append primitives are private to `bitsyntax-core`
//! (they exist only to let it build slices and staging buffers); from here
//! concatenation goes through the public bit-read API instead.

use bitsyntax_core::BitBuffer;

/// Concatenate `buffers` in order into one new buffer.
pub(crate) fn concat(buffers: &[BitBuffer]) -> BitBuffer {
    let total_bits: usize = buffers.iter().map(|b| b.len()).sum();
    let mut bytes = vec![0u8; total_bits.div_ceil(8)];
    let mut pos = 0usize;
    for buf in buffers {
        for i in 0..buf.len() {
            if buf.get_bit(i).expect("i is within buf's own length") {
                bytes[pos / 8] |= 1 << (7 - pos % 8);
            }
            pos += 1;
        }
    }
    BitBuffer::from_bytes_with_len(bytes, total_bits).expect("bytes sized for total_bits above")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_empty_is_empty() {
        let result = concat(&[]);
        assert_eq!(result.len(), 0);
    }

    #[test]
    fn concat_preserves_order_and_partial_bytes() {
        let a = BitBuffer::from_bytes_with_len(vec![0b1010_0000], 4).unwrap();
        let b = BitBuffer::from_bytes_with_len(vec![0b1100_0000], 4).unwrap();
        let c = concat(&[a, b]);
        assert_eq!(c.len(), 8);
        assert_eq!(c.to_bytes(), vec![0b1010_1100]);
    }
}
