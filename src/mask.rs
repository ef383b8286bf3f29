//! The RFC 6455 masking cipher.
//!
//! Masking and unmasking are the same operation: byte `i` of the payload is XORed with
//! `key[i % 4]`. Applying the same key twice restores the original bytes.

/// Mask/unmask a payload in place.
#[inline]
pub fn apply_mask(buf: &mut [u8], key: [u8; 4]) {
    apply_mask_fast32(buf, key);
}

/// Byte-at-a-time reference implementation.
#[inline]
fn apply_mask_fallback(buf: &mut [u8], key: [u8; 4]) {
    for (i, byte) in buf.iter_mut().enumerate() {
        *byte ^= key[i & 3];
    }
}

/// Operates on whole 4-byte chunks. Every chunk starts at a multiple of four
/// from the beginning of `buf`, so the key never needs rotating.
#[inline]
fn apply_mask_fast32(buf: &mut [u8], key: [u8; 4]) {
    let key_u32 = u32::from_ne_bytes(key);

    let mut chunks = buf.chunks_exact_mut(4);
    for chunk in &mut chunks {
        let word = u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) ^ key_u32;
        chunk.copy_from_slice(&word.to_ne_bytes());
    }
    apply_mask_fallback(chunks.into_remainder(), key);
}
