//! Opaque hash boundary (§4.1.1): turns a plaintext password into a lookup
//! key. The primitives themselves are out of scope — these are thin wrappers
//! over RustCrypto crates, not reimplementations.

use md4::Md4;
use sha1::{Digest, Sha1};

pub fn sha1_of(plaintext: &str) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(plaintext.as_bytes());
    hasher.finalize().into()
}

/// Top 8 bytes (64 bits) of the sha1 digest, used as the filter's key space.
pub fn sha1t64_of(plaintext: &str) -> [u8; 8] {
    let full = sha1_of(plaintext);
    full[..8].try_into().unwrap()
}

/// UTF-8 -> UTF-16LE -> MD4, per `ntlm.cpp`.
pub fn ntlm_of(plaintext: &str) -> [u8; 16] {
    let utf16le: Vec<u8> = plaintext
        .encode_utf16()
        .flat_map(|unit| unit.to_le_bytes())
        .collect();
    let mut hasher = Md4::new();
    hasher.update(&utf16le);
    hasher.finalize().into()
}

/// Interprets an already-hashed digest's leading 8 bytes as the 64-bit key
/// used by the binary-fuse filter (sha1t64 and ntlm digests alike: only the
/// first 8 bytes ever feed the filter's key space).
pub fn digest_to_u64(digest: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_known_vector() {
        // sha1("") = da39a3ee5e6b4b0d3255bfef95601890afd80709
        let digest = sha1_of("");
        assert_eq!(
            digest,
            [
                0xda, 0x39, 0xa3, 0xee, 0x5e, 0x6b, 0x4b, 0x0d, 0x32, 0x55, 0xbf, 0xef, 0x95,
                0x60, 0x18, 0x90, 0xaf, 0xd8, 0x07, 0x09,
            ]
        );
    }

    #[test]
    fn sha1t64_is_prefix_of_sha1() {
        let full = sha1_of("password");
        let truncated = sha1t64_of("password");
        assert_eq!(&full[..8], &truncated[..]);
    }
}
