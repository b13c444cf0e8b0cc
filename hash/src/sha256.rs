//! sha-256 hex digests used for canonical record hashes and folder content
//! hashes. Kept distinct from the keccak-256 Merkle hash.

use sha2::{Digest, Sha256};

pub fn sha256_hex(data: &[u8]) -> String {
    hex_string(&Sha256::digest(data))
}

/// Lower-case hex encoding shared by sha-256 and keccak-256 output.
pub fn hex_string(bytes: &[u8]) -> String {
    let mut out = vec![0u8; bytes.len() * 2];
    faster_hex::hex_encode(bytes, &mut out).expect("hex buffer sized correctly");
    String::from_utf8(out).expect("hex output is ASCII")
}

/// Decodes a lower-case hex string produced by [`hex_string`] back into
/// raw bytes, e.g. to recover a batch's `merkleRoot` for super-root
/// construction.
pub fn hex_bytes(s: &str) -> Result<Vec<u8>, faster_hex::Error> {
    let mut out = vec![0u8; s.len() / 2];
    faster_hex::hex_decode(s.as_bytes(), &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        // sha256("") is a standard, widely published test vector.
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn output_is_64_hex_chars() {
        assert_eq!(sha256_hex(b"geobatch").len(), 64);
    }
}
