use sha2::{Digest, Sha256};

/// Computes the content fingerprint of normalized image bytes
///
/// The fingerprint is the hex-encoded SHA-256 digest, used both as the
/// record key and as the stored file name.
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
