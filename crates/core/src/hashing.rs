//! SHA-256 digests used for bundle fingerprints and entity tags.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 digest of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Hex-encoded SHA-256 digest over a sequence of records, each terminated by
/// `\n`. Moving a boundary between records changes the digest.
pub fn sha256_hex_records<I, R>(records: I) -> String
where
    I: IntoIterator<Item = R>,
    R: AsRef<[u8]>,
{
    let mut hasher = Sha256::new();
    for record in records {
        hasher.update(record.as_ref());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}
