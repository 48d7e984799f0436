// Session fingerprints.
//
// A short BLAKE3 derived-key hash of the transport key. Both ends of a channel
// compute the same value, so it can be logged or compared out of band without
// exposing the key itself.

/// Length of a session fingerprint.
pub const FINGERPRINT_LEN: usize = 8;

const FINGERPRINT_CONTEXT: &str = "strandpeer 2024 session fingerprint";

/// Fingerprint of a transport key.
pub fn session_fingerprint(key: &[u8; 32]) -> [u8; FINGERPRINT_LEN] {
    let digest = blake3::derive_key(FINGERPRINT_CONTEXT, key);
    let mut out = [0u8; FINGERPRINT_LEN];
    out.copy_from_slice(&digest[..FINGERPRINT_LEN]);
    out
}

/// Lower-case hex rendering, for log fields.
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
