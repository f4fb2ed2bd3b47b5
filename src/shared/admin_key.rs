use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Fixed MAC key; only the comparison needs to be constant-time
const TAG_KEY: &[u8] = b"student-forum/admin-key";

/// Configured admin secret, compared in constant time
///
/// Both the configured and the presented key are reduced to HMAC-SHA256
/// tags, so neither content nor length leaks through comparison timing.
#[derive(Clone)]
pub struct AdminKey {
    tag: Vec<u8>,
}

impl AdminKey {
    pub fn new(secret: &str) -> Self {
        Self { tag: tag(secret) }
    }

    pub fn verify(&self, presented: &str) -> bool {
        mac()
            .chain_update(presented.as_bytes())
            .verify_slice(&self.tag)
            .is_ok()
    }
}

impl std::fmt::Debug for AdminKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AdminKey(***)")
    }
}

fn mac() -> HmacSha256 {
    // HMAC accepts keys of any length
    HmacSha256::new_from_slice(TAG_KEY).expect("HMAC key of any size is valid")
}

fn tag(secret: &str) -> Vec<u8> {
    mac()
        .chain_update(secret.as_bytes())
        .finalize()
        .into_bytes()
        .to_vec()
}
