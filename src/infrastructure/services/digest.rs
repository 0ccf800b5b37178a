//! Whole-payload SHA-256 used to detect torn or corrupted control blocks.

use sha2::{Digest as _, Sha256};

use crate::config::DIGEST_LEN;

pub type Digest = [u8; DIGEST_LEN];

/// Digest of the factory payload (all zero bytes) shipped in both copies.
pub const FACTORY_DIGEST: Digest = [
    0xea, 0x57, 0x12, 0x9a, 0x18, 0x10, 0x83, 0x80, 0x88, 0x80, 0x40, 0x1f, 0xae, 0xb2, 0xd2,
    0xff, 0x1c, 0x14, 0x5e, 0x81, 0x22, 0x6b, 0x9d, 0x93, 0x21, 0xf8, 0x0c, 0xc1, 0xda, 0x29,
    0x61, 0x64,
];

/// Digest of a payload held in memory.
pub fn digest(payload: &[u8]) -> Digest {
    let mut hasher = IntegrityHasher::new();
    hasher.update(payload);
    hasher.finalize()
}

/// Incremental form, for payloads streamed out of flash in chunks.
#[derive(Clone, Default)]
pub struct IntegrityHasher {
    inner: Sha256,
}

impl IntegrityHasher {
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.inner.update(bytes);
    }

    pub fn finalize(self) -> Digest {
        let mut out = [0u8; DIGEST_LEN];
        out.copy_from_slice(&self.inner.finalize());
        out
    }
}
