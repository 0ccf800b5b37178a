//! Compile-time layout of the credential store.

/// Length of the SHA-256 digest sealing each control block.
pub const DIGEST_LEN: usize = 32;

/// Size of one persisted control block (payload + digest).
pub const CONTROL_BLOCK_SIZE: usize = 8 * 1024;

/// Size of the hashed payload region.
pub const PAYLOAD_SIZE: usize = CONTROL_BLOCK_SIZE - DIGEST_LEN;

/// Maximum number of repair passes before the store halts.
pub const MAX_RECOVERY_RETRIES: usize = 3;

/// Number of object slots, including the reserved invalid slot 0.
pub const OBJECT_HANDLES_NUM: usize = 5;

/// Maximum length of an object label.
pub const LABEL_MAX_LEN: usize = 40;

/// Chunk used when streaming a copy out of flash for hashing or comparison.
pub const READ_CHUNK_SIZE: usize = 256;

pub const LABEL_DEVICE_PRIVATE_KEY: &str = "Device Priv TLS Key";
pub const LABEL_DEVICE_PUBLIC_KEY: &str = "Device Pub TLS Key";
pub const LABEL_DEVICE_CERTIFICATE: &str = "Device Cert";
pub const LABEL_CODE_SIGNING_KEY: &str = "Code Verify Key";

/// Label dictionary indexed by handle. Slot 0 never matches.
pub const OBJECT_LABELS: [&str; OBJECT_HANDLES_NUM] = [
    "",
    LABEL_DEVICE_PRIVATE_KEY,
    LABEL_DEVICE_PUBLIC_KEY,
    LABEL_DEVICE_CERTIFICATE,
    LABEL_CODE_SIGNING_KEY,
];

/// Base address of the `keystore` partition.
pub const KEYSTORE_PRIMARY_OFFSET: u32 = 0x31_0000;

/// Base address of the `keystore_mirror` partition.
pub const KEYSTORE_MIRROR_OFFSET: u32 = 0x31_2000;

const _: () = {
    assert!(PAYLOAD_SIZE % 4 == 0);
    assert!(CONTROL_BLOCK_SIZE % READ_CHUNK_SIZE == 0);
    let mut i = 0;
    while i < OBJECT_HANDLES_NUM {
        assert!(OBJECT_LABELS[i].len() <= LABEL_MAX_LEN);
        i += 1;
    }
};
