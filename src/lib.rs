#![cfg_attr(not(test), no_std)]

pub mod app;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use app::Pkcs11Pal;
pub use domain::{
    entity::{CopyRegion, Handle, ObjectKind, ObjectRecord, ObjectStatus, ObjectValue},
    errors::{DriverError, HaltReason, StoreError},
    ports::FlashPrimitive,
};
pub use infrastructure::{
    drivers::{NorFlashPrimitive, RegionLayout},
    services::{
        Keystore,
        RecoveryReport,
        RepairAttempt,
        SharedKeystore,
        digest,
        provision_factory_image,
    },
};
