pub mod digest;
mod keystore;
mod persistence;
mod recovery;
mod shared;

pub use keystore::Keystore;
pub use persistence::provision_factory_image;
pub use recovery::{RecoveryReport, RepairAttempt};
pub use shared::SharedKeystore;
