//! Infrastructure layer - Port implementations
//!
//! Concrete flash drivers, the RAM-resident control block image and the
//! services orchestrating verification, recovery and persistence.

pub mod drivers;
pub mod repositories;
pub mod services;
