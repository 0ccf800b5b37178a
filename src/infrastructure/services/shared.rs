use core::cell::RefCell;

use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};

use crate::{
    domain::{errors::StoreError, ports::FlashPrimitive},
    infrastructure::services::Keystore,
};

/// Single-writer wrapper around the keystore.
///
/// The store is not reentrant: a save holds the flash and the image buffer
/// for its whole duration, so every access goes through one critical
/// section and nested access is rejected as busy.
pub struct SharedKeystore<F: FlashPrimitive> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Keystore<F>>>,
}

impl<F: FlashPrimitive> SharedKeystore<F> {
    pub const fn new(store: Keystore<F>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(store)),
        }
    }

    /// Run `f` with exclusive access to the store.
    pub fn with<R>(&self, f: impl FnOnce(&mut Keystore<F>) -> R) -> Result<R, StoreError> {
        self.inner.lock(|cell| {
            let mut store = cell.try_borrow_mut().map_err(|_| StoreError::Busy)?;
            Ok(f(&mut store))
        })
    }

    pub fn into_inner(self) -> Keystore<F> {
        self.inner.into_inner().into_inner()
    }
}
