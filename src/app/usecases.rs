use crate::{
    domain::{entity::Handle, errors::StoreError, ports::FlashPrimitive},
    infrastructure::services::SharedKeystore,
};

/// PAL-style entry points over the shared keystore.
///
/// Failures that the PAL contract reports as a handle are collapsed into
/// [`Handle::INVALID`]; reads hand the object bytes to a closure that runs
/// while the store is locked.
pub struct Pkcs11Pal<'a, F: FlashPrimitive> {
    store: &'a SharedKeystore<F>,
}

impl<'a, F: FlashPrimitive> Pkcs11Pal<'a, F> {
    pub fn new(store: &'a SharedKeystore<F>) -> Self {
        Self { store }
    }

    /// Save `data` under `label`; [`Handle::INVALID`] on any failure.
    pub fn save_object(&self, label: &str, data: &[u8]) -> Handle {
        match self.store.with(|store| store.save_object(label, data)) {
            Ok(Ok(handle)) => handle,
            Ok(Err(_err)) | Err(_err) => {
                #[cfg(feature = "log")]
                log::error!("pal: saving {} failed: {}", label, _err);
                Handle::INVALID
            }
        }
    }

    pub fn find_object(&self, label: &str) -> Handle {
        Handle::find(label)
    }

    /// Pass the object's bytes and private flag to `f`.
    pub fn get_object_value<R>(
        &self,
        handle: Handle,
        f: impl FnOnce(&[u8], bool) -> R,
    ) -> Result<R, StoreError> {
        self.store.with(|store| {
            let value = store.get_object_value(handle)?;
            let result = f(value.data, value.is_private);
            store.get_object_value_cleanup(value);
            Ok(result)
        })?
    }

    /// Nothing to release: object bytes live in the store's static image.
    pub fn get_object_value_cleanup(&self, _data: &[u8]) {}
}
