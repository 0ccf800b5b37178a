use crate::{
    domain::{
        entity::{CopyRegion, Handle, ObjectKind, ObjectRecord, ObjectStatus, ObjectValue},
        errors::{HaltReason, StoreError},
        ports::FlashPrimitive,
    },
    infrastructure::{
        repositories::{ImageBuffer, ObjectTable},
        services::{
            persistence::{copies_match, load_copy, persist_copy},
            recovery::{RecoveryReport, recover},
        },
    },
};

/// Redundant credential store over a primary and a mirror control block.
///
/// Every mutation first certifies the persisted pair, then stages the change
/// in the image buffer and writes it to the primary, then to the mirror.
/// Reads are served from the image buffer without touching flash.
pub struct Keystore<F: FlashPrimitive> {
    flash: F,
    image: ImageBuffer,
    objects: ObjectTable,
    last_recovery: RecoveryReport,
    halted: Option<HaltReason>,
}

impl<F: FlashPrimitive> Keystore<F> {
    /// Verify (and if needed repair) both copies, then load the primary.
    pub fn open(flash: F) -> Result<Self, StoreError> {
        let mut store = Self {
            flash,
            image: ImageBuffer::new(),
            objects: ObjectTable::new(),
            last_recovery: RecoveryReport::default(),
            halted: None,
        };
        store.with_session(Self::certify_and_load)?;

        #[cfg(feature = "log")]
        log::info!(
            "keystore opened, {} bytes stored, {} repairs",
            store.objects.stored_size(),
            store.last_recovery.repairs().len()
        );
        Ok(store)
    }

    /// Persist `data` under `label`, appending it to the data area.
    pub fn save_object(&mut self, label: &str, data: &[u8]) -> Result<Handle, StoreError> {
        self.with_session(|store| {
            store.certify_and_load()?;

            let handle = Handle::find(label);
            if !handle.is_valid() {
                #[cfg(feature = "log")]
                log::warn!("save: unknown label {}", label);
                return Err(StoreError::LabelNotFound);
            }

            let previous = store.objects.clone();
            let staged = store
                .objects
                .append(handle, data.len())
                .and_then(|offset| store.image.write_object_data(offset, data));
            if let Err(err) = staged {
                store.objects = previous;
                return Err(err);
            }

            store.commit(previous)?;
            #[cfg(feature = "log")]
            log::debug!("save: {} bytes under handle {}", data.len(), handle.raw());
            Ok(handle)
        })
    }

    /// Mark an object deleted. Its bytes are never reclaimed.
    pub fn destroy_object(&mut self, handle: Handle) -> Result<(), StoreError> {
        self.with_session(|store| {
            store.certify_and_load()?;

            let previous = store.objects.clone();
            store.objects.mark_deleted(handle)?;
            store.commit(previous)
        })
    }

    /// Resolve a label to its handle. Never touches flash.
    pub fn find_object(&self, label: &str) -> Handle {
        Handle::find(label)
    }

    /// Borrow an object's bytes from the image buffer.
    ///
    /// Reads of the public key are served from the private key's slot.
    pub fn get_object_value(&self, handle: Handle) -> Result<ObjectValue<'_>, StoreError> {
        if let Some(reason) = self.halted {
            return Err(StoreError::Halted(reason));
        }
        if !handle.is_valid() {
            return Err(StoreError::KeyHandleInvalid);
        }

        let record = self
            .objects
            .record(handle.storage_handle())
            .filter(|record| record.status == ObjectStatus::Registered)
            .ok_or(StoreError::KeyHandleInvalid)?;
        let data = self.image.object_data(record.offset, record.length)?;

        Ok(ObjectValue {
            data,
            is_private: handle == ObjectKind::DevicePrivateKey.handle(),
        })
    }

    /// Release a value returned by [`Keystore::get_object_value`].
    ///
    /// Values borrow the image buffer, so there is nothing to free.
    pub fn get_object_value_cleanup(&self, _value: ObjectValue<'_>) {}

    pub fn record(&self, handle: Handle) -> Option<&ObjectRecord> {
        self.objects.record(handle)
    }

    /// Cumulative bytes appended since the factory image.
    pub fn stored_size(&self) -> u32 {
        self.objects.stored_size()
    }

    pub fn last_recovery(&self) -> &RecoveryReport {
        &self.last_recovery
    }

    pub fn halt_reason(&self) -> Option<HaltReason> {
        self.halted
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    pub fn flash(&self) -> &F {
        &self.flash
    }

    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    pub fn into_flash(self) -> F {
        self.flash
    }

    /// Run `f` with the flash open, closing it whatever the outcome.
    fn with_session<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        if let Some(reason) = self.halted {
            return Err(StoreError::Halted(reason));
        }
        self.flash.open().map_err(StoreError::FlashOpenFailure)?;
        let result = f(self);
        self.flash.close();

        if let Err(StoreError::Halted(reason)) = result {
            self.halt(reason);
        }
        result
    }

    fn certify_and_load(&mut self) -> Result<(), StoreError> {
        self.last_recovery = recover(&mut self.flash, &mut self.image)?;
        load_copy(&mut self.flash, CopyRegion::Primary, &mut self.image)?;
        self.objects = self.image.object_table()?;
        Ok(())
    }

    /// Seal the staged table and write both copies.
    ///
    /// If the primary cannot be written the mirror is left untouched and the
    /// in-memory table goes back to `previous`.
    fn commit(&mut self, previous: ObjectTable) -> Result<(), StoreError> {
        self.image.write_object_table(&self.objects);
        self.image.reseal();

        if let Err(err) = persist_copy(&mut self.flash, CopyRegion::Primary, &self.image) {
            self.objects = previous;
            return Err(err);
        }

        persist_copy(&mut self.flash, CopyRegion::Mirror, &self.image)?;
        if !copies_match(&mut self.flash)? {
            #[cfg(feature = "log")]
            log::error!("data flash setting NG");
            return Err(StoreError::WriteVerifyMismatch);
        }
        #[cfg(feature = "log")]
        log::debug!("data flash setting OK");
        Ok(())
    }

    fn halt(&mut self, reason: HaltReason) {
        #[cfg(feature = "log")]
        log::error!("keystore halted: {}", reason);
        self.halted = Some(reason);
        self.image.wipe();
        self.objects = ObjectTable::new();
    }
}
