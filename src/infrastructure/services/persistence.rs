//! Block-level persistence of control block copies.

use crate::{
    config::{CONTROL_BLOCK_SIZE, DIGEST_LEN, PAYLOAD_SIZE, READ_CHUNK_SIZE},
    domain::{entity::CopyRegion, errors::StoreError, ports::FlashPrimitive},
    infrastructure::{repositories::ImageBuffer, services::digest::IntegrityHasher},
};

/// Number of flash blocks one control block occupies, rounded up.
fn required_blocks<F: FlashPrimitive>(flash: &F) -> Result<usize, StoreError> {
    let block_size = flash.block_size();
    if block_size == 0 {
        return Err(StoreError::LayoutMismatch);
    }
    Ok(CONTROL_BLOCK_SIZE.div_ceil(block_size))
}

/// Check that the payload stored in `region` matches its stored digest.
pub(crate) fn verify_copy<F: FlashPrimitive>(
    flash: &mut F,
    region: CopyRegion,
) -> Result<bool, StoreError> {
    let mut hasher = IntegrityHasher::new();
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    let mut offset = 0;
    while offset < PAYLOAD_SIZE {
        let len = (PAYLOAD_SIZE - offset).min(READ_CHUNK_SIZE);
        flash
            .read(region, offset, &mut chunk[..len])
            .map_err(StoreError::FlashReadFailure)?;
        hasher.update(&chunk[..len]);
        offset += len;
    }

    let mut stored = [0u8; DIGEST_LEN];
    flash
        .read(region, PAYLOAD_SIZE, &mut stored)
        .map_err(StoreError::FlashReadFailure)?;

    let valid = hasher.finalize() == stored;
    #[cfg(feature = "log")]
    if valid {
        log::debug!("data flash({}) hash check OK", region);
    } else {
        log::warn!("data flash({}) hash check NG", region);
    }
    Ok(valid)
}

/// Copy a persisted control block into the image buffer.
pub(crate) fn load_copy<F: FlashPrimitive>(
    flash: &mut F,
    region: CopyRegion,
    image: &mut ImageBuffer,
) -> Result<(), StoreError> {
    flash
        .read(region, 0, image.as_bytes_mut())
        .map_err(StoreError::FlashReadFailure)
}

/// Erase `region` and program it from the image buffer.
///
/// When the block size does not divide the control block, the tail of the
/// last erased block stays blank. A failure leaves the region in whatever
/// state the partial operation produced; it is reported, never retried.
pub(crate) fn persist_copy<F: FlashPrimitive>(
    flash: &mut F,
    region: CopyRegion,
    image: &ImageBuffer,
) -> Result<(), StoreError> {
    let blocks = required_blocks(flash)?;

    if let Err(err) = flash.erase(region, blocks) {
        #[cfg(feature = "log")]
        log::error!("erase data flash({}) NG: {}", region, err);
        return Err(StoreError::FlashEraseFailure(err));
    }
    #[cfg(feature = "log")]
    log::debug!("erase data flash({}) OK", region);

    if let Err(err) = flash.program(image.as_bytes(), region, CONTROL_BLOCK_SIZE) {
        #[cfg(feature = "log")]
        log::error!("write data flash({}) NG: {}", region, err);
        return Err(StoreError::FlashWriteFailure(err));
    }
    #[cfg(feature = "log")]
    log::debug!("write data flash({}) OK", region);
    Ok(())
}

/// Byte-compare the primary and mirror copies.
pub(crate) fn copies_match<F: FlashPrimitive>(flash: &mut F) -> Result<bool, StoreError> {
    let mut primary = [0u8; READ_CHUNK_SIZE];
    let mut mirror = [0u8; READ_CHUNK_SIZE];
    let mut offset = 0;
    while offset < CONTROL_BLOCK_SIZE {
        let len = (CONTROL_BLOCK_SIZE - offset).min(READ_CHUNK_SIZE);
        flash
            .read(CopyRegion::Primary, offset, &mut primary[..len])
            .map_err(StoreError::FlashReadFailure)?;
        flash
            .read(CopyRegion::Mirror, offset, &mut mirror[..len])
            .map_err(StoreError::FlashReadFailure)?;
        if primary[..len] != mirror[..len] {
            return Ok(false);
        }
        offset += len;
    }
    Ok(true)
}

/// Write the factory control block (zero payload, factory digest) to both
/// copies.
pub fn provision_factory_image<F: FlashPrimitive>(flash: &mut F) -> Result<(), StoreError> {
    let image = ImageBuffer::factory();

    flash.open().map_err(StoreError::FlashOpenFailure)?;
    let result = persist_copy(flash, CopyRegion::Primary, &image)
        .and_then(|()| persist_copy(flash, CopyRegion::Mirror, &image));
    flash.close();

    #[cfg(feature = "log")]
    if result.is_ok() {
        log::info!("data flash provisioned with factory image");
    }
    result
}
