//! Flash primitive backed by any `embedded-storage` NOR flash.
//!
//! The driver owns the flash device for the lifetime of the keystore and
//! maps the two control block copies to fixed base addresses.

use embedded_storage::nor_flash::{NorFlash, NorFlashError, ReadNorFlash};

use crate::{
    config::{CONTROL_BLOCK_SIZE, KEYSTORE_MIRROR_OFFSET, KEYSTORE_PRIMARY_OFFSET},
    domain::{entity::CopyRegion, errors::DriverError, ports::FlashPrimitive},
};

/// Base addresses of the primary and mirror control blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionLayout {
    pub primary: u32,
    pub mirror: u32,
}

impl RegionLayout {
    /// Layout of the `keystore` and `keystore_mirror` partitions.
    pub const PARTITIONS: RegionLayout = RegionLayout {
        primary: KEYSTORE_PRIMARY_OFFSET,
        mirror: KEYSTORE_MIRROR_OFFSET,
    };

    pub const fn new(primary: u32, mirror: u32) -> Self {
        Self { primary, mirror }
    }

    const fn base(&self, region: CopyRegion) -> u32 {
        match region {
            CopyRegion::Primary => self.primary,
            CopyRegion::Mirror => self.mirror,
        }
    }
}

/// Flash primitive operating strictly within the two keystore regions.
pub struct NorFlashPrimitive<F: NorFlash> {
    flash: F,
    layout: RegionLayout,
    /// Bytes reserved per region, rounded up to whole erase blocks
    span: u32,
    opened: bool,
}

impl<F: NorFlash> NorFlashPrimitive<F> {
    pub fn new(flash: F, layout: RegionLayout) -> Result<Self, DriverError> {
        if F::ERASE_SIZE == 0 {
            return Err(DriverError::InvalidLayout);
        }
        let span = CONTROL_BLOCK_SIZE.div_ceil(F::ERASE_SIZE) * F::ERASE_SIZE;
        let span = u32::try_from(span).map_err(|_| DriverError::InvalidLayout)?;
        let erase_size = u32::try_from(F::ERASE_SIZE).map_err(|_| DriverError::InvalidLayout)?;
        let capacity = flash.capacity() as u64;

        for base in [layout.primary, layout.mirror] {
            if base % erase_size != 0 || u64::from(base) + u64::from(span) > capacity {
                return Err(DriverError::InvalidLayout);
            }
        }
        if layout.primary.abs_diff(layout.mirror) < span {
            return Err(DriverError::InvalidLayout);
        }

        Ok(Self {
            flash,
            layout,
            span,
            opened: false,
        })
    }

    pub fn layout(&self) -> RegionLayout {
        self.layout
    }

    pub fn inner(&self) -> &F {
        &self.flash
    }

    pub fn inner_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    pub fn into_inner(self) -> F {
        self.flash
    }

    fn ensure_open(&self) -> Result<(), DriverError> {
        if self.opened {
            Ok(())
        } else {
            Err(DriverError::NotOpen)
        }
    }

    /// Absolute address of `offset..offset + len` inside `region`.
    fn address(&self, region: CopyRegion, offset: usize, len: usize) -> Result<u32, DriverError> {
        let end = offset.checked_add(len).ok_or(DriverError::OutOfBounds)?;
        if end > self.span as usize {
            return Err(DriverError::OutOfBounds);
        }
        let offset = u32::try_from(offset).map_err(|_| DriverError::OutOfBounds)?;
        Ok(self.layout.base(region) + offset)
    }
}

impl<F: NorFlash> FlashPrimitive for NorFlashPrimitive<F> {
    fn block_size(&self) -> usize {
        F::ERASE_SIZE
    }

    fn open(&mut self) -> Result<(), DriverError> {
        self.opened = true;
        Ok(())
    }

    fn close(&mut self) {
        self.opened = false;
    }

    fn read(
        &mut self,
        region: CopyRegion,
        offset: usize,
        buffer: &mut [u8],
    ) -> Result<(), DriverError> {
        self.ensure_open()?;
        let addr = self.address(region, offset, buffer.len())?;
        self.flash
            .read(addr, buffer)
            .map_err(|err| DriverError::from(err.kind()))
    }

    fn erase(&mut self, region: CopyRegion, block_count: usize) -> Result<(), DriverError> {
        self.ensure_open()?;
        let len = block_count
            .checked_mul(F::ERASE_SIZE)
            .ok_or(DriverError::OutOfBounds)?;
        let from = self.address(region, 0, len)?;
        #[allow(clippy::cast_possible_truncation)]
        let to = from + len as u32;
        self.flash
            .erase(from, to)
            .map_err(|err| DriverError::from(err.kind()))
    }

    fn program(
        &mut self,
        source: &[u8],
        region: CopyRegion,
        length: usize,
    ) -> Result<(), DriverError> {
        self.ensure_open()?;
        let bytes = source.get(..length).ok_or(DriverError::OutOfBounds)?;
        let addr = self.address(region, 0, length)?;
        self.flash
            .write(addr, bytes)
            .map_err(|err| DriverError::from(err.kind()))
    }
}
