use embedded_storage::nor_flash::NorFlashErrorKind;

/// Error reported by the flash primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// Operation attempted outside an open session
    NotOpen,
    NotAligned,
    OutOfBounds,
    /// Region layout does not fit the device
    InvalidLayout,
    Device,
}

impl From<NorFlashErrorKind> for DriverError {
    fn from(kind: NorFlashErrorKind) -> Self {
        match kind {
            NorFlashErrorKind::NotAligned => DriverError::NotAligned,
            NorFlashErrorKind::OutOfBounds => DriverError::OutOfBounds,
            _ => DriverError::Device,
        }
    }
}

impl core::fmt::Display for DriverError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DriverError::NotOpen => f.write_str("flash is not open"),
            DriverError::NotAligned => f.write_str("unaligned flash access"),
            DriverError::OutOfBounds => f.write_str("flash access out of bounds"),
            DriverError::InvalidLayout => f.write_str("invalid region layout"),
            DriverError::Device => f.write_str("flash device error"),
        }
    }
}

impl core::error::Error for DriverError {}

/// Why the store stopped serving key material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// Neither copy matches its digest
    DualCopyCorruption,
    /// Repairs did not converge within the retry cap
    RetryLimitExceeded,
}

impl core::fmt::Display for HaltReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HaltReason::DualCopyCorruption => f.write_str("data flash is completely broken"),
            HaltReason::RetryLimitExceeded => f.write_str("recovery retry over the limit"),
        }
    }
}

/// Error type for the keystore operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    LabelNotFound,
    KeyHandleInvalid,
    /// Object does not fit in the remaining data area
    PayloadOverflow,
    FlashOpenFailure(DriverError),
    FlashReadFailure(DriverError),
    FlashEraseFailure(DriverError),
    FlashWriteFailure(DriverError),
    /// Mirror differs from primary after programming
    WriteVerifyMismatch,
    InvalidObjectTable,
    /// Control block is not a whole number of flash blocks
    LayoutMismatch,
    Busy,
    Halted(HaltReason),
}

impl core::fmt::Display for StoreError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            StoreError::LabelNotFound => f.write_str("label not found"),
            StoreError::KeyHandleInvalid => f.write_str("key handle invalid"),
            StoreError::PayloadOverflow => f.write_str("payload overflow"),
            StoreError::FlashOpenFailure(err) => write!(f, "flash open failed: {err}"),
            StoreError::FlashReadFailure(err) => write!(f, "flash read failed: {err}"),
            StoreError::FlashEraseFailure(err) => write!(f, "flash erase failed: {err}"),
            StoreError::FlashWriteFailure(err) => write!(f, "flash write failed: {err}"),
            StoreError::WriteVerifyMismatch => f.write_str("mirror does not match main"),
            StoreError::InvalidObjectTable => f.write_str("invalid object table"),
            StoreError::LayoutMismatch => {
                f.write_str("control block is not a multiple of the flash block size")
            }
            StoreError::Busy => f.write_str("keystore is busy"),
            StoreError::Halted(reason) => write!(f, "keystore halted: {reason}"),
        }
    }
}

impl core::error::Error for StoreError {}
