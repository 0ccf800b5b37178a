use crate::domain::{entity::CopyRegion, errors::DriverError};

/// Block-granular non-volatile medium holding the two control block copies.
///
/// All operations are blocking. A region must be erased before it is
/// programmed, and failures are reported without retrying.
pub trait FlashPrimitive {
    /// Erase and program granularity in bytes.
    fn block_size(&self) -> usize;

    fn open(&mut self) -> Result<(), DriverError>;

    fn close(&mut self);

    /// Read `buffer.len()` bytes starting `offset` bytes into `region`.
    fn read(
        &mut self,
        region: CopyRegion,
        offset: usize,
        buffer: &mut [u8],
    ) -> Result<(), DriverError>;

    /// Erase `block_count` blocks from the start of `region`.
    fn erase(&mut self, region: CopyRegion, block_count: usize) -> Result<(), DriverError>;

    /// Program the first `length` bytes of `source` at the start of `region`.
    ///
    /// The covered blocks have been erased by the caller.
    fn program(
        &mut self,
        source: &[u8],
        region: CopyRegion,
        length: usize,
    ) -> Result<(), DriverError>;
}
