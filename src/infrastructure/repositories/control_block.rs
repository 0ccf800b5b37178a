use crate::{
    config::{CONTROL_BLOCK_SIZE, DIGEST_LEN, PAYLOAD_SIZE},
    domain::errors::StoreError,
    infrastructure::{
        repositories::object_table::{DATA_CAPACITY, ObjectTable, TABLE_HEADER_SIZE},
        services::digest::{self, Digest},
    },
};

/// RAM working copy of one control block: `[payload][digest]`.
///
/// The payload starts with the persisted object table, followed by the
/// append-only data area.
pub struct ImageBuffer {
    bytes: [u8; CONTROL_BLOCK_SIZE],
}

impl Default for ImageBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageBuffer {
    pub const fn new() -> Self {
        Self {
            bytes: [0; CONTROL_BLOCK_SIZE],
        }
    }

    /// Factory image: zero payload sealed with the factory digest.
    pub fn factory() -> Self {
        let mut image = Self::new();
        image.bytes[PAYLOAD_SIZE..].copy_from_slice(&digest::FACTORY_DIGEST);
        image
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[..PAYLOAD_SIZE]
    }

    pub fn stored_digest(&self) -> Digest {
        let mut stored = [0u8; DIGEST_LEN];
        stored.copy_from_slice(&self.bytes[PAYLOAD_SIZE..]);
        stored
    }

    /// Recompute the digest over the whole payload and store it.
    pub fn reseal(&mut self) {
        let sealed = digest::digest(self.payload());
        self.bytes[PAYLOAD_SIZE..].copy_from_slice(&sealed);
    }

    pub fn is_sealed(&self) -> bool {
        digest::digest(self.payload()) == self.stored_digest()
    }

    pub fn object_table(&self) -> Result<ObjectTable, StoreError> {
        ObjectTable::decode(self.payload())
    }

    pub fn write_object_table(&mut self, table: &ObjectTable) {
        table.encode_into(&mut self.bytes[..PAYLOAD_SIZE]);
    }

    /// Bytes of the data area at `offset..offset + length`.
    pub fn object_data(&self, offset: u32, length: u32) -> Result<&[u8], StoreError> {
        let (start, end) = data_range(offset, length)?;
        Ok(&self.bytes[start..end])
    }

    /// Copy `data` into the data area at `offset`.
    pub fn write_object_data(&mut self, offset: u32, data: &[u8]) -> Result<(), StoreError> {
        let length = u32::try_from(data.len()).map_err(|_| StoreError::PayloadOverflow)?;
        let (start, end) = data_range(offset, length)?;
        self.bytes[start..end].copy_from_slice(data);
        Ok(())
    }

    /// Drop any key material held in RAM.
    pub fn wipe(&mut self) {
        self.bytes.fill(0);
    }
}

fn data_range(offset: u32, length: u32) -> Result<(usize, usize), StoreError> {
    let end = offset
        .checked_add(length)
        .ok_or(StoreError::PayloadOverflow)? as usize;
    if end > DATA_CAPACITY {
        return Err(StoreError::PayloadOverflow);
    }
    Ok((TABLE_HEADER_SIZE + offset as usize, TABLE_HEADER_SIZE + end))
}
