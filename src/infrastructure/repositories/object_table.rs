use core::str::FromStr;

use bytemuck::{Pod, Zeroable};
use heapless::String;

use crate::config::{LABEL_MAX_LEN, OBJECT_HANDLES_NUM, OBJECT_LABELS, PAYLOAD_SIZE};
use crate::domain::{
    entity::{Handle, ObjectRecord, ObjectStatus},
    errors::StoreError,
};

#[derive(Debug, Clone, Copy, Zeroable, Pod)]
#[repr(C)]
struct PersistentObjectRecord {
    pub offset: u32,
    pub length: u32,
    pub status: u32,
}

impl From<&ObjectRecord> for PersistentObjectRecord {
    fn from(record: &ObjectRecord) -> Self {
        Self {
            offset: record.offset,
            length: record.length,
            status: record.status.as_u32(),
        }
    }
}

/// Header stored at the start of the payload. An all-zero header is an
/// empty table.
#[derive(Debug, Clone, Copy, Zeroable, Pod)]
#[repr(C)]
struct PersistentObjectTable {
    pub stored_size: u32,
    pub records: [PersistentObjectRecord; OBJECT_HANDLES_NUM],
}

/// Bytes of payload occupied by the persisted table.
pub const TABLE_HEADER_SIZE: usize = size_of::<PersistentObjectTable>();

/// Bytes available for object data after the table header.
pub const DATA_CAPACITY: usize = PAYLOAD_SIZE - TABLE_HEADER_SIZE;

/// In-memory mapping from handles to object locations in the data area.
///
/// Offsets only ever grow: registering an object appends at the current
/// stored size and deleting one never frees its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectTable {
    records: [ObjectRecord; OBJECT_HANDLES_NUM],
    stored_size: u32,
}

impl Default for ObjectTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectTable {
    pub fn new() -> Self {
        Self {
            records: core::array::from_fn(|_| ObjectRecord::default()),
            stored_size: 0,
        }
    }

    /// Cumulative bytes appended to the data area.
    pub fn stored_size(&self) -> u32 {
        self.stored_size
    }

    pub fn record(&self, handle: Handle) -> Option<&ObjectRecord> {
        handle.index().map(|index| &self.records[index])
    }

    /// Reserve `length` bytes at the append point for `handle`.
    ///
    /// Returns the data area offset the object must be copied to.
    pub fn append(&mut self, handle: Handle, length: usize) -> Result<u32, StoreError> {
        let index = handle.index().ok_or(StoreError::LabelNotFound)?;
        let length = u32::try_from(length).map_err(|_| StoreError::PayloadOverflow)?;
        let offset = self.stored_size;
        let end = offset
            .checked_add(length)
            .ok_or(StoreError::PayloadOverflow)?;
        if end as usize > DATA_CAPACITY {
            return Err(StoreError::PayloadOverflow);
        }

        self.records[index] = ObjectRecord {
            label: label_for(index),
            offset,
            length,
            status: ObjectStatus::Registered,
        };
        self.stored_size = end;
        Ok(offset)
    }

    /// Mark a registered object as deleted. Its bytes stay allocated.
    pub fn mark_deleted(&mut self, handle: Handle) -> Result<(), StoreError> {
        let index = handle.index().ok_or(StoreError::KeyHandleInvalid)?;
        let record = &mut self.records[index];
        if record.status != ObjectStatus::Registered {
            return Err(StoreError::KeyHandleInvalid);
        }
        record.status = ObjectStatus::Deleted;
        Ok(())
    }

    /// Decode the table persisted at the start of a payload.
    pub fn decode(payload: &[u8]) -> Result<Self, StoreError> {
        let header = payload
            .get(..TABLE_HEADER_SIZE)
            .ok_or(StoreError::InvalidObjectTable)?;
        let persisted: PersistentObjectTable = bytemuck::pod_read_unaligned(header);

        if persisted.stored_size as usize > DATA_CAPACITY {
            return Err(StoreError::InvalidObjectTable);
        }

        let mut table = Self::new();
        table.stored_size = persisted.stored_size;
        for (index, raw) in persisted.records.iter().enumerate() {
            let status =
                ObjectStatus::from_u32(raw.status).ok_or(StoreError::InvalidObjectTable)?;
            if status == ObjectStatus::Empty {
                continue;
            }
            // Slot 0 is the invalid handle and never holds an object.
            if index == 0 {
                return Err(StoreError::InvalidObjectTable);
            }

            let record = ObjectRecord {
                label: label_for(index),
                offset: raw.offset,
                length: raw.length,
                status,
            };
            if record.end() > u64::from(table.stored_size) {
                return Err(StoreError::InvalidObjectTable);
            }
            table.records[index] = record;
        }

        Ok(table)
    }

    /// Encode the table into the start of a payload.
    pub fn encode_into(&self, payload: &mut [u8]) {
        let persisted = PersistentObjectTable {
            stored_size: self.stored_size,
            records: core::array::from_fn(|index| (&self.records[index]).into()),
        };
        payload[..TABLE_HEADER_SIZE].copy_from_slice(bytemuck::bytes_of(&persisted));
    }
}

fn label_for(index: usize) -> String<LABEL_MAX_LEN> {
    String::from_str(OBJECT_LABELS[index]).unwrap_or_default()
}
