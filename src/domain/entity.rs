use heapless::String;

use crate::config::{LABEL_MAX_LEN, OBJECT_HANDLES_NUM, OBJECT_LABELS};

/// Identifies one of the fixed credential slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(u32);

impl Handle {
    /// Never a valid object handle.
    pub const INVALID: Handle = Handle(0);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 != 0 && (self.0 as usize) < OBJECT_HANDLES_NUM
    }

    /// Slot index in the object table, `None` for the invalid handle.
    pub(crate) const fn index(self) -> Option<usize> {
        if self.is_valid() {
            Some(self.0 as usize)
        } else {
            None
        }
    }

    /// Resolve a label against the static dictionary.
    ///
    /// Returns [`Handle::INVALID`] when nothing matches.
    pub fn find(label: &str) -> Self {
        OBJECT_LABELS
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, known)| **known == label)
            .map_or(Self::INVALID, |(index, _)| Self(index as u32))
    }

    /// Label registered for this handle in the dictionary.
    pub fn label(self) -> Option<&'static str> {
        self.index().map(|index| OBJECT_LABELS[index])
    }

    /// Handle whose storage backs reads of this handle.
    ///
    /// The key pair is stored once, under the private key's slot.
    pub(crate) fn storage_handle(self) -> Self {
        if self == ObjectKind::DevicePublicKey.handle() {
            ObjectKind::DevicePrivateKey.handle()
        } else {
            self
        }
    }
}

impl From<ObjectKind> for Handle {
    fn from(kind: ObjectKind) -> Self {
        kind.handle()
    }
}

/// Known credential kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    DevicePrivateKey = 1,
    DevicePublicKey = 2,
    DeviceCertificate = 3,
    CodeSigningKey = 4,
}

impl ObjectKind {
    pub const fn handle(self) -> Handle {
        Handle(self as u32)
    }

    pub const fn label(self) -> &'static str {
        OBJECT_LABELS[self as usize]
    }
}

/// Lifecycle of an object slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectStatus {
    #[default]
    Empty,
    Registered,
    Deleted,
}

impl ObjectStatus {
    pub(crate) const fn as_u32(self) -> u32 {
        match self {
            ObjectStatus::Empty => 0,
            ObjectStatus::Registered => 1,
            ObjectStatus::Deleted => 2,
        }
    }

    pub(crate) const fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(ObjectStatus::Empty),
            1 => Some(ObjectStatus::Registered),
            2 => Some(ObjectStatus::Deleted),
            _ => None,
        }
    }
}

/// Location of one object inside the image buffer data area.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectRecord {
    pub label: String<LABEL_MAX_LEN>,
    pub offset: u32,
    pub length: u32,
    pub status: ObjectStatus,
}

impl ObjectRecord {
    pub(crate) fn end(&self) -> u64 {
        u64::from(self.offset) + u64::from(self.length)
    }
}

/// One of the two persisted control block copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyRegion {
    Primary,
    Mirror,
}

impl CopyRegion {
    /// The copy used to repair this one.
    pub const fn other(self) -> Self {
        match self {
            CopyRegion::Primary => CopyRegion::Mirror,
            CopyRegion::Mirror => CopyRegion::Primary,
        }
    }
}

impl core::fmt::Display for CopyRegion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CopyRegion::Primary => f.write_str("main"),
            CopyRegion::Mirror => f.write_str("mirror"),
        }
    }
}

/// Object bytes served straight from the image buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectValue<'a> {
    pub data: &'a [u8],
    pub is_private: bool,
}

impl ObjectValue<'_> {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
