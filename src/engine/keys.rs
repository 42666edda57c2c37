//! Key encoding for the engine's column families
//!
//! All integers are big-endian so that RocksDB's byte order matches
//! numeric order and prefix scans group related entries.
//!
//! Adjacency keys are laid out as
//! `object(8) | direction(1) | tag(4) | other(8) | relationship(8)`,
//! so a prefix of one, two, three or four components selects all
//! relationships of an object, one direction, one type, or one far
//! endpoint respectively.

use crate::error::{StoreError, StoreResult};
use crate::graph::{Direction, ObjectHandle, RelHandle, TypeTag};

pub(crate) const ADJACENCY_KEY_LEN: usize = 8 + 1 + 4 + 8 + 8;

/// Decoded adjacency entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AdjacencyKey {
    pub object: ObjectHandle,
    pub direction: Direction,
    pub tag: TypeTag,
    pub other: ObjectHandle,
    pub relationship: RelHandle,
}

impl AdjacencyKey {
    pub fn encode(&self) -> Vec<u8> {
        let mut key = Vec::with_capacity(ADJACENCY_KEY_LEN);
        key.extend_from_slice(&self.object.as_u64().to_be_bytes());
        key.push(self.direction.as_byte());
        key.extend_from_slice(&self.tag.as_u32().to_be_bytes());
        key.extend_from_slice(&self.other.as_u64().to_be_bytes());
        key.extend_from_slice(&self.relationship.as_u64().to_be_bytes());
        key
    }

    pub fn decode(key: &[u8]) -> StoreResult<Self> {
        if key.len() != ADJACENCY_KEY_LEN {
            return Err(StoreError::CorruptRecord(format!(
                "adjacency key has {} bytes, expected {}",
                key.len(),
                ADJACENCY_KEY_LEN
            )));
        }
        let direction = Direction::from_byte(key[8]).ok_or_else(|| {
            StoreError::CorruptRecord(format!("adjacency direction byte {}", key[8]))
        })?;

        Ok(AdjacencyKey {
            object: ObjectHandle::new(read_u64(&key[0..8])?),
            direction,
            tag: TypeTag::new(read_u32(&key[9..13])?),
            other: ObjectHandle::new(read_u64(&key[13..21])?),
            relationship: RelHandle::new(read_u64(&key[21..29])?),
        })
    }

    /// The matching entry stored under the far endpoint
    pub fn mirror(&self) -> Self {
        AdjacencyKey {
            object: self.other,
            direction: self.direction.reverse(),
            tag: self.tag,
            other: self.object,
            relationship: self.relationship,
        }
    }
}

/// Prefix selecting adjacency entries of an object, optionally narrowed
/// to a direction, a type and a far endpoint
pub(crate) fn adjacency_prefix(
    object: ObjectHandle,
    direction: Option<Direction>,
    tag: Option<TypeTag>,
    other: Option<ObjectHandle>,
) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(ADJACENCY_KEY_LEN);
    prefix.extend_from_slice(&object.as_u64().to_be_bytes());
    let Some(direction) = direction else {
        return prefix;
    };
    prefix.push(direction.as_byte());
    let Some(tag) = tag else {
        return prefix;
    };
    prefix.extend_from_slice(&tag.as_u32().to_be_bytes());
    if let Some(other) = other {
        prefix.extend_from_slice(&other.as_u64().to_be_bytes());
    }
    prefix
}

/// Identity index key for an external id
pub(crate) fn identity_key(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

pub(crate) fn object_key(handle: ObjectHandle) -> [u8; 8] {
    handle.as_u64().to_be_bytes()
}

pub(crate) fn relationship_key(handle: RelHandle) -> [u8; 8] {
    handle.as_u64().to_be_bytes()
}

/// Link types are signed; flip the sign bit so negative types sort first
pub(crate) fn rel_type_key(link_type: i64) -> [u8; 8] {
    ((link_type as u64) ^ (1 << 63)).to_be_bytes()
}

pub(crate) fn read_u64(bytes: &[u8]) -> StoreResult<u64> {
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| StoreError::CorruptRecord(format!("expected 8 bytes, got {}", bytes.len())))?;
    Ok(u64::from_be_bytes(array))
}

pub(crate) fn read_u32(bytes: &[u8]) -> StoreResult<u32> {
    let array: [u8; 4] = bytes
        .try_into()
        .map_err(|_| StoreError::CorruptRecord(format!("expected 4 bytes, got {}", bytes.len())))?;
    Ok(u32::from_be_bytes(array))
}
