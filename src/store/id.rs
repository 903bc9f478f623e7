use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use super::error::StoreError;

/// Opaque identifier addressing one object in the store.
///
/// Plays the role a path plays in a real filesystem. The canonical string
/// form is a fixed-width 16-digit lowercase hex rendering of the raw id;
/// an id and its string form always resolve to the same object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(u64);

impl ObjectId {
    /// Width of the canonical hex string form.
    pub const STR_LEN: usize = 16;

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl FromStr for ObjectId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != Self::STR_LEN {
            return Err(StoreError::InvalidId(s.to_string()));
        }
        u64::from_str_radix(s, 16)
            .map(ObjectId)
            .map_err(|_| StoreError::InvalidId(s.to_string()))
    }
}

impl TryFrom<String> for ObjectId {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.to_string()
    }
}

/// Id generation errors
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    #[error("Invalid node ID: {0} (must be 0-1023)")]
    InvalidNodeId(u64),

    #[error("Clock moved backwards: last={0}, current={1}")]
    ClockMovedBackwards(u64, u64),

    #[error("Sequence overflow in the same millisecond")]
    SequenceOverflow,
}

pub type IdResult<T> = Result<T, IdError>;

// Bit layout of a generated id
const TIMESTAMP_BITS: u64 = 42;
const NODE_ID_BITS: u64 = 10;
const SEQUENCE_BITS: u64 = 12;

const MAX_NODE_ID: u64 = (1 << NODE_ID_BITS) - 1; // 1023
const MAX_SEQUENCE: u64 = (1 << SEQUENCE_BITS) - 1; // 4095

const NODE_ID_SHIFT: u64 = SEQUENCE_BITS;
const TIMESTAMP_SHIFT: u64 = NODE_ID_BITS + SEQUENCE_BITS;

// Custom epoch: 2024-01-01 00:00:00 UTC, in milliseconds
const CUSTOM_EPOCH_MS: u64 = 1704067200000;

/// Snowflake-style generator for fresh [`ObjectId`]s.
///
/// 64-bit id layout:
/// - 42 bits: milliseconds since a custom epoch
/// - 10 bits: node id (0-1023)
/// - 12 bits: sequence number within one millisecond (0-4095)
///
/// Ids produced by one generator are unique and monotonically increasing.
#[derive(Debug)]
pub struct IdGenerator {
    /// Node id (0-1023)
    node_id: u64,
    /// Custom epoch as a UNIX timestamp in milliseconds
    epoch: u64,
    /// Timestamp of the most recent id
    last_timestamp: RefCell<u64>,
    /// Sequence number within the current millisecond
    sequence: RefCell<u64>,
}

impl IdGenerator {
    /// Create a generator for the given node id.
    ///
    /// # Errors
    /// Fails when the node id is out of range.
    pub fn new(node_id: u64) -> IdResult<Self> {
        if node_id > MAX_NODE_ID {
            return Err(IdError::InvalidNodeId(node_id));
        }

        Ok(Self {
            node_id,
            epoch: CUSTOM_EPOCH_MS,
            last_timestamp: RefCell::new(0),
            sequence: RefCell::new(0),
        })
    }

    /// Create a generator whose node id is derived from a string label.
    ///
    /// # Safety
    /// This function is safe because the hash is always modulo (MAX_NODE_ID + 1),
    /// ensuring the node_id is always in the valid range [0, 1023].
    /// Therefore, Self::new() will never return an error.
    pub fn from_node_string(node_id_str: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        node_id_str.hash(&mut hasher);
        let hash = hasher.finish();

        let node_id = hash % (MAX_NODE_ID + 1);

        // SAFETY: node_id is guaranteed to be in range [0, MAX_NODE_ID]
        Self::new(node_id).unwrap()
    }

    /// Generate the next unique id.
    ///
    /// # Errors
    /// - the system clock moved backwards
    /// - more than 4096 ids were requested within one millisecond
    pub fn next_id(&self) -> IdResult<ObjectId> {
        let mut current_timestamp = self.current_timestamp_ms()?;
        let mut last_timestamp = self.last_timestamp.borrow_mut();
        let mut sequence = self.sequence.borrow_mut();

        if current_timestamp < *last_timestamp {
            return Err(IdError::ClockMovedBackwards(
                *last_timestamp,
                current_timestamp,
            ));
        }

        if current_timestamp == *last_timestamp {
            *sequence = (*sequence + 1) & MAX_SEQUENCE;

            if *sequence == 0 {
                // Sequence exhausted for this millisecond, wait for the next one
                current_timestamp = self.wait_next_millis(*last_timestamp)?;
            }
        } else {
            *sequence = 0;
        }

        *last_timestamp = current_timestamp;

        let timestamp_part = (current_timestamp - self.epoch) << TIMESTAMP_SHIFT;
        let node_id_part = self.node_id << NODE_ID_SHIFT;
        let sequence_part = *sequence;

        Ok(ObjectId(timestamp_part | node_id_part | sequence_part))
    }

    fn current_timestamp_ms(&self) -> IdResult<u64> {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .map_err(|_| IdError::ClockMovedBackwards(0, 0))
    }

    fn wait_next_millis(&self, last_timestamp: u64) -> IdResult<u64> {
        let mut timestamp = self.current_timestamp_ms()?;

        while timestamp <= last_timestamp {
            std::hint::spin_loop();
            timestamp = self.current_timestamp_ms()?;
        }

        Ok(timestamp)
    }

    /// Node id this generator stamps into its ids.
    pub fn node_id(&self) -> u64 {
        self.node_id
    }
}
