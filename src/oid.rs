//! Module containing functionality related to BSON ObjectIds.
//! For more information, see the documentation for the [`ObjectId`] type.

use std::{
    fmt,
    str::FromStr,
    sync::{
        LazyLock,
        atomic::{AtomicU32, Ordering},
    },
    time::SystemTime,
};

use crate::{
    DateTime,
    error::{Error, Result},
};

const TIMESTAMP_SIZE: usize = 4;
const PROCESS_ID_SIZE: usize = 5;
const COUNTER_SIZE: usize = 3;

const TIMESTAMP_OFFSET: usize = 0;
const PROCESS_ID_OFFSET: usize = TIMESTAMP_OFFSET + TIMESTAMP_SIZE;
const COUNTER_OFFSET: usize = PROCESS_ID_OFFSET + PROCESS_ID_SIZE;

const MAX_U24: u32 = 0xFF_FFFF;

static DEFAULT_GENERATOR: LazyLock<ObjectIdGenerator> = LazyLock::new(ObjectIdGenerator::new);

/// A wrapper around a raw 12-byte ObjectId.
///
/// The bytes are laid out as a 4-byte big-endian timestamp in seconds, 5 process-unique bytes,
/// and a 3-byte big-endian counter.
///
/// ```
/// use bson_codec::oid::ObjectId;
///
/// let oid = ObjectId::parse_str("4d0ce088e447ad08b4721a37")?;
/// assert_eq!(oid.to_hex(), "4d0ce088e447ad08b4721a37");
/// # Ok::<(), bson_codec::error::Error>(())
/// ```
#[derive(Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct ObjectId {
    id: [u8; 12],
}

impl ObjectId {
    /// Generates a new [`ObjectId`] from the process-wide [`ObjectIdGenerator`].
    pub fn new() -> ObjectId {
        DEFAULT_GENERATOR.generate()
    }

    /// Constructs a new ObjectId wrapper around the raw byte representation.
    pub const fn from_bytes(bytes: [u8; 12]) -> ObjectId {
        ObjectId { id: bytes }
    }

    /// Creates an ObjectId from a 24-character hexadecimal string.
    pub fn parse_str(s: impl AsRef<str>) -> Result<ObjectId> {
        let s = s.as_ref();

        let bytes: Vec<u8> = hex::decode(s.as_bytes()).map_err(|e| Error::from_hex_error(e, s.len()))?;
        let id: [u8; 12] = bytes
            .try_into()
            .map_err(|_| Error::oid_invalid_length(s.len()))?;
        Ok(ObjectId::from_bytes(id))
    }

    /// Assembles an ObjectId from its three components.
    pub fn from_parts(seconds: u32, process_id: [u8; 5], counter: u32) -> ObjectId {
        let mut id = [0u8; 12];
        id[TIMESTAMP_OFFSET..PROCESS_ID_OFFSET].copy_from_slice(&seconds.to_be_bytes());
        id[PROCESS_ID_OFFSET..COUNTER_OFFSET].copy_from_slice(&process_id);
        id[COUNTER_OFFSET..COUNTER_OFFSET + COUNTER_SIZE]
            .copy_from_slice(&(counter & MAX_U24).to_be_bytes()[4 - COUNTER_SIZE..]);
        ObjectId::from_bytes(id)
    }

    /// Retrieves the timestamp from an [`ObjectId`].
    pub fn timestamp(&self) -> DateTime {
        let mut buf = [0; 4];
        buf.copy_from_slice(&self.id[TIMESTAMP_OFFSET..PROCESS_ID_OFFSET]);
        let seconds = u32::from_be_bytes(buf);
        DateTime::from_millis(i64::from(seconds) * 1000)
    }

    /// Returns the raw byte representation of an ObjectId.
    pub const fn bytes(&self) -> [u8; 12] {
        self.id
    }

    /// Convert this [`ObjectId`] to its lowercase hex string representation.
    pub fn to_hex(self) -> String {
        hex::encode(self.id)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_str(s)
    }
}

impl From<[u8; 12]> for ObjectId {
    fn from(bytes: [u8; 12]) -> Self {
        Self { id: bytes }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("ObjectId").field(&self.to_hex()).finish()
    }
}

/// Source of freshly generated [`ObjectId`]s.
///
/// A generator owns the process-unique bytes and the counter that make ids unique. The
/// process-wide instance behind [`ObjectId::new`] is seeded randomly on first use; tests and
/// embedders that need deterministic ids can create their own with
/// [`ObjectIdGenerator::with_seed`].
#[derive(Debug)]
pub struct ObjectIdGenerator {
    process_id: [u8; PROCESS_ID_SIZE],
    counter: AtomicU32,
}

impl ObjectIdGenerator {
    /// Creates a generator with random process bytes and a random counter start.
    pub fn new() -> Self {
        Self::with_seed(rand::random(), rand::random::<u32>() & MAX_U24)
    }

    /// Creates a generator with the given process bytes whose counter starts at
    /// `counter_start` (truncated to 24 bits).
    pub fn with_seed(process_id: [u8; 5], counter_start: u32) -> Self {
        Self {
            process_id,
            counter: AtomicU32::new(counter_start & MAX_U24),
        }
    }

    /// Generates an id stamped with the current time.
    pub fn generate(&self) -> ObjectId {
        let seconds = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        self.generate_at(seconds)
    }

    /// Generates an id stamped with the given number of seconds since the Unix epoch.
    pub fn generate_at(&self, seconds: u32) -> ObjectId {
        ObjectId::from_parts(seconds, self.process_id, self.next_count())
    }

    // The counter wraps at 2^24.
    fn next_count(&self) -> u32 {
        self.counter.fetch_add(1, Ordering::SeqCst) & MAX_U24
    }
}

impl Default for ObjectIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
