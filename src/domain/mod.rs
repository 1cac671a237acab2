use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};
use thiserror::Error;
use uuid::Uuid;


// Identifier

static ID_COUNTER: AtomicU32 = AtomicU32::new(0);
static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ObjectIdError {
    #[error("expected 24 hex characters, got {0}")]
    InvalidLength(usize),

    #[error("invalid hex character {0:?}")]
    InvalidCharacter(char),
}

/// A 12-byte document identifier, rendered as 24 lowercase hex characters.
///
/// Layout: 4-byte big-endian unix seconds, 5 bytes unique to this process,
/// 3-byte big-endian counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    pub fn generate() -> Self {
        let seconds = Utc::now().timestamp() as u32;
        let process = PROCESS_UNIQUE.get_or_init(|| {
            let mut unique = [0u8; 5];
            unique.copy_from_slice(&Uuid::new_v4().as_bytes()[..5]);
            unique
        });
        let count = ID_COUNTER.fetch_add(1, Ordering::Relaxed) & 0x00ff_ffff;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(process);
        bytes[9..].copy_from_slice(&count.to_be_bytes()[1..]);
        Self(bytes)
    }

    /// Parses a 24-character hex string. Case-insensitive.
    pub fn parse_str(s: &str) -> Result<Self, ObjectIdError> {
        if s.len() != 24 {
            return Err(ObjectIdError::InvalidLength(s.chars().count()));
        }
        if let Some(bad) = s.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(ObjectIdError::InvalidCharacter(bad));
        }

        let mut bytes = [0u8; 12];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|_| ObjectIdError::InvalidCharacter(s.as_bytes()[i * 2] as char))?;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl FromStr for ObjectId {
    type Err = ObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ObjectId::parse_str(&raw).map_err(de::Error::custom)
    }
}

// Structs

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Todo {
    pub id: ObjectId,
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Todo {
    pub fn from_new(id: ObjectId, new: NewTodo) -> Self {
        Self {
            id,
            description: new.description,
            completed: new.completed,
            created_at: new.created_at,
            updated_at: new.updated_at,
        }
    }
}

/// A document about to be inserted. The store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTodo {
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewTodo {
    /// Both timestamps come from the same clock reading.
    pub fn new(description: impl Into<String>, completed: bool, now: DateTime<Utc>) -> Self {
        Self {
            description: description.into(),
            completed,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Fields written by an update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct TodoUpdate {
    pub description: Option<String>,
    pub completed: Option<bool>,
    pub updated_at: DateTime<Utc>,
}
