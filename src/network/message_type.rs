use std::fmt;

/// Identifier of a message: four ASCII bytes packed big-endian into a `u32`.
///
/// The integer form is what goes on the wire and what the registry is keyed
/// on; equality is defined on it alone.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageType(u32);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("message tag {tag:?} must be exactly 4 bytes, got {len}")]
pub struct TagError {
    pub tag: String,
    pub len: usize,
}

impl MessageType {
    pub const fn from_tag(tag: &[u8; 4]) -> Self {
        Self(u32::from_be_bytes(*tag))
    }
    pub const fn from_id(id: u32) -> Self {
        Self(id)
    }
    /// Tags of any other length are rejected rather than packed from
    /// whatever bytes happen to be there.
    pub fn from_name(name: &str) -> Result<Self, TagError> {
        let tag: [u8; 4] = name.as_bytes().try_into().map_err(|_| {
            let err = TagError { tag: name.to_owned(), len: name.len() };
            log::error!("{err}");
            err
        })?;
        Ok(Self::from_tag(&tag))
    }
    pub const fn id(self) -> u32 {
        self.0
    }
    pub const fn tag(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
    /// The tag as text. Non-printable bytes are escaped, so ids that did not
    /// come from an ASCII tag still render.
    pub fn name(self) -> String {
        self.tag().escape_ascii().to_string()
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl fmt::Debug for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageType({:?}, {:#010x})", self.name(), self.0)
    }
}

impl From<u32> for MessageType {
    fn from(id: u32) -> Self {
        Self(id)
    }
}
