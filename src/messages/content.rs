//! Keeping the client's content tree in sync with the server's.
//!
//! The client lists what it has, the server answers with what to delete and
//! what to fetch, then streams each fetched file as numbered parts.

use super::{put_list, take_list, Message, MessageBuf, MessageType, Record, TypedMessage};

/// A file in the client's tree and the key of the version it holds.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ContentFile {
    pub name: String,
    pub update_key: String,
}

impl Record for ContentFile {
    fn put(&self, buf: &mut MessageBuf) {
        buf.put(&self.name);
        buf.put(&self.update_key);
    }
    fn take(&mut self, buf: &mut MessageBuf) -> bool {
        buf.take(&mut self.name) & buf.take(&mut self.update_key)
    }
}

/// Client to server: the whole local content tree.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ContentQueryUpdate {
    pub files: Vec<ContentFile>,
}

impl Message for ContentQueryUpdate {
    fn message_type(&self) -> MessageType {
        Self::TYPE
    }
    fn serialize_data(&self, buf: &mut MessageBuf) {
        put_list(buf, &self.files);
    }
    fn deserialize_data(&mut self, buf: &mut MessageBuf) {
        take_list(buf, &mut self.files);
    }
}

impl TypedMessage for ContentQueryUpdate {
    const TYPE: MessageType = MessageType::from_tag(b"CQUp");
}

/// Server to client: files to remove right away.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ContentDeleteList {
    pub files: Vec<String>,
}

impl Message for ContentDeleteList {
    fn message_type(&self) -> MessageType {
        Self::TYPE
    }
    fn serialize_data(&self, buf: &mut MessageBuf) {
        put_list(buf, &self.files);
    }
    fn deserialize_data(&mut self, buf: &mut MessageBuf) {
        take_list(buf, &mut self.files);
    }
}

impl TypedMessage for ContentDeleteList {
    const TYPE: MessageType = MessageType::from_tag(b"CDel");
}

/// One file the server is about to send as `num_parts` [`ContentFilePart`]s.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ContentUpdateFile {
    pub transfer_id: u32,
    pub num_parts: u32,
    pub filename: String,
    pub update_key: String,
    pub size: u32,
}

impl Record for ContentUpdateFile {
    fn put(&self, buf: &mut MessageBuf) {
        buf.put(&self.transfer_id);
        buf.put(&self.num_parts);
        buf.put(&self.filename);
        buf.put(&self.update_key);
        buf.put(&self.size);
    }
    fn take(&mut self, buf: &mut MessageBuf) -> bool {
        buf.take(&mut self.transfer_id)
            & buf.take(&mut self.num_parts)
            & buf.take(&mut self.filename)
            & buf.take(&mut self.update_key)
            & buf.take(&mut self.size)
    }
}

/// Server to client, sent just before the file parts.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ContentUpdateList {
    pub files: Vec<ContentUpdateFile>,
}

impl ContentUpdateList {
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| u64::from(f.size)).sum()
    }
}

impl Message for ContentUpdateList {
    fn message_type(&self) -> MessageType {
        Self::TYPE
    }
    fn serialize_data(&self, buf: &mut MessageBuf) {
        put_list(buf, &self.files);
    }
    fn deserialize_data(&mut self, buf: &mut MessageBuf) {
        take_list(buf, &mut self.files);
    }
}

impl TypedMessage for ContentUpdateList {
    const TYPE: MessageType = MessageType::from_tag(b"CUpd");
}

/// One chunk of a content file transfer. The data is raw bytes preceded by
/// its length.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ContentFilePart {
    pub transfer_id: u32,
    pub part_num: u32,
    pub data: Vec<u8>,
}

impl Message for ContentFilePart {
    fn message_type(&self) -> MessageType {
        Self::TYPE
    }
    fn serialize_data(&self, buf: &mut MessageBuf) {
        buf.put(&self.transfer_id);
        buf.put(&self.part_num);
        buf.put(&(self.data.len() as u32));
        buf.put_bytes(&self.data);
    }
    fn deserialize_data(&mut self, buf: &mut MessageBuf) {
        buf.take(&mut self.transfer_id);
        buf.take(&mut self.part_num);
        let mut size = 0u32;
        buf.take(&mut size);
        if let Some(data) = buf.take_bytes(size as usize) {
            self.data = data;
        }
    }
}

impl TypedMessage for ContentFilePart {
    const TYPE: MessageType = MessageType::from_tag(b"CFPa");
}
