//! Conversations with non-player characters.

use super::{put_list, take_list, Message, MessageBuf, MessageType, Record, TypedMessage};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DialogOption {
    pub id: u32,
    pub text: String,
}

impl Record for DialogOption {
    fn put(&self, buf: &mut MessageBuf) {
        buf.put(&self.id);
        buf.put(&self.text);
    }
    fn take(&mut self, buf: &mut MessageBuf) -> bool {
        buf.take(&mut self.id) & buf.take(&mut self.text)
    }
}

/// A line from an NPC and the answers the player may pick from.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NpcDialog {
    pub text: String,
    pub target: String,
    /// No reply expected.
    pub done: bool,
    pub options: Vec<DialogOption>,
}

impl Message for NpcDialog {
    fn message_type(&self) -> MessageType {
        Self::TYPE
    }
    fn serialize_data(&self, buf: &mut MessageBuf) {
        buf.put(&self.text);
        buf.put(&self.target);
        buf.put(&self.done);
        put_list(buf, &self.options);
    }
    fn deserialize_data(&mut self, buf: &mut MessageBuf) {
        buf.take(&mut self.text);
        buf.take(&mut self.target);
        buf.take(&mut self.done);
        take_list(buf, &mut self.options);
    }
}

impl TypedMessage for NpcDialog {
    const TYPE: MessageType = MessageType::from_tag(b"NPCD");
}

message! {
    /// The player's pick; `target` is the NPC's entity id.
    NpcDialogReply(origin: String, target: u64, done: bool, option: u32): b"NPDR"
}
