//! Inventory contents and the pick up / drop requests.
//!
//! Items inside a listing carry a 32-bit id. The single-item requests carry
//! the full 64-bit entity id of the object.

use super::{put_list, take_list, Message, MessageBuf, MessageType, Record, TypedMessage};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct InventoryItem {
    pub item_id: u32,
    pub mesh_type: String,
    pub mesh_subtype: String,
    pub load: f32,
}

impl Record for InventoryItem {
    fn put(&self, buf: &mut MessageBuf) {
        buf.put(&self.item_id);
        buf.put(&self.mesh_type);
        buf.put(&self.mesh_subtype);
        buf.put(&self.load);
    }
    fn take(&mut self, buf: &mut MessageBuf) -> bool {
        buf.take(&mut self.item_id)
            & buf.take(&mut self.mesh_type)
            & buf.take(&mut self.mesh_subtype)
            & buf.take(&mut self.load)
    }
}

/// The whole inventory in one go, instead of one [`InventoryAdd`] per item.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct InventoryListing {
    pub items: Vec<InventoryItem>,
}

impl Message for InventoryListing {
    fn message_type(&self) -> MessageType {
        Self::TYPE
    }
    fn serialize_data(&self, buf: &mut MessageBuf) {
        put_list(buf, &self.items);
    }
    fn deserialize_data(&mut self, buf: &mut MessageBuf) {
        take_list(buf, &mut self.items);
    }
}

impl TypedMessage for InventoryListing {
    const TYPE: MessageType = MessageType::from_tag(b"IvLt");
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct InventoryAdd {
    pub item: InventoryItem,
}

impl Message for InventoryAdd {
    fn message_type(&self) -> MessageType {
        Self::TYPE
    }
    fn serialize_data(&self, buf: &mut MessageBuf) {
        self.item.put(buf);
    }
    fn deserialize_data(&mut self, buf: &mut MessageBuf) {
        self.item.take(buf);
    }
}

impl TypedMessage for InventoryAdd {
    const TYPE: MessageType = MessageType::from_tag(b"IvAd");
}

message! {
    /// Client asks to pick the object up.
    InventoryGet(item_id: u64): b"IvGt"
    /// Client asks to drop the object.
    InventoryDrop(item_id: u64): b"IvDp"
    /// Server removes the object from the inventory.
    InventoryDel(item_id: u64): b"IvDl"
}
