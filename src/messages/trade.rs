//! Player to player trading.

use super::{take_records, InventoryItem, Message, MessageBuf, MessageType, Record, TypedMessage};

codes! {
    /// Step of a trade session, carried in [`Trade::kind`].
    TradeKind {
        Start = 1,
        End = 2,
        Accept = 3,
        UpdateList = 4,
        Commit = 5,
        CommitAccept = 6,
        CommitReject = 7,
    }
}

/// All three list lengths go out ahead of the lists themselves.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Trade {
    pub kind: u32,
    /// Character on the other side of the trade.
    pub target: String,
    pub items: Vec<InventoryItem>,
    pub player_selected: Vec<i32>,
    pub target_selected: Vec<i32>,
}

impl Trade {
    pub fn new(kind: TradeKind, target: impl Into<String>) -> Self {
        Self { kind: kind as u32, target: target.into(), ..Self::default() }
    }
    pub fn kind(&self) -> Option<TradeKind> {
        TradeKind::from_code(self.kind)
    }
}

impl Message for Trade {
    fn message_type(&self) -> MessageType {
        Self::TYPE
    }
    fn serialize_data(&self, buf: &mut MessageBuf) {
        buf.put(&self.kind);
        buf.put(&self.target);
        buf.put(&(self.items.len() as u32));
        buf.put(&(self.player_selected.len() as u32));
        buf.put(&(self.target_selected.len() as u32));
        for item in &self.items {
            item.put(buf);
        }
        for id in self.player_selected.iter().chain(&self.target_selected) {
            buf.put(id);
        }
    }
    fn deserialize_data(&mut self, buf: &mut MessageBuf) {
        buf.take(&mut self.kind);
        buf.take(&mut self.target);
        let (mut items, mut player, mut target) = (0u32, 0u32, 0u32);
        buf.take(&mut items);
        buf.take(&mut player);
        buf.take(&mut target);

        self.items.clear();
        self.player_selected.clear();
        self.target_selected.clear();
        take_records(buf, items, &mut self.items);
        take_records(buf, player, &mut self.player_selected);
        take_records(buf, target, &mut self.target_selected);
    }
}

impl TypedMessage for Trade {
    const TYPE: MessageType = MessageType::from_tag(b"Trde");
}
