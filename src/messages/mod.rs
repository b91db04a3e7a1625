//! The catalogue of messages exchanged by client and server.
//!
//! Most messages are flat records written field by field in declaration
//! order, and are declared through `message!`. The few with variable-length
//! parts implement [`Message`] by hand.

use crate::network::message::{Message, MessageBuf, TypedMessage};
use crate::network::MessageType;

macro_rules! message {
    {$($(#[$meta:meta])* $name:ident($($field:ident : $t:ty),*): $tag:literal)*} => {
        $(
            $(#[$meta])*
            #[derive(Debug, Default, Clone, PartialEq)]
            pub struct $name {
                $(pub $field: $t,)*
            }
            impl Message for $name {
                fn message_type(&self) -> MessageType {
                    Self::TYPE
                }
                #[allow(unused_variables)]
                fn serialize_data(&self, buf: &mut MessageBuf) {
                    $(buf.put(&self.$field);)*
                }
                #[allow(unused_variables)]
                fn deserialize_data(&mut self, buf: &mut MessageBuf) {
                    $(buf.take(&mut self.$field);)*
                }
            }
            impl TypedMessage for $name {
                const TYPE: MessageType = MessageType::from_tag($tag);
            }
        )*
    };
}

/// Numeric codes carried in a plain u32 (or u8) field, with a checked way
/// back from the raw value.
macro_rules! codes {
    {$($(#[$meta:meta])* $name:ident { $($variant:ident = $code:literal),* $(,)? })*} => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            #[repr(u32)]
            pub enum $name {
                $($variant = $code,)*
            }
            impl $name {
                pub fn from_code(code: u32) -> Option<Self> {
                    match code {
                        $($code => Some($name::$variant),)*
                        _ => None,
                    }
                }
            }
        )*
    };
}

mod combat;
mod console;
mod contact;
mod content;
mod dialog;
mod entity;
mod inventory;
mod selftest;
mod session;
mod trade;

pub use combat::{BattleAction, BattleResult, BattleState, BattleType, Combat, CombatAction, CombatResult, SpecialAction};
pub use console::{Chat, ChatKind, Command};
pub use contact::{ContactAdd, ContactDel, ContactStatus, CONTACT_CONNECTED, CONTACT_DISCONNECTED};
pub use content::{
    ContentDeleteList, ContentFile, ContentFilePart, ContentQueryUpdate, ContentUpdateFile, ContentUpdateList,
};
pub use dialog::{DialogOption, NpcDialog, NpcDialogReply};
pub use entity::{EntityCreate, EntityDestroy, EntityMove, PlayerData, TimeMinute};
pub use inventory::{InventoryAdd, InventoryDel, InventoryDrop, InventoryGet, InventoryItem, InventoryListing};
pub use selftest::TestDataTypes;
pub use session::{
    CharacterListEntry, Connect, ConnectReply, DelChar, DelCharReply, Join, JoinReply, Login,
    LoginReply, NewChar, NewCharReply, NewUser, NewUserReply,
};
pub use trade::{Trade, TradeKind};

/// A group of fields repeated inside a list message.
trait Record: Default {
    fn put(&self, buf: &mut MessageBuf);
    /// False if any field ran short.
    fn take(&mut self, buf: &mut MessageBuf) -> bool;
}

impl Record for String {
    fn put(&self, buf: &mut MessageBuf) {
        buf.put(self);
    }
    fn take(&mut self, buf: &mut MessageBuf) -> bool {
        buf.take(self)
    }
}

impl Record for i32 {
    fn put(&self, buf: &mut MessageBuf) {
        buf.put(self);
    }
    fn take(&mut self, buf: &mut MessageBuf) -> bool {
        buf.take(self)
    }
}

/// Count as u32, then the records.
fn put_list<T: Record>(buf: &mut MessageBuf, items: &[T]) {
    buf.put(&(items.len() as u32));
    for item in items {
        item.put(buf);
    }
}

/// Reads up to `count` records into `items`. The first record that runs
/// short is kept, with whatever fields it did read, and ends the list: a
/// count larger than the payload is not worth looping over.
fn take_records<T: Record>(buf: &mut MessageBuf, count: u32, items: &mut Vec<T>) {
    for _ in 0..count {
        let mut item = T::default();
        let whole = item.take(buf);
        items.push(item);
        if !whole {
            break;
        }
    }
}

/// Replaces `items` with a counted list read off `buf`.
fn take_list<T: Record>(buf: &mut MessageBuf, items: &mut Vec<T>) {
    items.clear();
    let mut count = 0u32;
    buf.take(&mut count);
    take_records(buf, count, items);
}

/// Outcome carried in the `result` field of the reply messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ResultCode {
    Success = 0,
    BadLogin,
    AlreadyLogged,
    Database,
    CharCorrupt,
    UserAlreadyExists,
    CharAlreadyExists,
    MaxChars,
    NewCharBadData,
    NoSuchChar,
    CreateFailed,
    AlreadyPlaying,
}

impl ResultCode {
    const ALL: [ResultCode; 12] = [
        ResultCode::Success,
        ResultCode::BadLogin,
        ResultCode::AlreadyLogged,
        ResultCode::Database,
        ResultCode::CharCorrupt,
        ResultCode::UserAlreadyExists,
        ResultCode::CharAlreadyExists,
        ResultCode::MaxChars,
        ResultCode::NewCharBadData,
        ResultCode::NoSuchChar,
        ResultCode::CreateFailed,
        ResultCode::AlreadyPlaying,
    ];

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn description(self) -> &'static str {
        match self {
            ResultCode::Success => "Success",
            ResultCode::BadLogin => "Wrong login/password",
            ResultCode::AlreadyLogged => "Already logged",
            ResultCode::Database => "Database error (Internal server error)",
            ResultCode::CharCorrupt => "Characters corrupted (Internal server error)",
            ResultCode::UserAlreadyExists => "Username already exists",
            ResultCode::CharAlreadyExists => "Character name already exists",
            ResultCode::MaxChars => "Max number of characters per account reached",
            ResultCode::NewCharBadData => "Bad data for new character (race, gender, class, points...)",
            ResultCode::NoSuchChar => "No such character",
            ResultCode::CreateFailed => "Couldn't create player in the world (Internal server error)",
            ResultCode::AlreadyPlaying => "Already playing",
        }
    }

    /// Description for a raw code off the wire.
    pub fn describe(code: u32) -> &'static str {
        Self::from_code(code).map_or("Unknown error code", Self::description)
    }
}

impl From<ResultCode> for u32 {
    fn from(code: ResultCode) -> u32 {
        code.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::message::{decode, serialize};

    #[test]
    fn result_codes_follow_declaration_order() {
        assert_eq!(ResultCode::Success.code(), 0);
        assert_eq!(ResultCode::AlreadyPlaying.code(), 11);
        for code in 0..12 {
            assert_eq!(ResultCode::from_code(code).map(ResultCode::code), Some(code));
        }
        assert_eq!(ResultCode::from_code(12), None);
    }

    #[test]
    fn unknown_codes_still_describe() {
        assert_eq!(ResultCode::describe(1), "Wrong login/password");
        assert_eq!(ResultCode::describe(999), "Unknown error code");
    }

    #[test]
    fn tags_are_distinct() {
        let mut types = vec![
            TestDataTypes::TYPE, Connect::TYPE, ConnectReply::TYPE, Login::TYPE, LoginReply::TYPE,
            NewUser::TYPE, NewUserReply::TYPE, NewChar::TYPE, NewCharReply::TYPE, DelChar::TYPE,
            DelCharReply::TYPE, Join::TYPE, JoinReply::TYPE, Chat::TYPE, Command::TYPE,
            ContactStatus::TYPE, ContactAdd::TYPE, ContactDel::TYPE, EntityCreate::TYPE,
            EntityMove::TYPE, EntityDestroy::TYPE, InventoryListing::TYPE, InventoryGet::TYPE,
            InventoryAdd::TYPE, InventoryDrop::TYPE, InventoryDel::TYPE, PlayerData::TYPE,
            TimeMinute::TYPE, ContentQueryUpdate::TYPE, ContentDeleteList::TYPE,
            ContentUpdateList::TYPE, ContentFilePart::TYPE, Trade::TYPE, Combat::TYPE,
            CombatAction::TYPE, CombatResult::TYPE, NpcDialog::TYPE, NpcDialogReply::TYPE,
        ];
        assert_eq!(types.len(), 38);
        let n = types.len();
        types.sort();
        types.dedup();
        assert_eq!(types.len(), n);
        assert_eq!(Connect::TYPE.name(), "Conn");
        assert_eq!(ContentFilePart::TYPE.name(), "CFPa");
        assert_eq!(NpcDialogReply::TYPE.name(), "NPDR");
    }

    #[test]
    fn list_stops_at_the_first_short_record() {
        let mut buf = MessageBuf::new();
        put_list(&mut buf, &[String::from("a"), String::from("b")]);
        let frame = buf.into_payload();
        let mut cut = MessageBuf::from_payload(&frame[..frame.len() - 2]);
        let mut items = vec![String::from("stale")];
        take_list(&mut cut, &mut items);
        assert_eq!(items, ["a", ""]);
    }

    #[test]
    fn empty_message_is_just_a_header() {
        let frame = serialize(&Connect {}).unwrap();
        assert_eq!(frame.as_bytes(), b"\x00\x06Conn");
        let (_, status) = decode::<Connect>(frame.as_bytes()).unwrap();
        assert!(status.is_clean());
    }

    #[test]
    fn connect_reply_field_order() {
        let reply = ConnectReply {
            result: ResultCode::Success.into(),
            protocol_version: "0.1".into(),
            uptime: "3h".into(),
            total_users: 10,
            total_chars: 12,
            current_players: 2,
        };
        let frame = serialize(&reply).unwrap();
        let payload = frame.payload();
        assert_eq!(&payload[..4], &[0, 0, 0, 0]);
        assert_eq!(&payload[4..8], b"0.1\0");
        assert_eq!(&payload[8..11], b"3h\0");
        assert_eq!(&payload[payload.len() - 4..], &[0, 0, 0, 2]);
        assert_eq!(decode::<ConnectReply>(frame.as_bytes()).unwrap().0, reply);
    }
}
