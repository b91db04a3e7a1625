//! Connecting, accounts and character selection.

use super::{put_list, take_list, Message, MessageBuf, MessageType, Record, TypedMessage};

message! {
    Connect(): b"Conn"
    ConnectReply(
        result: u32,
        protocol_version: String,
        uptime: String,
        total_users: u32,
        total_chars: u32,
        current_players: u32
    ): b"ConR"
    Login(username: String, pw_md5sum: String): b"Logi"
    NewUser(username: String, pw_md5sum: String, email: String, realname: String): b"NUsr"
    NewUserReply(result: u32): b"NUsR"
    /// Ability choices go out constitution first.
    NewChar(
        charname: String,
        race: String,
        gender: String,
        player_class: String,
        ab_choice_con: u8,
        ab_choice_str: u8,
        ab_choice_dex: u8,
        ab_choice_int: u8,
        ab_choice_wis: u8,
        ab_choice_cha: u8
    ): b"NCha"
    NewCharReply(
        result: u32,
        charname: String,
        race: String,
        gender: String,
        player_class: String,
        area: String
    ): b"NChR"
    DelChar(charname: String): b"DCha"
    DelCharReply(result: u32, charname: String): b"DChR"
    Join(charname: String): b"Join"
    JoinReply(result: u32): b"JoiR"
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterListEntry {
    pub name: String,
    pub race: String,
    pub gender: String,
    pub player_class: String,
    pub area: String,
}

impl Default for CharacterListEntry {
    /// Fields a truncated reply never filled in read as `<none>`.
    fn default() -> Self {
        let none = || String::from("<none>");
        Self { name: none(), race: none(), gender: none(), player_class: none(), area: none() }
    }
}

/// Login result plus the account's characters, prefixed by their count.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoginReply {
    pub result: u32,
    pub characters: Vec<CharacterListEntry>,
}

impl LoginReply {
    pub fn add_character(&mut self, entry: CharacterListEntry) {
        self.characters.push(entry);
    }
}

impl Record for CharacterListEntry {
    fn put(&self, buf: &mut MessageBuf) {
        buf.put(&self.name);
        buf.put(&self.race);
        buf.put(&self.gender);
        buf.put(&self.player_class);
        buf.put(&self.area);
    }
    fn take(&mut self, buf: &mut MessageBuf) -> bool {
        buf.take(&mut self.name)
            & buf.take(&mut self.race)
            & buf.take(&mut self.gender)
            & buf.take(&mut self.player_class)
            & buf.take(&mut self.area)
    }
}

impl Message for LoginReply {
    fn message_type(&self) -> MessageType {
        Self::TYPE
    }
    fn serialize_data(&self, buf: &mut MessageBuf) {
        buf.put(&self.result);
        put_list(buf, &self.characters);
    }
    fn deserialize_data(&mut self, buf: &mut MessageBuf) {
        buf.take(&mut self.result);
        take_list(buf, &mut self.characters);
    }
}

impl TypedMessage for LoginReply {
    const TYPE: MessageType = MessageType::from_tag(b"LogR");
}
