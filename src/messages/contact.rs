//! Contact (friends and ignore) lists. `kind` and `status` are single
//! ASCII letters.

use super::{Message, MessageBuf, MessageType, TypedMessage};

pub const CONTACT_CONNECTED: u8 = b'C';
pub const CONTACT_DISCONNECTED: u8 = b'D';

message! {
    /// Sent by the server for every contact at login and on each change.
    ContactStatus(charname: String, kind: u8, status: u8, last_login: String, comment: String): b"CtSt"
    ContactAdd(charname: String, kind: u8, comment: String): b"CtAd"
    ContactDel(charname: String): b"CtDl"
}

impl ContactStatus {
    pub fn is_connected(&self) -> bool {
        self.status == CONTACT_CONNECTED
    }
}
