use super::{Message, MessageBuf, MessageType, TypedMessage};

codes! {
    /// What a [`Chat`] line is, carried as a u32 in its `kind` field.
    ChatKind { System = 1, Action = 2, Chat = 3, Pm = 4 }
}

message! {
    /// `target` is only meaningful for private messages.
    Chat(origin: String, target: String, text: String, kind: u32): b"Chat"
    Command(command: String): b"Cmmd"
}

impl Chat {
    pub fn kind(&self) -> Option<ChatKind> {
        ChatKind::from_code(self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::message::{decode, serialize};

    #[test]
    fn chat_layout() {
        let msg = Chat { origin: "a".into(), target: "b".into(), text: "hi".into(), kind: ChatKind::Pm as u32 };
        let frame = serialize(&msg).unwrap();
        assert_eq!(frame.as_bytes(), b"\x00\x11Chata\0b\0hi\0\x00\x00\x00\x04");
        let (back, _) = decode::<Chat>(frame.as_bytes()).unwrap();
        assert_eq!(back.kind(), Some(ChatKind::Pm));
        assert_eq!(Chat { kind: 9, ..back }.kind(), None);
    }
}
