//! Binds each message type to the handler that services it.

use std::collections::HashMap;

use super::message::{self, Message, TypedMessage};
use super::message_type::MessageType;
use super::Connection;

/// Glue between a decoded message and whatever game logic consumes it.
///
/// `C` is the connection the message arrived on, so the handler can reply.
pub trait MessageHandler<C = Connection> {
    fn message_type(&self) -> MessageType;
    fn handle_message(&self, msg: &dyn Message, conn: &mut C);
}

/// Handler built from a closure over the concrete message type.
pub struct HandlerFn<M, F> {
    f: F,
    _msg: core::marker::PhantomData<fn(&M)>,
}

pub fn handler_fn<M, C, F>(f: F) -> HandlerFn<M, F>
where
    M: TypedMessage,
    F: Fn(&M, &mut C),
{
    HandlerFn { f, _msg: core::marker::PhantomData }
}

impl<M, C, F> MessageHandler<C> for HandlerFn<M, F>
where
    M: TypedMessage,
    F: Fn(&M, &mut C),
{
    fn message_type(&self) -> MessageType {
        M::TYPE
    }
    fn handle_message(&self, msg: &dyn Message, conn: &mut C) {
        match msg.downcast_ref::<M>() {
            Some(msg) => (self.f)(msg, conn),
            None => log::error!("handler for '{}' got a '{}'", M::TYPE, msg.message_type()),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("message '{0}' already registered")]
    Duplicate(MessageType),
    #[error("message types mismatch (msg: '{msg}', handler: '{handler}')")]
    Mismatch { msg: MessageType, handler: MessageType },
}

struct Entry<C> {
    create: fn() -> Box<dyn Message>,
    handler: Box<dyn MessageHandler<C>>,
}

fn blank<M: TypedMessage>() -> Box<dyn Message> {
    Box::<M>::default()
}

/// Table from type id to a constructor for a blank message and its handler.
///
/// Filled once at startup and only read afterwards.
pub struct MessageHandlerRegistry<C = Connection> {
    entries: HashMap<u32, Entry<C>>,
}

impl<C> Default for MessageHandlerRegistry<C> {
    fn default() -> Self {
        Self { entries: HashMap::new() }
    }
}

impl<C> MessageHandlerRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `M` with its handler. The first registration for a type
    /// wins; a handler for some other type is refused.
    pub fn register_message_with_handler<M: TypedMessage>(
        &mut self,
        handler: impl MessageHandler<C> + 'static,
    ) -> Result<(), RegistryError> {
        let key = M::TYPE.id();
        if self.entries.contains_key(&key) {
            log::warn!("msg already registered (type: '{}')", M::TYPE);
            return Err(RegistryError::Duplicate(M::TYPE));
        }
        if handler.message_type() != M::TYPE {
            let err = RegistryError::Mismatch { msg: M::TYPE, handler: handler.message_type() };
            log::error!("{err}");
            return Err(err);
        }
        self.entries.insert(key, Entry { create: blank::<M>, handler: Box::new(handler) });
        Ok(())
    }

    pub fn create_instance(&self, key: u32) -> Option<Box<dyn Message>> {
        match self.entries.get(&key) {
            Some(entry) => Some((entry.create)()),
            None => {
                log::error!("msg not found (type: '{}')", MessageType::from_id(key));
                None
            }
        }
    }

    pub fn get_handler(&self, key: u32) -> Option<&dyn MessageHandler<C>> {
        match self.entries.get(&key) {
            Some(entry) => Some(&*entry.handler),
            None => {
                log::error!("handler not found (type: '{}')", MessageType::from_id(key));
                None
            }
        }
    }

    pub fn is_registered(&self, ty: MessageType) -> bool {
        self.entries.contains_key(&ty.id())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds a fresh message for `key`, fills it from `frame` and hands it
    /// to the handler. Returns false, dispatching nothing, if the type is
    /// unknown or the frame is too short to hold a header.
    pub fn handle_stream(&self, conn: &mut C, key: u32, frame: &[u8]) -> bool {
        let (Some(mut msg), Some(handler)) = (self.create_instance(key), self.get_handler(key)) else {
            return false;
        };
        if let Err(e) = message::deserialize(&mut *msg, frame) {
            log::error!("dropping '{}' frame: {e}", MessageType::from_id(key));
            return false;
        }
        log::trace!("dispatching {msg:?}");
        handler.handle_message(&*msg, conn);
        true
    }
}

impl<C> std::fmt::Debug for MessageHandlerRegistry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<_> = self.entries.keys().map(|&k| MessageType::from_id(k)).collect();
        types.sort();
        f.debug_struct("MessageHandlerRegistry").field("types", &types).finish()
    }
}
