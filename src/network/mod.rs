//! Length-prefixed typed messages over non-blocking TCP.

mod buffer;
mod client;
mod connection;
pub mod message;
mod message_type;
pub mod ping;
mod registry;
mod server;
pub mod transport;
pub mod wire;

pub use buffer::{BufferError, ByteBuffer};
pub use client::ClientNetwork;
pub use connection::{Connection, LinkError, LinkStats, SendError};
pub use message::{CodecError, DecodeStatus, Frame, Message, MessageBuf, TypedMessage};
pub use message_type::{MessageType, TagError};
pub use ping::{PingClient, PingPacket, PingServer, PingServerEntry};
pub use registry::{handler_fn, HandlerFn, MessageHandler, MessageHandlerRegistry, RegistryError};
pub use server::ServerNetwork;

/// Largest frame either side will send or accept, header included.
pub const MAX_PACKET_SIZE: usize = 32768;

pub type ConnectionId = crate::collections::Key;
