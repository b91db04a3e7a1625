mod collections;
pub mod config;
pub mod messages;
pub mod network;
pub mod types;

pub use collections::{Key, SlotMap};
pub use config::{ConfigError, NetConfig};
pub use network::{ClientNetwork, ConnectionId, ServerNetwork};

mod prelude {
    pub(crate) use crate::collections::*;
    pub(crate) use crate::types::*;
    pub(crate) use std::{io, time};
    pub(crate) use std::net::TcpStream;
}
