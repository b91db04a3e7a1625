use crate::prelude::*;

use crate::config::NetConfig;
use super::connection::{Connection, LinkError, SendError};
use super::message::Message;
use super::registry::MessageHandlerRegistry;
use super::transport;

/// Client side of the layer: at most one connection, to the game server.
///
/// There is no poller here; the caller's frame loop calls [`process`]
/// once per tick.
///
/// [`process`]: ClientNetwork::process
#[derive(Debug)]
pub struct ClientNetwork {
    conn: Option<Connection>,
    registry: MessageHandlerRegistry,
    send_queue_limit: Option<usize>,
    connect_timeout: time::Duration,
}

impl ClientNetwork {
    pub fn new(registry: MessageHandlerRegistry) -> Self {
        Self {
            conn: None,
            registry,
            send_queue_limit: None,
            connect_timeout: transport::DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Takes the connect timeout and send queue cap from `config`.
    pub fn from_config(config: &NetConfig, registry: MessageHandlerRegistry) -> Self {
        Self {
            send_queue_limit: config.max_send_queue_bytes,
            connect_timeout: config.connect_timeout(),
            ..Self::new(registry)
        }
    }

    pub fn with_send_queue_limit(mut self, limit: Option<usize>) -> Self {
        self.send_queue_limit = limit;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.conn.as_ref().is_some_and(Connection::is_connected)
    }

    pub fn connection(&self) -> Option<&Connection> {
        self.conn.as_ref()
    }

    pub fn connect_timeout(&self) -> time::Duration {
        self.connect_timeout
    }

    /// [`connect_to_server`](ClientNetwork::connect_to_server) with the
    /// configured timeout.
    pub fn connect(&mut self, host: &str, port: u16) -> io::Result<()> {
        self.connect_to_server(host, port, self.connect_timeout)
    }

    /// Blocks for at most `timeout`. Refused while a connection is up.
    pub fn connect_to_server(&mut self, host: &str, port: u16, timeout: time::Duration) -> io::Result<()> {
        if self.is_connected() {
            log::warn!("already connected, not connecting to {host}:{port}");
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, "already connected"));
        }
        let stream = transport::connect_to_server(host, port, timeout)?;
        self.conn = Some(Connection::from_tcp(stream)?.with_send_queue_limit(self.send_queue_limit));
        Ok(())
    }

    pub fn send_to_server(&mut self, msg: &dyn Message) -> Result<(), SendError> {
        let conn = self.conn.as_mut().ok_or(SendError::NotConnected)?;
        conn.send_message(msg).map_err(|e| {
            log::warn!("sending '{}' to server: {e}", msg.message_type());
            e
        })
    }

    /// Flushes what it can, then reads and dispatches. If the link is lost
    /// the connection is dropped and the error returned.
    pub fn process(&mut self) -> Result<usize, LinkError> {
        let conn = self.conn.as_mut().ok_or(LinkError::NotConnected)?;
        conn.process_outgoing_messages();
        match conn.process_incoming_messages(&self.registry) {
            Ok(n) => Ok(n),
            Err(e) => {
                log::info!("connection to server lost: {e}");
                self.conn = None;
                Err(e)
            }
        }
    }

    /// Drops the connection and whatever it still had queued.
    pub fn disconnect(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            log::info!("disconnecting from {}", conn.peer());
            conn.disconnect();
        }
    }
}
