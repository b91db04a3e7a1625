use crate::prelude::*;
use crate::config::NetConfig;
use std::net::{SocketAddr, TcpListener};

use super::connection::{Connection, SendError};
use super::message::{self, Message};
use super::ping::PingServer;
use super::registry::MessageHandlerRegistry;
use super::{transport, ConnectionId, MAX_PACKET_SIZE};

const LISTENER: usize = usize::MAX - 1;
const PING_LISTENER: usize = usize::MAX - 2;

/// Server side of the layer: the game listener, the ping listener and every
/// player connection, driven from one thread.
pub struct ServerNetwork {
    listener: TcpListener,
    ping: PingServer,

    poller: polling::Poller,
    events: Vec<polling::Event>,

    connections: SlotMap<Connection>,
    registry: MessageHandlerRegistry,
    max_players: usize,
    send_queue_limit: Option<usize>,
}

impl ServerNetwork {
    /// Binds the game port and the ping port from `config`. Handlers must be
    /// registered before this point.
    pub fn start_listening(config: &NetConfig, registry: MessageHandlerRegistry) -> io::Result<Self> {
        let listener = transport::listen_for_clients(&config.address, config.port, config.backlog)?;
        let ping = PingServer::listen_for_clients(&config.address, config.ping_port(), config.backlog)?;

        let poller = polling::Poller::new()?;
        poller.add(&listener, polling::Event::readable(LISTENER))?;
        poller.add(ping.listener(), polling::Event::readable(PING_LISTENER))?;
        log::debug!("serving {} message types for up to {} players", registry.len(), config.max_players);
        Ok(Self {
            listener,
            ping,

            poller,
            events: vec![],

            connections: SlotMap::new(),
            registry,
            max_players: config.max_players,
            send_queue_limit: config.max_send_queue_bytes,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
    pub fn ping_addr(&self) -> io::Result<SocketAddr> {
        self.ping.local_addr()
    }
    pub fn registry(&self) -> &MessageHandlerRegistry {
        &self.registry
    }
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }
    pub fn connection_ids(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.connections.keys()
    }

    /// Runs the network until `deadline`: sleeps on the sockets, then accepts
    /// newcomers, answers pings and pumps every connection, outgoing first.
    /// Returns the connections that were lost along the way.
    pub fn process_until(&mut self, deadline: time::Instant) -> Vec<ConnectionId> {
        let mut lost = Vec::new();
        loop {
            let timeout = deadline.saturating_duration_since(time::Instant::now());
            self.events.clear();
            match self.poller.wait(&mut self.events, Some(timeout)) {
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    log::error!("waiting on sockets: {e}");
                    return lost;
                }
            }

            self.accept_players();
            self.ping.accept_incoming();
            self.ping.process_ping_requests();
            self.pump_connections(&mut lost);
            self.rearm();

            if time::Instant::now() >= deadline {
                return lost;
            }
        }
    }

    fn accept_players(&mut self) {
        loop {
            let (stream, addr) = match transport::accept_incoming(&self.listener) {
                Ok(Some(pending)) => pending,
                Ok(None) => break,
                Err(e) => {
                    log::error!("accepting player connection: {e}");
                    break;
                }
            };
            if self.connections.len() >= self.max_players {
                log::warn!("max players ({}) reached, rejecting connection from {addr}", self.max_players);
                continue;
            }
            let conn = match Connection::from_tcp(stream) {
                Ok(conn) => conn.with_send_queue_limit(self.send_queue_limit),
                Err(e) => {
                    log::warn!("setting up connection from {addr}: {e}");
                    continue;
                }
            };
            let id = self.connections.insert(conn);
            let registered = match self.connections.get(id).and_then(Connection::stream) {
                Some(stream) => self.poller.add(stream, polling::Event::readable(id.index())),
                None => Ok(()),
            };
            match registered {
                Ok(()) => log::debug!("accepted connection {id} from {addr}"),
                Err(e) => {
                    log::error!("watching connection from {addr}: {e}");
                    self.connections.remove(id);
                }
            }
        }
    }

    fn pump_connections(&mut self, lost: &mut Vec<ConnectionId>) {
        let registry = &self.registry;
        let mut dead = Vec::new();
        for (id, conn) in self.connections.iter_mut() {
            conn.process_outgoing_messages();
            if let Err(e) = conn.process_incoming_messages(registry) {
                log::debug!("connection {id} ({}) lost: {e}", conn.peer());
                dead.push(id);
            }
        }
        for id in dead {
            self.drop_connection(id);
            lost.push(id);
        }
    }

    /// Sources are registered oneshot, so each wakeup needs them re-armed.
    /// Connections with queued bytes also ask to hear when they are writable.
    fn rearm(&self) {
        if let Err(e) = self.poller.modify(&self.listener, polling::Event::readable(LISTENER)) {
            log::error!("re-arming game listener: {e}");
        }
        if let Err(e) = self.poller.modify(self.ping.listener(), polling::Event::readable(PING_LISTENER)) {
            log::error!("re-arming ping listener: {e}");
        }
        for (id, conn) in self.connections.iter() {
            let Some(stream) = conn.stream() else { continue };
            let interest = polling::Event {
                key: id.index(),
                readable: true,
                writable: conn.bytes_in_send_queue() > 0,
            };
            if let Err(e) = self.poller.modify(stream, interest) {
                log::error!("re-arming connection {id}: {e}");
            }
        }
    }

    fn drop_connection(&mut self, id: ConnectionId) -> bool {
        let Some(mut conn) = self.connections.remove(id) else {
            return false;
        };
        if let Some(stream) = conn.stream() {
            if let Err(e) = self.poller.delete(stream) {
                log::debug!("unwatching connection {id}: {e}");
            }
        }
        conn.disconnect();
        true
    }

    /// Closes a player's connection. Queued data is discarded.
    pub fn disconnect_player(&mut self, id: ConnectionId) -> bool {
        log::debug!("disconnecting {id}");
        self.drop_connection(id)
    }

    pub fn send_to(&mut self, id: ConnectionId, msg: &dyn Message) -> Result<(), SendError> {
        let conn = self.connections.get_mut(id).ok_or(SendError::NotConnected)?;
        conn.send_message(msg).map_err(|e| {
            log::warn!("sending '{}' to {id}: {e}", msg.message_type());
            e
        })
    }

    /// Serialises once and queues the frame on every connection. Returns how
    /// many connections accepted it.
    pub fn send_to_all(&mut self, msg: &dyn Message) -> Result<usize, SendError> {
        self.broadcast(msg, None)
    }

    pub fn send_to_all_but(&mut self, except: ConnectionId, msg: &dyn Message) -> Result<usize, SendError> {
        self.broadcast(msg, Some(except))
    }

    fn broadcast(&mut self, msg: &dyn Message, except: Option<ConnectionId>) -> Result<usize, SendError> {
        let frame = message::serialize(msg)?;
        if frame.len() > MAX_PACKET_SIZE {
            log::warn!("not broadcasting {frame:?}: over the {MAX_PACKET_SIZE}-byte limit");
            return Err(SendError::TooLarge { len: frame.len(), max: MAX_PACKET_SIZE });
        }
        let mut sent = 0;
        for (id, conn) in self.connections.iter_mut() {
            if Some(id) == except {
                continue;
            }
            match conn.send_frame(&frame) {
                Ok(()) => sent += 1,
                Err(e) => log::warn!("broadcasting {frame:?} to {id}: {e}"),
            }
        }
        Ok(sent)
    }
}

impl std::fmt::Debug for ServerNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerNetwork")
            .field("listener", &self.listener)
            .field("connections", &self.connections.len())
            .field("ping_clients", &self.ping.client_count())
            .field("max_players", &self.max_players)
            .finish()
    }
}
