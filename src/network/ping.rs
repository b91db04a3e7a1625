//! Latency pings on a separate port.
//!
//! A ping is six bytes, `[u16 id][u32 timestamp]` big-endian, with no
//! length prefix. The server echoes it back untouched; the client compares
//! the echoed timestamp with its clock.

use crate::prelude::*;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};

use super::{transport, wire};

pub const PING_PACKET_SIZE: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingPacket {
    pub id: u16,
    pub timestamp: u32,
}

impl PingPacket {
    pub fn encode(&self) -> [u8; PING_PACKET_SIZE] {
        let mut b = [0; PING_PACKET_SIZE];
        b[..2].copy_from_slice(&self.id.to_be_bytes());
        b[2..].copy_from_slice(&self.timestamp.to_be_bytes());
        b
    }
    /// Anything but exactly six bytes is not a ping packet.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != PING_PACKET_SIZE {
            return None;
        }
        let (id, rem) = wire::u16(bytes)?;
        let (timestamp, _) = wire::u32(rem)?;
        Some(Self { id, timestamp })
    }
}

/// Echo side, run next to the game listener.
#[derive(Debug)]
pub struct PingServer {
    listener: TcpListener,
    clients: Vec<(TcpStream, SocketAddr)>,
}

impl PingServer {
    pub fn listen_for_clients(host: &str, port: u16, backlog: u32) -> io::Result<Self> {
        let listener = transport::listen_for_clients(host, port, backlog)?;
        Ok(Self { listener, clients: vec![] })
    }
    pub fn listener(&self) -> &TcpListener {
        &self.listener
    }
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn accept_incoming(&mut self) {
        loop {
            match transport::accept_incoming(&self.listener) {
                Ok(Some((stream, addr))) => {
                    log::debug!("incoming ping connection: {addr}");
                    self.clients.push((stream, addr));
                }
                Ok(None) => break,
                Err(e) => {
                    log::warn!("accepting ping connection: {e}");
                    break;
                }
            }
        }
    }

    /// Echoes every well-formed ping waiting on the connected sockets and
    /// forgets the ones whose peer went away.
    pub fn process_ping_requests(&mut self) {
        self.clients.retain_mut(|(stream, addr)| {
            let mut buf = [0; PING_PACKET_SIZE];
            match stream.read(&mut buf) {
                Ok(0) => {
                    log::debug!("ping client {addr} disconnected");
                    false
                }
                Ok(PING_PACKET_SIZE) => {
                    match stream.write(&buf) {
                        Ok(PING_PACKET_SIZE) => {}
                        Ok(n) => log::debug!("couldn't send ping reply to {addr}: {n} sent"),
                        Err(e) => log::debug!("couldn't send ping reply to {addr}: {e}"),
                    }
                    true
                }
                Ok(n) => {
                    log::debug!("bad incoming ping data from {addr}: {n} received");
                    true
                }
                Err(e) if is_quiet(&e) => true,
                Err(e) => {
                    log::debug!("ping client {addr} lost: {e}");
                    false
                }
            }
        })
    }
}

/// A pinged server and what it last echoed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingServerEntry {
    pub id: u16,
    /// Timestamp carried by the last good reply; 0 when there was none this
    /// round.
    pub timestamp: u32,
    pub connected: bool,
}

impl PingServerEntry {
    /// Time the last reply took to come back, measured in whatever unit the
    /// caller stamps pings with. Survives the clock wrapping around.
    pub fn round_trip(&self, now: u32) -> Option<u32> {
        (self.connected && self.timestamp != 0).then(|| now.wrapping_sub(self.timestamp))
    }
}

#[derive(Debug)]
struct Target {
    entry: PingServerEntry,
    addr: SocketAddr,
    stream: Option<TcpStream>,
}

impl Target {
    fn hang_up(&mut self) {
        self.stream = None;
        self.entry.connected = false;
        self.entry.timestamp = 0;
    }
}

fn is_quiet(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted)
}

/// Probing side. One connection per server, each identified by the id the
/// caller picked for it.
#[derive(Debug, Default)]
pub struct PingClient {
    targets: Vec<Target>,
}

impl PingClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_server(&mut self, host: &str, port: u16, id: u16) -> io::Result<()> {
        self.add_server_with_timeout(host, port, id, transport::DEFAULT_CONNECT_TIMEOUT)
    }

    pub fn add_server_with_timeout(
        &mut self,
        host: &str,
        port: u16,
        id: u16,
        timeout: time::Duration,
    ) -> io::Result<()> {
        let stream = transport::connect_to_server(host, port, timeout)?;
        let addr = stream.peer_addr()?;
        log::debug!("pinging server {addr} as id {id}");
        self.targets.push(Target {
            entry: PingServerEntry { id, timestamp: 0, connected: true },
            addr,
            stream: Some(stream),
        });
        Ok(())
    }

    pub fn collect_ping_reply_data(&self) -> Vec<PingServerEntry> {
        self.targets.iter().map(|t| t.entry).collect()
    }

    pub fn send_pings(&mut self, timestamp: u32) {
        for t in &mut self.targets {
            let Some(stream) = t.stream.as_mut() else { continue };
            let packet = PingPacket { id: t.entry.id, timestamp }.encode();
            match stream.write(&packet) {
                Ok(PING_PACKET_SIZE) => {}
                Ok(n) => log::debug!("couldn't send ping to {} id={}: {n} sent", t.addr, t.entry.id),
                Err(e) => log::debug!("couldn't send ping to {} id={}: {e}", t.addr, t.entry.id),
            }
        }
    }

    /// Reads one reply per server. A server with nothing to say this round,
    /// or with something other than a ping packet, has its timestamp reset to 0.
    /// A reply carrying another id still counts. One that hung up is marked
    /// disconnected and skipped from then on.
    pub fn process_ping_replies(&mut self) {
        for t in &mut self.targets {
            let Some(stream) = t.stream.as_mut() else { continue };
            let mut buf = [0; PING_PACKET_SIZE];
            match stream.read(&mut buf) {
                Ok(0) => {
                    log::debug!("ping server {} id={} disconnected", t.addr, t.entry.id);
                    t.hang_up();
                }
                Ok(n) => match PingPacket::decode(&buf[..n]) {
                    Some(reply) => {
                        t.entry.timestamp = reply.timestamp;
                        if reply.id != t.entry.id {
                            log::debug!(
                                "ping reply id differs (sent={}, reply={})",
                                t.entry.id, reply.id
                            );
                        }
                    }
                    None => {
                        log::debug!("ping reply from {} id={} with {n} bytes", t.addr, t.entry.id);
                        t.entry.timestamp = 0;
                    }
                },
                Err(e) if is_quiet(&e) => t.entry.timestamp = 0,
                Err(e) => {
                    log::debug!("ping server {} id={} lost: {e}", t.addr, t.entry.id);
                    t.hang_up();
                }
            }
        }
    }
}
