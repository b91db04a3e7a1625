use crate::prelude::*;
use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::SocketAddr;

use super::message::{self, CodecError, Frame, Message, HEADER_SIZE};
use super::registry::MessageHandlerRegistry;
use super::{wire, MAX_PACKET_SIZE};

#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("peer closed the connection")]
    Closed,
    #[error("not connected")]
    NotConnected,
    #[error("frame length {len} outside {min}..={max}", min = HEADER_SIZE, max = MAX_PACKET_SIZE)]
    BadFrameLength { len: usize },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SendError {
    #[error("message of {len} bytes exceeds the {max}-byte packet limit")]
    TooLarge { len: usize, max: usize },
    #[error("send queue full ({queued} bytes queued, limit {limit})")]
    QueueFull { queued: usize, limit: usize },
    #[error("not connected")]
    NotConnected,
    #[error(transparent)]
    Codec(CodecError),
}

impl From<CodecError> for SendError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::FrameTooLarge { len } => SendError::TooLarge { len, max: MAX_PACKET_SIZE },
            e => SendError::Codec(e),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkStats {
    pub packets_received: u64,
    pub bytes_received: u64,
    pub packets_sent: u64,
    pub bytes_sent: u64,
}

fn per_packet(bytes: u64, packets: u64) -> f64 {
    if packets == 0 { 0.0 } else { bytes as f64 / packets as f64 }
}

/// Reassembly buffer. `front..back` holds received bytes that have not yet
/// formed a whole frame. Room for two maximum frames means a full frame plus
/// the start of the next always fit.
#[derive(Default)]
struct WorkBuffer {
    data: Box<[u8]>,
    front: usize,
    back: usize,
}

impl WorkBuffer {
    fn new() -> Self {
        Self { data: vec![0; 2 * MAX_PACKET_SIZE].into_boxed_slice(), front: 0, back: 0 }
    }
    fn stream(&self) -> &[u8] {
        &self.data[self.front..self.back]
    }
    /// Moves the unconsumed bytes to the start of the buffer.
    fn compact(&mut self) {
        if self.front != 0 {
            self.data.copy_within(self.front..self.back, 0);
            self.back -= self.front;
            self.front = 0;
        }
    }
    /// Where the next read lands: at most one packet's worth.
    fn spare(&mut self) -> &mut [u8] {
        let end = (self.back + MAX_PACKET_SIZE).min(self.data.len());
        &mut self.data[self.back..end]
    }
    fn consume(&mut self, n: usize) {
        if n == self.back - self.front {
            self.front = 0;
            self.back = 0;
        } else {
            self.front += n;
        }
    }
}

/// One peer: its socket, the frames waiting to go out, and the bytes that
/// came in but do not yet make up a whole frame.
///
/// Generic over the stream so framing can run over anything `Read + Write`;
/// in practice that is a non-blocking `TcpStream`.
pub struct Connection<S = TcpStream> {
    stream: Option<S>,
    peer: SocketAddr,
    send_queue: VecDeque<Vec<u8>>,
    send_queue_limit: Option<usize>,
    work: WorkBuffer,
    stats: LinkStats,
}

impl Connection<TcpStream> {
    /// Wraps a freshly accepted or connected socket, switching it to
    /// non-blocking mode.
    pub fn from_tcp(stream: TcpStream) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        let peer = stream.peer_addr()?;
        Ok(Self::new(stream, peer))
    }
}

impl<S: Read + Write> Connection<S> {
    pub fn new(stream: S, peer: SocketAddr) -> Self {
        Self {
            stream: Some(stream),
            peer,
            send_queue: VecDeque::new(),
            send_queue_limit: None,
            work: WorkBuffer::new(),
            stats: LinkStats::default(),
        }
    }

    /// Caps the bytes allowed to sit in the send queue. `None` is unbounded.
    pub fn with_send_queue_limit(mut self, limit: Option<usize>) -> Self {
        self.send_queue_limit = limit;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
    pub fn stream(&self) -> Option<&S> {
        self.stream.as_ref()
    }
    pub fn stats(&self) -> LinkStats {
        self.stats
    }
    pub fn bytes_in_send_queue(&self) -> usize {
        self.send_queue.iter().map(Vec::len).sum()
    }
    pub fn packets_in_send_queue(&self) -> usize {
        self.send_queue.len()
    }

    /// Closes the socket. Anything still queued is dropped, not flushed.
    pub fn disconnect(&mut self) {
        if self.stream.take().is_some() {
            let pending = self.bytes_in_send_queue();
            if pending != 0 {
                log::debug!("{}: discarding {pending} unsent bytes", self.peer);
            }
            self.send_queue.clear();
        }
    }

    pub fn send_message(&mut self, msg: &dyn Message) -> Result<(), SendError> {
        let frame = message::serialize(msg)?;
        self.send_frame(&frame)
    }

    /// Queues an already serialised frame and tries to flush right away.
    pub fn send_frame(&mut self, frame: &Frame) -> Result<(), SendError> {
        if self.stream.is_none() {
            return Err(SendError::NotConnected);
        }
        if frame.len() > MAX_PACKET_SIZE {
            return Err(SendError::TooLarge { len: frame.len(), max: MAX_PACKET_SIZE });
        }
        if let Some(limit) = self.send_queue_limit {
            let queued = self.bytes_in_send_queue();
            if queued + frame.len() > limit {
                return Err(SendError::QueueFull { queued, limit });
            }
        }
        log::trace!("{}: queueing {frame:?}", self.peer);
        self.send_queue.push_back(frame.as_bytes().to_vec());
        self.stats.packets_sent += 1;
        self.process_outgoing_messages();
        Ok(())
    }

    /// Writes as much of the queue as the socket takes. A partial write
    /// leaves only the unsent tail at the head of the queue. Errors are left
    /// for the receive path to discover.
    pub fn process_outgoing_messages(&mut self) {
        let Some(stream) = self.stream.as_mut() else { return };
        while let Some(head) = self.send_queue.front_mut() {
            match stream.write(head) {
                Ok(0) => return,
                Ok(n) if n == head.len() => {
                    self.stats.bytes_sent += n as u64;
                    self.send_queue.pop_front();
                }
                Ok(n) => {
                    self.stats.bytes_sent += n as u64;
                    head.drain(..n);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => return,
                Err(e) => {
                    log::trace!("{}: send: {e}", self.peer);
                    return;
                }
            }
        }
    }

    /// Reads once from the socket and dispatches every whole frame now
    /// buffered, in arrival order. Returns how many frames were consumed.
    ///
    /// An error means the link is gone (or the peer broke framing) and the
    /// owner should drop the connection. A handler that disconnects the link
    /// stops the batch there. Handlers must not call back into this method.
    pub fn process_incoming_messages(
        &mut self,
        registry: &MessageHandlerRegistry<Self>,
    ) -> Result<usize, LinkError> {
        self.work.compact();
        let stream = self.stream.as_mut().ok_or(LinkError::NotConnected)?;
        let n = match stream.read(self.work.spare()) {
            Ok(0) => return Err(LinkError::Closed),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(0),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        self.work.back += n;

        let mut work = core::mem::take(&mut self.work);
        let res = self.dispatch_frames(&mut work, registry);
        self.work = work;
        res
    }

    fn dispatch_frames(
        &mut self,
        work: &mut WorkBuffer,
        registry: &MessageHandlerRegistry<Self>,
    ) -> Result<usize, LinkError> {
        let mut frames = 0;
        loop {
            let stream = work.stream();
            if stream.len() < HEADER_SIZE {
                break;
            }
            let Some((len, rem)) = wire::u16(stream) else { break };
            let len = usize::from(len);
            if !(HEADER_SIZE..=MAX_PACKET_SIZE).contains(&len) {
                log::error!("{}: bad frame length {len}, dropping link", self.peer);
                return Err(LinkError::BadFrameLength { len });
            }
            if len > stream.len() {
                // wait for the rest
                break;
            }
            let Some((key, _)) = wire::u32(rem) else { break };
            registry.handle_stream(self, key, &stream[..len]);
            work.consume(len);

            self.stats.packets_received += 1;
            self.stats.bytes_received += len as u64;
            frames += 1;

            if !self.is_connected() {
                log::debug!("{}: handler closed the link, {} bytes left undispatched", self.peer, work.stream().len());
                return Err(LinkError::NotConnected);
            }
        }
        Ok(frames)
    }
}

impl<S> Drop for Connection<S> {
    fn drop(&mut self) {
        let s = &self.stats;
        log::debug!(
            "{}: sent ({} p, {} B, {:.02} B/p), recv ({} p, {} B, {:.02} B/p)",
            self.peer,
            s.packets_sent, s.bytes_sent, per_packet(s.bytes_sent, s.packets_sent),
            s.packets_received, s.bytes_received, per_packet(s.bytes_received, s.packets_received),
        );
    }
}

impl<S> std::fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("peer", &self.peer)
            .field("connected", &self.stream.is_some())
            .field("queued", &self.send_queue.len())
            .field("buffered", &(self.work.back - self.work.front))
            .finish()
    }
}
