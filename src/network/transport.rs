//! Socket setup: listen, accept and timeout-bounded connect.
//!
//! Everything handed out from here is already non-blocking.

use crate::prelude::*;
use std::net::{SocketAddr, TcpListener, ToSocketAddrs};

use socket2::{Domain, Protocol, Socket, Type};

pub const DEFAULT_CONNECT_TIMEOUT: time::Duration = time::Duration::from_secs(5);

/// Resolves `host` (a literal address or a host name) to its first address.
pub fn resolve(host: &str, port: u16) -> io::Result<SocketAddr> {
    (host, port).to_socket_addrs()?.next().ok_or_else(|| {
        io::Error::new(io::ErrorKind::NotFound, format!("no address for {host}:{port}"))
    })
}

pub fn listen_for_clients(host: &str, port: u16, backlog: u32) -> io::Result<TcpListener> {
    let addr = resolve(host, port)?;
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(i32::try_from(backlog).unwrap_or(i32::MAX))?;
    socket.set_nonblocking(true)?;
    let listener: TcpListener = socket.into();
    log::info!("listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Takes one pending connection, or `None` once the backlog is empty.
pub fn accept_incoming(listener: &TcpListener) -> io::Result<Option<(TcpStream, SocketAddr)>> {
    loop {
        match listener.accept() {
            Ok((stream, addr)) => {
                stream.set_nonblocking(true)?;
                return Ok(Some((stream, addr)));
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// The one blocking call in the layer: waits at most `timeout` for the
/// handshake, then switches the stream to non-blocking.
pub fn connect_to_server(host: &str, port: u16, timeout: time::Duration) -> io::Result<TcpStream> {
    let addr = resolve(host, port)?;
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.connect_timeout(&addr.into(), timeout)?;
    socket.set_nonblocking(true)?;
    log::info!("connected to {addr}");
    Ok(socket.into())
}
