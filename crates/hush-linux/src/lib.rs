use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use log::warn;
use socket2::{Domain, Protocol, Socket, Type};

use hush_core::{HushError, HushResult};
use hush_hal::{PlatformClock, PulseAcceptor, PulseEmitter};

pub mod config;

const BACKLOG: i32 = 16;
const RECV_SIZE: usize = 100;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// One TCP connection per pulse: connect, one noise byte, close.
pub struct TcpPulseEmitter {
    target: SocketAddr,
    label: String,
}

impl TcpPulseEmitter {
    pub fn new(target: &str) -> anyhow::Result<Self> {
        let addr = target
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| anyhow::anyhow!("No address for {}", target))?;
        Ok(Self { target: addr, label: target.to_string() })
    }
}

impl PulseEmitter for TcpPulseEmitter {
    fn pulse(&mut self) -> HushResult<()> {
        let mut stream =
            TcpStream::connect_timeout(&self.target, CONNECT_TIMEOUT).map_err(|_| HushError::LinkDown)?;
        stream.write_all(&[rand::random::<u8>()]).map_err(|_| HushError::LinkDown)?;
        let _ = stream.shutdown(Shutdown::Both);
        Ok(())
    }

    fn peer(&self) -> &str {
        &self.label
    }
}

/// Non-blocking TCP listener. A connection counts as a pulse once it delivers a byte.
pub struct TcpPulseAcceptor {
    listener: TcpListener,
    label: String,
}

impl TcpPulseAcceptor {
    pub fn bind(bind_addr: &str) -> anyhow::Result<Self> {
        let addr: SocketAddr = bind_addr.parse()?;
        let domain = if addr.is_ipv4() { Domain::IPV4 } else { Domain::IPV6 };

        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;
        socket.listen(BACKLOG)?;
        socket.set_nonblocking(true)?;

        let listener: TcpListener = socket.into();
        let label = listener.local_addr()?.to_string();
        Ok(Self { listener, label })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl PulseAcceptor for TcpPulseAcceptor {
    fn accept(&mut self) -> nb::Result<(), HushError> {
        let (mut stream, peer) = match self.listener.accept() {
            Ok(conn) => conn,
            Err(ref e) if is_transient(e) => return Err(nb::Error::WouldBlock),
            Err(e) => {
                warn!("Accept failed on {}: {}", self.label, e);
                return Err(nb::Error::Other(HushError::HalError));
            }
        };

        // Accepted sockets may inherit O_NONBLOCK (BSD).
        if stream.set_nonblocking(false).is_err() || stream.set_read_timeout(Some(READ_TIMEOUT)).is_err() {
            return Err(nb::Error::WouldBlock);
        }

        let mut buf = [0u8; RECV_SIZE];
        match stream.read(&mut buf) {
            Ok(n) if n > 0 => Ok(()),
            Ok(_) => Err(nb::Error::WouldBlock),
            Err(e) => {
                log::debug!("Empty connection from {}: {}", peer, e);
                Err(nb::Error::WouldBlock)
            }
        }
    }

    fn local(&self) -> &str {
        &self.label
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::ConnectionAborted
    )
}

pub struct LinuxClock(Instant);

impl LinuxClock {
    pub fn new() -> Self {
        Self(Instant::now())
    }
}

impl Default for LinuxClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformClock for LinuxClock {
    fn now_us(&self) -> u64 {
        self.0.elapsed().as_micros() as u64
    }

    fn sleep_us(&self, us: u64) {
        if us > 0 {
            std::thread::sleep(Duration::from_micros(us));
        }
    }
}
