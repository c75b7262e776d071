use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::{Endpoint, LinkTransport};

/// TCP client transport.
///
/// The current stream sits behind a mutex that is only held long enough to
/// clone or swap the `Arc`; reads and writes run on the clone, so a blocked
/// receive never stalls a send, a reconnect, or a close.
#[derive(Debug, Default)]
pub struct TcpTransport {
    stream: Mutex<Option<Arc<TcpStream>>>,
    closed: AtomicBool,
}

impl TcpTransport {
    /// Create an unconnected transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transport and connect it once.
    pub fn connect_to(endpoint: &Endpoint) -> Result<Self> {
        let transport = Self::new();
        transport.connect(endpoint)?;
        Ok(transport)
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "tcp"
    }

    fn slot(&self) -> MutexGuard<'_, Option<Arc<TcpStream>>> {
        // A poisoned slot still holds a valid Option; keep using it.
        self.stream.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn current(&self) -> Result<Arc<TcpStream>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Shutdown);
        }
        self.slot().clone().ok_or(TransportError::NotConnected)
    }

    fn open(endpoint: &Endpoint) -> Result<TcpStream> {
        let addrs = (endpoint.address.as_str(), endpoint.port)
            .to_socket_addrs()
            .map_err(|source| TransportError::Resolve {
                endpoint: endpoint.clone(),
                source,
            })?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect(addr) {
                Ok(stream) => return Ok(stream),
                Err(err) => last_err = Some(err),
            }
        }

        Err(TransportError::Connect {
            endpoint: endpoint.clone(),
            source: last_err.unwrap_or_else(|| {
                std::io::Error::new(ErrorKind::AddrNotAvailable, "no addresses resolved")
            }),
        })
    }
}

impl LinkTransport for TcpTransport {
    fn connect(&self, endpoint: &Endpoint) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Shutdown);
        }

        let stream = Self::open(endpoint)?;
        if let Err(err) = stream.set_nodelay(true) {
            debug!(%endpoint, %err, "failed to set TCP_NODELAY");
        }

        let mut slot = self.slot();
        // close() may have run while we were connecting.
        if self.closed.load(Ordering::Acquire) {
            let _ = stream.shutdown(Shutdown::Both);
            return Err(TransportError::Shutdown);
        }
        *slot = Some(Arc::new(stream));
        drop(slot);

        info!(%endpoint, "connected");
        Ok(())
    }

    fn send(&self, bytes: &[u8]) -> Result<usize> {
        let stream = self.current()?;
        let mut writer = &*stream;
        writer.write_all(bytes)?;
        writer.flush()?;
        Ok(bytes.len())
    }

    fn receive(&self, buf: &mut [u8]) -> Result<usize> {
        let stream = self.current()?;
        let mut reader = &*stream;
        let result = loop {
            match reader.read(buf) {
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                other => break other,
            }
        };

        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Shutdown);
        }

        match result {
            Ok(n) => Ok(n),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted | ErrorKind::BrokenPipe
                ) =>
            {
                debug!(%err, "stream reset by peer, reporting as closed");
                Ok(0)
            }
            Err(err) => Err(TransportError::Io(err)),
        }
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
        if let Some(stream) = self.slot().take() {
            // Wakes any reader blocked on a clone of this stream.
            let _ = stream.shutdown(Shutdown::Both);
            debug!("transport closed");
        }
    }

    fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::Acquire) && self.slot().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::time::Duration;

    fn listener() -> (TcpListener, Endpoint) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        (listener, Endpoint::new("127.0.0.1", port))
    }

    #[test]
    fn test_connect_send_receive() {
        let (listener, endpoint) = listener();

        let server = std::thread::spawn(move || {
            let (mut peer, _) = listener.accept().unwrap();
            let mut buf = [0u8; 5];
            peer.read_exact(&mut buf).unwrap();
            assert_eq!(&buf, b"hello");
            peer.write_all(b"world").unwrap();
        });

        let transport = TcpTransport::connect_to(&endpoint).unwrap();
        assert!(transport.is_connected());
        assert_eq!(transport.send(b"hello").unwrap(), 5);

        let mut buf = [0u8; 16];
        let mut got = Vec::new();
        while got.len() < 5 {
            let n = transport.receive(&mut buf).unwrap();
            assert!(n > 0);
            got.extend_from_slice(&buf[..n]);
        }
        assert_eq!(got, b"world");

        server.join().unwrap();
    }

    #[test]
    fn test_receive_returns_zero_on_peer_close() {
        let (listener, endpoint) = listener();
        let server = std::thread::spawn(move || {
            let (peer, _) = listener.accept().unwrap();
            drop(peer);
        });

        let transport = TcpTransport::connect_to(&endpoint).unwrap();
        server.join().unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(transport.receive(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_close_unblocks_pending_receive() {
        let (listener, endpoint) = listener();
        let transport = Arc::new(TcpTransport::connect_to(&endpoint).unwrap());
        let (_peer, _) = listener.accept().unwrap();

        let reader = {
            let transport = Arc::clone(&transport);
            std::thread::spawn(move || {
                let mut buf = [0u8; 8];
                transport.receive(&mut buf)
            })
        };

        std::thread::sleep(Duration::from_millis(50));
        transport.close();

        let result = reader.join().unwrap();
        assert!(matches!(result, Err(TransportError::Shutdown)));
        assert!(!transport.is_connected());
    }

    #[test]
    fn test_connect_after_close_is_refused() {
        let (_listener, endpoint) = listener();
        let transport = TcpTransport::new();
        transport.close();
        transport.close();

        let result = transport.connect(&endpoint);
        assert!(matches!(result, Err(TransportError::Shutdown)));
    }

    #[test]
    fn test_send_without_connection() {
        let transport = TcpTransport::new();
        let result = transport.send(b"x");
        assert!(matches!(result, Err(TransportError::NotConnected)));
    }

    #[test]
    fn test_connect_refused() {
        let (listener, endpoint) = listener();
        drop(listener);

        let result = TcpTransport::connect_to(&endpoint);
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }

    #[test]
    fn test_reconnect_replaces_stream() {
        let (listener, endpoint) = listener();
        let transport = TcpTransport::connect_to(&endpoint).unwrap();
        let (first, _) = listener.accept().unwrap();
        drop(first);

        transport.connect(&endpoint).unwrap();
        let (mut second, _) = listener.accept().unwrap();
        transport.send(b"again").unwrap();

        let mut buf = [0u8; 5];
        second.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"again");
    }

    #[test]
    fn test_endpoint_display() {
        assert_eq!(Endpoint::new("10.0.0.2", 12345).to_string(), "10.0.0.2:12345");
    }
}
