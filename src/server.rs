// src/server.rs
use std::io;
use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::TcpListener;
use tracing::warn;

/// Bind the listener on the configured port; if that port is already taken,
/// retry once on the next one.
pub async fn bind_with_fallback(port: u16) -> io::Result<(TcpListener, SocketAddr)> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    match TcpListener::bind(addr).await {
        Ok(listener) => {
            let local = listener.local_addr()?;
            Ok((listener, local))
        }
        Err(err) if err.kind() == io::ErrorKind::AddrInUse => {
            let next = port.saturating_add(1);
            warn!("port {port} already in use, trying {next}");
            let listener =
                TcpListener::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, next))).await?;
            let local = listener.local_addr()?;
            Ok((listener, local))
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn falls_back_to_next_port_when_taken() {
        let (_first, addr) = bind_with_fallback(0).await.unwrap();

        let (_second, fallback) = bind_with_fallback(addr.port()).await.unwrap();
        assert_eq!(fallback.port(), addr.port() + 1);
    }
}
