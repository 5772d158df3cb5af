//! Socket connect and line reading.

use std::time::Duration;

use driftwood_proto::LineCodec;
use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::config::NetworkConfig;
use crate::error::SessionError;

pub type LineReader = FramedRead<OwnedReadHalf, LineCodec>;
pub type LineWriter = FramedWrite<OwnedWriteHalf, LineCodec>;

/// Open a TCP connection, failing with `ConnectTimeout` once `timeout`
/// elapses. No retry happens here.
pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<TcpStream, SessionError> {
    let address = format!("{host}:{port}");
    match tokio::time::timeout(timeout, TcpStream::connect(&address)).await {
        Err(_) => Err(SessionError::ConnectTimeout { address, timeout }),
        Ok(Err(source)) => Err(SessionError::Connect { address, source }),
        Ok(Ok(stream)) => {
            // Lines are small and latency matters more than throughput.
            let _ = stream.set_nodelay(true);
            Ok(stream)
        }
    }
}

/// Split a connected stream into framed halves using the network's
/// encodings.
pub fn framed(stream: TcpStream, config: &NetworkConfig) -> Result<(LineReader, LineWriter), SessionError> {
    let read_codec = LineCodec::new(&config.in_encoding, &config.out_encoding).map_err(SessionError::Encoding)?;
    let write_codec = LineCodec::new(&config.in_encoding, &config.out_encoding).map_err(SessionError::Encoding)?;
    let (read_half, write_half) = stream.into_split();
    Ok((
        FramedRead::new(read_half, read_codec),
        FramedWrite::new(write_half, write_codec),
    ))
}

/// Next decoded line, terminator removed.
///
/// Fails with `ReadTimeout` if nothing arrives within `idle`, and with
/// `ConnectionLost` on EOF or any framing error.
pub async fn read_line<R>(reader: &mut FramedRead<R, LineCodec>, idle: Duration) -> Result<String, SessionError>
where
    R: AsyncRead + Unpin,
{
    match tokio::time::timeout(idle, reader.next()).await {
        Err(_) => Err(SessionError::ReadTimeout(idle)),
        Ok(None) => Err(SessionError::closed()),
        Ok(Some(Err(e))) => Err(SessionError::ConnectionLost(e)),
        Ok(Some(Ok(line))) => Ok(line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    fn reader(stream: tokio::io::DuplexStream) -> FramedRead<tokio::io::DuplexStream, LineCodec> {
        FramedRead::new(stream, LineCodec::default())
    }

    #[tokio::test]
    async fn test_read_lines_then_eof() {
        let (client, mut server) = tokio::io::duplex(256);
        let mut reader = reader(client);

        server.write_all(b"PING :a\r\nPING :b\r\n").await.unwrap();
        drop(server);

        let idle = Duration::from_secs(1);
        assert_eq!(read_line(&mut reader, idle).await.unwrap(), "PING :a");
        assert_eq!(read_line(&mut reader, idle).await.unwrap(), "PING :b");
        assert!(matches!(
            read_line(&mut reader, idle).await,
            Err(SessionError::ConnectionLost(_))
        ));
    }

    #[tokio::test]
    async fn test_partial_line_at_eof_is_connection_lost() {
        let (client, mut server) = tokio::io::duplex(256);
        let mut reader = reader(client);

        server.write_all(b"PING :a").await.unwrap();
        drop(server);

        let err = read_line(&mut reader, Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::ConnectionLost(driftwood_proto::ProtocolError::PartialLine(7))
        ));
    }

    #[tokio::test]
    async fn test_bare_line_feed_is_connection_lost() {
        let (client, mut server) = tokio::io::duplex(256);
        let mut reader = reader(client);

        server.write_all(b"PING :a\n").await.unwrap();

        let err = read_line(&mut reader, Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::ConnectionLost(driftwood_proto::ProtocolError::BareLineFeed)
        ));
    }

    #[tokio::test]
    async fn test_silence_is_read_timeout() {
        let (client, _server) = tokio::io::duplex(256);
        let mut reader = reader(client);

        let err = read_line(&mut reader, Duration::from_millis(50)).await.unwrap_err();
        assert!(matches!(err, SessionError::ReadTimeout(_)));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = connect("127.0.0.1", port, Duration::from_secs(2)).await.unwrap_err();
        assert!(matches!(err, SessionError::Connect { .. }));
    }
}
