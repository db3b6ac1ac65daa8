use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufStream};
use tokio::net::TcpStream;
use tokio::time::timeout;

use super::{CacheError, CacheStore};

/// Default address of a local memcached.
pub const DEFAULT_MEMCACHED_ADDR: &str = "127.0.0.1:11211";

const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// Store backed by a memcached server, spoken to over its text protocol.
///
/// Every operation opens its own connection and gives up after a short timeout, so an absent
/// server costs a request little more than a refused connection.
#[derive(Debug, Clone)]
pub struct Memcached {
    addr: String,
    timeout: Duration,
}

impl Memcached {
    /// A store talking to the memcached server at `addr` (`host:port`).
    pub fn new(addr: impl Into<String>) -> Memcached {
        Memcached {
            addr: addr.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Upper bound for a whole operation, connection included.
    pub fn with_timeout(mut self, timeout: Duration) -> Memcached {
        self.timeout = timeout;
        self
    }

    async fn connect(&self) -> Result<BufStream<TcpStream>, CacheError> {
        let stream = TcpStream::connect(&self.addr).await?;
        stream.set_nodelay(true)?;
        Ok(BufStream::new(stream))
    }

    async fn fetch(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connect().await?;

        conn.write_all(format!("get {}\r\n", key).as_bytes()).await?;
        conn.flush().await?;

        let header = read_line(&mut conn).await?;
        if header == "END" {
            return Ok(None);
        }

        let len = parse_value_header(&header)?;

        let mut data = vec![0; len + 2];
        conn.read_exact(&mut data).await?;
        if !data.ends_with(b"\r\n") {
            return Err(CacheError::Protocol(String::from("value not terminated")));
        }
        data.truncate(len);

        let trailer = read_line(&mut conn).await?;
        if trailer != "END" {
            return Err(CacheError::Protocol(trailer));
        }

        String::from_utf8(data)
            .map(Some)
            .map_err(|_| CacheError::Protocol(String::from("value is not UTF-8")))
    }

    async fn store(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut conn = self.connect().await?;

        conn.write_all(format!("set {} 0 0 {}\r\n", key, value.len()).as_bytes())
            .await?;
        conn.write_all(value.as_bytes()).await?;
        conn.write_all(b"\r\n").await?;
        conn.flush().await?;

        match read_line(&mut conn).await?.as_str() {
            "STORED" => Ok(()),
            reply => Err(CacheError::Protocol(reply.to_owned())),
        }
    }
}

impl Default for Memcached {
    fn default() -> Self {
        Memcached::new(DEFAULT_MEMCACHED_ADDR)
    }
}

#[async_trait]
impl CacheStore for Memcached {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        timeout(self.timeout, self.fetch(key))
            .await
            .map_err(|_| CacheError::Timeout)?
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        timeout(self.timeout, self.store(key, value))
            .await
            .map_err(|_| CacheError::Timeout)?
    }
}

async fn read_line(conn: &mut BufStream<TcpStream>) -> Result<String, CacheError> {
    let mut line = String::new();
    if conn.read_line(&mut line).await? == 0 {
        return Err(CacheError::Protocol(String::from("connection closed")));
    }

    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

/// Parses `VALUE <key> <flags> <bytes> [<cas>]`, returning the byte count.
fn parse_value_header(header: &str) -> Result<usize, CacheError> {
    let mut parts = header.split(' ');

    match (parts.next(), parts.nth(2)) {
        (Some("VALUE"), Some(len)) => len
            .parse()
            .map_err(|_| CacheError::Protocol(header.to_owned())),
        _ => Err(CacheError::Protocol(header.to_owned())),
    }
}
