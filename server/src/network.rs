//! Server network layer: TCP listener and per-connection tasks
//!
//! Every accepted socket gets two tasks. The reader decodes length-prefixed
//! command frames and hands them to the protocol handler in arrival order;
//! the writer drains the connection's outgoing queue onto the socket. When
//! the reader sees the peer go away the connection is dropped from the
//! registry, which never touches game state.

use crate::error::CommandError;
use crate::handler::ProtocolHandler;
use crate::registry::{Connection, ConnectionId};
use log::{debug, error, info, warn};
use serde::Serialize;
use shared::{
    decode_payload, encode_frame, frame_len, ClientCommand, FrameError, ServerMessage,
    FRAME_HEADER_LEN,
};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::sleep;

/// Pause after a failed accept so persistent errors (e.g. out of file
/// descriptors) do not spin the loop
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Listener settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind, e.g. `127.0.0.1:8080`
    pub addr: String,
    /// Connections beyond this are refused
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
            max_connections: 256,
        }
    }
}

/// Reads one frame payload. Returns None on a clean end of stream.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, NetworkError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; FRAME_HEADER_LEN];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = frame_len(header)?;
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Some(payload))
}

/// Encodes `message` and writes it as one frame
pub async fn write_frame<W, T>(writer: &mut W, message: &T) -> Result<(), NetworkError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let frame = encode_frame(message)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Accepts connections and wires them to the protocol handler
pub struct Server {
    listener: TcpListener,
    handler: Arc<ProtocolHandler>,
    max_connections: usize,
    next_connection_id: AtomicU32,
    active_connections: Arc<AtomicUsize>,
}

impl Server {
    pub async fn new(
        config: ServerConfig,
        handler: Arc<ProtocolHandler>,
    ) -> Result<Self, NetworkError> {
        let listener = TcpListener::bind(&config.addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        Ok(Server {
            listener,
            handler,
            max_connections: config.max_connections,
            next_connection_id: AtomicU32::new(1),
            active_connections: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, NetworkError> {
        Ok(self.listener.local_addr()?)
    }

    /// Number of connections currently being served
    fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::SeqCst)
    }

    /// Accept loop; runs until the task is dropped
    pub async fn run(&self) -> Result<(), NetworkError> {
        info!("Server started successfully");

        loop {
            let (stream, addr) = accept_with_retry(|| self.listener.accept()).await;

            if self.active_connections() >= self.max_connections {
                warn!("Refusing connection from {}: server full", addr);
                tokio::spawn(refuse(stream));
                continue;
            }

            let id = self.next_connection_id.fetch_add(1, Ordering::SeqCst);
            self.active_connections.fetch_add(1, Ordering::SeqCst);

            let handler = Arc::clone(&self.handler);
            let active = Arc::clone(&self.active_connections);
            tokio::spawn(async move {
                serve_connection(stream, addr, id, handler).await;
                active.fetch_sub(1, Ordering::SeqCst);
            });
        }
    }
}

/// Calls `accept` until it succeeds, pausing after every failure
async fn accept_with_retry<F, Fut, T>(mut accept: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<T>>,
{
    loop {
        match accept().await {
            Ok(accepted) => return accepted,
            Err(e) => {
                error!("Error accepting connection: {}", e);
                sleep(ACCEPT_RETRY_DELAY).await;
            }
        }
    }
}

async fn refuse(mut stream: TcpStream) {
    let message = ServerMessage::error("Error: server full");
    if let Err(e) = write_frame(&mut stream, &message).await {
        debug!("Failed to notify refused client: {}", e);
    }
}

/// Runs the reader loop for one client and cleans up when it ends
async fn serve_connection(
    stream: TcpStream,
    addr: SocketAddr,
    id: ConnectionId,
    handler: Arc<ProtocolHandler>,
) {
    info!("Client {} connected from {}", id, addr);

    let (mut reader, writer) = stream.into_split();
    let (tx, rx) = mpsc::unbounded_channel();
    let conn = Connection::new(id, addr, tx);
    spawn_writer(id, writer, rx);

    loop {
        let payload = match read_frame(&mut reader).await {
            Ok(Some(payload)) => payload,
            Ok(None) => break,
            Err(e) => {
                warn!("Dropping client {} ({}): {}", id, addr, e);
                break;
            }
        };

        match decode_payload::<ClientCommand>(&payload) {
            Ok(command) => handler.handle(&conn, command).await,
            Err(e) => {
                warn!("Failed to decode command from {}: {}", addr, e);
                let err = CommandError::Validation("malformed command".to_string());
                handler.reject(&conn, &err).await;
            }
        }
    }

    handler.disconnect(&conn).await;
    info!("Client {} disconnected", id);
}

/// Forwards queued messages to the socket until the queue or the socket closes
fn spawn_writer<W>(
    id: ConnectionId,
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<ServerMessage>,
) where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = write_frame(&mut writer, &message).await {
                debug!("Writer for client {} stopped: {}", id, e);
                break;
            }
        }
    });
}
