//! Reconnecting WebSocket text channel.
//!
//! A daemon thread owns the socket. Outbound text is queued from the UI
//! context and flushed by the daemon; inbound text frames are queued back
//! and picked up with [`WsChannel::drain_inbound`]. When the connection drops
//! the daemon waits `reconnect_delay` and dials again until the channel is
//! dropped.

use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket, connect};

const READ_SLICE: Duration = Duration::from_millis(50);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("channel is not open")]
    Closed,

    #[error("channel worker has exited")]
    Disconnected,
}

pub struct WsChannel {
    url: String,
    open: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    outbound: Sender<String>,
    inbound: Receiver<String>,
}

impl WsChannel {
    /// Start dialing `url` in the background. Returns immediately; the
    /// channel reports [`is_open`](Self::is_open) once the handshake is done.
    pub fn connect(url: impl Into<String>, reconnect_delay: Duration) -> Self {
        let url = url.into();
        let open = Arc::new(AtomicBool::new(false));
        let shutdown = Arc::new(AtomicBool::new(false));
        let (out_tx, out_rx) = mpsc::channel::<String>();
        let (in_tx, in_rx) = mpsc::channel::<String>();

        let daemon = Daemon {
            url: url.clone(),
            reconnect_delay,
            open: Arc::clone(&open),
            shutdown: Arc::clone(&shutdown),
            outbound: out_rx,
            inbound: in_tx,
        };
        thread::Builder::new()
            .name("dreamweb-ws".into())
            .spawn(move || daemon.run())
            .map_err(|err| warn!(?err, "failed to spawn websocket daemon"))
            .ok();

        Self {
            url,
            open,
            shutdown,
            outbound: out_tx,
            inbound: in_rx,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Queue a text frame. Fails without queueing when the socket is not open.
    pub fn send(&self, text: String) -> Result<(), ChannelError> {
        if !self.is_open() {
            return Err(ChannelError::Closed);
        }
        self.outbound
            .send(text)
            .map_err(|_| ChannelError::Disconnected)
    }

    /// All text frames received since the last call, in arrival order.
    pub fn drain_inbound(&self) -> Vec<String> {
        let mut frames = Vec::new();
        loop {
            match self.inbound.try_recv() {
                Ok(text) => frames.push(text),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        frames
    }

    /// Block until the socket is open or `timeout` elapses.
    pub fn wait_open(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.is_open() {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(Duration::from_millis(5));
        }
        true
    }
}

impl Drop for WsChannel {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
    }
}

struct Daemon {
    url: String,
    reconnect_delay: Duration,
    open: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    outbound: Receiver<String>,
    inbound: Sender<String>,
}

enum SessionEnd {
    Lost,
    Shutdown,
}

impl Daemon {
    fn run(self) {
        while !self.stopping() {
            match connect(self.url.as_str()) {
                Ok((socket, _)) => {
                    info!(url = %self.url, "live channel connected");
                    let end = self.session(socket);
                    self.open.store(false, Ordering::Release);
                    if matches!(end, SessionEnd::Shutdown) {
                        break;
                    }
                    info!(url = %self.url, "live channel closed, reconnecting");
                }
                Err(err) => debug!(url = %self.url, %err, "live channel connect failed"),
            }
            self.pause();
        }
        debug!(url = %self.url, "live channel daemon exiting");
    }

    fn stopping(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    fn pause(&self) {
        let deadline = Instant::now() + self.reconnect_delay;
        while !self.stopping() && Instant::now() < deadline {
            thread::sleep(READ_SLICE.min(deadline.saturating_duration_since(Instant::now())));
        }
    }

    fn session(&self, mut socket: WebSocket<MaybeTlsStream<TcpStream>>) -> SessionEnd {
        if let MaybeTlsStream::Plain(stream) = socket.get_ref() {
            if let Err(err) = stream.set_read_timeout(Some(READ_SLICE)) {
                warn!(?err, "failed to set read timeout on live channel");
            }
        }
        // Drop anything queued before this connection came up.
        while self.outbound.try_recv().is_ok() {}
        self.open.store(true, Ordering::Release);

        loop {
            if self.stopping() {
                let _ = socket.close(None);
                let _ = socket.flush();
                return SessionEnd::Shutdown;
            }

            loop {
                match self.outbound.try_recv() {
                    Ok(text) => {
                        if let Err(err) = socket.send(Message::Text(text)) {
                            warn!(%err, "live channel send failed");
                            return SessionEnd::Lost;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return SessionEnd::Shutdown,
                }
            }

            match socket.read() {
                Ok(Message::Text(text)) => {
                    if self.inbound.send(text).is_err() {
                        return SessionEnd::Shutdown;
                    }
                }
                Ok(Message::Close(_)) => return SessionEnd::Lost,
                Ok(_) => {}
                Err(tungstenite::Error::Io(err))
                    if matches!(
                        err.kind(),
                        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                    ) => {}
                Err(err) => {
                    debug!(%err, "live channel read failed");
                    return SessionEnd::Lost;
                }
            }
        }
    }
}
