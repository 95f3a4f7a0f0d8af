use std::io::ErrorKind;
use std::net::TcpStream;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::Duration;

use crossbeam_channel::Sender;
use tracing::{debug, trace, warn};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use crate::error::LinkError;
use crate::link::{ConnId, Transport, TransportEvent, TransportEventKind, TransportHandle};

/// How often a blocked read wakes up to check for a close request.
const READ_POLL: Duration = Duration::from_millis(200);

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

// -----------------------------
// Blocking websocket transport, one worker thread per attempt
// -----------------------------
pub struct WsTransport {
    tx: Sender<TransportEvent>,
}

impl WsTransport {
    pub fn new(tx: Sender<TransportEvent>) -> Self {
        Self { tx }
    }
}

impl Transport for WsTransport {
    fn open(&mut self, url: &str, conn: ConnId) -> Result<Box<dyn TransportHandle>, LinkError> {
        let stop = Arc::new(AtomicBool::new(false));
        let worker = Worker {
            url: url.to_string(),
            conn,
            tx: self.tx.clone(),
            stop: stop.clone(),
        };
        thread::Builder::new()
            .name(format!("ws-link-{conn}"))
            .spawn(move || worker.run())
            .map_err(LinkError::Init)?;
        Ok(Box::new(WsHandle { stop }))
    }
}

struct WsHandle {
    stop: Arc<AtomicBool>,
}

impl TransportHandle for WsHandle {
    fn close(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

struct Worker {
    url: String,
    conn: ConnId,
    tx: Sender<TransportEvent>,
    stop: Arc<AtomicBool>,
}

impl Worker {
    fn emit(&self, kind: TransportEventKind) {
        // Receiver gone means the UI has exited.
        let _ = self.tx.send(TransportEvent {
            conn: self.conn,
            kind,
        });
    }

    fn run(self) {
        debug!(conn = self.conn, "ws worker started");
        match tungstenite::connect(self.url.as_str()) {
            Ok((mut socket, _resp)) => {
                if self.stop.load(Ordering::Relaxed) {
                    // Cancelled while the handshake was in flight.
                    close_quietly(&mut socket);
                } else {
                    self.pump(&mut socket);
                }
            }
            Err(e) => {
                let err = LinkError::Connect {
                    url: self.url.clone(),
                    source: Box::new(e),
                };
                warn!(conn = self.conn, "{err}");
                self.emit(TransportEventKind::Error(err.to_string()));
            }
        }
        self.emit(TransportEventKind::Closed);
        debug!(conn = self.conn, "ws worker finished");
    }

    fn pump(&self, socket: &mut Socket) {
        if let MaybeTlsStream::Plain(stream) = socket.get_mut() {
            if let Err(e) = stream.set_read_timeout(Some(READ_POLL)) {
                warn!(conn = self.conn, "set read timeout: {e}");
            }
        }
        self.emit(TransportEventKind::Opened);

        loop {
            if self.stop.load(Ordering::Relaxed) {
                close_quietly(socket);
                return;
            }
            match socket.read() {
                Ok(Message::Text(text)) => {
                    self.emit(TransportEventKind::Message(text.as_str().to_owned()))
                }
                Ok(Message::Binary(bytes)) => {
                    debug!(conn = self.conn, len = bytes.len(), "ignoring binary frame")
                }
                Ok(Message::Close(frame)) => {
                    debug!(conn = self.conn, ?frame, "peer sent close");
                }
                Ok(_) => trace!(conn = self.conn, "control frame"),
                Err(tungstenite::Error::Io(e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
                Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                    debug!(conn = self.conn, "connection closed");
                    return;
                }
                Err(e) => {
                    if !self.stop.load(Ordering::Relaxed) {
                        let err = LinkError::Read(Box::new(e));
                        warn!(conn = self.conn, "{err}");
                        self.emit(TransportEventKind::Error(err.to_string()));
                    }
                    return;
                }
            }
        }
    }
}

fn close_quietly(socket: &mut Socket) {
    if let Err(e) = socket.close(None) {
        trace!("close handshake: {e}");
    }
    // Drain until the peer acknowledges or the socket errors out.
    for _ in 0..5 {
        match socket.read() {
            Ok(_) => continue,
            Err(tungstenite::Error::Io(e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                continue
            }
            Err(_) => break,
        }
    }
}
