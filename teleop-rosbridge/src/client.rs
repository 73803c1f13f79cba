use std::{
    collections::HashMap,
    fmt,
    marker::PhantomData,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use tokio::{
    net::TcpStream,
    sync::{mpsc, watch},
    time,
};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::{
    msg::RosMessage,
    protocol::{validate_topic, Operation, StatusLevel},
    Error,
};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Lifecycle of a rosbridge session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Closed,
    Failed(String),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Failed(_))
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connecting => f.write_str("Connecting..."),
            ConnectionState::Connected => f.write_str("Connected"),
            ConnectionState::Closed => f.write_str("Disconnected"),
            ConnectionState::Failed(reason) => write!(f, "Error: {reason}"),
        }
    }
}

/// Moves to `next` unless the session already ended.
fn set_state(state: &watch::Sender<ConnectionState>, next: ConnectionState) {
    state.send_if_modified(|current| {
        if current.is_terminal() || *current == next {
            return false;
        }
        debug!(from = ?current, to = ?next, "connection state");
        *current = next;
        true
    });
}

#[derive(Debug)]
enum Outgoing {
    Op(Operation),
    Close,
}

#[derive(Debug)]
struct Advertisement {
    msg_type: &'static str,
    publishers: usize,
}

#[derive(Debug)]
struct Shared {
    url: Url,
    sender: mpsc::UnboundedSender<Outgoing>,
    state: Arc<watch::Sender<ConnectionState>>,
    advertised: Mutex<HashMap<String, Advertisement>>,
}

impl Shared {
    fn advertised(&self) -> MutexGuard<'_, HashMap<String, Advertisement>> {
        self.advertised.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn send(&self, op: Operation) -> Result<(), Error> {
        if !self.state.borrow().is_connected() {
            return Err(Error::NotConnected);
        }
        trace!(op = op.op_name(), "queue");
        self.sender
            .send(Outgoing::Op(op))
            .map_err(|_| Error::NotConnected)
    }
}

/// A rosbridge WebSocket session.
///
/// Cloning is cheap; all clones share the same socket.
#[derive(Debug, Clone)]
pub struct RosbridgeClient {
    shared: Arc<Shared>,
}

pub fn parse_url(url: &str) -> Result<Url, Error> {
    let url = Url::parse(url).map_err(|e| Error::InvalidUrl(url.to_owned(), e))?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        scheme => Err(Error::UnsupportedScheme(scheme.to_owned())),
    }
}

impl RosbridgeClient {
    /// Opens a WebSocket session to the rosbridge server at `url`.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, Error> {
        let url = parse_url(url)?;
        info!(%url, "connecting to rosbridge");
        let (socket, _response) = time::timeout(timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| Error::Timeout(timeout))??;
        info!(%url, "connected to rosbridge");
        Ok(Self::from_socket(url, socket))
    }

    fn from_socket(url: Url, socket: Socket) -> Self {
        let (sink, stream) = socket.split();
        let (sender, receiver) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(ConnectionState::Connected);
        let state = Arc::new(state);

        tokio::spawn(write_loop(sink, receiver, state.clone()));
        tokio::spawn(read_loop(stream, state.clone()));

        Self {
            shared: Arc::new(Shared {
                url,
                sender,
                state,
                advertised: Mutex::default(),
            }),
        }
    }

    pub fn url(&self) -> &Url {
        &self.shared.url
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state.borrow().clone()
    }

    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.shared.state.borrow().is_connected()
    }

    /// Queues a raw protocol operation.
    pub fn send(&self, op: Operation) -> Result<(), Error> {
        self.shared.send(op)
    }

    /// Advertises `topic` with the type of `T` and returns a publisher for it.
    ///
    /// The topic is advertised once no matter how many publishers exist, and
    /// unadvertised when the last of them is dropped. Advertising a topic
    /// that is already advertised with another message type fails.
    pub fn advertise<T>(&self, topic: &str) -> Result<Publisher<T>, Error>
    where
        T: RosMessage,
    {
        validate_topic(topic)?;
        let mut advertised = self.shared.advertised();
        match advertised.get_mut(topic) {
            Some(ad) if ad.msg_type != T::TYPE_NAME => {
                return Err(Error::TypeMismatch {
                    topic: topic.to_owned(),
                    advertised: ad.msg_type.to_owned(),
                    requested: T::TYPE_NAME.to_owned(),
                });
            }
            Some(ad) => ad.publishers += 1,
            None => {
                self.shared.send(Operation::Advertise {
                    id: None,
                    topic: topic.to_owned(),
                    msg_type: T::TYPE_NAME.to_owned(),
                })?;
                info!(topic, msg_type = T::TYPE_NAME, "advertised");
                advertised.insert(
                    topic.to_owned(),
                    Advertisement {
                        msg_type: T::TYPE_NAME,
                        publishers: 1,
                    },
                );
            }
        }
        Ok(Publisher {
            shared: self.shared.clone(),
            topic: topic.to_owned(),
            _marker: PhantomData,
        })
    }

    /// Sends a close frame and ends the session.
    pub fn close(&self) {
        if self.is_connected() {
            info!(url = %self.shared.url, "closing rosbridge connection");
            let _ = self.shared.sender.send(Outgoing::Close);
        }
        set_state(&self.shared.state, ConnectionState::Closed);
    }
}

/// Publishes messages of type `T` on an advertised topic.
pub struct Publisher<T> {
    shared: Arc<Shared>,
    topic: String,
    _marker: PhantomData<fn(&T)>,
}

impl<T> fmt::Debug for Publisher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}

impl<T> Publisher<T>
where
    T: RosMessage,
{
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn publish(&self, msg: &T) -> Result<(), Error> {
        let msg = serde_json::to_value(msg)?;
        self.shared.send(Operation::Publish {
            id: None,
            topic: self.topic.clone(),
            msg,
        })
    }
}

impl<T> Drop for Publisher<T> {
    fn drop(&mut self) {
        let mut advertised = self.shared.advertised();
        let Some(ad) = advertised.get_mut(&self.topic) else {
            return;
        };
        ad.publishers -= 1;
        if ad.publishers > 0 {
            return;
        }
        advertised.remove(&self.topic);
        let result = self.shared.send(Operation::Unadvertise {
            id: None,
            topic: self.topic.clone(),
        });
        match result {
            Ok(()) => info!(topic = %self.topic, "unadvertised"),
            Err(e) => debug!(topic = %self.topic, "skip unadvertise: {e}"),
        }
    }
}

async fn write_loop(
    mut sink: SplitSink<Socket, Message>,
    mut receiver: mpsc::UnboundedReceiver<Outgoing>,
    state: Arc<watch::Sender<ConnectionState>>,
) {
    while let Some(outgoing) = receiver.recv().await {
        let result = match outgoing {
            Outgoing::Op(op) => match op.to_json() {
                Ok(text) => sink.send(Message::Text(text)).await,
                Err(e) => {
                    error!("failed to encode {}: {e}", op.op_name());
                    continue;
                }
            },
            Outgoing::Close => {
                if let Err(e) = sink.send(Message::Close(None)).await {
                    debug!("failed to send close frame: {e}");
                }
                break;
            }
        };
        if let Err(e) = result {
            warn!("rosbridge write error: {e}");
            set_state(&state, ConnectionState::Failed(e.to_string()));
            return;
        }
    }
    // All handles dropped without an explicit close.
    let _ = sink.close().await;
    set_state(&state, ConnectionState::Closed);
}

async fn read_loop(mut stream: SplitStream<Socket>, state: Arc<watch::Sender<ConnectionState>>) {
    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Text(text)) => handle_incoming(&text),
            Ok(Message::Close(frame)) => {
                info!(?frame, "rosbridge closed the connection");
                break;
            }
            Ok(other) => trace!(?other, "ignored frame"),
            Err(e) => {
                warn!("rosbridge read error: {e}");
                set_state(&state, ConnectionState::Failed(e.to_string()));
                return;
            }
        }
    }
    set_state(&state, ConnectionState::Closed);
}

fn handle_incoming(text: &str) {
    match Operation::from_json(text) {
        Ok(Operation::Status { level, msg, id }) => match level {
            StatusLevel::Error => error!(?id, "rosbridge: {msg}"),
            StatusLevel::Warning => warn!(?id, "rosbridge: {msg}"),
            StatusLevel::Info => info!(?id, "rosbridge: {msg}"),
            StatusLevel::None => debug!(?id, "rosbridge: {msg}"),
        },
        Ok(op) => debug!(op = op.op_name(), "unhandled incoming operation"),
        Err(e) => warn!(%text, "failed to decode incoming message: {e}"),
    }
}
