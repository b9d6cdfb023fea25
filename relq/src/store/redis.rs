use super::ListStore;
use crate::error::store_error;
use anyhow::Result;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use log::{error, trace, warn};
use relq_codec::codec::RespCodec;
use relq_codec::frame::{self, Frame};
use std::fmt;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::Framed;
use url::Url;

/// Where `RedisStore::connect_default` connects to.
pub const DEFAULT_URL: &str = "redis://127.0.0.1:6379";

const DEFAULT_PORT: u16 = 6379;

pub(crate) type StoreRequestSink = mpsc::Sender<StoreRequest>;

/// A command sent to the connection task together with the channel the reply is sent back on.
pub(crate) struct StoreRequest {
    frame: Frame,
    response: oneshot::Sender<Result<Frame>>,
}

impl fmt::Debug for StoreRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StoreRequest{{Frame={:?}}}", self.frame)
    }
}

/// Handle of a connection to a Redis compatible server. The socket is owned by a background task
/// which executes the requests one after the other, clones of the handle share that connection.
#[derive(Clone)]
pub struct RedisStore {
    address: String,
    request_sink: StoreRequestSink,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore").field("address", &self.address).finish()
    }
}

/// Parsed form of a `redis://` url.
#[derive(Debug, PartialEq)]
struct ConnectParams {
    address: String,
    username: Option<String>,
    password: Option<String>,
    db: Option<u32>,
}

fn parse_url(url: &str) -> Result<ConnectParams> {
    let url = if url.contains("://") {
        url.to_string()
    } else {
        format!("redis://{url}")
    };

    let parsed = Url::parse(&url).map_err(|e| store_error(format!("Invalid store url {url}: {e}")))?;

    if parsed.scheme() != "redis" {
        return Err(store_error(format!("Unsupported scheme {}", parsed.scheme())));
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| store_error(format!("Missing host in {url}")))?;
    let port = parsed.port().unwrap_or(DEFAULT_PORT);

    let db = match parsed.path().trim_start_matches('/') {
        "" => None,
        db => Some(
            db.parse::<u32>()
                .map_err(|_| store_error(format!("Invalid database index {db}")))?,
        ),
    };

    let username = Some(parsed.username()).filter(|u| !u.is_empty()).map(str::to_string);
    let password = parsed.password().map(str::to_string);

    Ok(ConnectParams {
        address: format!("{host}:{port}"),
        username,
        password,
        db,
    })
}

/// Timeout of the blocking commands in whole seconds. A sub-second remainder rounds up, otherwise
/// a short non-zero timeout would become 0 which means blocking forever.
pub(crate) fn timeout_secs(timeout: Duration) -> u64 {
    let secs = timeout.as_secs();

    if timeout.subsec_nanos() > 0 {
        secs.saturating_add(1)
    } else {
        secs
    }
}

impl RedisStore {
    /// Connect to `url`, which is `redis://[user:password@]host[:port][/db]` or simply
    /// `host:port`.
    pub async fn connect(url: &str) -> Result<RedisStore> {
        let params = parse_url(url)?;
        let request_sink = create_connection(&params.address).await?;

        let store = RedisStore {
            address: params.address,
            request_sink,
        };

        if let Some(password) = &params.password {
            store.call_ok(frame::auth(params.username.as_deref(), password)).await?;
        }

        if let Some(db) = params.db {
            store.call_ok(frame::select(db)).await?;
        }

        Ok(store)
    }

    /// Fresh connection to the local server on the default port.
    pub async fn connect_default() -> Result<RedisStore> {
        Self::connect(DEFAULT_URL).await
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Check that the server answers.
    pub async fn ping(&self) -> Result<()> {
        self.call_ok(frame::ping()).await
    }

    /// Send a command and wait for the reply. Error replies of the server are turned into errors.
    async fn call(&self, command: Frame) -> Result<Frame> {
        let (tx, rx) = oneshot::channel();

        self.request_sink
            .send(StoreRequest {
                frame: command,
                response: tx,
            })
            .await
            .map_err(|_| store_error(format!("Connection to {} is closed", self.address)))?;

        let reply = rx
            .await
            .map_err(|_| store_error(format!("Connection to {} is closed", self.address)))??;

        match reply {
            Frame::Error(message) => Err(store_error(message)),
            reply => Ok(reply),
        }
    }

    async fn call_ok(&self, command: Frame) -> Result<()> {
        match self.call(command).await? {
            Frame::Simple(_) => Ok(()),
            other => Err(unexpected_reply(other)),
        }
    }

    async fn call_integer(&self, command: Frame) -> Result<u64> {
        match self.call(command).await? {
            Frame::Integer(i) if i >= 0 => Ok(i as u64),
            other => Err(unexpected_reply(other)),
        }
    }

    async fn call_bulk(&self, command: Frame) -> Result<Option<Bytes>> {
        match self.call(command).await? {
            Frame::Bulk(value) => Ok(value),
            // blocking commands answer with a nil array on timeout
            Frame::Array(None) => Ok(None),
            other => Err(unexpected_reply(other)),
        }
    }
}

fn unexpected_reply(reply: Frame) -> anyhow::Error {
    store_error(format!("Unexpected reply {reply:?}"))
}

/// Open the socket and start the task owning it. Returns the sink where the requests go.
async fn create_connection(address: &str) -> Result<StoreRequestSink> {
    match TcpStream::connect(address).await {
        Ok(socket) => {
            let (sender, receiver) = mpsc::channel(1);
            let address = address.to_string();

            tokio::spawn(async move {
                if let Err(e) = connection_loop(socket, receiver).await {
                    error!("Connection to {} failed {:?}", address, e);
                }
            });

            Ok(sender)
        }
        Err(e) => Err(store_error(format!("Connection error {address}: {e:?}"))),
    }
}

/// Execute the requests one by one. The first transport error closes the connection, the callers
/// waiting later get a closed connection error.
async fn connection_loop(socket: TcpStream, mut requests: mpsc::Receiver<StoreRequest>) -> Result<()> {
    let mut framed = Framed::new(socket, RespCodec::new());

    while let Some(request) = requests.recv().await {
        trace!("Incoming store request {:?}", request);

        let reply = exchange(&mut framed, request.frame).await;
        let broken = reply.is_err();

        trace!("Reply {:?}", reply);

        if let Err(unsent) = request.response.send(reply) {
            warn!("Caller gone before the reply {:?}", unsent);
        }

        if broken {
            break;
        }
    }

    Ok(())
}

async fn exchange(framed: &mut Framed<TcpStream, RespCodec>, command: Frame) -> Result<Frame> {
    framed
        .send(command)
        .await
        .map_err(|e| store_error(format!("Send error {e:?}")))?;

    match framed.next().await {
        Some(Ok(reply)) => Ok(reply),
        Some(Err(e)) => Err(store_error(format!("Receive error {e:?}"))),
        None => Err(store_error("Connection closed by the server")),
    }
}

impl ListStore for RedisStore {
    async fn lpush(&self, key: &str, value: Bytes) -> Result<u64> {
        self.call_integer(frame::lpush(key, &value)).await
    }

    async fn rpush(&self, key: &str, value: Bytes) -> Result<u64> {
        self.call_integer(frame::rpush(key, &value)).await
    }

    async fn lpop(&self, key: &str) -> Result<Option<Bytes>> {
        self.call_bulk(frame::lpop(key)).await
    }

    async fn rpoplpush(&self, source: &str, destination: &str) -> Result<Option<Bytes>> {
        self.call_bulk(frame::rpoplpush(source, destination)).await
    }

    async fn brpoplpush(&self, source: &str, destination: &str, timeout: Duration) -> Result<Option<Bytes>> {
        self.call_bulk(frame::brpoplpush(source, destination, timeout_secs(timeout)))
            .await
    }

    async fn lrem(&self, key: &str, count: i64, value: &[u8]) -> Result<u64> {
        self.call_integer(frame::lrem(key, count, value)).await
    }

    async fn llen(&self, key: &str) -> Result<u64> {
        self.call_integer(frame::llen(key)).await
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<Bytes>> {
        match self.call(frame::lrange(key, start, stop)).await? {
            Frame::Array(None) => Ok(vec![]),
            Frame::Array(Some(items)) => items
                .into_iter()
                .map(|item| match item {
                    Frame::Bulk(Some(value)) => Ok(value),
                    other => Err(unexpected_reply(other)),
                })
                .collect(),
            other => Err(unexpected_reply(other)),
        }
    }

    async fn del(&self, key: &str) -> Result<u64> {
        self.call_integer(frame::del(key)).await
    }
}
