use bytes::Bytes;
use std::fmt;

pub const LPUSH: &str = "LPUSH";
pub const RPUSH: &str = "RPUSH";
pub const LPOP: &str = "LPOP";
pub const RPOPLPUSH: &str = "RPOPLPUSH";
pub const BRPOPLPUSH: &str = "BRPOPLPUSH";
pub const LREM: &str = "LREM";
pub const LLEN: &str = "LLEN";
pub const LRANGE: &str = "LRANGE";
pub const DEL: &str = "DEL";
pub const SELECT: &str = "SELECT";
pub const AUTH: &str = "AUTH";
pub const PING: &str = "PING";

/// Represents a RESP2 frame. Requests are always arrays of bulk strings, replies can be any of
/// the variants.
#[derive(Clone, PartialEq, Eq)]
pub enum Frame {
    /// `+OK\r\n`
    Simple(String),
    /// `-ERR message\r\n`, the server refused to execute the command.
    Error(String),
    /// `:42\r\n`
    Integer(i64),
    /// Binary safe string, `None` is the null bulk string `$-1\r\n`.
    Bulk(Option<Bytes>),
    /// Array of frames, `None` is the null array `*-1\r\n` which blocking commands return on
    /// timeout.
    Array(Option<Vec<Frame>>),
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Simple(s) => write!(f, "Simple({s})"),
            Frame::Error(e) => write!(f, "Error({e})"),
            Frame::Integer(i) => write!(f, "Integer({i})"),
            Frame::Bulk(None) => write!(f, "Bulk(nil)"),
            Frame::Bulk(Some(b)) => {
                let body = String::from_utf8_lossy(&b[..std::cmp::min(64usize, b.len())]);

                write!(f, "Bulk({:?}, len={})", body, b.len())
            }
            Frame::Array(None) => write!(f, "Array(nil)"),
            Frame::Array(Some(items)) => f.debug_list().entries(items).finish(),
        }
    }
}

impl Frame {
    /// Null replies are the absent values of RESP: nil bulk string or nil array.
    pub fn is_nil(&self) -> bool {
        matches!(self, Frame::Bulk(None) | Frame::Array(None))
    }

    /// The name of the command if the frame is a request, the first element of the array.
    pub fn command_name(&self) -> Option<String> {
        match self {
            Frame::Array(Some(items)) => match items.first() {
                Some(Frame::Bulk(Some(name))) => Some(String::from_utf8_lossy(name).to_uppercase()),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Builder of a request frame. Every argument is sent as a bulk string.
#[derive(Debug, Default)]
pub struct Command {
    args: Vec<Frame>,
}

impl Command {
    pub fn new(name: &str) -> Self {
        Command {
            args: vec![bulk(name.as_bytes())],
        }
    }

    pub fn arg(mut self, value: impl AsRef<[u8]>) -> Self {
        self.args.push(bulk(value.as_ref()));
        self
    }

    pub fn arg_int(self, value: i64) -> Self {
        self.arg(value.to_string())
    }

    pub fn frame(self) -> Frame {
        Frame::Array(Some(self.args))
    }
}

fn bulk(value: &[u8]) -> Frame {
    Frame::Bulk(Some(Bytes::copy_from_slice(value)))
}

pub fn lpush(key: &str, value: &[u8]) -> Frame {
    Command::new(LPUSH).arg(key).arg(value).frame()
}

pub fn rpush(key: &str, value: &[u8]) -> Frame {
    Command::new(RPUSH).arg(key).arg(value).frame()
}

pub fn lpop(key: &str) -> Frame {
    Command::new(LPOP).arg(key).frame()
}

pub fn rpoplpush(source: &str, destination: &str) -> Frame {
    Command::new(RPOPLPUSH).arg(source).arg(destination).frame()
}

/// Blocking move, `timeout_secs` 0 means the server blocks until an element arrives.
pub fn brpoplpush(source: &str, destination: &str, timeout_secs: u64) -> Frame {
    Command::new(BRPOPLPUSH)
        .arg(source)
        .arg(destination)
        .arg(timeout_secs.to_string())
        .frame()
}

/// Remove elements equal to `value`. Count 0 removes all of them, a positive count removes from
/// head to tail, a negative one from tail to head.
pub fn lrem(key: &str, count: i64, value: &[u8]) -> Frame {
    Command::new(LREM).arg(key).arg_int(count).arg(value).frame()
}

pub fn llen(key: &str) -> Frame {
    Command::new(LLEN).arg(key).frame()
}

pub fn lrange(key: &str, start: i64, stop: i64) -> Frame {
    Command::new(LRANGE).arg(key).arg_int(start).arg_int(stop).frame()
}

pub fn del(key: &str) -> Frame {
    Command::new(DEL).arg(key).frame()
}

pub fn select(db: u32) -> Frame {
    Command::new(SELECT).arg(db.to_string()).frame()
}

/// Authenticate the connection, the username form needs Redis 6 ACLs.
pub fn auth(username: Option<&str>, password: &str) -> Frame {
    match username {
        Some(user) => Command::new(AUTH).arg(user).arg(password).frame(),
        None => Command::new(AUTH).arg(password).frame(),
    }
}

pub fn ping() -> Frame {
    Command::new(PING).frame()
}
