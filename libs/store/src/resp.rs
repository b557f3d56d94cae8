//! RESP wire framing: command encoding and reply decoding.

use crate::StoreError;
use std::future::Future;
use std::pin::Pin;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// A single engine command: a name followed by raw arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    args: Vec<Vec<u8>>,
}

impl Command {
    pub fn new(name: &str) -> Self {
        Self {
            args: vec![name.as_bytes().to_vec()],
        }
    }

    pub fn arg(mut self, value: impl AsRef<[u8]>) -> Self {
        self.args.push(value.as_ref().to_vec());
        self
    }

    pub fn arg_int(self, value: i64) -> Self {
        self.arg(value.to_string())
    }

    pub fn arg_float(self, value: f64) -> Self {
        self.arg(value.to_string())
    }

    /// The command name, for error reporting.
    pub fn name(&self) -> String {
        String::from_utf8_lossy(&self.args[0]).into_owned()
    }

    pub fn args(&self) -> &[Vec<u8>] {
        &self.args
    }

    /// Space-joined rendering used by logs and tests.
    pub fn to_line(&self) -> String {
        self.args
            .iter()
            .map(|a| String::from_utf8_lossy(a).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Encode as a RESP array of bulk strings.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(16 * self.args.len());
        out.extend_from_slice(format!("*{}\r\n", self.args.len()).as_bytes());
        for arg in &self.args {
            out.extend_from_slice(format!("${}\r\n", arg.len()).as_bytes());
            out.extend_from_slice(arg);
            out.extend_from_slice(b"\r\n");
        }
        out
    }
}

/// A decoded engine reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Vec<u8>),
    Null,
    Array(Vec<Reply>),
}

impl Reply {
    /// Short rendering for error messages.
    pub fn describe(&self) -> String {
        match self {
            Reply::Simple(s) => format!("+{s}"),
            Reply::Error(e) => format!("-{e}"),
            Reply::Integer(i) => format!(":{i}"),
            Reply::Bulk(b) => format!("${}", String::from_utf8_lossy(b)),
            Reply::Null => "(nil)".to_string(),
            Reply::Array(items) => format!("array[{}]", items.len()),
        }
    }

    /// Interpret this reply as an integer (engine timestamps arrive both as
    /// integers and as textual bulk strings).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Reply::Integer(v) => Some(*v),
            Reply::Bulk(b) => std::str::from_utf8(b).ok()?.parse().ok(),
            Reply::Simple(s) => s.parse().ok(),
            Reply::Error(_) | Reply::Null | Reply::Array(_) => None,
        }
    }

    /// Interpret this reply as a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Reply::Integer(v) => Some(*v as f64),
            Reply::Bulk(b) => std::str::from_utf8(b).ok()?.parse().ok(),
            Reply::Simple(s) => s.parse().ok(),
            Reply::Error(_) | Reply::Null | Reply::Array(_) => None,
        }
    }
}

/// Read one RESP reply from the stream.
///
/// Boxed because array replies recurse.
pub fn read_reply<'a, R>(
    reader: &'a mut R,
) -> Pin<Box<dyn Future<Output = Result<Reply, StoreError>> + Send + 'a>>
where
    R: AsyncBufRead + Unpin + Send,
{
    Box::pin(async move {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Err(StoreError::Protocol("connection closed mid-reply".to_string()));
        }
        let line = line
            .strip_suffix("\r\n")
            .or_else(|| line.strip_suffix('\n'))
            .ok_or_else(|| StoreError::Protocol("reply line missing terminator".to_string()))?;
        let kind = *line
            .as_bytes()
            .first()
            .ok_or_else(|| StoreError::Protocol("empty reply line".to_string()))?;
        if !kind.is_ascii() {
            return Err(StoreError::Protocol(format!("unknown reply type {kind:#x}")));
        }
        let rest = &line[1..];

        match kind {
            b'+' => Ok(Reply::Simple(rest.to_string())),
            b'-' => Ok(Reply::Error(rest.to_string())),
            b':' => rest
                .parse()
                .map(Reply::Integer)
                .map_err(|_| StoreError::Protocol(format!("bad integer reply {rest:?}"))),
            b'$' => {
                let len: i64 = rest
                    .parse()
                    .map_err(|_| StoreError::Protocol(format!("bad bulk length {rest:?}")))?;
                if len < 0 {
                    return Ok(Reply::Null);
                }
                let mut buf = vec![0u8; len as usize + 2];
                reader.read_exact(&mut buf).await?;
                buf.truncate(len as usize);
                Ok(Reply::Bulk(buf))
            }
            b'*' => {
                let len: i64 = rest
                    .parse()
                    .map_err(|_| StoreError::Protocol(format!("bad array length {rest:?}")))?;
                if len < 0 {
                    return Ok(Reply::Null);
                }
                let mut items = Vec::with_capacity(len as usize);
                for _ in 0..len {
                    items.push(read_reply(reader).await?);
                }
                Ok(Reply::Array(items))
            }
            other => Err(StoreError::Protocol(format!("unknown reply type {other:?}"))),
        }
    })
}
