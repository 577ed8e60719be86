//! Newline-delimited JSON transport.
//!
//! Input is screened line by line before it reaches the rmcp session: lines
//! the session could not decode are answered here, so one bad line never ends
//! the connection. Output from the session and those answers share a single
//! writer task.

use std::collections::HashSet;
use std::io;

use rmcp::ServiceExt;
use rmcp::model::{ClientJsonRpcMessage, ErrorCode, ErrorData};
use serde_json::{Value, json};
use thiserror::Error;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::server::McpServer;

const PIPE_CAPACITY: usize = 64 * 1024;
const FRAME_BUFFER: usize = 64;
const SERVED_METHODS: &[&str] = &["initialize", "ping", "tools/list", "tools/call"];

/// Errors that end the serving loop.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Reading requests or writing responses failed.
    #[error("transport i/o failed: {0}")]
    Io(#[from] io::Error),

    /// A locally produced error frame could not be encoded.
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),

    /// The session ended abnormally, e.g. the handshake did not complete.
    #[error("mcp session failed: {reason}")]
    Protocol {
        /// Reason reported by the session.
        reason: String,
    },

    /// A background task of the loop panicked or was cancelled.
    #[error("transport task failed: {reason}")]
    Task {
        /// Panic or cancellation message.
        reason: String,
    },
}

/// Result alias for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// What to do with one input line.
#[derive(Debug, PartialEq)]
enum Screened {
    /// Hand the line to the session, expecting a response for `expect`.
    Forward {
        expect: Option<String>,
        cancels: Option<String>,
    },
    /// Answer locally with this error frame.
    Reject(Value),
    /// Drop the line.
    Skip,
}

enum Outbound {
    Expect(String),
    Forget(String),
    Reject(Value),
    InputClosed(DuplexStream),
}

/// Serves requests read line by line from `reader`, writing one JSON line per
/// response to `writer`.
///
/// At end of input the loop waits until every forwarded request has been
/// answered, then closes the session and returns the writer.
///
/// # Errors
///
/// Returns the first read or write failure, or the reason the session ended
/// abnormally.
pub async fn serve<R, W>(server: McpServer, mut reader: R, writer: W) -> TransportResult<W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (mut to_session, session_input) = tokio::io::duplex(PIPE_CAPACITY);
    let (session_output, from_session) = tokio::io::duplex(PIPE_CAPACITY);
    let session = tokio::spawn(run_session(server, session_input, session_output));

    let (tx, rx) = mpsc::channel(FRAME_BUFFER);
    let writer_task = tokio::spawn(write_frames(writer, from_session, rx));

    let mut line = Vec::new();
    let mut forwarded = 0_u64;
    let mut rejected = 0_u64;
    let read_result = loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break Ok(()),
            Ok(_) => {}
            Err(err) => break Err(TransportError::from(err)),
        }

        let outbound = match screen(&line) {
            Screened::Skip => continue,
            Screened::Reject(frame) => {
                rejected += 1;
                Outbound::Reject(frame)
            }
            Screened::Forward { expect, cancels } => {
                let notes = expect.map(Outbound::Expect).into_iter();
                let notes = notes.chain(cancels.map(Outbound::Forget));
                if !notify(&tx, notes).await {
                    break Ok(());
                }
                if let Err(err) = forward(&mut to_session, &line).await {
                    debug!(error = %err, "session stopped reading");
                    break Ok(());
                }
                forwarded += 1;
                continue;
            }
        };
        if tx.send(outbound).await.is_err() {
            debug!("writer stopped, no longer reading input");
            break Ok(());
        }
    };

    if read_result.is_ok() {
        if tx.send(Outbound::InputClosed(to_session)).await.is_err() {
            debug!("writer stopped before input closed");
        }
    } else {
        drop(to_session);
    }
    drop(tx);

    let writer = writer_task.await.map_err(|err| TransportError::Task {
        reason: err.to_string(),
    })??;
    read_result?;
    session.await.map_err(|err| TransportError::Task {
        reason: err.to_string(),
    })??;

    debug!(forwarded, rejected, "input closed");
    Ok(writer)
}

/// Serves requests from process stdin, answering on stdout.
///
/// # Errors
///
/// See [`serve`].
pub async fn serve_stdio(server: McpServer) -> TransportResult<()> {
    info!(tools = server.tools().len(), "serving on stdio");
    let stdin = BufReader::new(tokio::io::stdin());
    serve(server, stdin, tokio::io::stdout()).await?;
    info!("stdio closed, shutting down");
    Ok(())
}

async fn run_session(
    server: McpServer,
    input: DuplexStream,
    output: DuplexStream,
) -> TransportResult<()> {
    let running = match server.serve((input, output)).await {
        Ok(running) => running,
        Err(err) => {
            return Err(TransportError::Protocol {
                reason: err.to_string(),
            });
        }
    };
    let reason = running.waiting().await.map_err(|err| TransportError::Task {
        reason: err.to_string(),
    })?;
    debug!(?reason, "session ended");
    Ok(())
}

async fn notify(tx: &mpsc::Sender<Outbound>, notes: impl Iterator<Item = Outbound>) -> bool {
    for note in notes {
        if tx.send(note).await.is_err() {
            debug!("writer stopped, no longer reading input");
            return false;
        }
    }
    true
}

async fn forward(session: &mut DuplexStream, line: &[u8]) -> io::Result<()> {
    session.write_all(line).await?;
    if !line.ends_with(b"\n") {
        session.write_all(b"\n").await?;
    }
    Ok(())
}

/// Classifies one raw input line.
fn screen(line: &[u8]) -> Screened {
    let Ok(text) = std::str::from_utf8(line) else {
        debug!(bytes = line.len(), "input line is not utf-8");
        return reject(Value::Null, ErrorData::parse_error("request is not valid UTF-8", None));
    };
    let text = text.trim();
    if text.is_empty() {
        return Screened::Skip;
    }
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(err) => {
            debug!(error = %err, "unparsable input line");
            return reject(Value::Null, ErrorData::parse_error(format!("invalid JSON: {err}"), None));
        }
    };
    let Value::Object(message) = &value else {
        return reject(Value::Null, ErrorData::invalid_request("request must be an object", None));
    };

    let method = message.get("method").and_then(Value::as_str);
    let id = message.get("id");
    if serde_json::from_value::<ClientJsonRpcMessage>(value.clone()).is_ok() {
        let expect = method.and(id).map(Value::to_string);
        let cancels = (method == Some("notifications/cancelled"))
            .then(|| message.get("params")?.get("requestId").map(Value::to_string))
            .flatten();
        return Screened::Forward { expect, cancels };
    }

    match (id, method) {
        (None, _) => {
            debug!(method, "dropping undecodable notification");
            Screened::Skip
        }
        (Some(Value::Null), _) => reject(
            Value::Null,
            ErrorData::invalid_request("request id must be a string or a number", None),
        ),
        (Some(id), Some(method)) if SERVED_METHODS.contains(&method) => reject(
            id.clone(),
            ErrorData::invalid_params(format!("malformed `{method}` request"), None),
        ),
        (Some(id), Some(method)) => reject(
            id.clone(),
            ErrorData::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("method not found: {method}"),
                None,
            ),
        ),
        (Some(id), None) => reject(
            id.clone(),
            ErrorData::invalid_request("message has neither a method nor a result", None),
        ),
    }
}

fn reject(id: Value, error: ErrorData) -> Screened {
    Screened::Reject(json!({ "jsonrpc": "2.0", "id": id, "error": error }))
}

/// Copies session output and locally produced frames to `writer`.
///
/// Holds the session input once the reader reaches end of input and drops it
/// when no forwarded request is left unanswered.
async fn write_frames<W>(
    mut writer: W,
    from_session: DuplexStream,
    mut outbound: mpsc::Receiver<Outbound>,
) -> TransportResult<W>
where
    W: AsyncWrite + Unpin,
{
    let mut responses = BufReader::new(from_session).lines();
    let mut pending: HashSet<String> = HashSet::new();
    let mut closing = None;
    let mut reader_open = true;

    loop {
        tokio::select! {
            biased;
            note = outbound.recv(), if reader_open => match note {
                Some(Outbound::Expect(id)) => {
                    pending.insert(id);
                }
                Some(Outbound::Forget(id)) => {
                    pending.remove(&id);
                }
                Some(Outbound::Reject(frame)) => {
                    write_line(&mut writer, &serde_json::to_vec(&frame)?).await?;
                }
                Some(Outbound::InputClosed(input)) => closing = Some(input),
                None => reader_open = false,
            },
            response = responses.next_line() => {
                let Some(response) = response? else {
                    break;
                };
                if let Some(id) = answered_id(&response) {
                    pending.remove(&id);
                }
                write_line(&mut writer, response.as_bytes()).await?;
            }
        }

        if pending.is_empty() && closing.take().is_some() {
            debug!("in-flight requests answered, closing session input");
        }
    }

    if !pending.is_empty() {
        warn!(unanswered = pending.len(), "session ended with requests in flight");
    }
    Ok(writer)
}

/// Returns the id of a response line, ignoring requests sent by the server.
fn answered_id(line: &str) -> Option<String> {
    let message: Value = serde_json::from_str(line).ok()?;
    if message.get("method").is_some() {
        return None;
    }
    message.get("id").map(Value::to_string)
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, frame: &[u8]) -> io::Result<()> {
    writer.write_all(frame).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}
