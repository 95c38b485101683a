//! Line pumps: one task per engine output stream, reading complete lines
//! until end-of-stream and forwarding them to the supervisor's channel.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Which engine stream a line arrived on. Order is preserved per source;
/// stdout and stderr interleave in arrival order on the shared channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSource {
    EngineStdout,
    EngineStderr,
}

impl StreamSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamSource::EngineStdout => "engine-stdout",
            StreamSource::EngineStderr => "engine-stderr",
        }
    }
}

/// One line read from an engine stream, trimmed of surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEvent {
    pub source: StreamSource,
    pub text: String,
}

/// Spawns a pump task reading lines from `stream` into `tx` until EOF.
///
/// A closed receiver also stops the pump; the session is over at that
/// point and remaining output is irrelevant.
pub fn spawn_pump<R>(
    stream: R,
    source: StreamSource,
    tx: UnboundedSender<LineEvent>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let event = LineEvent {
                        source,
                        text: line.trim().to_string(),
                    };
                    if tx.send(event).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(source = source.as_str(), error = %e, "pump read failed");
                    break;
                }
            }
        }
        debug!(source = source.as_str(), "stream closed, pump exiting");
    })
}
