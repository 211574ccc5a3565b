//! Newline-delimited JSON event source.
//!
//! Reads one [`BeaconEvent`](super::BeaconEvent) per line from standard input
//! or a file. Blank lines are skipped. Reading happens on a spawned task and
//! results are delivered through a channel, so the consumer sees the same
//! shape whether events come from a pipe, a recorded file or a test.

use super::{EVENT_CHANNEL_BUFFER_SIZE, EventResult, Input, SourceError, decode_event};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

/// Start reading events from the given input.
///
/// # Arguments
/// * `input` - Standard input or a file path
/// * `verbose` - If true, decode errors are sent as Err values; otherwise they're silently dropped.
///   Read errors are always sent.
///
/// # Errors
/// Returns `SourceError::Io` if the file cannot be opened.
pub async fn start_read(
    input: Input,
    verbose: bool,
) -> Result<mpsc::Receiver<EventResult>, SourceError> {
    match input {
        Input::Stdin => Ok(read_events(tokio::io::stdin(), verbose)),
        Input::File(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .map_err(|e| SourceError::Io(format!("{}: {e}", path.display())))?;
            Ok(read_events(file, verbose))
        }
    }
}

/// Spawn a task that decodes events from `reader` until end of input.
///
/// The channel closes when the input ends or a read fails. A read failure is
/// sent as `SourceError::Io` before closing, so it can't pass for end of input.
pub fn read_events<R>(reader: R, verbose: bool) -> mpsc::Receiver<EventResult>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_BUFFER_SIZE);

    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        let mut line_number = 0;

        loop {
            let text = match lines.next_line().await {
                Ok(Some(text)) => text,
                Ok(None) => break,
                Err(e) => {
                    let _ = tx.send(Err(SourceError::from(e))).await;
                    break;
                }
            };
            line_number += 1;

            if text.trim().is_empty() {
                continue;
            }

            let result = decode_event(line_number, &text);
            if (result.is_ok() || verbose) && tx.send(result).await.is_err() {
                debug!("event receiver dropped, stopping reader");
                break;
            }
        }
    });

    rx
}
