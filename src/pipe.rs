//! Pipe-handler loop: newline-delimited events in, acknowledgments out

use anyhow::Context;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, instrument, trace};

use crate::event::RawEvent;
use crate::translator::EventTranslator;

/// Forward one JSON event per line until EOF
///
/// Blank lines are skipped. Each delivered event writes its acknowledgment
/// line to `output`. Returns the number of lines that were not delivered,
/// counting both unparseable lines and failed publishes.
#[instrument(skip_all)]
pub async fn forward_events<R, W>(
    translator: &EventTranslator,
    input: R,
    output: &mut W,
) -> anyhow::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut failed = 0;

    while let Some(line) = lines.next_line().await.context("failed to read event")? {
        if line.trim().is_empty() {
            continue;
        }

        let event = match serde_json::from_str::<RawEvent>(&line) {
            Ok(event) => event,
            Err(e) => {
                error!("error while trying to parse the event: {e}");
                failed += 1;
                continue;
            }
        };

        match translator.process(&event).await {
            Ok(response) => {
                output
                    .write_all(format!("{}\n", response.message).as_bytes())
                    .await
                    .context("failed to write acknowledgment")?;
                trace!("handler status {}", response.status);
            }
            Err(e) => {
                error!(
                    "{}/{}: event not delivered: {e}",
                    event.client.name, event.check.name
                );
                failed += 1;
            }
        }
    }

    output.flush().await?;
    Ok(failed)
}
