//! Background loops draining the two inbound sources.
//!
//! Each loop owns its input: the inbound worker its channel receiver, the
//! result worker its queue polling. Both share only the orchestrator and run
//! until cancelled.

use std::{sync::Arc, time::Duration};

use {
    pixbot_common::InboundMessage,
    tokio::sync::mpsc,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use crate::{orchestrator::Orchestrator, ports::WorkQueue, prediction::ResultEnvelope};

/// Buffer size of the inbound message channel.
pub const INBOUND_CAPACITY: usize = 256;

pub fn inbound_channel() -> (mpsc::Sender<InboundMessage>, mpsc::Receiver<InboundMessage>) {
    mpsc::channel(INBOUND_CAPACITY)
}

/// Handle inbound messages one at a time until the channel closes or the
/// token is cancelled.
pub async fn run_inbound_worker(
    orchestrator: Arc<Orchestrator>,
    mut rx: mpsc::Receiver<InboundMessage>,
    cancel: CancellationToken,
) {
    info!("inbound worker started");
    loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => break,
            msg = rx.recv() => match msg {
                Some(msg) => msg,
                None => {
                    debug!("inbound channel closed");
                    break;
                },
            },
        };
        orchestrator.handle_message(msg).await;
    }
    info!("inbound worker stopped");
}

/// Poll the result queue, handle each envelope, then acknowledge it.
///
/// Malformed bodies are logged and acknowledged so they are not redelivered.
pub async fn run_result_worker(
    orchestrator: Arc<Orchestrator>,
    queue: Arc<dyn WorkQueue>,
    queue_name: String,
    wait: Duration,
    cancel: CancellationToken,
) {
    info!(queue = %queue_name, "result worker started");
    loop {
        let received = tokio::select! {
            _ = cancel.cancelled() => break,
            received = queue.receive(&queue_name, wait) => received,
        };
        let message = match received {
            Ok(Some(message)) => message,
            Ok(None) => continue,
            Err(e) => {
                warn!(queue = %queue_name, error = %e, "result queue poll failed");
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(wait) => continue,
                }
            },
        };

        match serde_json::from_str::<ResultEnvelope>(&message.body) {
            Ok(envelope) => orchestrator.handle_result(envelope).await,
            Err(e) => warn!(queue = %queue_name, error = %e, "discarding malformed result message"),
        }

        if let Err(e) = queue.ack(&queue_name, &message.receipt).await {
            warn!(queue = %queue_name, error = %e, "failed to acknowledge result message");
        }
    }
    info!(queue = %queue_name, "result worker stopped");
}
