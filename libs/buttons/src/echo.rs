use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::transport::{Envelope, LocalEcho};

struct EchoJob {
    echo: Arc<dyn LocalEcho>,
    envelope: Envelope,
}

/// Background queue that replays sent messages into the local event stream.
///
/// Jobs run one at a time in enqueue order, each holding the transport's event lock.
#[derive(Clone)]
pub struct EchoQueue {
    sender: mpsc::UnboundedSender<EchoJob>,
}

impl EchoQueue {
    /// Starts the worker task. Must be called from within a tokio runtime.
    pub fn spawn() -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<EchoJob>();
        tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                let message_id = job.envelope.key.id.clone();
                let lock = job.echo.event_lock();
                let _guard = lock.lock().await;
                match job.echo.echo_locally(job.envelope).await {
                    Ok(()) => debug!(target: "gsm.buttons.echo", %message_id, "echoed"),
                    Err(err) => {
                        warn!(target: "gsm.buttons.echo", %message_id, error = %err, "local echo failed")
                    }
                }
            }
        });
        Self { sender }
    }

    /// Returns `false` when the worker has stopped.
    pub fn enqueue(&self, echo: Arc<dyn LocalEcho>, envelope: Envelope) -> bool {
        self.sender.send(EchoJob { echo, envelope }).is_ok()
    }
}

impl std::fmt::Debug for EchoQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EchoQueue")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}
