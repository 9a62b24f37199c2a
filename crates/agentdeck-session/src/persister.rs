use agentdeck_client::ConversationStore;
use agentdeck_types::ConversationPayload;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

enum PersistCommand {
    Save(ConversationPayload),
    Flush(oneshot::Sender<()>),
}

/// Background saver: snapshots are written one at a time in the order they
/// were queued, and failures are only logged.
pub(crate) struct Persister {
    tx: mpsc::UnboundedSender<PersistCommand>,
}

impl Persister {
    /// Spawn the worker on the current tokio runtime. It stops once the
    /// persister is dropped and the queue is drained.
    pub(crate) fn spawn(store: Arc<dyn ConversationStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    PersistCommand::Save(payload) => {
                        match store.save_conversation(&payload).await {
                            Ok(()) => tracing::debug!(
                                conversation_id = %payload.conversation_id,
                                messages = payload.messages.len(),
                                "Conversation saved"
                            ),
                            Err(e) => tracing::warn!(
                                conversation_id = %payload.conversation_id,
                                "Failed to save conversation: {:#}",
                                e
                            ),
                        }
                    }
                    PersistCommand::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
        });

        Self { tx }
    }

    pub(crate) fn save(&self, payload: ConversationPayload) {
        if self.tx.send(PersistCommand::Save(payload)).is_err() {
            tracing::warn!("Persistence worker stopped, dropping conversation save");
        }
    }

    /// Wait until every save queued before this call has been attempted
    pub(crate) async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(PersistCommand::Flush(done_tx)).is_ok() {
            let _ = done_rx.await;
        }
    }
}
