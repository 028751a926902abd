use crate::core::{Dispatcher, EmailMessage, Storage};
use crate::utils::error::{ReportError, Result};
use async_trait::async_trait;
use chrono::Local;
use std::sync::atomic::{AtomicU64, Ordering};

pub const ENVELOPE_FILENAME: &str = "message.json";

/// Drops each message into storage for the mail relay to pick up: one
/// directory per message holding the attachments and a JSON envelope.
pub struct OutboxDispatcher<S: Storage> {
    storage: S,
    sequence: AtomicU64,
}

impl<S: Storage> OutboxDispatcher<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            sequence: AtomicU64::new(0),
        }
    }

    /// 時間戳加上遞增序號，同一毫秒內的訊息也不會互相覆蓋
    fn message_dir(&self) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{}-{:04}", Local::now().format("%Y%m%dT%H%M%S%.3f"), sequence)
    }
}

#[async_trait]
impl<S: Storage> Dispatcher for OutboxDispatcher<S> {
    async fn send(&self, message: EmailMessage) -> Result<String> {
        if message.filenames.len() != message.attachments.len() {
            return Err(ReportError::DeliveryError {
                message: format!(
                    "{} filenames for {} attachments",
                    message.filenames.len(),
                    message.attachments.len()
                ),
            });
        }
        if message.to.is_empty() {
            return Err(ReportError::DeliveryError {
                message: "no recipients".to_string(),
            });
        }

        let dir = self.message_dir();
        for (filename, data) in message.filenames.iter().zip(&message.attachments) {
            tracing::debug!("Writing attachment {} ({} bytes)", filename, data.len());
            self.storage
                .write_file(&format!("{}/{}", dir, filename), data)
                .await?;
        }

        let envelope = serde_json::to_vec_pretty(&message)?;
        self.storage
            .write_file(&format!("{}/{}", dir, ENVELOPE_FILENAME), &envelope)
            .await?;

        tracing::info!(
            "✉️ Queued '{}' for {} recipient(s)",
            message.subject,
            message.to.len()
        );
        Ok(dir)
    }
}
