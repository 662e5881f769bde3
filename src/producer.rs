//! NATS message producer for score results

use crate::types::score::ScoreResult;
use anyhow::Result;
use async_nats::Client;
use tracing::debug;

/// Producer for publishing score results to NATS
#[derive(Clone)]
pub struct ScoreResultProducer {
    client: Client,
    subject: String,
}

impl ScoreResultProducer {
    /// Create a new result producer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish a score result to the configured result subject
    pub async fn publish(&self, result: &ScoreResult) -> Result<()> {
        self.publish_to(self.subject.clone(), result).await
    }

    /// Publish a score result to a specific subject. Used for
    /// request/reply scoring when the inbound message carries a reply
    /// subject.
    pub async fn publish_to(
        &self,
        subject: impl async_nats::subject::ToSubject,
        result: &ScoreResult,
    ) -> Result<()> {
        let payload = serde_json::to_vec(result)?;

        self.client.publish(subject, payload.into()).await?;

        debug!(
            user_id = %result.user_id,
            score = result.score,
            action = ?result.recommended_action,
            "Published score result"
        );

        Ok(())
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would require a running NATS server
}
