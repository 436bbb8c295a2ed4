//! Validate/block workflow for staff.
//!
//! Order per action: role guard, confirmation, backend call, then a reload of
//! the pending queue. Nothing is updated optimistically. When the backend
//! accepted the action but the reload fails, the last queue this client saw
//! is returned without the moderated item and flagged as degraded.

use crate::session::Session;
use crate::Outcome;
use sb_client::{Degradable, ForumClient, PendingContent, ReadPolicy};
use sb_core::{ForumError, ModerationAction, ModerationTarget, Prompt, Result};
use std::sync::Arc;
use tracing::{info, warn};

pub struct ModerationWorkflow {
    client: Arc<ForumClient>,
    prompt: Arc<dyn Prompt>,
}

impl ModerationWorkflow {
    pub fn new(client: Arc<ForumClient>, prompt: Arc<dyn Prompt>) -> Self {
        Self { client, prompt }
    }

    pub async fn validate(
        &self,
        session: &Session,
        target: ModerationTarget,
    ) -> Result<Outcome<Degradable<PendingContent>>> {
        self.apply(session, ModerationAction::Validate, target).await
    }

    pub async fn block(
        &self,
        session: &Session,
        target: ModerationTarget,
    ) -> Result<Outcome<Degradable<PendingContent>>> {
        self.apply(session, ModerationAction::Block, target).await
    }

    pub async fn load_pending(&self, session: &Session) -> Result<PendingContent> {
        guard(session)?;
        self.client.pending_content(session.requester()).await
    }

    pub async fn apply(
        &self,
        session: &Session,
        action: ModerationAction,
        target: ModerationTarget,
    ) -> Result<Outcome<Degradable<PendingContent>>> {
        guard(session)?;

        let question = format!(
            "Are you sure you want to {} this {}?",
            action.verb(),
            target.kind()
        );
        if !self.prompt.confirm(&question) {
            info!(%target, action = action.verb(), "moderation cancelled");
            return Ok(Outcome::Cancelled);
        }

        if let Err(err) = self
            .client
            .moderate(action, target, session.requester())
            .await
        {
            warn!(%target, action = action.verb(), error = %err, "moderation failed");
            self.prompt.alert(&err.user_message());
            return Err(err);
        }

        let mut pending = self
            .client
            .pending_content_with(session.requester(), ReadPolicy::CacheOrEmpty)
            .await?;
        if pending.is_degraded() {
            warn!(%target, action = action.verb(), source = ?pending.source, "queue refresh failed after moderation");
            self.prompt.alert(&format!(
                "The {} was {}, but the pending list could not be refreshed.",
                target.kind(),
                action.past_tense()
            ));
            pending.data = pending.data.without(target);
        }
        Ok(Outcome::Done(pending))
    }
}

fn guard(session: &Session) -> Result<()> {
    if session.is_staff() {
        Ok(())
    } else {
        Err(ForumError::Authorization(
            "only teachers or admins can moderate content".into(),
        ))
    }
}
