// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::agent::{AgentDraft, AgentId, AgentRecord, AgentStatus};
use crate::domain::repository::{AgentRepository, RepositoryError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Attempts at drawing a fresh id before giving up on a conflicting store
const MAX_ID_ATTEMPTS: usize = 8;

/// Keyed store of agent records
#[derive(Clone)]
pub struct AgentRegistry {
    repository: Arc<dyn AgentRepository>,
}

impl AgentRegistry {
    pub fn new(repository: Arc<dyn AgentRepository>) -> Self {
        Self { repository }
    }

    /// Store a draft under a fresh id, active and timestamped now.
    pub async fn save_agent(&self, draft: AgentDraft) -> Result<AgentId, RepositoryError> {
        let mut last_conflict = None;

        for _ in 0..MAX_ID_ATTEMPTS {
            let id = AgentId::generate();
            let record = AgentRecord::from_draft(id.clone(), draft.clone());

            match self.repository.insert(record).await {
                Ok(()) => {
                    info!("Saved agent {} ({})", id, draft.name);
                    return Ok(id);
                }
                Err(RepositoryError::Conflict(existing)) => {
                    warn!("Agent id collision on {}, regenerating", existing);
                    last_conflict = Some(RepositoryError::Conflict(existing));
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_conflict.unwrap_or_else(|| RepositoryError::Storage("No agent id available".into())))
    }

    pub async fn get_agent(&self, id: &AgentId) -> Result<Option<AgentRecord>, RepositoryError> {
        self.repository.find_by_id(id).await
    }

    /// All records in insertion order
    pub async fn get_all_agents(&self) -> Result<Vec<AgentRecord>, RepositoryError> {
        self.repository.list_all().await
    }

    pub async fn delete_agent(&self, id: &AgentId) -> Result<bool, RepositoryError> {
        let removed = self.repository.delete(id).await?;
        debug!("Delete agent {}: removed={}", id, removed);
        Ok(removed)
    }

    pub async fn update_agent_status(
        &self,
        id: &AgentId,
        status: AgentStatus,
    ) -> Result<bool, RepositoryError> {
        let updated = self.repository.update_status(id, status).await?;
        if updated {
            info!("Agent {} is now {}", id, status);
        }
        Ok(updated)
    }
}
