// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contract for the `AgentRecord` aggregate, defined in the domain
//! layer and implemented in `crate::infrastructure::repositories`.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `AgentRepository` | `AgentRecord` | `InMemoryAgentRepository` |
//!
//! Storage is process-lifetime memory; nothing survives a restart.

use async_trait::async_trait;
use crate::domain::agent::{AgentId, AgentRecord, AgentStatus};

/// Repository interface for agent records
#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Insert a new record. Fails with `Conflict` if the id is taken.
    async fn insert(&self, record: AgentRecord) -> Result<(), RepositoryError>;

    /// Find record by id
    async fn find_by_id(&self, id: &AgentId) -> Result<Option<AgentRecord>, RepositoryError>;

    /// List all records in insertion order
    async fn list_all(&self) -> Result<Vec<AgentRecord>, RepositoryError>;

    /// Remove a record, returning whether it existed
    async fn delete(&self, id: &AgentId) -> Result<bool, RepositoryError>;

    /// Set the status of a record in place, returning whether it existed
    async fn update_status(&self, id: &AgentId, status: AgentStatus) -> Result<bool, RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity already exists: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),
}
