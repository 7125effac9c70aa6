// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the repository abstractions defined in
//! the domain layer.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Hold agent records for the lifetime of the process
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! - **InMemoryAgentRepository** - `RwLock`-guarded map that remembers
//!   insertion order so listings are deterministic

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::agent::{AgentId, AgentRecord, AgentStatus};
use crate::domain::repository::{AgentRepository, RepositoryError};

#[derive(Default)]
struct AgentTable {
    records: HashMap<AgentId, AgentRecord>,
    order: Vec<AgentId>,
}

#[derive(Clone, Default)]
pub struct InMemoryAgentRepository {
    table: Arc<RwLock<AgentTable>>,
}

impl InMemoryAgentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AgentRepository for InMemoryAgentRepository {
    async fn insert(&self, record: AgentRecord) -> Result<(), RepositoryError> {
        let mut table = self.table.write();
        if table.records.contains_key(&record.id) {
            return Err(RepositoryError::Conflict(record.id.to_string()));
        }
        table.order.push(record.id.clone());
        table.records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn find_by_id(&self, id: &AgentId) -> Result<Option<AgentRecord>, RepositoryError> {
        Ok(self.table.read().records.get(id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<AgentRecord>, RepositoryError> {
        let table = self.table.read();
        Ok(table
            .order
            .iter()
            .filter_map(|id| table.records.get(id).cloned())
            .collect())
    }

    async fn delete(&self, id: &AgentId) -> Result<bool, RepositoryError> {
        let mut table = self.table.write();
        if table.records.remove(id).is_none() {
            return Ok(false);
        }
        table.order.retain(|existing| existing != id);
        Ok(true)
    }

    async fn update_status(&self, id: &AgentId, status: AgentStatus) -> Result<bool, RepositoryError> {
        let mut table = self.table.write();
        match table.records.get_mut(id) {
            Some(record) => {
                record.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
