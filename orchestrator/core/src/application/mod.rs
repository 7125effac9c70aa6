// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0

pub mod agent_service;
pub mod executor;
pub mod registry;
pub mod validation;

// Re-export use cases for convenience
pub use agent_service::{AgentService, CreatedAgent, ServiceError};
pub use executor::{AgentExecutor, ExecutorError};
pub use registry::AgentRegistry;
pub use validation::{CreateAgentRequest, ValidationIssue};
