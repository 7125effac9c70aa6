// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0

pub mod agent_code_generator;
pub mod llm;
pub mod repositories;
pub mod tools;

pub use agent_code_generator::{AgentCodeGenerator, AgentCodeSpec};
pub use repositories::InMemoryAgentRepository;
pub use tools::ToolCatalog;
