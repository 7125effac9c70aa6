// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the AgentForge CLI

pub mod agent;
pub mod config;
pub mod health;
pub mod serve;

pub use self::agent::AgentCommand;
pub use self::config::ConfigCommand;
pub use self::serve::ServeArgs;
