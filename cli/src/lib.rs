// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0
//! AgentForge CLI library - exposes testable components
//!
//! # Architecture
//!
//! - **Layer:** Interface / Presentation Layer
//! - **Purpose:** HTTP client and command handlers behind the `agentforge` binary

pub mod client;
pub mod commands;
