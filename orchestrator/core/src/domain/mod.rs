// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Agent records, handles, tools and the provider port.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Types and ports shared by the application and infrastructure layers

pub mod agent;
pub mod handle;
pub mod llm;
pub mod node_config;
pub mod repository;
pub mod tool;
