// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0
//! AgentForge Core
//!
//! In-memory agent registry paired with an executor that builds and caches
//! LLM-backed agent handles, plus the provider adapters, tool catalog and
//! HTTP routes around them.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Domain types, application services, adapters and the API router

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::{AgentService, ServiceError};
pub use domain::node_config::NodeConfig;
