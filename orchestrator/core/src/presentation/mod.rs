// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`agentforge-core`)
//!
//! HTTP surface that translates external requests into application service
//! calls. No business logic lives here; all real work is delegated to
//! [`crate::application::agent_service::AgentService`].
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP (Axum) | Agent create / list / get / delete / status / execute, health |

pub mod api;
