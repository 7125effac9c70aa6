// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0

// LLM Provider Infrastructure - Anti-Corruption Layer Implementations
//
// Each provider adapter translates between the domain chat interface and an
// external API.

pub mod ollama;
pub mod openai;
pub mod registry;

pub use registry::ProviderRegistry;
