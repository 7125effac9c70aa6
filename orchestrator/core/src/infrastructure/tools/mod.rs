// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0
//! Tool Catalog
//!
//! Fixed set of tools an agent record may name. Ids the catalog does not know
//! are handed back to the caller instead of failing resolution.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Resolve record tool ids to `Tool` implementations

pub mod weather;

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::tool::Tool;

pub use weather::{WeatherTool, WEATHER_TOOL_ID};

pub struct ToolCatalog {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolCatalog {
    /// Catalog with no tools
    pub fn empty() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Catalog with every built-in tool
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        catalog.register(Arc::new(WeatherTool));
        catalog
    }

    /// Add or replace a tool under its own id
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.id().to_string(), tool);
    }

    /// Known tool ids, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Split `ids` into resolved tools (request order) and unknown ids
    pub fn resolve(&self, ids: &[String]) -> (Vec<Arc<dyn Tool>>, Vec<String>) {
        let mut resolved = Vec::with_capacity(ids.len());
        let mut dropped = Vec::new();
        for id in ids {
            match self.tools.get(id) {
                Some(tool) => resolved.push(tool.clone()),
                None => dropped.push(id.clone()),
            }
        }
        (resolved, dropped)
    }
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
