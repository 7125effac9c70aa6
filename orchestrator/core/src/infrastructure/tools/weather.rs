// Copyright (c) 2026 AgentForge Contributors
// SPDX-License-Identifier: AGPL-3.0

// Weather tool. Returns generated readings rather than calling a live weather API.

use crate::domain::tool::{Tool, ToolError};
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const WEATHER_TOOL_ID: &str = "get_weather";

const CONDITIONS: [&str; 4] = ["Sunny", "Cloudy", "Rainy", "Snowy"];

#[derive(Debug, Deserialize)]
struct WeatherArgs {
    location: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub location: String,
    /// Degrees Celsius, 5..=34
    pub temperature: u32,
    pub condition: String,
    /// Percent, 0..=99
    pub humidity: u32,
    pub wind_speed: u32,
    pub message: String,
}

impl WeatherReport {
    fn sample(location: String) -> Self {
        let mut rng = rand::rng();
        let temperature = rng.random_range(5..35);
        let condition = CONDITIONS[rng.random_range(0..CONDITIONS.len())].to_string();
        let humidity = rng.random_range(0..100);
        let wind_speed = rng.random_range(0..20);

        Self {
            message: format!(
                "Current weather in {}: {}°C, {}",
                location, temperature, condition
            ),
            location,
            temperature,
            condition,
            humidity,
            wind_speed,
        }
    }
}

#[derive(Debug, Default)]
pub struct WeatherTool;

#[async_trait]
impl Tool for WeatherTool {
    fn id(&self) -> &str {
        WEATHER_TOOL_ID
    }

    fn description(&self) -> &str {
        "Get current weather information for a location"
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The city name to get weather for"
                }
            },
            "required": ["location"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: WeatherArgs =
            serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
                tool: WEATHER_TOOL_ID.to_string(),
                message: e.to_string(),
            })?;

        let report = WeatherReport::sample(args.location);
        serde_json::to_value(report).map_err(|e| ToolError::Failed {
            tool: WEATHER_TOOL_ID.to_string(),
            message: format!("Failed to get weather data: {}", e),
        })
    }
}
