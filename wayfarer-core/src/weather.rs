//! Ground weather conditions reported by a [`WeatherProvider`](crate::WeatherProvider).

use serde::{Deserialize, Serialize};

/// Weather at a location and time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    /// No precipitation.
    #[default]
    Clear,
    /// Rain.
    Rain,
    /// Snow or ice.
    Snow,
    /// Storm-force wind or heavy precipitation.
    Storm,
}

impl WeatherCondition {
    /// Return the condition as a lowercase `&str`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Storm => "storm",
        }
    }
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WeatherCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "clear" => Ok(Self::Clear),
            "rain" => Ok(Self::Rain),
            "snow" => Ok(Self::Snow),
            "storm" => Ok(Self::Storm),
            _ => Err(format!("unknown weather condition '{s}'")),
        }
    }
}
