use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    Candles,
    Flowers,
}

impl Counter {
    pub const ALL: [Counter; 2] = [Counter::Candles, Counter::Flowers];

    /// Local storage key the counter is mirrored under.
    pub fn key(self) -> &'static str {
        match self {
            Counter::Candles => "yzn_candles",
            Counter::Flowers => "yzn_flowers",
        }
    }

    pub fn default_count(self) -> u64 {
        match self {
            Counter::Candles => 50,
            Counter::Flowers => 20,
        }
    }

    /// Column name in the remote tribute table.
    pub fn column(self) -> &'static str {
        match self {
            Counter::Candles => "candles",
            Counter::Flowers => "flowers",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|counter| counter.key() == key)
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Counter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "candle" | "candles" => Ok(Counter::Candles),
            "flower" | "flowers" => Ok(Counter::Flowers),
            other => Err(format!("unknown tribute kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalCounters {
    pub candles: u64,
    pub flowers: u64,
}

impl Default for LocalCounters {
    fn default() -> Self {
        Self {
            candles: Counter::Candles.default_count(),
            flowers: Counter::Flowers.default_count(),
        }
    }
}

impl LocalCounters {
    pub fn get(&self, counter: Counter) -> u64 {
        match counter {
            Counter::Candles => self.candles,
            Counter::Flowers => self.flowers,
        }
    }

    pub fn slot(&mut self, counter: Counter) -> &mut u64 {
        match counter {
            Counter::Candles => &mut self.candles,
            Counter::Flowers => &mut self.flowers,
        }
    }
}

/// The single live row of the remote tribute table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TributeRecord {
    pub id: Uuid,
    pub candles: u64,
    pub flowers: u64,
    pub updated_at: DateTime<Utc>,
}

impl TributeRecord {
    pub fn get(&self, counter: Counter) -> u64 {
        match counter {
            Counter::Candles => self.candles,
            Counter::Flowers => self.flowers,
        }
    }
}

/// Partial update of the tribute row. Absent fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TributeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candles: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flowers: Option<u64>,
}

impl TributeUpdate {
    pub fn set(counter: Counter, value: u64) -> Self {
        let mut update = Self::default();
        match counter {
            Counter::Candles => update.candles = Some(value),
            Counter::Flowers => update.flowers = Some(value),
        }
        update
    }

    pub fn apply(&self, record: &mut TributeRecord) {
        if let Some(candles) = self.candles {
            record.candles = candles;
        }
        if let Some(flowers) = self.flowers {
            record.flowers = flowers;
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TributeRequest {
    pub kind: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TributeCountsResponse {
    pub candles: u64,
    pub flowers: u64,
}

impl From<LocalCounters> for TributeCountsResponse {
    fn from(counters: LocalCounters) -> Self {
        Self {
            candles: counters.candles,
            flowers: counters.flowers,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Zh,
    En,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub lang: Option<Language>,
    pub theme: Option<Theme>,
}
