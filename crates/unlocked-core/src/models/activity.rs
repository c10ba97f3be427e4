// ABOUTME: Learner activity records and per-day activity aggregates
// ABOUTME: Activities carry cumulative time and the delta since the previous record
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ModelParseError;

/// Kind of activity event reported by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    /// Work started or in progress
    Start,
    /// Work completed
    Complete,
}

impl ActivityType {
    /// Database/string representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = ModelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "complete" => Ok(Self::Complete),
            _ => Err(ModelParseError::new("activity type", s)),
        }
    }
}

/// A single activity record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Primary key
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Program the activity belongs to
    pub program_id: i64,
    /// Event kind
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    /// Cumulative time in seconds reported by the provider
    pub total_time: i64,
    /// Seconds added since the previous record for the same user and program
    pub time_delta: i64,
    /// Provider-side identifier
    pub external_id: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Activity grouped by calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyActivity {
    /// Calendar day (UTC)
    pub date: NaiveDate,
    /// Sum of `time_delta` across the day's activities
    pub total_time: i64,
    /// 1..=4 relative to the busiest day in the window, 0 when no time was logged
    pub quartile: u8,
    /// The day's activities in creation order
    pub activities: Vec<Activity>,
}
