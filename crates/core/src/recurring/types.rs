//! Recurring schedule types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How often a schedule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    /// Every `interval` days.
    Daily,
    /// Every `7 * interval` days.
    Weekly,
    /// Every `14 * interval` days.
    Biweekly,
    /// Every `interval` calendar months.
    Monthly,
    /// Every `3 * interval` calendar months.
    Quarterly,
}

impl Frequency {
    /// Returns the string representation of the frequency.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Biweekly => "BIWEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Quarterly => "QUARTERLY",
        }
    }

    /// Parses a frequency from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DAILY" => Some(Self::Daily),
            "WEEKLY" => Some(Self::Weekly),
            "BIWEEKLY" => Some(Self::Biweekly),
            "MONTHLY" => Some(Self::Monthly),
            "QUARTERLY" => Some(Self::Quarterly),
            _ => None,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn default_interval() -> u32 {
    1
}

/// Input for attaching a schedule to a template request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleParams {
    /// Frequency.
    pub frequency: Frequency,
    /// Multiplier, at least 1.
    #[serde(default = "default_interval")]
    pub interval: u32,
    /// 0 = Sunday .. 6 = Saturday. Stored, not used for advancement.
    #[serde(default)]
    pub day_of_week: Option<u32>,
    /// 1..=31. Stored, not used for advancement.
    #[serde(default)]
    pub day_of_month: Option<u32>,
    /// First run.
    pub start_date: DateTime<Utc>,
    /// Last date a run may happen.
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
}

/// Partial update of a schedule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulePatch {
    /// New frequency.
    pub frequency: Option<Frequency>,
    /// New interval.
    pub interval: Option<u32>,
    /// New day-of-week anchor.
    pub day_of_week: Option<u32>,
    /// New day-of-month anchor.
    pub day_of_month: Option<u32>,
    /// New end date.
    pub end_date: Option<DateTime<Utc>>,
}
