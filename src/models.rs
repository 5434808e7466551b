use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Review state of a submitted activity.
///
/// Anything other than the three known states is kept verbatim in `Other`
/// so it can be passed through to exports unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityStatus {
    Approved,
    Pending,
    Rejected,
    Other(String),
}

impl ActivityStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ActivityStatus::Approved => "approved",
            ActivityStatus::Pending => "pending",
            ActivityStatus::Rejected => "rejected",
            ActivityStatus::Other(value) => value,
        }
    }
}

impl From<String> for ActivityStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "approved" => ActivityStatus::Approved,
            "pending" => ActivityStatus::Pending,
            "rejected" => ActivityStatus::Rejected,
            _ => ActivityStatus::Other(value),
        }
    }
}

impl From<&str> for ActivityStatus {
    fn from(value: &str) -> Self {
        ActivityStatus::from(value.to_string())
    }
}

impl From<ActivityStatus> for String {
    fn from(value: ActivityStatus) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub student_id: String,
    pub student_name: String,
    #[serde(default)]
    pub roll_number: String,
    pub title: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub status: ActivityStatus,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reviewed_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub threshold: u32,
    pub title: String,
    pub badge: String,
    pub color: String,
}

/// Derived points summary for a set of activities. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointsBreakdown {
    pub total_points: u32,
    pub approved_count: usize,
    pub pending_count: usize,
    pub rejected_count: usize,
    pub points_by_type: BTreeMap<String, u32>,
    pub current_milestone: Option<Milestone>,
    pub next_milestone: Option<Milestone>,
    pub progress_to_next: f64,
}

impl PointsBreakdown {
    /// True once the highest milestone has been reached.
    pub fn is_maxed_out(&self) -> bool {
        matches!(
            (&self.current_milestone, &self.next_milestone),
            (Some(current), Some(next)) if current == next
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivityMetrics {
    pub total: usize,
    pub approved: usize,
    pub pending: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityTypeSummary {
    pub activity_type: String,
    pub count: usize,
    pub approved: usize,
}

/// Share of all submissions in one review status, rounded to a whole percent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusShare {
    pub status: ActivityStatus,
    pub count: usize,
    pub percent: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyActivity {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub submissions: usize,
    pub approvals: usize,
}

#[derive(Debug, Clone)]
pub struct StudentStanding {
    pub student_id: String,
    pub student_name: String,
    pub total_points: u32,
    pub approved_count: usize,
    pub badge: Option<String>,
}
