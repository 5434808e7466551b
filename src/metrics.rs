use std::collections::{BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate};

use crate::models::{
    ActivityMetrics, ActivityRecord, ActivityStatus, ActivityTypeSummary, MonthlyActivity,
    StatusShare,
};

/// Number of calendar months covered by `monthly_activity`, current month included.
pub const MONTHLY_WINDOW: i32 = 6;

/// Review-queue filter. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub status: Option<ActivityStatus>,
    pub activity_type: Option<String>,
    pub from: Option<NaiveDate>,
    /// Inclusive of the whole day.
    pub to: Option<NaiveDate>,
}

impl ActivityFilter {
    pub fn matches(&self, activity: &ActivityRecord) -> bool {
        if let Some(status) = &self.status {
            if &activity.status != status {
                return false;
            }
        }

        if let Some(activity_type) = &self.activity_type {
            if &activity.activity_type != activity_type {
                return false;
            }
        }

        let submitted_on = activity.submitted_at.date_naive();
        if self.from.is_some_and(|from| submitted_on < from) {
            return false;
        }
        if self.to.is_some_and(|to| submitted_on > to) {
            return false;
        }

        true
    }

    pub fn apply<'a>(&self, activities: &'a [ActivityRecord]) -> Vec<&'a ActivityRecord> {
        activities
            .iter()
            .filter(|activity| self.matches(activity))
            .collect()
    }
}

pub fn compute_activity_metrics<'a, I>(activities: I) -> ActivityMetrics
where
    I: IntoIterator<Item = &'a ActivityRecord>,
{
    let mut metrics = ActivityMetrics::default();

    for activity in activities {
        metrics.total += 1;
        match activity.status {
            ActivityStatus::Approved => metrics.approved += 1,
            ActivityStatus::Pending => metrics.pending += 1,
            ActivityStatus::Rejected => metrics.rejected += 1,
            ActivityStatus::Other(_) => {}
        }
    }

    metrics
}

pub fn summarize_by_type<'a, I>(activities: I) -> Vec<ActivityTypeSummary>
where
    I: IntoIterator<Item = &'a ActivityRecord>,
{
    let mut map: HashMap<String, (usize, usize)> = HashMap::new();

    for activity in activities {
        let entry = map.entry(activity.activity_type.clone()).or_insert((0, 0));
        entry.0 += 1;
        if activity.status == ActivityStatus::Approved {
            entry.1 += 1;
        }
    }

    let mut summaries: Vec<ActivityTypeSummary> = map
        .into_iter()
        .map(|(activity_type, (count, approved))| ActivityTypeSummary {
            activity_type,
            count,
            approved,
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.activity_type.cmp(&b.activity_type))
    });
    summaries
}

/// Approved, pending and rejected shares of all submissions. Empty when there
/// are no submissions.
pub fn status_distribution<'a, I>(activities: I) -> Vec<StatusShare>
where
    I: IntoIterator<Item = &'a ActivityRecord>,
{
    let counts = compute_activity_metrics(activities);
    let total = counts.total;
    if total == 0 {
        return Vec::new();
    }

    [
        (ActivityStatus::Approved, counts.approved),
        (ActivityStatus::Pending, counts.pending),
        (ActivityStatus::Rejected, counts.rejected),
    ]
    .into_iter()
    .map(|(status, count)| StatusShare {
        status,
        count,
        percent: (count as f64 / total as f64 * 100.0).round() as u32,
    })
    .collect()
}

/// Submissions and approvals per calendar month for the window ending with
/// the month of `today`, oldest first. Months without activity are zero.
pub fn monthly_activity<'a, I>(activities: I, today: NaiveDate) -> Vec<MonthlyActivity>
where
    I: IntoIterator<Item = &'a ActivityRecord>,
{
    let current = month_index(today.year(), today.month());
    let first = current - (MONTHLY_WINDOW - 1);
    let mut counts: HashMap<i32, (usize, usize)> = HashMap::new();

    for activity in activities {
        let submitted = activity.submitted_at.date_naive();
        let index = month_index(submitted.year(), submitted.month());
        if index < first || index > current {
            continue;
        }

        let entry = counts.entry(index).or_insert((0, 0));
        entry.0 += 1;
        if activity.status == ActivityStatus::Approved {
            entry.1 += 1;
        }
    }

    (first..=current)
        .map(|index| {
            let year = index.div_euclid(12);
            let month = index.rem_euclid(12) as u32 + 1;
            let (submissions, approvals) = counts.get(&index).copied().unwrap_or((0, 0));
            MonthlyActivity {
                year,
                month,
                label: NaiveDate::from_ymd_opt(year, month, 1)
                    .map(|date| date.format("%b").to_string())
                    .unwrap_or_default(),
                submissions,
                approvals,
            }
        })
        .collect()
}

fn month_index(year: i32, month: u32) -> i32 {
    year * 12 + month as i32 - 1
}

pub fn distinct_types(activities: &[ActivityRecord]) -> Vec<String> {
    activities
        .iter()
        .map(|activity| activity.activity_type.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
