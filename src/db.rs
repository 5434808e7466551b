use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{ActivityRecord, ActivityStatus};

pub async fn fetch_activities(
    pool: &PgPool,
    student_id: Option<&str>,
) -> anyhow::Result<Vec<ActivityRecord>> {
    let mut query = String::from(
        "SELECT a.id, a.student_id, a.student_name, a.roll_number, a.title, \
         a.activity_type, a.status, a.activity_date, a.description, \
         a.submitted_at, a.reviewed_at, a.reviewed_by \
         FROM student_hub.activities a",
    );

    if student_id.is_some() {
        query.push_str(" WHERE a.student_id = $1");
    }
    query.push_str(" ORDER BY a.submitted_at DESC");

    let mut rows = sqlx::query(&query);
    if let Some(value) = student_id {
        rows = rows.bind(value);
    }

    let records = rows
        .fetch_all(pool)
        .await
        .context("failed to query student_hub.activities")?;
    let activities = records
        .iter()
        .map(activity_from_row)
        .collect::<Result<Vec<_>, _>>()
        .context("failed to decode activity row")?;

    tracing::info!(count = activities.len(), "fetched activities from Postgres");
    Ok(activities)
}

/// Decodes one `student_hub.activities` row. Name and roll number may be
/// NULL and decode as empty strings.
fn activity_from_row(row: &PgRow) -> Result<ActivityRecord, sqlx::Error> {
    let status: String = row.try_get("status")?;

    Ok(ActivityRecord {
        id: Some(row.try_get("id")?),
        student_id: row.try_get("student_id")?,
        student_name: row
            .try_get::<Option<String>, _>("student_name")?
            .unwrap_or_default(),
        roll_number: row
            .try_get::<Option<String>, _>("roll_number")?
            .unwrap_or_default(),
        title: row.try_get("title")?,
        activity_type: row.try_get("activity_type")?,
        status: ActivityStatus::from(status),
        date: row.try_get::<Option<NaiveDate>, _>("activity_date")?,
        description: row.try_get("description")?,
        submitted_at: row.try_get::<DateTime<Utc>, _>("submitted_at")?,
        reviewed_at: row.try_get::<Option<DateTime<Utc>>, _>("reviewed_at")?,
        reviewed_by: row.try_get("reviewed_by")?,
    })
}

/// Reads activity records from a CSV export. Rows without an id are given
/// an `import-<uuid>` id so they stay distinguishable in later exports.
pub fn load_csv(csv_path: &Path) -> anyhow::Result<Vec<ActivityRecord>> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut activities = Vec::new();

    for (index, result) in reader.deserialize::<ActivityRecord>().enumerate() {
        let mut activity =
            result.with_context(|| format!("invalid activity on row {}", index + 2))?;

        if activity.id.as_deref().map_or(true, str::is_empty) {
            activity.id = Some(format!("import-{}", Uuid::new_v4()));
        }
        if let ActivityStatus::Other(status) = &activity.status {
            tracing::warn!(row = index + 2, %status, "unrecognised activity status");
        }

        activities.push(activity);
    }

    tracing::info!(
        count = activities.len(),
        path = %csv_path.display(),
        "loaded activities from CSV"
    );
    Ok(activities)
}

/// Keeps only one student's activities.
pub fn retain_student(activities: &mut Vec<ActivityRecord>, student_id: Option<&str>) {
    if let Some(student_id) = student_id {
        activities.retain(|activity| activity.student_id == student_id);
    }
}
