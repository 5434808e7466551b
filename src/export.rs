use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::ActivityRecord;

const HEADERS: [&str; 9] = [
    "ID",
    "Student Name",
    "Roll Number",
    "Title",
    "Type",
    "Status",
    "Submitted At",
    "Reviewed By",
    "Reviewed At",
];

/// Writes the submissions sheet used for offline review.
pub fn write_csv<'a, W, I>(writer: W, activities: I) -> anyhow::Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a ActivityRecord>,
{
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(HEADERS)?;

    let mut written = 0usize;
    for activity in activities {
        out.write_record([
            activity.id.as_deref().unwrap_or(""),
            activity.student_name.as_str(),
            activity.roll_number.as_str(),
            activity.title.as_str(),
            activity.activity_type.as_str(),
            activity.status.as_str(),
            timestamp(&activity.submitted_at).as_str(),
            activity.reviewed_by.as_deref().unwrap_or(""),
            activity
                .reviewed_at
                .as_ref()
                .map(timestamp)
                .unwrap_or_default()
                .as_str(),
        ])?;
        written += 1;
    }

    out.flush()?;
    Ok(written)
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityStatus;
    use chrono::TimeZone;

    #[test]
    fn writes_header_and_escapes_titles() {
        let activity = ActivityRecord {
            id: Some("a1".to_string()),
            student_id: "stu-9".to_string(),
            student_name: "Kiara Patel".to_string(),
            roll_number: "ME-330".to_string(),
            title: "Talk: \"Rust, safely\"".to_string(),
            activity_type: "presentation".to_string(),
            status: ActivityStatus::Approved,
            date: None,
            description: None,
            submitted_at: Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap(),
            reviewed_at: Some(Utc.with_ymd_and_hms(2026, 2, 3, 12, 0, 0).unwrap()),
            reviewed_by: Some("Admin".to_string()),
        };

        let mut buffer = Vec::new();
        let written = write_csv(&mut buffer, [&activity]).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();

        assert_eq!(written, 1);
        assert_eq!(
            lines.next(),
            Some("ID,Student Name,Roll Number,Title,Type,Status,Submitted At,Reviewed By,Reviewed At")
        );
        assert_eq!(
            lines.next(),
            Some(
                "a1,Kiara Patel,ME-330,\"Talk: \"\"Rust, safely\"\"\",presentation,approved,\
                 2026-02-01T09:00:00.000Z,Admin,2026-02-03T12:00:00.000Z"
            )
        );
    }

    #[test]
    fn empty_list_writes_only_header() {
        let mut buffer = Vec::new();
        let written = write_csv(&mut buffer, std::iter::empty::<&ActivityRecord>()).unwrap();
        assert_eq!(written, 0);
        assert_eq!(String::from_utf8(buffer).unwrap().lines().count(), 1);
    }
}
