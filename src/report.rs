use std::collections::HashMap;
use std::fmt::Write;

use crate::config::PointsConfig;
use crate::models::{ActivityRecord, StudentStanding};
use crate::points;

pub fn build_student_report(
    config: &PointsConfig,
    label: Option<&str>,
    activities: &[ActivityRecord],
) -> String {
    let breakdown = points::compute_points_breakdown(config, activities);

    let mut output = String::new();
    let label = label.unwrap_or("all students");

    let _ = writeln!(output, "# Achievement Points Report");
    let _ = writeln!(
        output,
        "Generated for {} ({} activities)",
        label,
        activities.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Points Summary");
    let _ = writeln!(output, "- Total points: {}", breakdown.total_points);
    let _ = writeln!(
        output,
        "- Approved: {}, pending: {}, rejected: {}",
        breakdown.approved_count, breakdown.pending_count, breakdown.rejected_count
    );

    match &breakdown.current_milestone {
        Some(milestone) => {
            let _ = writeln!(
                output,
                "- Current badge: {} ({})",
                milestone.badge, milestone.title
            );
        }
        None => {
            let _ = writeln!(output, "- Current badge: none yet");
        }
    }

    if breakdown.is_maxed_out() {
        let _ = writeln!(output, "- Every milestone reached");
    } else if let Some(next) = &breakdown.next_milestone {
        let _ = writeln!(
            output,
            "- Next: {} at {} points ({:.0}% there, {} to go)",
            next.badge,
            next.threshold,
            breakdown.progress_to_next,
            next.threshold.saturating_sub(breakdown.total_points)
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Points by Type");

    if breakdown.points_by_type.is_empty() {
        let _ = writeln!(output, "No approved activities yet.");
    } else {
        let mut by_type: Vec<(&String, &u32)> = breakdown.points_by_type.iter().collect();
        by_type.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (activity_type, earned) in by_type {
            let _ = writeln!(
                output,
                "- {}: {} points ({} pts each)",
                activity_type,
                earned,
                points::points_for_activity_type(config, activity_type)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Milestone Ladder");
    for milestone in config.milestones.iter() {
        let mark = if breakdown.total_points >= milestone.threshold {
            "x"
        } else {
            " "
        };
        let _ = writeln!(
            output,
            "- [{}] {} ({}) at {} points",
            mark, milestone.badge, milestone.title, milestone.threshold
        );
    }

    let mut recent: Vec<&ActivityRecord> = activities.iter().collect();
    recent.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Activity");

    if recent.is_empty() {
        let _ = writeln!(output, "No activities submitted.");
    } else {
        for activity in recent.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} ({}, {}) submitted {}",
                activity.title,
                activity.activity_type,
                activity.status,
                activity.submitted_at.date_naive()
            );
        }
    }

    output
}

/// Ranks students by total points, highest first.
pub fn rank_students(
    config: &PointsConfig,
    activities: &[ActivityRecord],
) -> Vec<StudentStanding> {
    let mut grouped: HashMap<&str, Vec<&ActivityRecord>> = HashMap::new();
    for activity in activities {
        grouped
            .entry(activity.student_id.as_str())
            .or_default()
            .push(activity);
    }

    let mut standings: Vec<StudentStanding> = grouped
        .into_iter()
        .map(|(student_id, records)| {
            let breakdown = points::compute_points_breakdown(config, records.iter().copied());
            StudentStanding {
                student_id: student_id.to_string(),
                student_name: records[0].student_name.clone(),
                total_points: breakdown.total_points,
                approved_count: breakdown.approved_count,
                badge: breakdown.current_milestone.map(|milestone| milestone.badge),
            }
        })
        .collect();

    standings.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| a.student_name.cmp(&b.student_name))
            .then_with(|| a.student_id.cmp(&b.student_id))
    });
    standings
}

pub fn build_leaderboard(
    config: &PointsConfig,
    activities: &[ActivityRecord],
    limit: usize,
) -> String {
    let standings = rank_students(config, activities);
    let mut output = String::new();

    let _ = writeln!(output, "# Points Leaderboard");
    if standings.is_empty() {
        let _ = writeln!(output, "No students with activities.");
        return output;
    }

    for (rank, standing) in standings.iter().take(limit).enumerate() {
        let _ = writeln!(
            output,
            "{}. {} ({}) {} points across {} approved activities [{}]",
            rank + 1,
            standing.student_name,
            standing.student_id,
            standing.total_points,
            standing.approved_count,
            standing.badge.as_deref().unwrap_or("no badge")
        );
    }

    output
}
