use std::collections::BTreeMap;

use crate::config::{MilestoneTable, PointsConfig};
use crate::models::{ActivityRecord, ActivityStatus, Milestone, PointsBreakdown};

/// Summarizes points, status counts and milestone progress for `activities`.
///
/// Only approved activities earn points or show up in `points_by_type`.
pub fn compute_points_breakdown<'a, I>(config: &PointsConfig, activities: I) -> PointsBreakdown
where
    I: IntoIterator<Item = &'a ActivityRecord>,
{
    let mut total_points: u32 = 0;
    let mut approved_count = 0usize;
    let mut pending_count = 0usize;
    let mut rejected_count = 0usize;
    let mut points_by_type: BTreeMap<String, u32> = BTreeMap::new();

    for activity in activities {
        let base = config.points.points_for(&activity.activity_type);
        let multiplier = config.points.multiplier_for(&activity.status);
        let earned = earned_points(base, multiplier);

        match activity.status {
            ActivityStatus::Approved => {
                total_points = total_points.saturating_add(earned);
                approved_count += 1;
                let entry = points_by_type
                    .entry(activity.activity_type.clone())
                    .or_insert(0);
                *entry = entry.saturating_add(earned);
            }
            ActivityStatus::Pending => pending_count += 1,
            ActivityStatus::Rejected => rejected_count += 1,
            ActivityStatus::Other(_) => {}
        }
    }

    let (current_milestone, next_milestone) = locate_milestones(&config.milestones, total_points);
    let progress_to_next = progress_toward(total_points, next_milestone.as_ref());

    tracing::debug!(
        total_points,
        approved_count,
        pending_count,
        rejected_count,
        "computed points breakdown"
    );

    PointsBreakdown {
        total_points,
        approved_count,
        pending_count,
        rejected_count,
        points_by_type,
        current_milestone,
        next_milestone,
        progress_to_next,
    }
}

/// Base value for an activity type, falling back to the table default.
pub fn points_for_activity_type(config: &PointsConfig, activity_type: &str) -> u32 {
    config.points.points_for(activity_type)
}

fn earned_points(base: u32, multiplier: f64) -> u32 {
    let earned = (base as f64 * multiplier).round();
    if earned >= u32::MAX as f64 {
        u32::MAX
    } else {
        earned as u32
    }
}

/// Returns `(current, next)`. At the top tier `next` repeats `current`.
pub fn locate_milestones(
    milestones: &MilestoneTable,
    total_points: u32,
) -> (Option<Milestone>, Option<Milestone>) {
    let mut current: Option<&Milestone> = None;
    let mut next: Option<&Milestone> = None;

    for milestone in milestones.iter() {
        if total_points >= milestone.threshold {
            current = Some(milestone);
        } else {
            next = Some(milestone);
            break;
        }
    }

    let next = match (current, next) {
        (None, _) => milestones.first(),
        (Some(reached), None) => Some(reached),
        (Some(_), Some(upcoming)) => Some(upcoming),
    };

    (current.cloned(), next.cloned())
}

/// Percentage of the way to `next`, clamped to `[0, 100]`.
pub fn progress_toward(total_points: u32, next: Option<&Milestone>) -> f64 {
    match next {
        Some(milestone) if milestone.threshold > 0 => {
            (total_points as f64 / milestone.threshold as f64 * 100.0).clamp(0.0, 100.0)
        }
        _ => 100.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PointTable;
    use chrono::Utc;

    fn activity(activity_type: &str, status: &str) -> ActivityRecord {
        ActivityRecord {
            id: None,
            student_id: "stu-1".to_string(),
            student_name: "Avery Lee".to_string(),
            roll_number: "CS-101".to_string(),
            title: format!("{activity_type} submission"),
            activity_type: activity_type.to_string(),
            status: ActivityStatus::from(status),
            date: None,
            description: None,
            submitted_at: Utc::now(),
            reviewed_at: None,
            reviewed_by: None,
        }
    }

    fn tier(threshold: u32, badge: &str) -> Milestone {
        Milestone {
            threshold,
            title: format!("{badge} tier"),
            badge: badge.to_string(),
            color: "#000000".to_string(),
        }
    }

    fn small_ladder() -> PointsConfig {
        PointsConfig {
            points: PointTable::default(),
            milestones: MilestoneTable::new(vec![
                tier(100, "Beginner"),
                tier(250, "Learner"),
                tier(500, "Achiever"),
            ])
            .unwrap(),
        }
    }

    #[test]
    fn approved_project_earns_its_value() {
        let config = PointsConfig::default();
        let activities = [activity("project", "approved")];
        let breakdown = compute_points_breakdown(&config, &activities);

        assert_eq!(breakdown.total_points, 50);
        assert_eq!(breakdown.approved_count, 1);
        assert_eq!(
            breakdown.points_by_type,
            BTreeMap::from([("project".to_string(), 50)])
        );
    }

    #[test]
    fn pending_activity_creates_no_type_entry() {
        let config = PointsConfig::default();
        let activities = [activity("quiz", "pending")];
        let breakdown = compute_points_breakdown(&config, &activities);

        assert_eq!(breakdown.total_points, 0);
        assert_eq!(breakdown.pending_count, 1);
        assert!(breakdown.points_by_type.is_empty());
    }

    #[test]
    fn rejected_activity_only_counts() {
        let config = PointsConfig::default();
        let breakdown = compute_points_breakdown(
            &config,
            &[activity("quiz", "rejected"), activity("quiz", "approved")],
        );

        assert_eq!(breakdown.rejected_count, 1);
        assert_eq!(breakdown.approved_count, 1);
        assert_eq!(breakdown.points_by_type.get("quiz"), Some(&20));
        assert_eq!(breakdown.total_points, 20);
    }

    #[test]
    fn unknown_type_uses_default_value() {
        let config = PointsConfig::default();
        let activities = [activity("skydiving", "approved")];
        let breakdown = compute_points_breakdown(&config, &activities);

        assert_eq!(breakdown.total_points, 25);
        assert_eq!(breakdown.points_by_type.get("skydiving"), Some(&25));
        assert_eq!(points_for_activity_type(&config, "skydiving"), 25);
    }

    #[test]
    fn unknown_status_is_ignored() {
        let config = PointsConfig::default();
        let activities = [activity("project", "archived")];
        let breakdown = compute_points_breakdown(&config, &activities);

        assert_eq!(breakdown.total_points, 0);
        assert_eq!(
            breakdown.approved_count + breakdown.pending_count + breakdown.rejected_count,
            0
        );
        assert!(breakdown.points_by_type.is_empty());
    }

    #[test]
    fn empty_input_points_at_first_milestone() {
        let config = small_ladder();
        let activities: Vec<ActivityRecord> = Vec::new();
        let breakdown = compute_points_breakdown(&config, &activities);

        assert_eq!(breakdown.total_points, 0);
        assert_eq!(breakdown.approved_count, 0);
        assert_eq!(breakdown.pending_count, 0);
        assert_eq!(breakdown.rejected_count, 0);
        assert!(breakdown.current_milestone.is_none());
        assert_eq!(breakdown.next_milestone.unwrap().threshold, 100);
        assert_eq!(breakdown.progress_to_next, 0.0);
    }

    #[test]
    fn threshold_is_inclusive() {
        let config = small_ladder();
        let activities = vec![activity("project", "approved"), activity("project", "approved")];
        let breakdown = compute_points_breakdown(&config, &activities);

        assert_eq!(breakdown.total_points, 100);
        assert_eq!(breakdown.current_milestone.unwrap().threshold, 100);
        assert_eq!(breakdown.next_milestone.unwrap().threshold, 250);
        assert!((breakdown.progress_to_next - 40.0).abs() < 1e-9);
    }

    #[test]
    fn top_tier_repeats_current_as_next() {
        let config = small_ladder();
        let activities: Vec<ActivityRecord> =
            (0..6).map(|_| activity("hackathon", "approved")).collect();
        let breakdown = compute_points_breakdown(&config, &activities);

        assert_eq!(breakdown.total_points, 600);
        assert_eq!(breakdown.current_milestone, breakdown.next_milestone);
        assert_eq!(breakdown.current_milestone.as_ref().unwrap().badge, "Achiever");
        assert_eq!(breakdown.progress_to_next, 100.0);
        assert!(breakdown.is_maxed_out());
    }

    #[test]
    fn counts_partition_input_and_types_sum_to_total() {
        let config = PointsConfig::default();
        let activities = vec![
            activity("project", "approved"),
            activity("research", "approved"),
            activity("project", "approved"),
            activity("quiz", "pending"),
            activity("workshop", "rejected"),
            activity("skydiving", "approved"),
        ];
        let breakdown = compute_points_breakdown(&config, &activities);

        assert_eq!(
            breakdown.approved_count + breakdown.pending_count + breakdown.rejected_count,
            activities.len()
        );
        assert_eq!(
            breakdown.points_by_type.values().sum::<u32>(),
            breakdown.total_points
        );
        assert_eq!(breakdown.total_points, 50 + 60 + 50 + 25);
    }

    #[test]
    fn repeated_calls_agree() {
        let config = PointsConfig::default();
        let activities = vec![activity("project", "approved"), activity("quiz", "pending")];

        assert_eq!(
            compute_points_breakdown(&config, &activities),
            compute_points_breakdown(&config, &activities)
        );
    }

    #[test]
    fn milestones_never_regress_as_points_grow() {
        let config = PointsConfig::default();
        let mut activities = Vec::new();
        let mut last_total = 0;
        let mut last_threshold = 0;

        for _ in 0..30 {
            activities.push(activity("competition", "approved"));
            let breakdown = compute_points_breakdown(&config, &activities);
            assert!(breakdown.total_points >= last_total);
            let threshold = breakdown
                .current_milestone
                .map(|milestone| milestone.threshold)
                .unwrap_or(0);
            assert!(threshold >= last_threshold);
            last_total = breakdown.total_points;
            last_threshold = threshold;
        }
    }

    #[test]
    fn zero_threshold_counts_as_complete() {
        assert_eq!(progress_toward(0, Some(&tier(0, "Free"))), 100.0);
        assert_eq!(progress_toward(10, None), 100.0);
    }
}
