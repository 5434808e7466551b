//! Point values and milestone tiers.
//!
//! Both tables are immutable once built and are handed to the engine by
//! reference. A TOML file can override any section; missing sections keep the
//! built-in values.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::models::{ActivityStatus, Milestone};

/// Key in the `[activities]` table that holds the fallback value.
pub const DEFAULT_KEY: &str = "default";

const BUILTIN_DEFAULT_POINTS: u32 = 25;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid points config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("milestone table is empty")]
    NoMilestones,

    #[error("milestone thresholds must be strictly increasing ({previous} then {next})")]
    UnorderedMilestones { previous: u32, next: u32 },

    #[error("status multiplier for {status} must be a non-negative number, got {value}")]
    InvalidMultiplier { status: String, value: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointTable {
    activities: BTreeMap<String, u32>,
    default_points: u32,
    status_multipliers: BTreeMap<String, f64>,
}

impl PointTable {
    /// Builds a table from per-type values and status multipliers.
    ///
    /// A `default` entry in `activities` becomes the fallback value.
    pub fn new(
        mut activities: BTreeMap<String, u32>,
        status_multipliers: BTreeMap<String, f64>,
    ) -> Result<Self, ConfigError> {
        for (status, value) in &status_multipliers {
            if !value.is_finite() || *value < 0.0 {
                return Err(ConfigError::InvalidMultiplier {
                    status: status.clone(),
                    value: *value,
                });
            }
        }

        let default_points = activities
            .remove(DEFAULT_KEY)
            .unwrap_or(BUILTIN_DEFAULT_POINTS);

        Ok(Self {
            activities,
            default_points,
            status_multipliers,
        })
    }

    pub fn points_for(&self, activity_type: &str) -> u32 {
        self.activities
            .get(activity_type)
            .copied()
            .unwrap_or(self.default_points)
    }

    /// Unregistered statuses earn nothing.
    pub fn multiplier_for(&self, status: &ActivityStatus) -> f64 {
        self.status_multipliers
            .get(status.as_str())
            .copied()
            .unwrap_or(0.0)
    }

    pub fn default_points(&self) -> u32 {
        self.default_points
    }

    /// Registered activity types with their base values, highest first.
    pub fn ranked_types(&self) -> Vec<(&str, u32)> {
        let mut values: Vec<(&str, u32)> = self
            .activities
            .iter()
            .map(|(name, points)| (name.as_str(), *points))
            .collect();
        values.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        values
    }
}

impl Default for PointTable {
    fn default() -> Self {
        let activities = BTreeMap::from([
            ("project".to_string(), 50),
            ("assignment".to_string(), 30),
            ("quiz".to_string(), 20),
            ("presentation".to_string(), 40),
            ("lab_work".to_string(), 25),
            ("research".to_string(), 60),
            ("hackathon".to_string(), 100),
            ("competition".to_string(), 80),
            ("workshop".to_string(), 30),
            ("certification".to_string(), 70),
            ("community_service".to_string(), 40),
            ("leadership".to_string(), 50),
        ]);

        Self {
            activities,
            default_points: BUILTIN_DEFAULT_POINTS,
            status_multipliers: default_multipliers(),
        }
    }
}

fn default_multipliers() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("approved".to_string(), 1.0),
        ("pending".to_string(), 0.0),
        ("rejected".to_string(), 0.0),
    ])
}

#[derive(Debug, Clone, PartialEq)]
pub struct MilestoneTable {
    milestones: Vec<Milestone>,
}

impl MilestoneTable {
    pub fn new(milestones: Vec<Milestone>) -> Result<Self, ConfigError> {
        if milestones.is_empty() {
            return Err(ConfigError::NoMilestones);
        }

        for pair in milestones.windows(2) {
            if pair[1].threshold <= pair[0].threshold {
                return Err(ConfigError::UnorderedMilestones {
                    previous: pair[0].threshold,
                    next: pair[1].threshold,
                });
            }
        }

        Ok(Self { milestones })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Milestone> {
        self.milestones.iter()
    }

    pub fn first(&self) -> Option<&Milestone> {
        self.milestones.first()
    }

    pub fn len(&self) -> usize {
        self.milestones.len()
    }
}

impl Default for MilestoneTable {
    fn default() -> Self {
        let tier = |threshold: u32, title: &str, badge: &str, color: &str| Milestone {
            threshold,
            title: title.to_string(),
            badge: badge.to_string(),
            color: color.to_string(),
        };

        Self {
            milestones: vec![
                tier(100, "Getting Started", "Beginner", "#8b5cf6"),
                tier(250, "Making Progress", "Learner", "#3b82f6"),
                tier(500, "Active Student", "Achiever", "#10b981"),
                tier(750, "High Performer", "Star", "#f59e0b"),
                tier(1000, "Excellence", "Expert", "#ef4444"),
                tier(1500, "Outstanding", "Champion", "#8b5cf6"),
                tier(2000, "Exceptional", "Master", "#6366f1"),
            ],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointsConfig {
    pub points: PointTable,
    pub milestones: MilestoneTable,
}

#[derive(Debug, Deserialize)]
struct PointsFile {
    activities: Option<BTreeMap<String, u32>>,
    status_multipliers: Option<BTreeMap<String, f64>>,
    milestones: Option<Vec<Milestone>>,
}

impl PointsConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: PointsFile = toml::from_str(content)?;
        let builtin = PointsConfig::default();

        let points = match (file.activities, file.status_multipliers) {
            (None, None) => builtin.points,
            (activities, multipliers) => {
                let mut activities =
                    activities.unwrap_or_else(|| builtin.points.activities.clone());
                activities
                    .entry(DEFAULT_KEY.to_string())
                    .or_insert(builtin.points.default_points);
                PointTable::new(
                    activities,
                    multipliers.unwrap_or_else(default_multipliers),
                )?
            }
        };

        let milestones = match file.milestones {
            Some(milestones) => MilestoneTable::new(milestones)?,
            None => builtin.milestones,
        };

        Ok(Self { points, milestones })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!(
            path = %path.display(),
            milestones = config.milestones.len(),
            "loaded points config"
        );
        Ok(config)
    }
}
