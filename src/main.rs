use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;

use student_points::config::PointsConfig;
use student_points::metrics::{self, ActivityFilter};
use student_points::models::{ActivityRecord, ActivityStatus};
use student_points::{db, export, points, report};

#[derive(Parser)]
#[command(name = "student-points")]
#[command(
    about = "Achievement points and milestone tracker for student activities",
    long_about = None
)]
struct Cli {
    /// Read activities from a CSV file instead of DATABASE_URL
    #[arg(long, global = true)]
    csv: Option<PathBuf>,
    /// TOML file overriding point values and milestones
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute points and milestone progress
    Points {
        #[arg(long)]
        student: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Count submissions by review status
    Metrics {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Export submissions as CSV
    Export {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value = "submissions.csv")]
        out: PathBuf,
    },
    /// Generate a markdown points report
    Report {
        #[arg(long)]
        student: Option<String>,
        #[arg(long, default_value = "points-report.md")]
        out: PathBuf,
    },
    /// Rank students by points
    Leaderboard {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// List milestone tiers and point values
    Milestones,
}

#[derive(Args)]
struct FilterArgs {
    #[arg(
        long,
        default_value = "all",
        value_parser = ["all", "approved", "pending", "rejected"]
    )]
    status: String,
    #[arg(long = "type")]
    activity_type: Option<String>,
    #[arg(long)]
    from: Option<NaiveDate>,
    #[arg(long)]
    to: Option<NaiveDate>,
}

impl FilterArgs {
    fn into_filter(self) -> ActivityFilter {
        let status = match self.status.as_str() {
            "all" => None,
            other => Some(ActivityStatus::from(other)),
        };

        ActivityFilter {
            status,
            activity_type: self.activity_type.filter(|value| value != "all"),
            from: self.from,
            to: self.to,
        }
    }
}

async fn load_activities(
    csv: Option<&Path>,
    student: Option<&str>,
) -> anyhow::Result<Vec<ActivityRecord>> {
    if let Some(path) = csv {
        let mut activities = db::load_csv(path)?;
        db::retain_student(&mut activities, student);
        return Ok(activities);
    }

    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set when --csv is not given")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    db::fetch_activities(&pool, student).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => PointsConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => PointsConfig::default(),
    };
    let csv = cli.csv.as_deref();

    match cli.command {
        Commands::Points { student, json } => {
            let activities = load_activities(csv, student.as_deref()).await?;
            let breakdown = points::compute_points_breakdown(&config, &activities);

            if json {
                println!("{}", serde_json::to_string_pretty(&breakdown)?);
                return Ok(());
            }

            println!(
                "{} points ({} approved, {} pending, {} rejected)",
                breakdown.total_points,
                breakdown.approved_count,
                breakdown.pending_count,
                breakdown.rejected_count
            );
            for (activity_type, earned) in &breakdown.points_by_type {
                println!("- {activity_type}: {earned}");
            }
            if let Some(current) = &breakdown.current_milestone {
                println!("Current badge: {} ({})", current.badge, current.title);
            }
            if breakdown.is_maxed_out() {
                println!("All milestones reached.");
            } else if let Some(next) = &breakdown.next_milestone {
                println!(
                    "Next badge: {} at {} points ({:.1}%)",
                    next.badge, next.threshold, breakdown.progress_to_next
                );
            }
        }
        Commands::Metrics { filter } => {
            let activities = load_activities(csv, None).await?;
            let filter = filter.into_filter();
            let matched = filter.apply(&activities);
            let totals = metrics::compute_activity_metrics(matched.iter().copied());

            println!(
                "{} submissions: {} approved, {} pending, {} rejected",
                totals.total, totals.approved, totals.pending, totals.rejected
            );
            for summary in metrics::summarize_by_type(matched.iter().copied()) {
                println!(
                    "- {}: {} submitted, {} approved",
                    summary.activity_type, summary.count, summary.approved
                );
            }

            let shares = metrics::status_distribution(matched.iter().copied());
            if !shares.is_empty() {
                println!("Status mix:");
                for share in shares {
                    println!("- {}: {}% ({})", share.status, share.percent, share.count);
                }
            }

            println!("Last {} months:", metrics::MONTHLY_WINDOW);
            let today = chrono::Utc::now().date_naive();
            for month in metrics::monthly_activity(matched.iter().copied(), today) {
                println!(
                    "- {} {}: {} submitted, {} approved",
                    month.label, month.year, month.submissions, month.approvals
                );
            }
        }
        Commands::Export { filter, out } => {
            let activities = load_activities(csv, None).await?;
            let matched = filter.into_filter().apply(&activities);
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            let written = export::write_csv(file, matched.iter().copied())?;
            println!("Exported {written} submissions to {}.", out.display());
        }
        Commands::Report { student, out } => {
            let activities = load_activities(csv, student.as_deref()).await?;
            let label = student
                .as_deref()
                .and_then(|id| {
                    activities
                        .iter()
                        .find(|activity| activity.student_id == id)
                        .map(|activity| activity.student_name.as_str())
                })
                .or(student.as_deref());
            let report = report::build_student_report(&config, label, &activities);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Leaderboard { limit } => {
            let activities = load_activities(csv, None).await?;
            print!("{}", report::build_leaderboard(&config, &activities, limit));
        }
        Commands::Milestones => {
            println!("Milestones:");
            for milestone in config.milestones.iter() {
                println!(
                    "- {} points: {} ({}, {})",
                    milestone.threshold, milestone.badge, milestone.title, milestone.color
                );
            }
            println!("Points per activity:");
            for (activity_type, value) in config.points.ranked_types() {
                println!("- {activity_type}: {value}");
            }
            println!("- anything else: {}", config.points.default_points());
        }
    }

    Ok(())
}
