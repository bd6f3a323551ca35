use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use sqlx::postgres::PgPoolOptions;

mod db;
mod export;
mod models;
mod report;
mod scoring;

use models::Category;

#[derive(Parser)]
#[command(name = "sel-assessment-rollup")]
#[command(about = "SEL assessment scoring and rollup for classroom dashboards", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Scope {
    #[arg(long)]
    school: Option<String>,
    #[arg(long)]
    grade: Option<String>,
    #[arg(long)]
    section: Option<String>,
    #[arg(long, value_parser = ["PRE", "POST"])]
    test_type: Option<String>,
}

impl Scope {
    fn describe(&self) -> Option<String> {
        let parts: Vec<String> = [
            self.school.as_ref().map(|value| format!("school {value}")),
            self.grade.as_ref().map(|value| format!("grade {value}")),
            self.section.as_ref().map(|value| format!("section {value}")),
            self.test_type.as_ref().map(|value| format!("{value} test")),
        ]
        .into_iter()
        .flatten()
        .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportKind {
    TeacherReport,
    SelfAssessment,
    Parent,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import submissions from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Score submissions and print the level distributions
    Rollup {
        #[command(flatten)]
        scope: Scope,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        scope: Scope,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Export per-student scores as CSV
    Export {
        #[command(flatten)]
        scope: Scope,
        #[arg(long, value_enum)]
        instrument: ExportKind,
        #[arg(long, default_value = "scores.csv")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let database_url = std::env::var("DATABASE_URL")
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to Postgres")?;

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let inserted = db::import_csv(&pool, &csv).await?;
            println!("Inserted {inserted} submissions from {}.", csv.display());
        }
        Commands::Rollup { scope, json } => {
            let submissions = fetch(&pool, &scope).await?;
            let data = scoring::process_assessment_data(&submissions);

            if json {
                println!("{}", serde_json::to_string_pretty(&data)?);
                return Ok(());
            }

            if data.total_students == 0 {
                println!("No submissions found for this scope.");
                return Ok(());
            }

            println!(
                "Scored {} submissions ({} unscored).",
                data.total_students, data.unscored
            );
            println!(
                "Overall: beginner {} / growth {} / expert {}",
                data.overall.beginner, data.overall.growth, data.overall.expert
            );
            for category in Category::ALL {
                let histogram = data.category(category);
                println!(
                    "- {}: beginner {} / growth {} / expert {}",
                    category.display_name(),
                    histogram.beginner,
                    histogram.growth,
                    histogram.expert
                );
            }
        }
        Commands::Report { scope, out } => {
            let submissions = fetch(&pool, &scope).await?;
            let report = report::build_report(scope.describe().as_deref(), &submissions);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export {
            scope,
            instrument,
            out,
        } => {
            let submissions = fetch(&pool, &scope).await?;
            let csv = match instrument {
                ExportKind::TeacherReport => export::teacher_report_csv(&submissions)?,
                ExportKind::SelfAssessment => export::self_assessment_csv(&submissions)?,
                ExportKind::Parent => export::parent_questionnaire_csv(&submissions)?,
            };
            std::fs::write(&out, csv)?;
            println!("Export written to {}.", out.display());
        }
    }

    Ok(())
}

async fn fetch(
    pool: &sqlx::PgPool,
    scope: &Scope,
) -> anyhow::Result<Vec<models::AssessmentSubmission>> {
    db::fetch_submissions(
        pool,
        scope.school.as_deref(),
        scope.grade.as_deref(),
        scope.section.as_deref(),
        scope.test_type.as_deref(),
    )
    .await
}
