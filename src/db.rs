use anyhow::Context;
use chrono::NaiveDate;
use serde_json::{json, Value};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::AssessmentSubmission;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let submissions = vec![
        (
            "seed-001",
            "Nadia Perera",
            "Sunrise Primary",
            "Grade 1",
            "A",
            "PRE",
            json!(["4", "3", "4", "4", "3", "4", "4", "3", "4", "4", "4"]),
        ),
        (
            "seed-002",
            "Ishan Fernando",
            "Sunrise Primary",
            "Grade 1",
            "A",
            "PRE",
            json!(["1", "2", "1", "1", "2", "1", "2", "1", "1", "1", "2"]),
        ),
        (
            "seed-003",
            "Amaya Silva",
            "Sunrise Primary",
            "Grade 1",
            "B",
            "PRE",
            json!({
                "0": "3", "1": "1", "2": "1", "3": "1", "4": "2", "5": "1",
                "6": "2", "7": "1", "8": "1", "9": "1", "10": "2", "11": "3"
            }),
        ),
        (
            "seed-004",
            "Dineth Jayawardena",
            "Sunrise Primary",
            "Grade 1",
            "B",
            "POST",
            json!({
                "0": "2", "1": "4", "2": "2", "3": "2", "4": "3", "5": "2",
                "6": "3", "7": "3", "8": "2", "9": "2", "10": "5", "11": "5"
            }),
        ),
        (
            "seed-005",
            "Ravindu Bandara",
            "Sunrise Primary",
            "Grade 1",
            "C",
            "PRE",
            // Deliberately broken payload so the unscored path shows up in demos.
            json!("not json {{{"),
        ),
    ];

    let submitted_at = NaiveDate::from_ymd_opt(2026, 3, 10).context("invalid date")?;

    for (source_key, student_name, school, grade, section, test_type, assessment) in submissions {
        sqlx::query(
            r#"
            INSERT INTO sel_rollup.submissions
            (id, student_name, school, grade, section, test_type, assessment, submitted_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_name)
        .bind(school)
        .bind(grade)
        .bind(section)
        .bind(test_type)
        .bind(assessment)
        .bind(submitted_at)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn fetch_submissions(
    pool: &PgPool,
    school: Option<&str>,
    grade: Option<&str>,
    section: Option<&str>,
    test_type: Option<&str>,
) -> anyhow::Result<Vec<AssessmentSubmission>> {
    let mut query = String::from(
        "SELECT student_name, section, assessment, parent_questionnaire \
         FROM sel_rollup.submissions WHERE 1 = 1",
    );

    let filters = [
        ("school", school),
        ("grade", grade),
        ("section", section),
        ("test_type", test_type),
    ];

    let mut position = 0;
    for (column, value) in filters {
        if value.is_some() {
            position += 1;
            query.push_str(&format!(" AND {column} = ${position}"));
        }
    }
    query.push_str(" ORDER BY student_name");

    let mut rows = sqlx::query(&query);
    for (_, value) in filters {
        if let Some(value) = value {
            rows = rows.bind(value);
        }
    }

    let records = rows.fetch_all(pool).await?;
    let mut submissions = Vec::new();

    for row in records {
        submissions.push(AssessmentSubmission {
            student_name: row.get("student_name"),
            section: row.get("section"),
            assessment: row.get("assessment"),
            parent_questionnaire: row.get("parent_questionnaire"),
        });
    }

    Ok(submissions)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        student_name: String,
        school: String,
        grade: String,
        section: String,
        test_type: String,
        assessment: String,
        parent_questionnaire: Option<String>,
        submitted_at: NaiveDate,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;

        // A cell that is not valid JSON is stored as a JSON string; the
        // scoring engine then applies its fail-open policy downstream.
        let assessment: Value = serde_json::from_str(&row.assessment)
            .unwrap_or_else(|_| Value::String(row.assessment.clone()));
        let parent_questionnaire: Option<Value> = row
            .parent_questionnaire
            .filter(|text| !text.is_empty())
            .map(|text| {
                serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text.clone()))
            });

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO sel_rollup.submissions
            (id, student_name, school, grade, section, test_type, assessment,
             parent_questionnaire, submitted_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.student_name)
        .bind(&row.school)
        .bind(&row.grade)
        .bind(&row.section)
        .bind(&row.test_type)
        .bind(assessment)
        .bind(parent_questionnaire)
        .bind(row.submitted_at)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
