use std::fmt::Write;

use crate::models::{AnswerSheet, AssessmentSubmission, Category, Instrument, SectionSummary};
use crate::scoring;

pub fn summarize_by_section(submissions: &[AssessmentSubmission]) -> Vec<SectionSummary> {
    let mut map: std::collections::HashMap<String, SectionSummary> =
        std::collections::HashMap::new();

    for submission in submissions {
        let entry = map
            .entry(submission.section.clone())
            .or_insert_with(|| SectionSummary {
                section: submission.section.clone(),
                submissions: 0,
                teacher_reports: 0,
                self_assessments: 0,
                unscored: 0,
            });
        entry.submissions += 1;
        match AnswerSheet::from_value(&submission.assessment).map(|sheet| sheet.instrument()) {
            Some(Instrument::TeacherReport) => entry.teacher_reports += 1,
            Some(Instrument::SelfAssessment) => entry.self_assessments += 1,
            None => entry.unscored += 1,
        }
    }

    let mut summaries: Vec<SectionSummary> = map.into_values().collect();
    summaries.sort_by(|a, b| b.submissions.cmp(&a.submissions).then(a.section.cmp(&b.section)));
    summaries
}

pub fn build_report(scope: Option<&str>, submissions: &[AssessmentSubmission]) -> String {
    let data = scoring::process_assessment_data(submissions);
    let summaries = summarize_by_section(submissions);

    let mut output = String::new();
    let scope_label = scope.unwrap_or("all submissions");

    let _ = writeln!(output, "# SEL Assessment Rollup");
    let _ = writeln!(
        output,
        "Scored {} submissions for {}.",
        data.total_students, scope_label
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overall");

    if data.total_students == 0 {
        let _ = writeln!(output, "No submissions matched this scope.");
    } else {
        let _ = writeln!(
            output,
            "- beginner {} / growth {} / expert {}",
            data.overall.beginner, data.overall.growth, data.overall.expert
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Skill Categories");

    if data.total_students == 0 {
        let _ = writeln!(output, "No submissions matched this scope.");
    } else {
        for category in Category::ALL {
            let histogram = data.category(category);
            let _ = writeln!(
                output,
                "- {}: beginner {} / growth {} / expert {}",
                category.display_name(),
                histogram.beginner,
                histogram.growth,
                histogram.expert
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Sections");

    if summaries.is_empty() {
        let _ = writeln!(output, "No sections in this scope.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} submissions ({} teacher report, {} self-assessment)",
                summary.section,
                summary.submissions,
                summary.teacher_reports,
                summary.self_assessments
            );
        }
    }

    if data.unscored > 0 {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Data Quality");
        let _ = writeln!(
            output,
            "{} submissions could not be parsed and were counted as beginner.",
            data.unscored
        );
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn submission(section: &str, assessment: serde_json::Value) -> AssessmentSubmission {
        AssessmentSubmission {
            student_name: "Nadia Perera".to_string(),
            section: section.to_string(),
            assessment,
            parent_questionnaire: None,
        }
    }

    #[test]
    fn sections_count_submissions_by_instrument() {
        let submissions = vec![
            submission("A", json!(vec!["4"; 11])),
            submission("A", json!({"0": "3"})),
            submission("B", json!("not json {{{")),
        ];

        let summaries = summarize_by_section(&submissions);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].section, "A");
        assert_eq!(summaries[0].submissions, 2);
        assert_eq!(summaries[0].teacher_reports, 1);
        assert_eq!(summaries[0].self_assessments, 1);
        assert_eq!(summaries[1].section, "B");
        assert_eq!(summaries[1].unscored, 1);
    }

    #[test]
    fn report_covers_overall_categories_and_sections() {
        let submissions = vec![submission("A", json!(vec!["4"; 11]))];
        let report = build_report(Some("Grade 1, section A"), &submissions);

        assert!(report.contains("# SEL Assessment Rollup"));
        assert!(report.contains("Scored 1 submissions for Grade 1, section A."));
        assert!(report.contains("- beginner 0 / growth 0 / expert 1"));
        assert!(report.contains("- Critical Thinking: beginner 0 / growth 0 / expert 1"));
        assert!(report.contains("- A: 1 submissions (1 teacher report, 0 self-assessment)"));
        assert!(!report.contains("## Data Quality"));
    }

    #[test]
    fn report_flags_unscored_submissions() {
        let submissions = vec![submission("A", json!("not json {{{"))];
        let report = build_report(None, &submissions);

        assert!(report.contains("for all submissions."));
        assert!(report.contains("## Data Quality"));
        assert!(report.contains("1 submissions could not be parsed"));
    }
}
