use anyhow::anyhow;
use serde_json::Value;

use crate::models::{AnswerSheet, AssessmentSubmission, Category, Instrument};
use crate::scoring;

fn category_headers() -> Vec<String> {
    Category::ALL
        .iter()
        .map(|category| format!("{} Score", category.display_name()))
        .collect()
}

fn finish(writer: csv::Writer<Vec<u8>>) -> anyhow::Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow!("flush csv writer: {err}"))?;
    Ok(String::from_utf8(bytes)?)
}

/// Teacher Report export: per-question points, the total, and the 8 category
/// averages for every submission whose sheet decodes as the array form.
pub fn teacher_report_csv(submissions: &[AssessmentSubmission]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);

    let mut headers = vec!["Student Name".to_string(), "Section".to_string()];
    headers.extend((1..=11).map(|question| format!("Q{question}")));
    headers.push("Overall Score".to_string());
    headers.extend(category_headers());
    writer.write_record(&headers)?;

    for submission in submissions {
        let Some(sheet) = AnswerSheet::from_value(&submission.assessment) else {
            continue;
        };
        if sheet.instrument() != Instrument::TeacherReport {
            continue;
        }
        writer.write_record(score_row(submission, &sheet, Instrument::TeacherReport))?;
    }

    finish(writer)
}

/// Student Self-Assessment export, Q1-Q12.
pub fn self_assessment_csv(submissions: &[AssessmentSubmission]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);

    let mut headers = vec!["Student Name".to_string(), "Section".to_string()];
    headers.extend((1..=12).map(|question| format!("Q{question}")));
    headers.push("Overall Score".to_string());
    headers.extend(category_headers());
    writer.write_record(&headers)?;

    for submission in submissions {
        let Some(sheet) = AnswerSheet::from_value(&submission.assessment) else {
            continue;
        };
        if sheet.instrument() != Instrument::SelfAssessment {
            continue;
        }
        writer.write_record(score_row(submission, &sheet, Instrument::SelfAssessment))?;
    }

    finish(writer)
}

fn score_row(
    submission: &AssessmentSubmission,
    sheet: &AnswerSheet,
    instrument: Instrument,
) -> Vec<String> {
    let scores = scoring::question_scores(sheet);
    let averages = scoring::category_averages(&scores, instrument);

    let mut row = vec![submission.student_name.clone(), submission.section.clone()];
    for question in 0..instrument.question_count() {
        row.push(format!("{:.2}", scores.point(question) as f64));
    }
    row.push(format!("{:.2}", scores.total as f64));
    row.extend(averages.iter().map(|average| format!("{average:.2}")));
    row
}

const PARENT_PROFILE_FIELDS: [(&str, &str); 7] = [
    ("Parent Name", "parentName"),
    ("Child Sex", "childSex"),
    ("Date of Birth", "childDob"),
    ("Repeated Grade", "repeatedGrade"),
    ("Hearing Difficulty", "hearingDifficulty"),
    ("Remembering Difficulty", "rememberingDifficulty"),
    ("Communication Difficulty", "communicationDifficulty"),
];

const PARENT_QUESTION_HEADERS: [&str; 11] = [
    "Q1_Feelings",
    "Q2_Preferences",
    "Q3_Persistence",
    "Q4_Help_Seeking",
    "Q5_Empathy",
    "Q6_Comforting",
    "Q7_Problem_Solving",
    "Q8_Self_Regulation",
    "Q9_Impulse_Control",
    "Q10_Self_Awareness",
    "Q11_Learning_Goals",
];

/// Parent questionnaire export. Rows exist only for submissions that carry an
/// object-shaped questionnaire; answers score under the frequency scale.
pub fn parent_questionnaire_csv(submissions: &[AssessmentSubmission]) -> anyhow::Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);

    let mut headers = vec!["Student Name".to_string(), "Section".to_string()];
    headers.extend(PARENT_PROFILE_FIELDS.iter().map(|(label, _)| label.to_string()));
    headers.extend(PARENT_QUESTION_HEADERS.iter().map(|label| label.to_string()));
    headers.push("Overall Score".to_string());
    headers.extend(category_headers());
    writer.write_record(&headers)?;

    for submission in submissions {
        let Some(Value::Object(questionnaire)) = submission.parent_questionnaire.as_ref() else {
            continue;
        };

        let scores = scoring::parent_question_scores(questionnaire);
        let averages = scoring::parent_category_averages(&scores);

        let mut row = vec![submission.student_name.clone(), submission.section.clone()];
        for (_, key) in PARENT_PROFILE_FIELDS {
            row.push(
                questionnaire
                    .get(key)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            );
        }
        for question in 0..PARENT_QUESTION_HEADERS.len() {
            row.push(format!("{:.2}", scores.point(question) as f64));
        }
        row.push(format!("{:.2}", scores.total as f64));
        row.extend(averages.iter().map(|average| format!("{average:.2}")));
        writer.write_record(&row)?;
    }

    finish(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn submission(assessment: Value, parent: Option<Value>) -> AssessmentSubmission {
        AssessmentSubmission {
            student_name: "Nadia Perera".to_string(),
            section: "A".to_string(),
            assessment,
            parent_questionnaire: parent,
        }
    }

    #[test]
    fn teacher_report_csv_keeps_only_array_sheets() {
        let submissions = vec![
            submission(json!(vec!["4"; 11]), None),
            submission(json!({"0": "3"}), None),
            submission(json!("not json {{{"), None),
        ];

        let csv = teacher_report_csv(&submissions).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Student Name,Section,Q1,"));
        assert!(lines[0].ends_with("Critical Thinking Score"));
        // 11 answers worth 3 points each: every question cell and total.
        assert!(lines[1].starts_with("Nadia Perera,A,3.00,"));
        assert!(lines[1].contains(",33.00,"));
    }

    #[test]
    fn self_assessment_csv_has_twelve_question_columns() {
        let submissions = vec![submission(json!({"0": "3", "3": "1"}), None)];

        let csv = self_assessment_csv(&submissions).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Q12"));
        assert!(lines[1].starts_with("Nadia Perera,A,3.00,0.00,0.00,3.00,"));
        assert!(lines[1].contains(",6.00,"));
    }

    #[test]
    fn parent_csv_scores_the_frequency_scale() {
        let questionnaire = json!({
            "parentName": "R. Perera",
            "childSex": "F",
            "q1_feelings": "Almost always",
            "q2_preferences": "Never",
        });
        let submissions = vec![
            submission(json!(vec!["4"; 11]), Some(questionnaire)),
            submission(json!(vec!["4"; 11]), None),
        ];

        let csv = parent_questionnaire_csv(&submissions).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("Nadia Perera,A,R. Perera,F,"));
        // q1 = 3, q2 = 0, everything else unanswered.
        assert!(lines[1].contains("3.00,0.00,0.00,0.00,0.00,0.00,0.00,0.00,0.00,0.00,0.00,3.00,"));
        // selfAwareness averages q1 and q2: 1.50.
        assert!(lines[1].contains(",1.50,"));
    }
}
