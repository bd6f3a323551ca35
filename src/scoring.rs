use serde_json::{Map, Value};

use crate::models::{
    AnswerSheet, AssessmentSubmission, Category, Instrument, Level, ProcessedAssessmentData,
};

/// Teacher Report answer codes map straight to 0-based points.
const TEACHER_REPORT_POINTS: [(&str, u32); 4] = [("1", 0), ("2", 1), ("3", 2), ("4", 3)];

pub fn teacher_report_points(answer: &str) -> u32 {
    TEACHER_REPORT_POINTS
        .iter()
        .find(|(code, _)| *code == answer)
        .map(|(_, points)| *points)
        .unwrap_or(0)
}

/// One Self-Assessment question's scoring rule: listed codes earn 3 or 2
/// points, any other answer earns the fallback. A missing or empty answer
/// always scores 0, bypassing the fallback.
#[derive(Debug, Clone, Copy)]
pub struct AnswerRule {
    pub three_points: &'static [&'static str],
    pub two_points: &'static [&'static str],
    pub fallback: u32,
}

/// Hand-authored per-question rules for the 12 Self-Assessment questions.
/// These are domain policy from the assessment authors, not a formula.
pub const SELF_ASSESSMENT_RULES: [AnswerRule; 12] = [
    AnswerRule { three_points: &["3"], two_points: &[], fallback: 1 },
    AnswerRule { three_points: &["1", "2", "3"], two_points: &[], fallback: 1 },
    AnswerRule { three_points: &["1"], two_points: &["3"], fallback: 0 },
    AnswerRule { three_points: &["1"], two_points: &[], fallback: 0 },
    AnswerRule { three_points: &["1", "2"], two_points: &[], fallback: 0 },
    AnswerRule { three_points: &["1"], two_points: &[], fallback: 0 },
    AnswerRule { three_points: &["1"], two_points: &["2"], fallback: 0 },
    AnswerRule { three_points: &["1"], two_points: &["2"], fallback: 0 },
    AnswerRule { three_points: &["1"], two_points: &[], fallback: 0 },
    AnswerRule { three_points: &["1"], two_points: &[], fallback: 0 },
    AnswerRule { three_points: &["1", "2", "3", "4"], two_points: &[], fallback: 0 },
    AnswerRule { three_points: &["1", "2", "3", "4"], two_points: &[], fallback: 0 },
];

pub fn self_assessment_points(question: usize, answer: &str) -> u32 {
    let Some(rule) = SELF_ASSESSMENT_RULES.get(question) else {
        return 0;
    };
    if answer.is_empty() {
        return 0;
    }
    if rule.three_points.contains(&answer) {
        3
    } else if rule.two_points.contains(&answer) {
        2
    } else {
        rule.fallback
    }
}

/// Category-to-question-index tables, one per instrument. Categories overlap;
/// the two tables must never be conflated.
pub fn question_indices(instrument: Instrument, category: Category) -> &'static [usize] {
    match (instrument, category) {
        (Instrument::TeacherReport, Category::SelfAwareness) => &[0, 1],
        (Instrument::TeacherReport, Category::SelfManagement) => &[7, 8],
        (Instrument::TeacherReport, Category::SocialAwareness) => &[4, 5],
        (Instrument::TeacherReport, Category::RelationshipSkills) => &[6],
        (Instrument::TeacherReport, Category::ResponsibleDecisionMaking) => &[8],
        (Instrument::TeacherReport, Category::Metacognition) => &[3, 9, 10],
        (Instrument::TeacherReport, Category::Empathy) => &[4, 5, 6],
        (Instrument::TeacherReport, Category::CriticalThinking) => &[2, 3, 8],
        (Instrument::SelfAssessment, Category::SelfAwareness) => &[0, 1, 10],
        (Instrument::SelfAssessment, Category::SelfManagement) => &[2, 8, 9],
        (Instrument::SelfAssessment, Category::SocialAwareness) => &[0, 5],
        (Instrument::SelfAssessment, Category::RelationshipSkills) => &[4, 6],
        (Instrument::SelfAssessment, Category::ResponsibleDecisionMaking) => &[7, 9],
        (Instrument::SelfAssessment, Category::Metacognition) => &[2, 3, 10, 11],
        (Instrument::SelfAssessment, Category::Empathy) => &[4, 5, 6],
        (Instrument::SelfAssessment, Category::CriticalThinking) => &[3, 7],
    }
}

/// Per-question point values for one sheet plus their sum. Ephemeral; one per
/// submission.
#[derive(Debug, Clone)]
pub struct QuestionScores {
    points: Vec<u32>,
    pub total: u32,
}

impl QuestionScores {
    fn new(points: Vec<u32>) -> QuestionScores {
        let total = points.iter().sum();
        QuestionScores { points, total }
    }

    /// 0 for any index the sheet did not answer.
    pub fn point(&self, question: usize) -> u32 {
        self.points.get(question).copied().unwrap_or(0)
    }
}

pub fn question_scores(sheet: &AnswerSheet) -> QuestionScores {
    match sheet {
        AnswerSheet::TeacherReport(answers) => QuestionScores::new(
            answers
                .iter()
                .map(|answer| teacher_report_points(answer))
                .collect(),
        ),
        AnswerSheet::SelfAssessment(answers) => QuestionScores::new(
            (0..Instrument::SelfAssessment.question_count())
                .map(|question| {
                    answers
                        .get(&question.to_string())
                        .map(|answer| self_assessment_points(question, answer))
                        .unwrap_or(0)
                })
                .collect(),
        ),
    }
}

fn averages(scores: &QuestionScores, indices_for: impl Fn(Category) -> &'static [usize]) -> [f64; 8] {
    let mut result = [0.0; 8];
    for (slot, category) in result.iter_mut().zip(Category::ALL) {
        let indices = indices_for(category);
        let sum: u32 = indices.iter().map(|&question| scores.point(question)).sum();
        *slot = sum as f64 / indices.len() as f64;
    }
    result
}

/// Unweighted mean of each category's question scores, in `Category::ALL`
/// order. Missing questions count as 0 in the sum but the divisor stays the
/// full index count.
pub fn category_averages(scores: &QuestionScores, instrument: Instrument) -> [f64; 8] {
    averages(scores, |category| question_indices(instrument, category))
}

/// Instrument-specific level breakpoints applied to a category or overall
/// average.
pub fn level_for(instrument: Instrument, average: f64) -> Level {
    let beginner_cap = match instrument {
        Instrument::TeacherReport => 1.0,
        Instrument::SelfAssessment => 1.5,
    };
    if average <= beginner_cap {
        Level::Beginner
    } else if average <= 2.4 {
        Level::Growth
    } else {
        Level::Expert
    }
}

/// Scores a batch of raw submissions into per-category level histograms.
///
/// Pure and order-independent. A submission whose payload fails to decode is
/// never dropped and never aborts the batch: it still counts toward
/// `total_students`, lands in the beginner bucket of all 9 histograms, and is
/// tallied in `unscored` so data quality problems stay visible.
pub fn process_assessment_data(submissions: &[AssessmentSubmission]) -> ProcessedAssessmentData {
    let mut data = ProcessedAssessmentData {
        total_students: submissions.len(),
        ..ProcessedAssessmentData::default()
    };

    for submission in submissions {
        match AnswerSheet::from_value(&submission.assessment) {
            Some(sheet) => {
                let instrument = sheet.instrument();
                let scores = question_scores(&sheet);
                let overall_average = scores.total as f64 / instrument.question_count() as f64;
                data.overall.bump(level_for(instrument, overall_average));

                let category_means = category_averages(&scores, instrument);
                for (category, average) in Category::ALL.into_iter().zip(category_means) {
                    data.category_mut(category).bump(level_for(instrument, average));
                }
            }
            None => {
                data.unscored += 1;
                data.overall.bump(Level::Beginner);
                for category in Category::ALL {
                    data.category_mut(category).bump(Level::Beginner);
                }
            }
        }
    }

    data
}

/// Parent questionnaire answer keys, in question order.
pub const PARENT_QUESTION_KEYS: [&str; 11] = [
    "q1_feelings",
    "q2_preferences",
    "q3_persistence",
    "q4_help_seeking",
    "q5_empathy",
    "q6_comforting",
    "q7_problem_solving",
    "q8_self_regulation",
    "q9_impulse_control",
    "q10_self_awareness",
    "q11_learning_goals",
];

const PARENT_POINTS: [(&str, u32); 4] = [
    ("Never", 0),
    ("Sometimes", 1),
    ("Most of the time", 2),
    ("Almost always", 3),
];

pub fn parent_points(answer: &str) -> u32 {
    PARENT_POINTS
        .iter()
        .find(|(code, _)| *code == answer)
        .map(|(_, points)| *points)
        .unwrap_or(0)
}

/// Parent questionnaire category table. Numerically it matches the Teacher
/// Report table today, but it is separately authored policy and kept apart.
pub fn parent_question_indices(category: Category) -> &'static [usize] {
    match category {
        Category::SelfAwareness => &[0, 1],
        Category::SelfManagement => &[7, 8],
        Category::SocialAwareness => &[4, 5],
        Category::RelationshipSkills => &[6],
        Category::ResponsibleDecisionMaking => &[8],
        Category::Metacognition => &[3, 9, 10],
        Category::Empathy => &[4, 5, 6],
        Category::CriticalThinking => &[2, 3, 8],
    }
}

pub fn parent_question_scores(questionnaire: &Map<String, Value>) -> QuestionScores {
    QuestionScores::new(
        PARENT_QUESTION_KEYS
            .iter()
            .map(|key| {
                questionnaire
                    .get(*key)
                    .and_then(Value::as_str)
                    .map(parent_points)
                    .unwrap_or(0)
            })
            .collect(),
    )
}

pub fn parent_category_averages(scores: &QuestionScores) -> [f64; 8] {
    averages(scores, parent_question_indices)
}
