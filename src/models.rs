use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// One student's raw submission as fetched from the store. The `assessment`
/// payload is kept raw (decoded JSON or a JSON-encoded string) so the scoring
/// engine owns the fail-open decode policy.
#[derive(Debug, Clone)]
pub struct AssessmentSubmission {
    pub student_name: String,
    pub section: String,
    pub assessment: Value,
    pub parent_questionnaire: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instrument {
    TeacherReport,
    SelfAssessment,
}

impl Instrument {
    /// Fixed question count per form. The overall average always divides by
    /// this, even when a Teacher Report array arrives short or long.
    pub fn question_count(self) -> usize {
        match self {
            Instrument::TeacherReport => 11,
            Instrument::SelfAssessment => 12,
        }
    }
}

/// Answer payload resolved into an explicit variant at the decode boundary.
/// Array shape is the Teacher Report form, keyed-object shape is the Student
/// Self-Assessment form. Anything else has no sheet and stays unscored.
#[derive(Debug, Clone)]
pub enum AnswerSheet {
    TeacherReport(Vec<String>),
    SelfAssessment(BTreeMap<String, String>),
}

impl AnswerSheet {
    pub fn from_value(raw: &Value) -> Option<AnswerSheet> {
        match raw {
            Value::String(text) => {
                let decoded: Value = serde_json::from_str(text).ok()?;
                AnswerSheet::from_decoded(&decoded)
            }
            other => AnswerSheet::from_decoded(other),
        }
    }

    fn from_decoded(value: &Value) -> Option<AnswerSheet> {
        match value {
            Value::Array(items) => Some(AnswerSheet::TeacherReport(
                items
                    .iter()
                    .map(|item| item.as_str().unwrap_or_default().to_string())
                    .collect(),
            )),
            Value::Object(map) => Some(AnswerSheet::SelfAssessment(
                map.iter()
                    .filter_map(|(key, answer)| {
                        answer.as_str().map(|text| (key.clone(), text.to_string()))
                    })
                    .collect(),
            )),
            _ => None,
        }
    }

    pub fn instrument(&self) -> Instrument {
        match self {
            AnswerSheet::TeacherReport(_) => Instrument::TeacherReport,
            AnswerSheet::SelfAssessment(_) => Instrument::SelfAssessment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Beginner,
    Growth,
    Expert,
}

/// The 8 fixed SEL skill dimensions. Order matches the dashboard display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    SelfAwareness,
    SelfManagement,
    SocialAwareness,
    RelationshipSkills,
    ResponsibleDecisionMaking,
    Metacognition,
    Empathy,
    CriticalThinking,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::SelfAwareness,
        Category::SelfManagement,
        Category::SocialAwareness,
        Category::RelationshipSkills,
        Category::ResponsibleDecisionMaking,
        Category::Metacognition,
        Category::Empathy,
        Category::CriticalThinking,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Category::SelfAwareness => "Self-Awareness",
            Category::SelfManagement => "Self-Management",
            Category::SocialAwareness => "Social Awareness",
            Category::RelationshipSkills => "Relationship Skills",
            Category::ResponsibleDecisionMaking => "Responsible Decision-Making",
            Category::Metacognition => "Metacognition",
            Category::Empathy => "Empathy",
            Category::CriticalThinking => "Critical Thinking",
        }
    }
}

/// Three-bucket level histogram for one category (or overall).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryData {
    pub beginner: u32,
    pub growth: u32,
    pub expert: u32,
}

impl CategoryData {
    pub fn bump(&mut self, level: Level) {
        match level {
            Level::Beginner => self.beginner += 1,
            Level::Growth => self.growth += 1,
            Level::Expert => self.expert += 1,
        }
    }
}

/// Engine output: one histogram overall plus one per category. `unscored`
/// counts submissions whose payload could not be decoded; those are still in
/// `total_students` and bucketed as beginner everywhere, so for every
/// histogram beginner + growth + expert == total_students.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedAssessmentData {
    pub overall: CategoryData,
    pub self_awareness: CategoryData,
    pub self_management: CategoryData,
    pub social_awareness: CategoryData,
    pub relationship_skills: CategoryData,
    pub responsible_decision_making: CategoryData,
    pub metacognition: CategoryData,
    pub empathy: CategoryData,
    pub critical_thinking: CategoryData,
    pub total_students: usize,
    pub unscored: usize,
}

impl ProcessedAssessmentData {
    pub fn category(&self, category: Category) -> &CategoryData {
        match category {
            Category::SelfAwareness => &self.self_awareness,
            Category::SelfManagement => &self.self_management,
            Category::SocialAwareness => &self.social_awareness,
            Category::RelationshipSkills => &self.relationship_skills,
            Category::ResponsibleDecisionMaking => &self.responsible_decision_making,
            Category::Metacognition => &self.metacognition,
            Category::Empathy => &self.empathy,
            Category::CriticalThinking => &self.critical_thinking,
        }
    }

    pub fn category_mut(&mut self, category: Category) -> &mut CategoryData {
        match category {
            Category::SelfAwareness => &mut self.self_awareness,
            Category::SelfManagement => &mut self.self_management,
            Category::SocialAwareness => &mut self.social_awareness,
            Category::RelationshipSkills => &mut self.relationship_skills,
            Category::ResponsibleDecisionMaking => &mut self.responsible_decision_making,
            Category::Metacognition => &mut self.metacognition,
            Category::Empathy => &mut self.empathy,
            Category::CriticalThinking => &mut self.critical_thinking,
        }
    }
}

/// Per-section submission mix used by the markdown report.
#[derive(Debug, Clone)]
pub struct SectionSummary {
    pub section: String,
    pub submissions: usize,
    pub teacher_reports: usize,
    pub self_assessments: usize,
    pub unscored: usize,
}
