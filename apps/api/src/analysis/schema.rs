//! Response-shape declaration handed to the completion service.
//!
//! The schema is static: it is built once per pipeline from a `SchemaVariant`
//! and rendered to the service's JSON dialect. Property names must stay in
//! lockstep with the serde names in `models`. Only the top-level core is
//! required; nested properties are all optional, and so are their model fields.

use std::str::FromStr;

use serde_json::{json, Map, Value};

use crate::analysis::models::{QuestionCategory, Recommendation, Severity};

/// Which revision of the result shape to request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchemaVariant {
    /// Union of every field the dossier can show.
    #[default]
    Full,
    /// Lean shape without discrepancies, priority flags, scorecard or soft skills.
    Compact,
}

impl FromStr for SchemaVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(SchemaVariant::Full),
            "compact" => Ok(SchemaVariant::Compact),
            other => Err(format!("unknown schema variant '{other}' (expected 'full' or 'compact')")),
        }
    }
}

/// Always required, in every variant.
pub const REQUIRED_FIELDS: &[&str] = &[
    "matchScore",
    "meritJudgment",
    "operationalRisk",
    "salaryBenchmark",
    "interviewGuide",
];

/// Fields only requested by `SchemaVariant::Full`.
const FULL_ONLY_FIELDS: &[&str] = &[
    "scorecard",
    "isFit",
    "softSkills",
    "priorityFlags",
    "estimatedJoiningDate",
    "discrepancies",
];

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    Number,
    String,
    Boolean,
    Enum(&'static [&'static str]),
    Object {
        properties: Vec<(&'static str, SchemaNode)>,
        required: &'static [&'static str],
    },
    Array(Box<SchemaNode>),
}

impl SchemaNode {
    fn object(properties: Vec<(&'static str, SchemaNode)>) -> Self {
        SchemaNode::Object {
            properties,
            required: &[],
        }
    }

    fn array_of(item: SchemaNode) -> Self {
        SchemaNode::Array(Box::new(item))
    }

    /// Renders the node in the service's schema dialect.
    pub fn to_json(&self) -> Value {
        match self {
            SchemaNode::Number => json!({"type": "NUMBER"}),
            SchemaNode::String => json!({"type": "STRING"}),
            SchemaNode::Boolean => json!({"type": "BOOLEAN"}),
            SchemaNode::Enum(values) => json!({"type": "STRING", "format": "enum", "enum": values}),
            SchemaNode::Array(item) => json!({"type": "ARRAY", "items": item.to_json()}),
            SchemaNode::Object {
                properties,
                required,
            } => {
                let mut props = Map::new();
                for (name, node) in properties {
                    props.insert((*name).to_string(), node.to_json());
                }
                let ordering: Vec<&str> = properties.iter().map(|(name, _)| *name).collect();
                let mut object = json!({
                    "type": "OBJECT",
                    "properties": props,
                    "propertyOrdering": ordering,
                });
                if !required.is_empty() {
                    object["required"] = json!(required);
                }
                object
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractionSchema {
    root: SchemaNode,
    rendered: Value,
}

impl ExtractionSchema {
    pub fn for_variant(variant: SchemaVariant) -> Self {
        let properties = full_properties()
            .into_iter()
            .filter(|(name, _)| variant == SchemaVariant::Full || !FULL_ONLY_FIELDS.contains(name))
            .collect();
        let root = SchemaNode::Object {
            properties,
            required: REQUIRED_FIELDS,
        };
        let rendered = root.to_json();
        Self { root, rendered }
    }

    pub fn as_json(&self) -> &Value {
        &self.rendered
    }

    /// Top-level property names in declaration order.
    pub fn field_names(&self) -> Vec<&'static str> {
        match &self.root {
            SchemaNode::Object { properties, .. } => properties.iter().map(|(n, _)| *n).collect(),
            _ => Vec::new(),
        }
    }
}

fn strategic_point() -> SchemaNode {
    SchemaNode::object(vec![
        ("title", SchemaNode::String),
        ("description", SchemaNode::String),
        ("tag", SchemaNode::String),
        ("impactOrMitigation", SchemaNode::String),
    ])
}

fn full_properties() -> Vec<(&'static str, SchemaNode)> {
    vec![
        ("matchScore", SchemaNode::Number),
        (
            "scorecard",
            SchemaNode::object(vec![
                ("technical", SchemaNode::Number),
                ("experience", SchemaNode::Number),
                ("location", SchemaNode::Number),
                ("cost", SchemaNode::Number),
                ("stability", SchemaNode::Number),
                ("integrity", SchemaNode::Number),
            ]),
        ),
        ("isFit", SchemaNode::Boolean),
        ("suitabilityLabel", SchemaNode::String),
        ("meritJudgment", SchemaNode::String),
        ("operationalRisk", SchemaNode::Number),
        ("aiFinalRecommendation", SchemaNode::Enum(&Recommendation::ALL)),
        ("recommendationWhy", SchemaNode::String),
        ("summary", SchemaNode::String),
        (
            "softSkills",
            SchemaNode::array_of(SchemaNode::object(vec![
                ("name", SchemaNode::String),
                ("score", SchemaNode::Number),
                ("description", SchemaNode::String),
            ])),
        ),
        ("strengths", SchemaNode::array_of(strategic_point())),
        ("weaknesses", SchemaNode::array_of(strategic_point())),
        (
            "priorityFlags",
            SchemaNode::object(vec![
                ("isSaudi", SchemaNode::Boolean),
                ("transferableIqama", SchemaNode::Boolean),
                ("rareSkills", SchemaNode::Boolean),
                ("iqamaExpired", SchemaNode::Boolean),
            ]),
        ),
        ("estimatedJoiningDate", SchemaNode::String),
        (
            "discrepancies",
            SchemaNode::array_of(SchemaNode::object(vec![
                ("id", SchemaNode::String),
                ("field", SchemaNode::String),
                ("userInput", SchemaNode::String),
                ("cvDetected", SchemaNode::String),
                ("cvSnippet", SchemaNode::String),
                ("severity", SchemaNode::Enum(&Severity::ALL)),
            ])),
        ),
        (
            "interviewGuide",
            SchemaNode::array_of(SchemaNode::object(vec![
                ("question", SchemaNode::String),
                ("target", SchemaNode::String),
                ("expectedAnswerHint", SchemaNode::String),
                ("category", SchemaNode::Enum(&QuestionCategory::ALL)),
            ])),
        ),
        (
            "salaryBenchmark",
            SchemaNode::object(vec![
                ("status", SchemaNode::String),
                ("marketRange", SchemaNode::String),
                ("analysis", SchemaNode::String),
                ("suggestedSalary", SchemaNode::String),
                ("comparisonWithExpected", SchemaNode::String),
            ]),
        ),
        (
            "alternatives",
            SchemaNode::array_of(SchemaNode::object(vec![
                ("jobTitle", SchemaNode::String),
                ("score", SchemaNode::Number),
                ("reason", SchemaNode::String),
            ])),
        ),
    ]
}
