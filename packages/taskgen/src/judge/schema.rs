use std::fmt::Write;

use serde_json::{Value, json};
use thiserror::Error;

use crate::rubric::{RubricItem, total_points};

/// A run passes when its total reaches this fraction of the maximum.
pub const PASS_FRACTION: f64 = 0.5;

/// One bounded integer field of the score contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreField {
    /// Python/JSON identifier, e.g. `accuracy_score`.
    pub key: String,
    /// Rubric category name.
    pub label: String,
    pub description: String,
    pub max_points: u32,
}

/// The scoring contract derived from a rubric: one `0..=points` field per
/// category, a `total` bounded by the summed points and free-text feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreSchema {
    pub fields: Vec<ScoreField>,
    pub max_total: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    #[error("judge response is not a JSON object")]
    NotAnObject,
    #[error("missing field '{0}'")]
    Missing(String),
    #[error("field '{0}' must be an integer")]
    NotInteger(String),
    #[error("field '{field}' = {value} is outside 0..={max}")]
    OutOfRange { field: String, value: i64, max: u32 },
    #[error("field 'feedback' must be a string")]
    FeedbackNotString,
}

/// A structurally valid judge answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreCard {
    /// `(key, points)` in rubric order.
    pub scores: Vec<(String, u32)>,
    pub total: u32,
    pub feedback: String,
}

impl ScoreCard {
    pub fn passes(&self, schema: &ScoreSchema) -> bool {
        f64::from(self.total) >= f64::from(schema.max_total) * PASS_FRACTION
    }
}

fn field_key(name: &str, index: usize) -> String {
    let mut key = String::new();
    let mut pending = false;
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending && !key.is_empty() {
                key.push('_');
            }
            pending = false;
            key.push(c);
        } else {
            pending = true;
        }
    }
    if key.is_empty() {
        key = format!("category_{}", index + 1);
    } else if key.starts_with(|c: char| c.is_ascii_digit()) {
        key.insert_str(0, "c_");
    }
    key.push_str("_score");
    key
}

impl ScoreSchema {
    pub fn from_rubric(items: &[RubricItem]) -> Self {
        let mut fields: Vec<ScoreField> = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let base = field_key(&item.name, i);
            let mut key = base.clone();
            let mut n = 2;
            while fields.iter().any(|f| f.key == key) {
                key = format!("{base}_{n}");
                n += 1;
            }
            fields.push(ScoreField {
                key,
                label: item.name.clone(),
                description: item.description_or_default().to_string(),
                max_points: item.points,
            });
        }
        Self {
            fields,
            max_total: total_points(items),
        }
    }

    /// JSON Schema of the expected judge answer, embedded in prompts.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for field in &self.fields {
            properties.insert(
                field.key.clone(),
                json!({
                    "type": "integer",
                    "minimum": 0,
                    "maximum": field.max_points,
                    "description": format!("{}: {}", field.label, field.description),
                }),
            );
            required.push(field.key.clone());
        }
        properties.insert(
            "total".into(),
            json!({"type": "integer", "minimum": 0, "maximum": self.max_total}),
        );
        properties.insert("feedback".into(), json!({"type": "string"}));
        required.push("total".into());
        required.push("feedback".into());

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    pub fn validate(&self, value: &Value) -> Result<ScoreCard, Vec<SchemaViolation>> {
        let Some(obj) = value.as_object() else {
            return Err(vec![SchemaViolation::NotAnObject]);
        };

        let mut violations = Vec::new();
        let mut scores = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            if let Some(points) = bounded_int(obj.get(&field.key), &field.key, field.max_points, &mut violations) {
                scores.push((field.key.clone(), points));
            }
        }
        let total = bounded_int(obj.get("total"), "total", self.max_total, &mut violations);

        let feedback = match obj.get("feedback") {
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                violations.push(SchemaViolation::FeedbackNotString);
                None
            }
            None => {
                violations.push(SchemaViolation::Missing("feedback".into()));
                None
            }
        };

        match (violations.is_empty(), total, feedback) {
            (true, Some(total), Some(feedback)) => Ok(ScoreCard {
                scores,
                total,
                feedback,
            }),
            _ => Err(violations),
        }
    }
}

fn bounded_int(
    value: Option<&Value>,
    field: &str,
    max: u32,
    violations: &mut Vec<SchemaViolation>,
) -> Option<u32> {
    let Some(value) = value else {
        violations.push(SchemaViolation::Missing(field.to_string()));
        return None;
    };
    let parsed = value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.is_finite())
            .map(|f| f as i64)
    });
    let Some(n) = parsed else {
        violations.push(SchemaViolation::NotInteger(field.to_string()));
        return None;
    };
    if n < 0 || n > i64::from(max) {
        violations.push(SchemaViolation::OutOfRange {
            field: field.to_string(),
            value: n,
            max,
        });
        return None;
    }
    Some(n as u32)
}

/// Integer ceiling of `points * tenths / 10`.
fn ceil_fraction(points: u32, tenths: u32) -> u32 {
    (points * tenths).div_ceil(10)
}

fn band(lo: u32, hi: u32) -> Option<String> {
    match lo.cmp(&hi) {
        std::cmp::Ordering::Less => Some(format!("{lo}-{hi} points")),
        std::cmp::Ordering::Equal => Some(format!("{lo} points")),
        std::cmp::Ordering::Greater => None,
    }
}

/// Human-readable scoring guide with qualitative tiers per category.
pub fn scoring_guide(items: &[RubricItem]) -> String {
    let mut out = String::new();
    for (i, item) in items.iter().enumerate() {
        let p = item.points;
        let good = ceil_fraction(p, 7);
        let fair = ceil_fraction(p, 4);

        let _ = writeln!(out, "Category {}: {} ({} points)", i + 1, item.name, p);
        let _ = writeln!(out, "  {}", item.description_or_default());
        let tiers = [
            ("Excellent (~100%)", band(p, p)),
            ("Good (~70-99%)", band(good, p.saturating_sub(1))),
            ("Fair (~40-69%)", band(fair, good.saturating_sub(1))),
            ("Poor (~1-39%)", band(1, fair.saturating_sub(1))),
            ("Missing (0)", Some("0 points".to_string())),
        ];
        for (label, range) in tiers {
            if let Some(range) = range {
                let _ = writeln!(out, "  - {label}: {range}");
            }
        }
        out.push('\n');
    }
    let total = total_points(items);
    let _ = write!(
        out,
        "Maximum total: {total} points. Passing requires at least {} points.",
        (f64::from(total) * PASS_FRACTION).ceil() as u32
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rubric() -> Vec<RubricItem> {
        vec![
            RubricItem::new("Accuracy", "Numbers match", 10),
            RubricItem::new("Code Quality!", "", 15),
            RubricItem::new("accuracy", "dup", 5),
        ]
    }

    #[test]
    fn keys_are_unique_identifiers() {
        let schema = ScoreSchema::from_rubric(&rubric());
        let keys: Vec<&str> = schema.fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["accuracy_score", "code_quality_score", "accuracy_score_2"]);
        assert_eq!(schema.max_total, 30);

        let odd = ScoreSchema::from_rubric(&[
            RubricItem::new("1st pass", "", 1),
            RubricItem::new("!!!", "", 1),
        ]);
        assert_eq!(odd.fields[0].key, "c_1st_pass_score");
        assert_eq!(odd.fields[1].key, "category_2_score");
    }

    #[test]
    fn validates_bounds_and_types() {
        let schema = ScoreSchema::from_rubric(&rubric());
        let ok = json!({
            "accuracy_score": 10, "code_quality_score": 12, "accuracy_score_2": 0,
            "total": 22, "feedback": "solid"
        });
        let card = schema.validate(&ok).unwrap();
        assert_eq!(card.total, 22);
        assert_eq!(card.scores[1], ("code_quality_score".to_string(), 12));
        assert!(card.passes(&schema));

        let bad = json!({
            "accuracy_score": 11, "code_quality_score": "high",
            "total": 31, "feedback": 3
        });
        let violations = schema.validate(&bad).unwrap_err();
        assert!(violations.contains(&SchemaViolation::OutOfRange {
            field: "accuracy_score".into(),
            value: 11,
            max: 10
        }));
        assert!(violations.contains(&SchemaViolation::NotInteger("code_quality_score".into())));
        assert!(violations.contains(&SchemaViolation::Missing("accuracy_score_2".into())));
        assert!(violations.contains(&SchemaViolation::FeedbackNotString));
        assert_eq!(violations.len(), 5);

        assert_eq!(
            schema.validate(&json!([1, 2])).unwrap_err(),
            vec![SchemaViolation::NotAnObject]
        );
    }

    #[test]
    fn pass_mark_is_half_of_maximum() {
        let schema = ScoreSchema::from_rubric(&rubric());
        let card = |total| ScoreCard {
            scores: vec![],
            total,
            feedback: String::new(),
        };
        assert!(card(15).passes(&schema));
        assert!(!card(14).passes(&schema));
    }

    #[test]
    fn guide_lists_tiers_per_category() {
        let guide = scoring_guide(&[RubricItem::new("Accuracy", "Numbers match", 10)]);
        assert!(guide.contains("Category 1: Accuracy (10 points)"));
        assert!(guide.contains("  - Excellent (~100%): 10 points"));
        assert!(guide.contains("  - Good (~70-99%): 7-9 points"));
        assert!(guide.contains("  - Fair (~40-69%): 4-6 points"));
        assert!(guide.contains("  - Poor (~1-39%): 1-3 points"));
        assert!(guide.contains("  - Missing (0): 0 points"));
        assert!(guide.ends_with("Maximum total: 10 points. Passing requires at least 5 points."));
    }

    #[test]
    fn guide_omits_empty_bands_for_tiny_ceilings() {
        let guide = scoring_guide(&[RubricItem::new("Tiny", "", 1)]);
        assert!(guide.contains("Excellent (~100%): 1 points"));
        assert!(!guide.contains("Good"));
        assert!(!guide.contains("Fair"));
        assert!(!guide.contains("Poor"));
    }

    #[test]
    fn json_schema_lists_required_fields() {
        let schema = ScoreSchema::from_rubric(&rubric());
        let js = schema.to_json_schema();
        assert_eq!(js["required"].as_array().unwrap().len(), 5);
        assert_eq!(js["properties"]["accuracy_score"]["maximum"], 10);
        assert_eq!(js["properties"]["total"]["maximum"], 30);
    }
}
