//! Dataset metadata snapshot
//!
//! Field values are ingested once as tagged `FieldValue`s and reduced to
//! `FieldCharacteristics`; routing never looks at raw records. The
//! `routing_history` handle is shared between snapshots so that a metadata
//! refresh does not lose learned outcomes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use crate::history::RoutingHistory;
use crate::ids::{Category, FieldName};

/// A single ingested value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Numeric(f64),
    Categorical(String),
    /// Opaque geometry reference (WKT, GeoJSON id, ...)
    Geometry(String),
    Missing,
}

impl FieldValue {
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Missing => true,
            Self::Numeric(v) => v.is_nan(),
            Self::Categorical(s) | Self::Geometry(s) => s.trim().is_empty(),
        }
    }

    /// Key used for distinct counting
    fn distinct_key(&self) -> Option<String> {
        match self {
            _ if self.is_missing() => None,
            Self::Numeric(v) => Some(format!("n:{}", v.to_bits())),
            Self::Categorical(s) => Some(format!("c:{}", s)),
            Self::Geometry(s) => Some(format!("g:{}", s)),
            Self::Missing => None,
        }
    }
}

/// Precomputed quality metadata of one field, all values in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldCharacteristics {
    /// Share of non-missing values
    pub coverage: f64,
    /// Normalized dispersion (numeric: var / (mean² + var); categorical: Gini impurity)
    pub variance: f64,
    /// Distinct non-missing values / non-missing values
    pub uniqueness: f64,
    /// How useful the field is for analysis
    pub relevance_score: f64,
}

impl FieldCharacteristics {
    /// Fully covered, fully relevant field
    pub fn complete() -> Self {
        Self {
            coverage: 1.0,
            variance: 0.5,
            uniqueness: 1.0,
            relevance_score: 1.0,
        }
    }

    /// Clamp every metric into `[0, 1]`
    pub fn clamped(self) -> Self {
        Self {
            coverage: clamp_unit(self.coverage),
            variance: clamp_unit(self.variance),
            uniqueness: clamp_unit(self.uniqueness),
            relevance_score: clamp_unit(self.relevance_score),
        }
    }

    /// Compute characteristics from ingested values
    ///
    /// Relevance is derived from coverage, halved for constant columns.
    pub fn from_values(values: &[FieldValue]) -> Self {
        if values.is_empty() {
            return Self {
                coverage: 0.0,
                variance: 0.0,
                uniqueness: 0.0,
                relevance_score: 0.0,
            };
        }

        let present: Vec<&FieldValue> = values.iter().filter(|v| !v.is_missing()).collect();
        let coverage = present.len() as f64 / values.len() as f64;

        let distinct: HashSet<String> = present.iter().filter_map(|v| v.distinct_key()).collect();
        let uniqueness = if present.is_empty() {
            0.0
        } else {
            distinct.len() as f64 / present.len() as f64
        };

        let variance = normalized_dispersion(&present);
        let relevance_score = if variance > 0.0 { coverage } else { coverage * 0.5 };

        Self {
            coverage,
            variance,
            uniqueness,
            relevance_score,
        }
        .clamped()
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

fn normalized_dispersion(present: &[&FieldValue]) -> f64 {
    let numbers: Vec<f64> = present
        .iter()
        .filter_map(|v| match v {
            FieldValue::Numeric(n) => Some(*n),
            _ => None,
        })
        .collect();

    if !numbers.is_empty() && numbers.len() == present.len() {
        let n = numbers.len() as f64;
        let mean = numbers.iter().sum::<f64>() / n;
        let var = numbers.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let denom = mean * mean + var;
        return if denom == 0.0 { 0.0 } else { var / denom };
    }

    // Categorical / geometry / mixed: Gini impurity of the value distribution
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for v in present {
        if let Some(key) = v.distinct_key() {
            *counts.entry(key).or_default() += 1;
        }
    }
    let total = present.len() as f64;
    if total == 0.0 {
        return 0.0;
    }
    1.0 - counts
        .values()
        .map(|c| {
            let p = *c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

/// One ingested row
pub type DatasetRecord = BTreeMap<FieldName, FieldValue>;

/// Read-mostly dataset snapshot used by context enhancement
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetContext {
    #[serde(default)]
    pub available_fields: BTreeMap<Category, BTreeSet<FieldName>>,
    #[serde(default)]
    pub field_characteristics: BTreeMap<FieldName, FieldCharacteristics>,
    #[serde(skip)]
    pub routing_history: Arc<RoutingHistory>,
}

impl DatasetContext {
    /// Empty snapshot with a fresh history store
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: register a field with its characteristics
    pub fn with_field(
        mut self,
        category: Category,
        field: FieldName,
        characteristics: FieldCharacteristics,
    ) -> Self {
        self.insert_field(category, field, characteristics);
        self
    }

    /// Builder: share an existing history store
    pub fn with_history(mut self, history: Arc<RoutingHistory>) -> Self {
        self.routing_history = history;
        self
    }

    pub fn insert_field(
        &mut self,
        category: Category,
        field: FieldName,
        characteristics: FieldCharacteristics,
    ) {
        self.available_fields
            .entry(category)
            .or_default()
            .insert(field.clone());
        self.field_characteristics
            .insert(field, characteristics.clamped());
    }

    /// Remove a field from every category; characteristics are kept
    pub fn remove_field(&mut self, field: &FieldName) -> bool {
        let mut removed = false;
        for fields in self.available_fields.values_mut() {
            removed |= fields.remove(field);
        }
        self.available_fields.retain(|_, fields| !fields.is_empty());
        removed
    }

    /// Whether the field is listed under any category
    pub fn is_available(&self, field: &FieldName) -> bool {
        self.available_fields.values().any(|fields| fields.contains(field))
    }

    pub fn characteristics(&self, field: &FieldName) -> Option<&FieldCharacteristics> {
        self.field_characteristics.get(field)
    }

    /// Category a field is listed under, if any
    pub fn category_of(&self, field: &FieldName) -> Option<&Category> {
        self.available_fields
            .iter()
            .find(|(_, fields)| fields.contains(field))
            .map(|(category, _)| category)
    }

    pub fn field_count(&self) -> usize {
        self.available_fields.values().map(|f| f.len()).sum()
    }

    /// Ingest raw records, computing characteristics once per field
    ///
    /// `schema` assigns each field to a category; fields absent from a record
    /// count as missing for that record.
    pub fn from_records(schema: &BTreeMap<FieldName, Category>, records: &[DatasetRecord]) -> Self {
        let mut context = Self::new();
        for (field, category) in schema {
            let values: Vec<FieldValue> = records
                .iter()
                .map(|r| r.get(field).cloned().unwrap_or(FieldValue::Missing))
                .collect();
            let characteristics = FieldCharacteristics::from_values(&values);
            context.insert_field(category.clone(), field.clone(), characteristics);
        }
        tracing::debug!(
            fields = context.field_count(),
            records = records.len(),
            "Ingested dataset records"
        );
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> FieldName {
        FieldName::parse(name).unwrap()
    }

    fn category(name: &str) -> Category {
        Category::parse(name).unwrap()
    }

    #[test]
    fn test_characteristics_numeric() {
        let values = vec![
            FieldValue::Numeric(10.0),
            FieldValue::Numeric(20.0),
            FieldValue::Missing,
            FieldValue::Numeric(30.0),
        ];
        let c = FieldCharacteristics::from_values(&values);
        assert!((c.coverage - 0.75).abs() < 1e-9);
        assert_eq!(c.uniqueness, 1.0);
        assert!(c.variance > 0.0 && c.variance < 1.0);
        assert!((c.relevance_score - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_characteristics_constant_column() {
        let values = vec![FieldValue::Categorical("a".into()); 4];
        let c = FieldCharacteristics::from_values(&values);
        assert_eq!(c.coverage, 1.0);
        assert_eq!(c.variance, 0.0);
        assert_eq!(c.uniqueness, 0.25);
        assert_eq!(c.relevance_score, 0.5);
    }

    #[test]
    fn test_characteristics_empty_and_nan() {
        let c = FieldCharacteristics::from_values(&[]);
        assert_eq!(c.coverage, 0.0);

        let c = FieldCharacteristics::from_values(&[FieldValue::Numeric(f64::NAN)]);
        assert_eq!(c.coverage, 0.0);
    }

    #[test]
    fn test_from_records() {
        let mut schema = BTreeMap::new();
        schema.insert(field("population"), category("demographic"));
        schema.insert(field("store_count"), category("competitive"));

        let mut row1 = DatasetRecord::new();
        row1.insert(field("population"), FieldValue::Numeric(1200.0));
        row1.insert(field("store_count"), FieldValue::Numeric(3.0));
        let mut row2 = DatasetRecord::new();
        row2.insert(field("population"), FieldValue::Numeric(800.0));

        let ctx = DatasetContext::from_records(&schema, &[row1, row2]);
        assert!(ctx.is_available(&field("population")));
        assert_eq!(ctx.category_of(&field("store_count")).unwrap().as_str(), "competitive");
        let sc = ctx.characteristics(&field("store_count")).unwrap();
        assert!((sc.coverage - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_remove_field() {
        let mut ctx = DatasetContext::new().with_field(
            category("demographic"),
            field("median_age"),
            FieldCharacteristics::complete(),
        );
        assert!(ctx.remove_field(&field("median_age")));
        assert!(!ctx.is_available(&field("median_age")));
        assert!(ctx.available_fields.is_empty());
        assert!(!ctx.remove_field(&field("median_age")));
    }

    #[test]
    fn test_snapshot_deserialization() {
        let json = r#"{
            "available_fields": { "demographic": ["population", "median_income"] },
            "field_characteristics": {
                "population": { "coverage": 1.0, "variance": 0.4, "uniqueness": 0.9, "relevance_score": 0.95 }
            }
        }"#;
        let ctx: DatasetContext = serde_json::from_str(json).unwrap();
        assert_eq!(ctx.field_count(), 2);
        assert!(ctx.routing_history.is_empty());
    }
}
