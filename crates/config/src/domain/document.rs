//! Raw domain documents
//!
//! Serde mirror of config/domains/{domain}/domain.yaml. Everything here is
//! still stringly typed; `DomainValidator::build` validates and
//! compiles it.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::path::Path;

use crate::ConfigError;

/// Top-level domain document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub vocabulary: VocabularyDocument,
    #[serde(default)]
    pub endpoint_mappings: BTreeMap<String, EndpointDocument>,
    #[serde(default)]
    pub avoid_terms: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub validation_rules: ValidationRulesDocument,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// Vocabulary section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VocabularyDocument {
    /// Entity category -> surface terms
    #[serde(default)]
    pub entities: BTreeMap<String, Vec<String>>,
    /// Qualifier kind -> surface terms
    #[serde(default)]
    pub qualifiers: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub domain_terms: DomainTermsDocument,
    /// Domain term -> generic equivalents
    #[serde(default)]
    pub synonyms: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainTermsDocument {
    #[serde(default)]
    pub primary: Vec<String>,
    #[serde(default)]
    pub secondary: Vec<String>,
    #[serde(default)]
    pub context: Vec<String>,
}

/// One endpoint mapping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointDocument {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub primary_intents: Vec<String>,
    #[serde(default)]
    pub required_fields: Vec<String>,
    #[serde(default)]
    pub boost_terms: Vec<String>,
    #[serde(default)]
    pub penalty_terms: Vec<String>,
    #[serde(default)]
    pub confidence_threshold: Option<f64>,
}

/// Validator rules section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRulesDocument {
    /// Topic (personal_requests, technical_support, ...) -> patterns
    #[serde(default)]
    pub rejection_patterns: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub domain_indicators: DomainIndicatorsDocument,
    /// Redirect topic -> keywords and message
    #[serde(default)]
    pub topic_redirects: BTreeMap<String, TopicRedirectDocument>,
    #[serde(default)]
    pub generic_redirect: Option<String>,
    #[serde(default = "default_min_token_count")]
    pub min_token_count: usize,
}

impl Default for ValidationRulesDocument {
    fn default() -> Self {
        Self {
            rejection_patterns: BTreeMap::new(),
            domain_indicators: DomainIndicatorsDocument::default(),
            topic_redirects: BTreeMap::new(),
            generic_redirect: None,
            min_token_count: default_min_token_count(),
        }
    }
}

fn default_min_token_count() -> usize {
    2
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainIndicatorsDocument {
    #[serde(default)]
    pub required_subjects: Vec<String>,
    #[serde(default)]
    pub required_actions: Vec<String>,
    #[serde(default)]
    pub valid_contexts: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicRedirectDocument {
    #[serde(default)]
    pub keywords: Vec<String>,
    pub message: String,
}

impl DomainDocument {
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse domain YAML: {}", e)))
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse domain JSON: {}", e)))
    }

    /// Load a document, picking the format from the file extension
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let value = read_value(path.as_ref())?;
        Self::from_value(value)
    }

    /// Load a domain document deep-merged over a base defaults document
    ///
    /// Domain values win; a missing base file is not an error.
    pub fn load_layered<P: AsRef<Path>, Q: AsRef<Path>>(
        base: P,
        domain: Q,
    ) -> Result<Self, ConfigError> {
        let base = base.as_ref();
        let domain_value = read_value(domain.as_ref())?;

        let merged = if base.exists() {
            let base_value = read_value(base)?;
            merge_json(base_value, domain_value)
        } else {
            tracing::debug!("No base config found at {:?}", base);
            domain_value
        };

        Self::from_value(merged)
    }

    /// Load `config_dir/domains/{domain_id}/domain.yaml` over
    /// `config_dir/base/defaults.yaml`
    pub fn load_domain(domain_id: &str, config_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let base = config_dir.join("base/defaults.yaml");
        let domain = config_dir.join(format!("domains/{}/domain.yaml", domain_id));
        let mut document = Self::load_layered(base, domain)?;
        if document.name.is_empty() {
            document.name = domain_id.to_string();
        }
        Ok(document)
    }

    fn from_value(value: JsonValue) -> Result<Self, ConfigError> {
        serde_json::from_value(value)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse merged config: {}", e)))
    }
}

fn read_value(path: &Path) -> Result<JsonValue, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Parse(format!("Failed to read {}: {}", path.display(), e)))?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        serde_json::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse {}: {}", path.display(), e)))
    } else {
        serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse {}: {}", path.display(), e)))
    }
}

/// Deep merge two JSON values (right overrides left)
pub fn merge_json(left: JsonValue, right: JsonValue) -> JsonValue {
    match (left, right) {
        (JsonValue::Object(mut left_map), JsonValue::Object(right_map)) => {
            for (key, right_val) in right_map {
                let merged_val = if let Some(left_val) = left_map.remove(&key) {
                    merge_json(left_val, right_val)
                } else {
                    right_val
                };
                left_map.insert(key, merged_val);
            }
            JsonValue::Object(left_map)
        }
        (_, right) => right, // Right value wins for non-objects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_merge_json() {
        let base = serde_json::json!({
            "a": 1,
            "b": { "c": 2, "d": 3 }
        });
        let overlay = serde_json::json!({
            "b": { "c": 20 },
            "e": 5
        });
        let merged = merge_json(base, overlay);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"]["c"], 20);
        assert_eq!(merged["b"]["d"], 3);
        assert_eq!(merged["e"], 5);
    }

    #[test]
    fn test_yaml_defaults() {
        let doc = DomainDocument::from_yaml_str("name: retail\n").unwrap();
        assert_eq!(doc.name, "retail");
        assert_eq!(doc.version, "1.0");
        assert_eq!(doc.validation_rules.min_token_count, 2);
        assert!(doc.endpoint_mappings.is_empty());
    }

    #[test]
    fn test_parse_error() {
        let err = DomainDocument::from_yaml_str("endpoint_mappings: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_file_json_and_missing() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"name": "real_estate", "version": "2.1"}}"#).unwrap();
        let doc = DomainDocument::load_file(file.path()).unwrap();
        assert_eq!(doc.name, "real_estate");
        assert_eq!(doc.version, "2.1");

        let err = DomainDocument::load_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_domain_layered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("base")).unwrap();
        std::fs::create_dir_all(dir.path().join("domains/retail")).unwrap();
        std::fs::write(
            dir.path().join("base/defaults.yaml"),
            "validation_rules:\n  min_token_count: 3\n  generic_redirect: base redirect\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("domains/retail/domain.yaml"),
            "validation_rules:\n  min_token_count: 2\n",
        )
        .unwrap();

        let doc = DomainDocument::load_domain("retail", dir.path()).unwrap();
        assert_eq!(doc.name, "retail");
        assert_eq!(doc.validation_rules.min_token_count, 2);
        assert_eq!(
            doc.validation_rules.generic_redirect.as_deref(),
            Some("base redirect")
        );
    }
}
