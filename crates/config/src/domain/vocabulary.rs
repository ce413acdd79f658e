//! Domain vocabulary
//!
//! Entities, qualifiers, weighted domain terms and the synonym graph of one
//! vertical. All terms are lower-cased at load.

use std::collections::{BTreeMap, BTreeSet};

use super::document::VocabularyDocument;

/// Domain terms by weight tier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainTerms {
    pub primary: BTreeSet<String>,
    pub secondary: BTreeSet<String>,
    pub context: BTreeSet<String>,
}

impl DomainTerms {
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty() && self.context.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainVocabulary {
    /// Entity category -> terms
    pub entities: BTreeMap<String, BTreeSet<String>>,
    /// Qualifier kind -> terms
    pub qualifiers: BTreeMap<String, BTreeSet<String>>,
    pub domain_terms: DomainTerms,
    /// Directed synonym edges: domain term -> generic equivalents
    pub synonyms: BTreeMap<String, BTreeSet<String>>,
}

fn normalize_set(terms: &[String]) -> BTreeSet<String> {
    terms
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

fn normalize_map(map: &BTreeMap<String, Vec<String>>) -> BTreeMap<String, BTreeSet<String>> {
    map.iter()
        .map(|(k, v)| (k.trim().to_lowercase(), normalize_set(v)))
        .filter(|(k, _)| !k.is_empty())
        .collect()
}

impl DomainVocabulary {
    pub fn from_document(doc: &VocabularyDocument) -> Self {
        Self {
            entities: normalize_map(&doc.entities),
            qualifiers: normalize_map(&doc.qualifiers),
            domain_terms: DomainTerms {
                primary: normalize_set(&doc.domain_terms.primary),
                secondary: normalize_set(&doc.domain_terms.secondary),
                context: normalize_set(&doc.domain_terms.context),
            },
            synonyms: normalize_map(&doc.synonyms),
        }
    }

    /// Synonyms in both directions, self-references dropped
    pub fn bidirectional_synonyms(&self) -> BTreeMap<String, BTreeSet<String>> {
        let mut graph: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (term, targets) in &self.synonyms {
            for target in targets {
                if target == term {
                    continue;
                }
                graph.entry(term.clone()).or_default().insert(target.clone());
                graph.entry(target.clone()).or_default().insert(term.clone());
            }
        }
        graph
    }

    /// Total number of distinct terms across all sections
    pub fn term_count(&self) -> usize {
        let mut all: BTreeSet<&String> = BTreeSet::new();
        all.extend(self.entities.values().flatten());
        all.extend(self.qualifiers.values().flatten());
        all.extend(self.domain_terms.primary.iter());
        all.extend(self.domain_terms.secondary.iter());
        all.extend(self.domain_terms.context.iter());
        all.extend(self.synonyms.keys());
        all.extend(self.synonyms.values().flatten());
        all.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_and_bidirectional() {
        let mut doc = VocabularyDocument::default();
        doc.synonyms.insert(
            " Rival ".into(),
            vec!["Competitor".into(), "rival".into(), " ".into()],
        );
        doc.domain_terms.primary = vec!["Market".into(), "market".into()];

        let vocab = DomainVocabulary::from_document(&doc);
        assert_eq!(vocab.domain_terms.primary.len(), 1);
        assert!(vocab.synonyms["rival"].contains("competitor"));

        let graph = vocab.bidirectional_synonyms();
        assert!(graph["competitor"].contains("rival"));
        assert!(!graph["rival"].contains("rival"));
        assert_eq!(vocab.term_count(), 3);
    }
}
