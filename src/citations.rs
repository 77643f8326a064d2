//! Citation model and page grouping for answer references

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A pointer to one page of one reference document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    #[serde(rename = "source")]
    pub document_id: String,
    #[serde(rename = "page_number")]
    pub page_number: i64,
}

impl Citation {
    pub fn new(document_id: impl Into<String>, page_number: i64) -> Self {
        Self {
            document_id: document_id.into(),
            page_number,
        }
    }
}

/// All pages cited from a single document, in the order they were cited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedCitation {
    pub document_id: String,
    pub page_numbers: Vec<i64>,
}

impl GroupedCitation {
    /// Page list as shown to the user, e.g. `1, 2, 1`
    pub fn pages_label(&self) -> String {
        self.page_numbers
            .iter()
            .map(|page| page.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Group citations by document.
///
/// Documents come out in first-appearance order and pages keep their encounter
/// order. Repeated pages are kept as-is.
pub fn group_citations(citations: &[Citation]) -> Vec<GroupedCitation> {
    let mut groups: Vec<GroupedCitation> = Vec::new();
    let mut index_by_document: HashMap<&str, usize> = HashMap::new();

    for citation in citations {
        match index_by_document.get(citation.document_id.as_str()) {
            Some(&index) => groups[index].page_numbers.push(citation.page_number),
            None => {
                index_by_document.insert(citation.document_id.as_str(), groups.len());
                groups.push(GroupedCitation {
                    document_id: citation.document_id.clone(),
                    page_numbers: vec![citation.page_number],
                });
            }
        }
    }

    groups
}
