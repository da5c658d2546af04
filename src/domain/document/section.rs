//! Document and section value types.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DocumentId, SectionId};

/// An addressable, ordered unit of a proposal holding editable text.
///
/// Only `content` changes during editing. `id`, `title` and `order` are
/// fixed by the document-creation flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub order: i32,
}

impl Section {
    /// Creates a section.
    pub fn new(
        id: impl Into<SectionId>,
        title: impl Into<String>,
        content: impl Into<String>,
        order: i32,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            order,
        }
    }

    /// Length of the content in characters, the unit cursor offsets use.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Review status of a proposal as reported by the persistence service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    #[default]
    Draft,
    InReview,
    Submitted,
    Archived,
    /// Any status this client does not know about.
    #[serde(other)]
    Other,
}

/// Everything about a document except its sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub id: DocumentId,
    pub title: String,
    /// External solicitation/reference number.
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub status: DocumentStatus,
}

/// A proposal as loaded from the persistence service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(flatten)]
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Document {
    /// Creates a draft document with no reference number.
    pub fn new(id: impl Into<DocumentId>, title: impl Into<String>, sections: Vec<Section>) -> Self {
        Self {
            metadata: DocumentMetadata {
                id: id.into(),
                title: title.into(),
                reference_number: None,
                status: DocumentStatus::Draft,
            },
            sections,
        }
    }

    /// Sets the external reference number.
    pub fn with_reference_number(mut self, reference: impl Into<String>) -> Self {
        self.metadata.reference_number = Some(reference.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_deserializes_from_flat_service_payload() {
        let json = r#"{
            "id": "prop-1",
            "title": "Cloud Migration",
            "reference_number": "W91QUZ-25-R-0001",
            "status": "in_review",
            "sections": [
                {"id": "s1", "title": "1.0 Intro", "content": "Hello", "order": 1},
                {"id": "s2", "title": "2.0 Approach", "order": 2}
            ]
        }"#;

        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.metadata.id, DocumentId::new("prop-1"));
        assert_eq!(doc.metadata.status, DocumentStatus::InReview);
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[1].content, "");
    }

    #[test]
    fn unknown_status_maps_to_other() {
        let status: DocumentStatus = serde_json::from_str("\"awarded\"").unwrap();
        assert_eq!(status, DocumentStatus::Other);
    }

    #[test]
    fn char_len_counts_characters_not_bytes() {
        let section = Section::new("s1", "Intro", "naïve", 1);
        assert_eq!(section.char_len(), 5);
    }
}
