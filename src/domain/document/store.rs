//! In-memory ordered collection of sections.

use std::collections::HashMap;

use crate::domain::foundation::SectionId;

use super::{Section, WorkspaceError};

/// Locally known content of every section, in load order.
///
/// Lookups by id go through an index built at load time; the set of
/// sections never changes afterwards, only their content.
#[derive(Debug, Clone, Default)]
pub struct SectionStore {
    sections: Vec<Section>,
    index: HashMap<SectionId, usize>,
}

impl SectionStore {
    /// Builds a store from sections in the order the service returned them.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateSection` if two sections share an id.
    pub fn from_sections(sections: Vec<Section>) -> Result<Self, WorkspaceError> {
        let mut index = HashMap::with_capacity(sections.len());
        for (position, section) in sections.iter().enumerate() {
            if index.insert(section.id.clone(), position).is_some() {
                return Err(WorkspaceError::DuplicateSection(section.id.clone()));
            }
        }
        Ok(Self { sections, index })
    }

    pub fn get(&self, id: &SectionId) -> Option<&Section> {
        self.index.get(id).map(|&i| &self.sections[i])
    }

    pub fn content(&self, id: &SectionId) -> Option<&str> {
        self.get(id).map(|s| s.content.as_str())
    }

    pub fn contains(&self, id: &SectionId) -> bool {
        self.index.contains_key(id)
    }

    /// Overwrites one section's content.
    pub fn set_content(&mut self, id: &SectionId, content: impl Into<String>) -> Result<(), WorkspaceError> {
        let position = *self
            .index
            .get(id)
            .ok_or_else(|| WorkspaceError::UnknownSection(id.clone()))?;
        self.sections[position].content = content.into();
        Ok(())
    }

    /// The first section in load order.
    pub fn first(&self) -> Option<&Section> {
        self.sections.first()
    }

    /// Sections in load order.
    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    /// Sections sorted by ascending `order`; ties keep load order.
    pub fn ordered(&self) -> Vec<&Section> {
        let mut sorted: Vec<&Section> = self.sections.iter().collect();
        sorted.sort_by_key(|s| s.order);
        sorted
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sections() -> Vec<Section> {
        vec![
            Section::new("s3", "3.0 Team", "", 3),
            Section::new("s1", "1.0 Intro", "hello", 1),
            Section::new("s2", "2.0 Approach", "", 2),
        ]
    }

    #[test]
    fn keeps_load_order_for_iteration() {
        let store = SectionStore::from_sections(sections()).unwrap();
        let ids: Vec<&str> = store.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s3", "s1", "s2"]);
        assert_eq!(store.first().unwrap().id, SectionId::new("s3"));
    }

    #[test]
    fn ordered_sorts_by_order_field() {
        let store = SectionStore::from_sections(sections()).unwrap();
        let ids: Vec<&str> = store.ordered().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2", "s3"]);
    }

    #[test]
    fn set_content_overwrites_only_target() {
        let mut store = SectionStore::from_sections(sections()).unwrap();
        store.set_content(&SectionId::new("s2"), "draft").unwrap();

        assert_eq!(store.content(&SectionId::new("s2")), Some("draft"));
        assert_eq!(store.content(&SectionId::new("s1")), Some("hello"));
    }

    #[test]
    fn set_content_rejects_unknown_section() {
        let mut store = SectionStore::from_sections(sections()).unwrap();
        let err = store.set_content(&SectionId::new("nope"), "x").unwrap_err();
        assert_eq!(err, WorkspaceError::UnknownSection(SectionId::new("nope")));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut dupes = sections();
        dupes.push(Section::new("s1", "again", "", 9));
        let err = SectionStore::from_sections(dupes).unwrap_err();
        assert_eq!(err, WorkspaceError::DuplicateSection(SectionId::new("s1")));
    }
}
