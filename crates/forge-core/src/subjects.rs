use forge_media::ImageFile;

use crate::artifact::ArtifactRef;
use crate::history::EditHistory;

/// Stable identity of an uploaded image. Positions shift on removal; ids do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubjectId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    id: SubjectId,
    pub name: String,
    pub mime_type: String,
    pub history: EditHistory,
}

impl Subject {
    pub fn id(&self) -> SubjectId {
        self.id
    }

    pub fn current(&self) -> &ArtifactRef {
        self.history.current()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubjectError {
    #[error("no image at position {index} (have {len})")]
    OutOfRange { index: usize, len: usize },
}

/// The ordered set of images uploaded in photo mode, plus which one is active.
#[derive(Debug, Default, Clone)]
pub struct SubjectCollection {
    subjects: Vec<Subject>,
    active: Option<SubjectId>,
    next_id: u64,
}

impl SubjectCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append images, each seeded with a fresh history, and activate the
    /// first of them. Returns that position, or `None` when `images` is empty.
    pub fn add(&mut self, images: impl IntoIterator<Item = ImageFile>) -> Option<usize> {
        let first = self.subjects.len();
        for image in images {
            let id = SubjectId(self.next_id);
            self.next_id += 1;
            self.subjects.push(Subject {
                id,
                name: image.name,
                mime_type: image.mime_type,
                history: EditHistory::new(image.encoded),
            });
        }

        let added = self.subjects.get(first)?;
        self.active = Some(added.id);
        tracing::debug!(count = self.subjects.len() - first, "added subjects");
        Some(first)
    }

    pub fn remove(&mut self, index: usize) -> Result<Subject, SubjectError> {
        self.check(index)?;
        let removed = self.subjects.remove(index);

        if self.active == Some(removed.id) {
            self.active = if self.subjects.is_empty() {
                None
            } else {
                let clamped = index.min(self.subjects.len() - 1);
                Some(self.subjects[clamped].id)
            };
        }
        // Any other active subject keeps its id; its position follows from
        // the vector, so removal before it shifts it down by one.
        Ok(removed)
    }

    pub fn select(&mut self, index: usize) -> Result<(), SubjectError> {
        self.check(index)?;
        self.active = Some(self.subjects[index].id);
        Ok(())
    }

    pub fn active(&self) -> Option<&Subject> {
        let id = self.active?;
        self.subjects.iter().find(|subject| subject.id == id)
    }

    pub fn active_mut(&mut self) -> Option<&mut Subject> {
        let id = self.active?;
        self.subjects.iter_mut().find(|subject| subject.id == id)
    }

    pub fn active_index(&self) -> Option<usize> {
        let id = self.active?;
        self.position(id)
    }

    pub fn position(&self, id: SubjectId) -> Option<usize> {
        self.subjects.iter().position(|subject| subject.id == id)
    }

    pub fn get(&self, index: usize) -> Option<&Subject> {
        self.subjects.get(index)
    }

    pub fn by_id_mut(&mut self, id: SubjectId) -> Option<&mut Subject> {
        self.subjects.iter_mut().find(|subject| subject.id == id)
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subject> {
        self.subjects.iter()
    }

    pub fn clear(&mut self) {
        self.subjects.clear();
        self.active = None;
    }

    fn check(&self, index: usize) -> Result<(), SubjectError> {
        if index < self.subjects.len() {
            Ok(())
        } else {
            Err(SubjectError::OutOfRange {
                index,
                len: self.subjects.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn image(name: &str) -> ImageFile {
        ImageFile {
            name: name.to_string(),
            mime_type: "image/png".to_string(),
            encoded: forge_media::encode(name),
        }
    }

    fn collection(names: &[&str]) -> SubjectCollection {
        let mut subjects = SubjectCollection::new();
        subjects.add(names.iter().map(|name| image(name)));
        subjects
    }

    fn names(subjects: &SubjectCollection) -> Vec<&str> {
        subjects.iter().map(|subject| subject.name.as_str()).collect()
    }

    #[test]
    fn add_activates_first_new_subject() {
        let mut subjects = collection(&["s0"]);
        assert_eq!(subjects.active_index(), Some(0));

        let first = subjects.add([image("s1"), image("s2")]);
        assert_eq!(first, Some(1));
        assert_eq!(subjects.active_index(), Some(1));
        assert_eq!(subjects.len(), 3);

        assert_eq!(subjects.add(Vec::new()), None);
        assert_eq!(subjects.active_index(), Some(1));
    }

    #[test]
    fn removing_before_active_shifts_it_down() {
        let mut subjects = collection(&["s0", "s1", "s2"]);
        subjects.select(2).expect("select");

        subjects.remove(1).expect("remove");
        assert_eq!(names(&subjects), vec!["s0", "s2"]);
        assert_eq!(subjects.active_index(), Some(1));
        assert_eq!(subjects.active().map(|s| s.name.as_str()), Some("s2"));
    }

    #[test]
    fn removing_active_clamps_to_last_position() {
        let mut subjects = collection(&["s0", "s1"]);
        subjects.select(1).expect("select");

        subjects.remove(1).expect("remove");
        assert_eq!(subjects.active_index(), Some(0));

        subjects.remove(0).expect("remove");
        assert!(subjects.is_empty());
        assert_eq!(subjects.active_index(), None);
    }

    #[test]
    fn removing_active_in_the_middle_keeps_position() {
        let mut subjects = collection(&["s0", "s1", "s2"]);
        subjects.select(1).expect("select");

        subjects.remove(1).expect("remove");
        assert_eq!(subjects.active().map(|s| s.name.as_str()), Some("s2"));
        assert_eq!(subjects.active_index(), Some(1));
    }

    #[test]
    fn removing_after_active_changes_nothing() {
        let mut subjects = collection(&["s0", "s1", "s2"]);

        subjects.remove(2).expect("remove");
        assert_eq!(subjects.active_index(), Some(0));
    }

    #[test]
    fn out_of_range_is_rejected() {
        let mut subjects = collection(&["s0"]);
        assert_eq!(
            subjects.remove(3).map(|s| s.name),
            Err(SubjectError::OutOfRange { index: 3, len: 1 })
        );
        assert_eq!(subjects.select(1), Err(SubjectError::OutOfRange { index: 1, len: 1 }));
        assert_eq!(subjects.len(), 1);
    }

    #[test]
    fn histories_are_independent() {
        let mut subjects = collection(&["s0", "s1"]);
        subjects
            .active_mut()
            .expect("active")
            .history
            .append("edited");

        subjects.select(1).expect("select");
        assert!(!subjects.active().expect("active").history.is_edited());
        assert!(subjects.get(0).expect("s0").history.is_edited());
    }
}
