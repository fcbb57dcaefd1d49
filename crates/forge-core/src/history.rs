use crate::artifact::ArtifactRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HistoryError {
    #[error("nothing to undo")]
    CannotUndo,
    #[error("nothing to redo")]
    CannotRedo,
}

/// Linear undo/redo history for one image. `edits[0]` is the original upload
/// and is never dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditHistory {
    edits: Vec<ArtifactRef>,
    current_index: usize,
}

impl EditHistory {
    pub fn new(initial: impl Into<ArtifactRef>) -> Self {
        Self {
            edits: vec![initial.into()],
            current_index: 0,
        }
    }

    /// Record a new edit. Anything ahead of the cursor is discarded first.
    pub fn append(&mut self, artifact: impl Into<ArtifactRef>) {
        self.edits.truncate(self.current_index + 1);
        self.edits.push(artifact.into());
        self.current_index = self.edits.len() - 1;
    }

    pub fn undo(&mut self) -> Result<&ArtifactRef, HistoryError> {
        if !self.can_undo() {
            return Err(HistoryError::CannotUndo);
        }
        self.current_index -= 1;
        Ok(self.current())
    }

    pub fn redo(&mut self) -> Result<&ArtifactRef, HistoryError> {
        if !self.can_redo() {
            return Err(HistoryError::CannotRedo);
        }
        self.current_index += 1;
        Ok(self.current())
    }

    pub fn current(&self) -> &ArtifactRef {
        &self.edits[self.current_index]
    }

    pub fn original(&self) -> &ArtifactRef {
        &self.edits[0]
    }

    pub fn can_undo(&self) -> bool {
        self.current_index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.current_index + 1 < self.edits.len()
    }

    pub fn is_edited(&self) -> bool {
        self.current_index > 0
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn edits(&self) -> &[ArtifactRef] {
        &self.edits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn encoded(history: &EditHistory) -> Vec<&str> {
        history.edits().iter().map(ArtifactRef::encoded).collect()
    }

    fn abc() -> EditHistory {
        let mut history = EditHistory::new("a");
        history.append("b");
        history.append("c");
        history
    }

    #[test]
    fn append_after_undo_discards_redo_branch() {
        let mut history = abc();
        assert_eq!(history.current_index(), 2);

        history.undo().expect("undo");
        assert_eq!(history.current_index(), 1);

        history.append("d");
        assert_eq!(encoded(&history), vec!["a", "b", "d"]);
        assert_eq!(history.current_index(), 2);
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_and_redo_are_inverses() {
        let original = abc();

        let mut history = original.clone();
        history.undo().expect("undo");
        history.redo().expect("redo");
        assert_eq!(history, original);

        let mut history = original.clone();
        history.undo().expect("undo");
        let rewound = history.clone();
        history.redo().expect("redo");
        history.undo().expect("undo");
        assert_eq!(history, rewound);
    }

    #[test]
    fn boundaries_report_errors_without_moving() {
        let mut history = EditHistory::new("original");
        assert_eq!(history.undo(), Err(HistoryError::CannotUndo));
        assert_eq!(history.redo(), Err(HistoryError::CannotRedo));
        assert_eq!(history.current_index(), 0);
        assert!(!history.is_edited());

        history.append("edit");
        assert_eq!(history.redo(), Err(HistoryError::CannotRedo));
        assert_eq!(history.current().encoded(), "edit");
        assert_eq!(history.original().encoded(), "original");
        assert!(history.is_edited());
    }

    #[test]
    fn undo_to_original_keeps_it_first() {
        let mut history = abc();
        history.undo().expect("undo");
        let current = history.undo().expect("undo").clone();
        assert_eq!(current.encoded(), "a");
        assert!(!history.is_edited());
        assert_eq!(history.len(), 3);
    }
}
