//! View-state types for the projects page

use crate::types::{Project, Task};

/// Load lifecycle of the page.
///
/// `Idle` means there is no session to load for.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub enum PagePhase {
    #[default]
    Idle,
    Loading,
    Loaded,
}

impl PagePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            PagePhase::Idle => "idle",
            PagePhase::Loading => "loading",
            PagePhase::Loaded => "loaded",
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum DraftField {
    Name,
    Description,
}

impl DraftField {
    pub fn toggle(self) -> Self {
        match self {
            DraftField::Name => DraftField::Description,
            DraftField::Description => DraftField::Name,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DraftField::Name => "name",
            DraftField::Description => "description",
        }
    }
}

/// Text typed into the create or edit form.
///
/// One draft is shared by both forms; opening an edit starts from empty text.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ProjectDraft {
    pub name: String,
    pub description: String,
}

impl ProjectDraft {
    pub fn field(&self, field: DraftField) -> &str {
        match field {
            DraftField::Name => &self.name,
            DraftField::Description => &self.description,
        }
    }

    pub fn field_mut(&mut self, field: DraftField) -> &mut String {
        match field {
            DraftField::Name => &mut self.name,
            DraftField::Description => &mut self.description,
        }
    }

    pub fn clear(&mut self) {
        self.name.clear();
        self.description.clear();
    }

    /// Values to save for `project`: the draft where typed, the stored value otherwise.
    pub fn resolve_against<'a>(&'a self, project: &'a Project) -> (&'a str, &'a str) {
        let name = if self.name.is_empty() {
            project.name.as_str()
        } else {
            self.name.as_str()
        };
        let description = if self.description.is_empty() {
            project.description.as_str()
        } else {
            self.description.as_str()
        };
        (name, description)
    }
}

/// One rendered project panel.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PanelView<'a> {
    pub project: &'a Project,
    pub tasks: Vec<&'a Task>,
    pub expanded: bool,
    pub editing: bool,
}
