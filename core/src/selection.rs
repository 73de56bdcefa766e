use std::collections::HashSet;

use crate::config::ProjectConfig;

/// Which enabled projects are chosen for the next run.
///
/// Selection is tracked by project name, so it does not depend on where a
/// project happens to be drawn on screen.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    projects: Vec<ProjectConfig>,
    selected: HashSet<String>,
}

impl SelectionState {
    /// Disabled projects are dropped here and never become selectable.
    pub fn new(projects: &[ProjectConfig]) -> Self {
        Self {
            projects: projects.iter().filter(|p| !p.disabled).cloned().collect(),
            selected: HashSet::new(),
        }
    }

    pub fn projects(&self) -> &[ProjectConfig] {
        &self.projects
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Toggles the project at `index` in the enabled list. Returns `false`
    /// when the index is out of range.
    pub fn toggle(&mut self, index: usize) -> bool {
        match self.projects.get(index) {
            Some(project) => {
                let name = project.name.clone();
                self.toggle_name(&name)
            }
            None => false,
        }
    }

    pub fn toggle_name(&mut self, name: &str) -> bool {
        if !self.projects.iter().any(|p| p.name == name) {
            return false;
        }

        if !self.selected.remove(name) {
            self.selected.insert(name.to_string());
        }
        true
    }

    pub fn select_all(&mut self) {
        self.selected = self.projects.iter().map(|p| p.name.clone()).collect();
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, name: &str) -> bool {
        self.selected.contains(name)
    }

    pub fn selected_names(&self) -> &HashSet<String> {
        &self.selected
    }

    /// Selected projects in display order.
    pub fn selected(&self) -> Vec<ProjectConfig> {
        self.projects
            .iter()
            .filter(|p| self.selected.contains(&p.name))
            .cloned()
            .collect()
    }
}
