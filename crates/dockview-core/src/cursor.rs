//! Selection cursor over the flattened project tree
//!
//! The cursor follows a container by ID, not by row index. When the selected
//! container disappears it falls back, in order, to:
//! 1. the same position (clamped) among the remaining visible containers of its project
//! 2. the first visible row, when the project is gone or has nothing visible
//! 3. nothing, when there are no rows at all

use crate::tree::Row;
use dockview_runtime::{ContainerId, ProjectLabel};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Selection {
    id: ContainerId,
    project: ProjectLabel,
    /// Position among the visible rows of `project` when last seen
    index_in_project: usize,
}

/// Highlighted container, tracked by stable ID
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    selected: Option<Selection>,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_id(&self) -> Option<&ContainerId> {
        self.selected.as_ref().map(|s| &s.id)
    }

    pub fn selected_project(&self) -> Option<&ProjectLabel> {
        self.selected.as_ref().map(|s| &s.project)
    }

    /// Row index of the selection, if it is visible in `rows`
    pub fn row(&self, rows: &[Row<'_>]) -> Option<usize> {
        let selected = self.selected.as_ref()?;
        rows.iter().position(|r| r.container.id == selected.id)
    }

    /// Select the row at `index`, clamped to the last row
    pub fn select_row(&mut self, rows: &[Row<'_>], index: usize) {
        if rows.is_empty() {
            self.selected = None;
            return;
        }
        let index = index.min(rows.len() - 1);
        let row = rows[index];
        let index_in_project = rows[..index]
            .iter()
            .filter(|r| r.project == row.project)
            .count();
        self.selected = Some(Selection {
            id: row.container.id.clone(),
            project: row.project.clone(),
            index_in_project,
        });
    }

    /// Move by `delta` rows, stopping at either end
    pub fn move_by(&mut self, rows: &[Row<'_>], delta: isize) {
        let current = match self.row(rows) {
            Some(row) => row,
            None => {
                self.reconcile(rows);
                match self.row(rows) {
                    Some(row) => row,
                    None => return,
                }
            }
        };
        let target = current.saturating_add_signed(delta);
        self.select_row(rows, target);
    }

    pub fn first(&mut self, rows: &[Row<'_>]) {
        self.select_row(rows, 0);
    }

    pub fn last(&mut self, rows: &[Row<'_>]) {
        self.select_row(rows, rows.len().saturating_sub(1));
    }

    /// Re-anchor the cursor after the rows changed (new snapshot or filter)
    pub fn reconcile(&mut self, rows: &[Row<'_>]) {
        if rows.is_empty() {
            self.selected = None;
            return;
        }

        let Some(selected) = self.selected.clone() else {
            self.select_row(rows, 0);
            return;
        };

        if let Some(index) = self.row(rows) {
            self.select_row(rows, index);
            return;
        }

        let siblings: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, r)| *r.project == selected.project)
            .map(|(i, _)| i)
            .collect();

        match siblings.get(selected.index_in_project.min(siblings.len().saturating_sub(1))) {
            Some(&index) => self.select_row(rows, index),
            None => self.select_row(rows, 0),
        }
    }
}
