//! Project tree: containers grouped by compose project
//!
//! Ordering is sticky. Projects and containers already shown keep their
//! previous relative order; newcomers are appended in listing order. The
//! displayed list therefore only moves when membership changes, no matter
//! how the runtime happens to order its `ps` output.

use dockview_runtime::{ContainerId, ContainerRecord, ProjectLabel};
use std::collections::{HashMap, HashSet};

/// One project and its containers, in display order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectGroup {
    pub project: ProjectLabel,
    pub containers: Vec<ContainerRecord>,
}

impl ProjectGroup {
    pub fn running_count(&self) -> usize {
        self.containers.iter().filter(|c| c.status.is_running()).count()
    }
}

/// Full ordered tree for one poll cycle. Never mutated once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeSnapshot {
    groups: Vec<ProjectGroup>,
}

/// Which containers appear as rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFilter {
    All,
    RunningOnly,
}

impl RowFilter {
    fn accepts(&self, record: &ContainerRecord) -> bool {
        match self {
            Self::All => true,
            Self::RunningOnly => record.status.is_running(),
        }
    }
}

/// A container as a row of the flattened tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row<'a> {
    /// Index of the project group in the snapshot
    pub group: usize,
    pub project: &'a ProjectLabel,
    pub container: &'a ContainerRecord,
}

impl TreeSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn groups(&self) -> &[ProjectGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn container_count(&self) -> usize {
        self.groups.iter().map(|g| g.containers.len()).sum()
    }

    pub fn running_count(&self) -> usize {
        self.groups.iter().map(ProjectGroup::running_count).sum()
    }

    pub fn group(&self, project: &ProjectLabel) -> Option<&ProjectGroup> {
        self.groups.iter().find(|g| &g.project == project)
    }

    pub fn find(&self, id: &ContainerId) -> Option<&ContainerRecord> {
        self.groups
            .iter()
            .flat_map(|g| g.containers.iter())
            .find(|c| &c.id == id)
    }

    /// Flatten into rows, projects in order, containers in order
    pub fn rows(&self, filter: RowFilter) -> Vec<Row<'_>> {
        self.groups
            .iter()
            .enumerate()
            .flat_map(move |(group, g)| {
                g.containers
                    .iter()
                    .filter(move |c| filter.accepts(c))
                    .map(move |container| Row {
                        group,
                        project: &g.project,
                        container,
                    })
            })
            .collect()
    }
}

/// Builds tree snapshots from flat container listings
pub struct ProjectTree;

impl ProjectTree {
    /// Group `records` by project.
    ///
    /// Items present in `previous` keep their previous relative order; items
    /// never seen before follow in order of first occurrence in `records`.
    /// A container ID listed twice keeps only its first record.
    pub fn build(records: Vec<ContainerRecord>, previous: Option<&TreeSnapshot>) -> TreeSnapshot {
        let mut group_rank: HashMap<&ProjectLabel, usize> = HashMap::new();
        let mut member_rank: HashMap<&ContainerId, usize> = HashMap::new();
        if let Some(prev) = previous {
            let mut position = 0;
            for (rank, group) in prev.groups.iter().enumerate() {
                group_rank.insert(&group.project, rank);
                for container in &group.containers {
                    member_rank.insert(&container.id, position);
                    position += 1;
                }
            }
        }

        // Group in first-occurrence order
        let mut seen: HashSet<ContainerId> = HashSet::new();
        let mut index: HashMap<ProjectLabel, usize> = HashMap::new();
        let mut groups: Vec<ProjectGroup> = Vec::new();
        for record in records {
            if !seen.insert(record.id.clone()) {
                tracing::debug!("Ignoring duplicate listing for container {}", record.id);
                continue;
            }
            let slot = *index.entry(record.project.clone()).or_insert_with(|| {
                groups.push(ProjectGroup {
                    project: record.project.clone(),
                    containers: Vec::new(),
                });
                groups.len() - 1
            });
            groups[slot].containers.push(record);
        }

        // Stable sorts: previously seen first (by old rank), then new ones in arrival order
        for group in &mut groups {
            let arrival: HashMap<ContainerId, usize> = group
                .containers
                .iter()
                .enumerate()
                .map(|(i, c)| (c.id.clone(), i))
                .collect();
            group.containers.sort_by_key(|c| match member_rank.get(&c.id) {
                Some(rank) => (0, *rank),
                None => (1, arrival[&c.id]),
            });
        }

        let arrival: HashMap<ProjectLabel, usize> = groups
            .iter()
            .enumerate()
            .map(|(i, g)| (g.project.clone(), i))
            .collect();
        groups.sort_by_key(|g| match group_rank.get(&g.project) {
            Some(rank) => (0, *rank),
            None => (1, arrival[&g.project]),
        });

        TreeSnapshot { groups }
    }
}
