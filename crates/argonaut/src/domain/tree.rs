//! Live resource forest shown by the tree view.
//!
//! Forests are kept per application in insertion order. Nodes live in an
//! arena keyed by uid and reference each other through uid arrays only, so
//! misbehaving servers that emit parent/child cycles cannot create
//! reference cycles here; back-edges are dropped on ingest.

use std::collections::{HashMap, HashSet};

use tracing::warn;

/// One resource node as delivered by the upstream tree endpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceNode {
    pub uid: String,
    pub group: String,
    pub version: String,
    pub kind: String,
    pub name: String,
    pub namespace: Option<String>,
    pub parent_uids: Vec<String>,
    pub health: Option<String>,
    pub status: Option<String>,
}

/// Per-resource status overlay matched by `(group, kind, namespace, name)`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceStatus {
    pub group: String,
    pub kind: String,
    pub namespace: Option<String>,
    pub name: String,
    pub health: Option<String>,
    pub status: Option<String>,
}

/// A node stored in the arena.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeNode {
    pub uid: String,
    pub kind: String,
    pub group: String,
    pub version: String,
    pub name: String,
    pub namespace: Option<String>,
    pub parent_uids: Vec<String>,
    pub children_uids: Vec<String>,
    pub health: Option<String>,
    pub status: Option<String>,
    pub expanded: bool,
    pub depth: usize,
    /// Index of this node's rendered line in the current projection.
    pub line_index: usize,
    pub synthetic_root: bool,
    self_match: bool,
    subtree_match: bool,
}

impl TreeNode {
    fn matches_query(&self, query: &str) -> bool {
        self.kind.to_lowercase().contains(query)
            || self.name.to_lowercase().contains(query)
            || self
                .namespace
                .as_deref()
                .is_some_and(|ns| ns.to_lowercase().contains(query))
    }
}

/// One rendered line of the flat projection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeLine {
    /// Blank separator between application roots.
    Blank,
    /// A visible node, by uid.
    Node(String),
}

/// Forest-of-trees model backing the resource view.
#[derive(Debug, Default)]
pub struct TreeModel {
    arena: HashMap<String, TreeNode>,
    /// Application names in insertion order.
    app_order: Vec<String>,
    /// Synthetic root uid per application.
    roots: HashMap<String, String>,
    filter: String,
    /// Rendered lines, including blank separators.
    lines: Vec<TreeLine>,
    /// Uids of visible nodes in projection order.
    visible: Vec<String>,
}

fn synthetic_root_uid(app_name: &str) -> String {
    format!("app::{app_name}")
}

impl TreeModel {
    /// Returns the active filter query.
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Returns the node stored under `uid`.
    pub fn node(&self, uid: &str) -> Option<&TreeNode> {
        self.arena.get(uid)
    }

    /// Returns the visible node at the given node index.
    pub fn node_at(&self, index: usize) -> Option<&TreeNode> {
        self.visible.get(index).and_then(|uid| self.arena.get(uid))
    }

    /// Number of expanded-visible nodes (cursor domain).
    pub fn visible_node_count(&self) -> usize {
        self.visible.len()
    }

    /// Number of rendered lines, including blank separators (scroll domain).
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Rendered lines in order.
    pub fn lines(&self) -> &[TreeLine] {
        &self.lines
    }

    /// Maps a node index to its rendered line index.
    pub fn line_index_of(&self, node_index: usize) -> usize {
        self.visible
            .get(node_index)
            .and_then(|uid| self.arena.get(uid))
            .map_or(0, |node| node.line_index)
    }

    /// Returns `true` when no application forest is loaded.
    pub fn is_empty(&self) -> bool {
        self.app_order.is_empty()
    }

    /// Replaces the forest for `app_name` entirely.
    ///
    /// Expansion state is preserved for nodes whose uid survives. New nodes
    /// default to expanded only when they are synthetic roots or have at
    /// least one child.
    pub fn upsert_app_tree(&mut self, app_name: &str, nodes: Vec<ResourceNode>) {
        let root_uid = synthetic_root_uid(app_name);
        let prior_expanded: HashMap<String, bool> = self
            .app_uids(app_name)
            .into_iter()
            .filter_map(|uid| self.arena.get(&uid).map(|n| (uid.clone(), n.expanded)))
            .collect();
        let prior_root = self.arena.get(&root_uid).cloned();
        self.remove_app_nodes(app_name);

        if !self.app_order.iter().any(|name| name == app_name) {
            self.app_order.push(app_name.to_string());
        }
        self.roots.insert(app_name.to_string(), root_uid.clone());

        let incoming: HashSet<String> = nodes.iter().map(|n| n.uid.clone()).collect();
        let order: Vec<String> = nodes.iter().map(|n| n.uid.clone()).collect();
        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        let mut top_level = Vec::new();
        for node in &nodes {
            let known_parents: Vec<&String> = node
                .parent_uids
                .iter()
                .filter(|uid| incoming.contains(*uid))
                .collect();
            if known_parents.is_empty() {
                top_level.push(node.uid.clone());
            } else {
                for parent in known_parents {
                    children
                        .entry(parent.clone())
                        .or_default()
                        .push(node.uid.clone());
                }
            }
        }
        // Nodes trapped in a pure parent cycle are unreachable from any
        // top-level node; adopt the first such node under the root and
        // repeat until everything is reachable. The remaining back-edge
        // is dropped during the depth walk.
        loop {
            let mut reachable: HashSet<String> = HashSet::new();
            let mut stack = top_level.clone();
            while let Some(current) = stack.pop() {
                if !reachable.insert(current.clone()) {
                    continue;
                }
                if let Some(kids) = children.get(&current) {
                    stack.extend(kids.iter().cloned());
                }
            }
            let Some(orphan) = order.iter().find(|uid| !reachable.contains(*uid)) else {
                break;
            };
            warn!(uid = %orphan, "adopting cyclic orphan under the application root");
            top_level.push(orphan.clone());
        }

        let mut root = TreeNode {
            uid: root_uid.clone(),
            kind: "Application".to_string(),
            group: "argoproj.io".to_string(),
            version: "v1alpha1".to_string(),
            name: app_name.to_string(),
            namespace: None,
            parent_uids: Vec::new(),
            children_uids: top_level.clone(),
            health: prior_root.as_ref().and_then(|r| r.health.clone()),
            status: prior_root.as_ref().and_then(|r| r.status.clone()),
            expanded: prior_root.as_ref().map_or(true, |r| r.expanded),
            depth: 0,
            line_index: 0,
            synthetic_root: true,
            self_match: false,
            subtree_match: false,
        };
        root.expanded = prior_expanded.get(&root_uid).copied().unwrap_or(root.expanded);
        self.arena.insert(root_uid.clone(), root);

        for node in nodes {
            let child_uids = children.remove(&node.uid).unwrap_or_default();
            let default_expanded = !child_uids.is_empty();
            let expanded = prior_expanded
                .get(&node.uid)
                .copied()
                .unwrap_or(default_expanded);
            self.arena.insert(
                node.uid.clone(),
                TreeNode {
                    uid: node.uid,
                    kind: node.kind,
                    group: node.group,
                    version: node.version,
                    name: node.name,
                    namespace: node.namespace,
                    parent_uids: node.parent_uids,
                    children_uids: child_uids,
                    health: node.health,
                    status: node.status,
                    expanded,
                    depth: 0,
                    line_index: 0,
                    synthetic_root: false,
                    self_match: false,
                    subtree_match: false,
                },
            );
        }

        self.break_cycles_and_assign_depth(&root_uid);
        self.recompute_matches();
        self.rebuild_projection();
    }

    /// Updates the synthetic root's badges without touching its children.
    pub fn set_app_meta(&mut self, app_name: &str, health: Option<String>, sync: Option<String>) {
        let root_uid = synthetic_root_uid(app_name);
        if let Some(root) = self.arena.get_mut(&root_uid) {
            root.health = health;
            root.status = sync;
        }
    }

    /// Overlays per-node status without structural changes.
    pub fn set_resource_statuses(&mut self, app_name: &str, statuses: &[ResourceStatus]) {
        for uid in self.app_uids(app_name) {
            let Some(node) = self.arena.get_mut(&uid) else {
                continue;
            };
            let matched = statuses.iter().find(|status| {
                status.group == node.group
                    && status.kind == node.kind
                    && status.namespace == node.namespace
                    && status.name == node.name
            });
            if let Some(status) = matched {
                if status.health.is_some() {
                    node.health = status.health.clone();
                }
                if status.status.is_some() {
                    node.status = status.status.clone();
                }
            }
        }
    }

    /// Removes the forest for `app_name`.
    pub fn remove_app(&mut self, app_name: &str) {
        self.remove_app_nodes(app_name);
        self.app_order.retain(|name| name != app_name);
        self.roots.remove(app_name);
        self.rebuild_projection();
    }

    /// Drops every forest and clears the filter.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Recomputes match flags for `query` and rebuilds the projection.
    ///
    /// Returns the node index of the first direct match so the caller can
    /// move the cursor there.
    pub fn set_filter(&mut self, query: &str) -> Option<usize> {
        self.filter = query.to_string();
        self.recompute_matches();
        self.rebuild_projection();

        if self.filter.is_empty() {
            return None;
        }
        self.visible
            .iter()
            .position(|uid| self.arena.get(uid).is_some_and(|n| n.self_match))
    }

    /// Toggles expansion at the given visible node.
    pub fn toggle(&mut self, node_index: usize) {
        let Some(node) = self.node_at(node_index) else {
            return;
        };
        if node.expanded {
            self.collapse(node_index);
        } else {
            self.expand(node_index);
        }
    }

    /// Collapses the node; collapsing a root collapses all descendants.
    pub fn collapse(&mut self, node_index: usize) {
        let Some(node) = self.node_at(node_index) else {
            return;
        };
        let uid = node.uid.clone();
        let recursive = node.synthetic_root;
        if recursive {
            for descendant in self.descendants(&uid) {
                if let Some(n) = self.arena.get_mut(&descendant) {
                    n.expanded = false;
                }
            }
        }
        if let Some(n) = self.arena.get_mut(&uid) {
            n.expanded = false;
        }
        self.rebuild_projection();
    }

    /// Expands the node; expanding a root expands one level only.
    pub fn expand(&mut self, node_index: usize) {
        let Some(node) = self.node_at(node_index) else {
            return;
        };
        let uid = node.uid.clone();
        if let Some(n) = self.arena.get_mut(&uid) {
            n.expanded = true;
        }
        self.rebuild_projection();
    }

    fn app_uids(&self, app_name: &str) -> Vec<String> {
        let Some(root_uid) = self.roots.get(app_name) else {
            return Vec::new();
        };
        let mut uids = vec![root_uid.clone()];
        uids.extend(self.descendants(root_uid));

        uids
    }

    fn descendants(&self, uid: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut stack: Vec<String> = self
            .arena
            .get(uid)
            .map(|n| n.children_uids.clone())
            .unwrap_or_default();
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(node) = self.arena.get(&current) {
                stack.extend(node.children_uids.iter().cloned());
            }
            result.push(current);
        }

        result
    }

    fn remove_app_nodes(&mut self, app_name: &str) {
        for uid in self.app_uids(app_name) {
            self.arena.remove(&uid);
        }
    }

    /// Depth-first walk from the synthetic root that assigns depths and
    /// drops edges closing a cycle.
    fn break_cycles_and_assign_depth(&mut self, root_uid: &str) {
        let mut on_path: HashSet<String> = HashSet::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut dropped: Vec<(String, String)> = Vec::new();
        self.walk_assign(root_uid, 0, &mut on_path, &mut visited, &mut dropped);

        for (parent, child) in dropped {
            warn!(%parent, %child, "dropping cyclic tree edge from upstream");
            if let Some(node) = self.arena.get_mut(&parent) {
                node.children_uids.retain(|uid| uid != &child);
            }
        }
    }

    fn walk_assign(
        &mut self,
        uid: &str,
        depth: usize,
        on_path: &mut HashSet<String>,
        visited: &mut HashSet<String>,
        dropped: &mut Vec<(String, String)>,
    ) {
        on_path.insert(uid.to_string());
        visited.insert(uid.to_string());
        let children = match self.arena.get_mut(uid) {
            Some(node) => {
                node.depth = depth;
                node.children_uids.clone()
            }
            None => Vec::new(),
        };
        for child in children {
            if on_path.contains(&child) {
                dropped.push((uid.to_string(), child));
                continue;
            }
            // A node reachable through two parents keeps its first depth.
            if visited.contains(&child) {
                continue;
            }
            self.walk_assign(&child, depth + 1, on_path, visited, dropped);
        }
        on_path.remove(uid);
    }

    fn recompute_matches(&mut self) {
        let query = self.filter.to_lowercase();
        if query.is_empty() {
            for node in self.arena.values_mut() {
                node.self_match = false;
                node.subtree_match = false;
            }
            return;
        }

        let roots: Vec<String> = self
            .app_order
            .iter()
            .filter_map(|app| self.roots.get(app).cloned())
            .collect();
        for root in roots {
            self.recompute_matches_from(&root, &query, &mut HashSet::new());
        }
    }

    fn recompute_matches_from(
        &mut self,
        uid: &str,
        query: &str,
        seen: &mut HashSet<String>,
    ) -> bool {
        if !seen.insert(uid.to_string()) {
            return false;
        }
        let (self_match, children) = match self.arena.get(uid) {
            Some(node) => (node.matches_query(query), node.children_uids.clone()),
            None => return false,
        };
        let mut subtree_match = self_match;
        for child in children {
            if self.recompute_matches_from(&child, query, seen) {
                subtree_match = true;
            }
        }
        if let Some(node) = self.arena.get_mut(uid) {
            node.self_match = self_match;
            node.subtree_match = subtree_match;
        }

        subtree_match
    }

    /// Rebuilds the flat projection of visible lines.
    ///
    /// With an active filter, nodes whose subtree contains a match are shown
    /// regardless of collapse state so matches are always revealed; with no
    /// filter, collapse state alone decides visibility.
    fn rebuild_projection(&mut self) {
        let filtering = !self.filter.is_empty();
        let mut lines = Vec::new();
        let mut visible = Vec::new();
        let apps = self.app_order.clone();
        for (app_index, app_name) in apps.iter().enumerate() {
            let Some(root_uid) = self.roots.get(app_name).cloned() else {
                continue;
            };
            if filtering && !self.arena.get(&root_uid).is_some_and(|n| n.subtree_match) {
                continue;
            }
            if app_index > 0 && !lines.is_empty() {
                lines.push(TreeLine::Blank);
            }
            self.project_subtree(&root_uid, filtering, &mut lines, &mut visible);
        }

        for (line_index, line) in lines.iter().enumerate() {
            if let TreeLine::Node(uid) = line {
                if let Some(node) = self.arena.get_mut(uid) {
                    node.line_index = line_index;
                }
            }
        }
        self.lines = lines;
        self.visible = visible;
    }

    fn project_subtree(
        &self,
        uid: &str,
        filtering: bool,
        lines: &mut Vec<TreeLine>,
        visible: &mut Vec<String>,
    ) {
        let Some(node) = self.arena.get(uid) else {
            return;
        };
        if filtering && !node.subtree_match {
            return;
        }
        lines.push(TreeLine::Node(uid.to_string()));
        visible.push(uid.to_string());
        if !node.expanded && !filtering {
            return;
        }
        for child in &node.children_uids {
            self.project_subtree(child, filtering, lines, visible);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(uid: &str, kind: &str, name: &str, parents: &[&str]) -> ResourceNode {
        ResourceNode {
            uid: uid.to_string(),
            group: "apps".to_string(),
            version: "v1".to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
            namespace: Some("default".to_string()),
            parent_uids: parents.iter().map(|p| (*p).to_string()).collect(),
            health: None,
            status: None,
        }
    }

    fn sample_forest() -> Vec<ResourceNode> {
        vec![
            resource("d1", "Deployment", "web", &[]),
            resource("r1", "ReplicaSet", "web-abc", &["d1"]),
            resource("p1", "Pod", "web-abc-xyz", &["r1"]),
            resource("s1", "Service", "web-svc", &[]),
        ]
    }

    #[test]
    fn test_upsert_builds_projection_under_synthetic_root() {
        // Arrange
        let mut tree = TreeModel::default();

        // Act
        tree.upsert_app_tree("web", sample_forest());

        // Assert: root + 4 resources, all expanded (parents) or leaves
        assert_eq!(tree.visible_node_count(), 5);
        let root = tree.node_at(0).expect("missing root");
        assert!(root.synthetic_root);
        assert_eq!(root.depth, 0);
        let deployment = tree.node("d1").expect("missing deployment");
        assert_eq!(deployment.depth, 1);
        let pod = tree.node("p1").expect("missing pod");
        assert_eq!(pod.depth, 3);
    }

    #[test]
    fn test_upsert_twice_is_idempotent() {
        // Arrange
        let mut tree = TreeModel::default();

        // Act
        tree.upsert_app_tree("web", sample_forest());
        let first: Vec<TreeLine> = tree.lines().to_vec();
        tree.upsert_app_tree("web", sample_forest());

        // Assert
        assert_eq!(tree.lines(), first.as_slice());
    }

    #[test]
    fn test_upsert_preserves_expansion_for_surviving_uids() {
        // Arrange
        let mut tree = TreeModel::default();
        tree.upsert_app_tree("web", sample_forest());
        let deployment_index = tree
            .lines()
            .iter()
            .position(|l| matches!(l, TreeLine::Node(uid) if uid == "d1"))
            .expect("deployment not visible");
        tree.collapse(deployment_index);
        assert!(!tree.node("d1").expect("missing").expanded);

        // Act
        tree.upsert_app_tree("web", sample_forest());

        // Assert: collapse survived the replace
        assert!(!tree.node("d1").expect("missing").expanded);
        // ReplicaSet and Pod hidden under the collapsed deployment.
        assert_eq!(tree.visible_node_count(), 3);
    }

    #[test]
    fn test_new_leaf_nodes_default_collapsed() {
        // Arrange
        let mut tree = TreeModel::default();

        // Act
        tree.upsert_app_tree("web", sample_forest());

        // Assert
        assert!(!tree.node("p1").expect("missing pod").expanded);
        assert!(!tree.node("s1").expect("missing service").expanded);
        assert!(tree.node("d1").expect("missing deployment").expanded);
    }

    #[test]
    fn test_collapse_root_collapses_all_descendants() {
        // Arrange
        let mut tree = TreeModel::default();
        tree.upsert_app_tree("web", sample_forest());

        // Act
        tree.collapse(0);

        // Assert: only the root line remains
        assert_eq!(tree.visible_node_count(), 1);
        assert!(!tree.node("d1").expect("missing").expanded);

        // Act: expanding the root reopens one level only
        tree.expand(0);

        // Assert: root, deployment, service visible; replica set stays hidden
        assert_eq!(tree.visible_node_count(), 3);
    }

    #[test]
    fn test_set_filter_reveals_matches_and_jumps_cursor() {
        // Arrange
        let mut tree = TreeModel::default();
        tree.upsert_app_tree("web", sample_forest());
        tree.collapse(0);

        // Act
        let first_match = tree.set_filter("pod");

        // Assert: the pod match is revealed through collapsed ancestors
        let index = first_match.expect("no match found");
        assert_eq!(tree.node_at(index).expect("missing").uid, "p1");
        // Service subtree has no match and is hidden.
        assert!(tree.lines().iter().all(
            |line| !matches!(line, TreeLine::Node(uid) if uid == "s1")
        ));
    }

    #[test]
    fn test_filter_round_trip_restores_expansion_visibility() {
        // Arrange
        let mut tree = TreeModel::default();
        tree.upsert_app_tree("web", sample_forest());
        let deployment_index = 1;
        tree.collapse(deployment_index);
        let before: Vec<TreeLine> = tree.lines().to_vec();

        // Act
        tree.set_filter("pod");
        tree.set_filter("svc");
        tree.set_filter("");

        // Assert
        assert_eq!(tree.lines(), before.as_slice());
    }

    #[test]
    fn test_blank_separator_between_app_roots() {
        // Arrange
        let mut tree = TreeModel::default();

        // Act
        tree.upsert_app_tree("web", vec![resource("w1", "Service", "web-svc", &[])]);
        tree.upsert_app_tree("api", vec![resource("a1", "Service", "api-svc", &[])]);

        // Assert: node line count differs from visible node count by the blank
        assert_eq!(tree.visible_node_count(), 4);
        assert_eq!(tree.line_count(), 5);
        assert!(matches!(tree.lines()[2], TreeLine::Blank));
        // Line indices account for the separator.
        let api_root_index = tree.line_index_of(2);
        assert_eq!(api_root_index, 3);
    }

    #[test]
    fn test_cyclic_edges_are_dropped_on_ingest() {
        // Arrange: b is a child of a, and a claims b as parent (cycle)
        let nodes = vec![
            resource("a", "Deployment", "a", &["b"]),
            resource("b", "ReplicaSet", "b", &["a"]),
        ];
        let mut tree = TreeModel::default();

        // Act
        tree.upsert_app_tree("web", nodes);

        // Assert: both nodes visible exactly once, no infinite walk
        assert_eq!(tree.visible_node_count(), 3);
    }

    #[test]
    fn test_set_app_meta_touches_only_the_root() {
        // Arrange
        let mut tree = TreeModel::default();
        tree.upsert_app_tree("web", sample_forest());

        // Act
        tree.set_app_meta("web", Some("Degraded".to_string()), Some("OutOfSync".to_string()));

        // Assert
        let root_uid = synthetic_root_uid("web");
        let root = tree.node(&root_uid).expect("missing root");
        assert_eq!(root.health.as_deref(), Some("Degraded"));
        assert_eq!(root.status.as_deref(), Some("OutOfSync"));
        assert!(tree.node("d1").expect("missing").health.is_none());
    }

    #[test]
    fn test_set_resource_statuses_matches_by_identity() {
        // Arrange
        let mut tree = TreeModel::default();
        tree.upsert_app_tree("web", sample_forest());
        let statuses = vec![ResourceStatus {
            group: "apps".to_string(),
            kind: "Pod".to_string(),
            namespace: Some("default".to_string()),
            name: "web-abc-xyz".to_string(),
            health: Some("Healthy".to_string()),
            status: None,
        }];

        // Act
        tree.set_resource_statuses("web", &statuses);

        // Assert
        assert_eq!(
            tree.node("p1").expect("missing").health.as_deref(),
            Some("Healthy")
        );
        assert!(tree.node("r1").expect("missing").health.is_none());
    }

    #[test]
    fn test_remove_app_drops_forest_and_separator() {
        // Arrange
        let mut tree = TreeModel::default();
        tree.upsert_app_tree("web", vec![resource("w1", "Service", "web-svc", &[])]);
        tree.upsert_app_tree("api", vec![resource("a1", "Service", "api-svc", &[])]);

        // Act
        tree.remove_app("web");

        // Assert
        assert_eq!(tree.visible_node_count(), 2);
        assert!(tree.lines().iter().all(|l| !matches!(l, TreeLine::Blank)));
        assert!(tree.node("w1").is_none());
    }
}
