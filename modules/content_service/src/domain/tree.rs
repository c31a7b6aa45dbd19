//! Arena/adjacency builder for self-referential rows (pages, template sections)

use crate::contract::{Page, TemplateSection};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Row that may reference a parent row of the same kind
pub trait TreeNode {
    fn node_id(&self) -> Uuid;
    fn parent_node_id(&self) -> Option<Uuid>;
    /// Sibling order
    fn sort_key(&self) -> i32 {
        0
    }
}

/// Flat rows indexed into parent/children adjacency lists
///
/// Rows whose parent is missing, or whose ancestor chain loops, become roots.
#[derive(Debug, Clone)]
pub struct Forest<T> {
    nodes: Vec<T>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    index: HashMap<Uuid, usize>,
}

impl<T: TreeNode> Forest<T> {
    pub fn build(mut nodes: Vec<T>) -> Self {
        nodes.sort_by_key(|n| n.sort_key());
        let index: HashMap<Uuid, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.node_id(), i))
            .collect();

        let mut children = vec![Vec::new(); nodes.len()];
        let mut roots = Vec::new();
        for (i, node) in nodes.iter().enumerate() {
            match node.parent_node_id().and_then(|p| index.get(&p).copied()) {
                Some(parent) if !Self::chain_loops(&nodes, &index, i) => children[parent].push(i),
                _ => roots.push(i),
            }
        }

        Self {
            nodes,
            children,
            roots,
            index,
        }
    }

    fn chain_loops(nodes: &[T], index: &HashMap<Uuid, usize>, start: usize) -> bool {
        let mut seen = HashSet::from([start]);
        let mut current = start;
        while let Some(parent) = nodes[current].parent_node_id().and_then(|p| index.get(&p).copied()) {
            if !seen.insert(parent) {
                return true;
            }
            current = parent;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&T> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn roots(&self) -> impl Iterator<Item = &T> {
        self.roots.iter().map(|&i| &self.nodes[i])
    }

    pub fn children_of(&self, id: Uuid) -> Vec<&T> {
        self.index
            .get(&id)
            .map(|&i| self.children[i].iter().map(|&c| &self.nodes[c]).collect())
            .unwrap_or_default()
    }

    /// Whether `node` sits somewhere below `ancestor`
    pub fn is_descendant(&self, ancestor: Uuid, node: Uuid) -> bool {
        let Some(&start) = self.index.get(&ancestor) else {
            return false;
        };
        let mut stack = self.children[start].clone();
        while let Some(i) = stack.pop() {
            if self.nodes[i].node_id() == node {
                return true;
            }
            stack.extend_from_slice(&self.children[i]);
        }
        false
    }

    /// Fold every tree bottom-up, roots in sibling order
    pub fn fold<U>(&self, mut f: impl FnMut(&T, Vec<U>) -> U) -> Vec<U> {
        self.roots.iter().map(|&i| self.fold_node(i, &mut f)).collect()
    }

    fn fold_node<U>(&self, i: usize, f: &mut impl FnMut(&T, Vec<U>) -> U) -> U {
        let children = self.children[i].iter().map(|&c| self.fold_node(c, f)).collect();
        f(&self.nodes[i], children)
    }
}

/// Whether moving `node` under `new_parent` would close a loop
pub fn would_create_cycle<T: TreeNode>(forest: &Forest<T>, node: Uuid, new_parent: Uuid) -> bool {
    node == new_parent || forest.is_descendant(node, new_parent)
}

impl TreeNode for Page {
    fn node_id(&self) -> Uuid {
        self.id
    }

    fn parent_node_id(&self) -> Option<Uuid> {
        self.parent_id
    }

    fn sort_key(&self) -> i32 {
        self.menu.menu_order
    }
}

impl TreeNode for TemplateSection {
    fn node_id(&self) -> Uuid {
        self.id
    }

    fn parent_node_id(&self) -> Option<Uuid> {
        self.parent_id
    }

    fn sort_key(&self) -> i32 {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Row {
        id: Uuid,
        parent: Option<Uuid>,
        order: i32,
        name: &'static str,
    }

    impl TreeNode for Row {
        fn node_id(&self) -> Uuid {
            self.id
        }
        fn parent_node_id(&self) -> Option<Uuid> {
            self.parent
        }
        fn sort_key(&self) -> i32 {
            self.order
        }
    }

    fn row(name: &'static str, parent: Option<&Row>, order: i32) -> Row {
        Row {
            id: Uuid::new_v4(),
            parent: parent.map(|p| p.id),
            order,
            name,
        }
    }

    fn render(forest: &Forest<Row>) -> Vec<String> {
        forest.fold(|row, children: Vec<String>| {
            if children.is_empty() {
                row.name.to_string()
            } else {
                format!("{}({})", row.name, children.join(","))
            }
        })
    }

    #[test]
    fn test_build_nested_ordered() {
        let home = row("home", None, 0);
        let about = row("about", None, 1);
        let team = row("team", Some(&about), 1);
        let history = row("history", Some(&about), 0);
        let forest = Forest::build(vec![team.clone(), about.clone(), home, history.clone()]);

        assert_eq!(forest.len(), 4);
        assert_eq!(render(&forest), vec!["home", "about(history,team)"]);
        assert_eq!(forest.children_of(about.id).len(), 2);
        assert!(forest.is_descendant(about.id, team.id));
        assert!(!forest.is_descendant(team.id, about.id));
    }

    #[test]
    fn test_orphans_become_roots() {
        let mut lost = row("lost", None, 0);
        lost.parent = Some(Uuid::new_v4());
        let forest = Forest::build(vec![lost]);
        assert_eq!(forest.roots().count(), 1);
    }

    #[test]
    fn test_stored_cycle_does_not_hide_rows() {
        let mut a = row("a", None, 0);
        let mut b = row("b", None, 1);
        a.parent = Some(b.id);
        b.parent = Some(a.id);
        let forest = Forest::build(vec![a, b]);
        assert_eq!(forest.roots().count(), 2);
    }

    #[test]
    fn test_would_create_cycle() {
        let root = row("root", None, 0);
        let child = row("child", Some(&root), 0);
        let grandchild = row("grandchild", Some(&child), 0);
        let other = row("other", None, 1);
        let forest = Forest::build(vec![root.clone(), child.clone(), grandchild.clone(), other.clone()]);

        assert!(would_create_cycle(&forest, root.id, root.id));
        assert!(would_create_cycle(&forest, root.id, grandchild.id));
        assert!(!would_create_cycle(&forest, grandchild.id, other.id));
        assert!(!would_create_cycle(&forest, child.id, root.id));
    }
}
