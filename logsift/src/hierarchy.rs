use std::fmt;

use crate::identity;
use crate::pattern::Pattern;

/// Index of a node inside a [`PatternForest`] arena.
pub type NodeId = usize;

/// One pattern in the hierarchy, tagged with the level and threshold it was
/// extracted at. Parent and children are arena indices, so the forest never
/// forms ownership cycles.
#[derive(Debug, Clone)]
pub struct HierarchicalNode {
    level: usize,
    threshold: f64,
    pattern: Pattern,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl HierarchicalNode {
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl PartialEq for HierarchicalNode {
    fn eq(&self, other: &Self) -> bool {
        self.level == other.level
            && self.threshold == other.threshold
            && self.pattern == other.pattern
    }
}

/// Forest of patterns extracted at increasingly strict thresholds: level 0
/// holds the coarsest patterns, each deeper level refines its parent.
#[derive(Debug, Clone, Default)]
pub struct PatternForest {
    nodes: Vec<HierarchicalNode>,
    roots: Vec<NodeId>,
}

impl PatternForest {
    /// Arranges per-level pattern lists into a forest. Level 0 patterns
    /// become roots; each finer pattern hangs off the previous-level node it
    /// shares the most literal tokens with, and is discarded when it shares
    /// none with any candidate.
    pub(crate) fn build(thresholds: &[f64], levels: Vec<Vec<Pattern>>) -> PatternForest {
        let mut forest = PatternForest::default();
        let mut levels = levels.into_iter();
        let Some(coarsest) = levels.next() else {
            return forest;
        };
        for pattern in coarsest {
            forest.add_root(thresholds[0], pattern);
        }

        for (level, patterns) in levels.enumerate() {
            let level = level + 1;
            let candidates = forest.nodes_at_level(level - 1);
            for pattern in patterns {
                if let Some(parent) = best_parent(&forest, &candidates, &pattern) {
                    forest.add_child(parent, level, thresholds[level], pattern);
                }
            }
        }
        forest
    }

    fn add_root(&mut self, threshold: f64, pattern: Pattern) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(HierarchicalNode {
            level: 0,
            threshold,
            pattern,
            parent: None,
            children: Vec::new(),
        });
        self.roots.push(id);
        id
    }

    fn add_child(
        &mut self,
        parent: NodeId,
        level: usize,
        threshold: f64,
        pattern: Pattern,
    ) -> NodeId {
        assert!(
            level > self.nodes[parent].level,
            "child level must exceed parent level"
        );
        let id = self.nodes.len();
        self.nodes.push(HierarchicalNode {
            level,
            threshold,
            pattern,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> &HierarchicalNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids at the given level, in depth-first traversal order.
    pub fn nodes_at_level(&self, level: usize) -> Vec<NodeId> {
        let mut out = Vec::new();
        for &root in &self.roots {
            self.collect_nodes_at_level(root, level, &mut out);
        }
        out
    }

    fn collect_nodes_at_level(&self, id: NodeId, level: usize, out: &mut Vec<NodeId>) {
        if self.nodes[id].level == level {
            out.push(id);
        }
        for &child in &self.nodes[id].children {
            self.collect_nodes_at_level(child, level, out);
        }
    }

    /// Patterns at `level` within the subtree rooted at `id`.
    pub fn patterns_at_level(&self, id: NodeId, level: usize) -> Vec<&Pattern> {
        let mut out = Vec::new();
        self.collect_patterns_at_level(id, level, &mut out);
        out
    }

    fn collect_patterns_at_level<'a>(&'a self, id: NodeId, level: usize, out: &mut Vec<&'a Pattern>) {
        if self.nodes[id].level == level {
            out.push(&self.nodes[id].pattern);
        }
        for &child in &self.nodes[id].children {
            self.collect_patterns_at_level(child, level, out);
        }
    }

    /// Pattern sequence from the subtree root down to `id`, top-down.
    pub fn path_from_root(&self, id: NodeId) -> Vec<&Pattern> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            path.push(&self.nodes[node].pattern);
            current = self.nodes[node].parent;
        }
        path.reverse();
        path
    }

    /// Patterns at the leaves of the subtree rooted at `id`.
    pub fn leaf_patterns(&self, id: NodeId) -> Vec<&Pattern> {
        let mut out = Vec::new();
        self.collect_leaf_patterns(id, &mut out);
        out
    }

    fn collect_leaf_patterns<'a>(&'a self, id: NodeId, out: &mut Vec<&'a Pattern>) {
        if self.nodes[id].children.is_empty() {
            out.push(&self.nodes[id].pattern);
        } else {
            for &child in &self.nodes[id].children {
                self.collect_leaf_patterns(child, out);
            }
        }
    }

    /// Number of nodes below `id`.
    pub fn descendant_count(&self, id: NodeId) -> usize {
        self.nodes[id]
            .children
            .iter()
            .map(|&c| 1 + self.descendant_count(c))
            .sum()
    }

    fn fmt_subtree(&self, id: NodeId, indent: usize, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = &self.nodes[id];
        writeln!(
            f,
            "{}L{} (t={:.2}): {} [support={}]",
            "  ".repeat(indent),
            node.level,
            node.threshold,
            node.pattern.signature(),
            node.pattern.support_count()
        )?;
        for &child in &node.children {
            self.fmt_subtree(child, indent + 1, f)?;
        }
        Ok(())
    }
}

impl fmt::Display for PatternForest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &root in &self.roots {
            self.fmt_subtree(root, 0, f)?;
        }
        Ok(())
    }
}

// The parent sharing the most positionally-aligned literal tokens wins; ties
// go to the earliest candidate. Zero overlap means no parent at all.
fn best_parent(forest: &PatternForest, candidates: &[NodeId], pattern: &Pattern) -> Option<NodeId> {
    let mut best = None;
    let mut best_count = 0usize;
    for &candidate in candidates {
        let count =
            common_literal_count(pattern.tokens(), forest.node(candidate).pattern().tokens());
        if count > best_count {
            best_count = count;
            best = Some(candidate);
        }
    }
    best
}

// Counts positions where both tokens are literals (no wildcard spelling) and
// string-equal.
fn common_literal_count(a: &[String], b: &[String]) -> usize {
    a.iter()
        .zip(b)
        .filter(|(x, y)| !identity::is_wildcard(x) && !identity::is_wildcard(y) && x == y)
        .count()
}
