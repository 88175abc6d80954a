//! Tree genome for strategy controllers.
//!
//! A genome is a binary expression tree over the function set `+ - * / RAND`
//! and a role-dependent terminal set (sensor features plus numeric constants).
//! The controller evaluates it once per candidate destination cell and moves
//! to the cell with the highest value.
//!
//! # Representation
//!
//! Trees are stored as an arena: a `Vec<Node>` in pre-order with the root at
//! index 0 and children referenced by index. Every child index is greater than
//! its parent's, which lets `reset_metrics` recompute depths in one forward
//! pass and heights/sizes in one backward pass.
//!
//! Structural edits never patch the arena in place. Mutation and recombination
//! build a fresh compact arena with the spliced subtree copied in, then reset
//! the cached metrics, so `depth`, `height`, `size` and `parent` are always
//! consistent with the shape.
use crate::types::{Feature, FeatureVector, TerminalKind};
use rand::Rng;
use std::collections::VecDeque;
use std::fmt;

/// Lower bound (inclusive) of freshly drawn constants.
pub const CONSTANT_MIN: f64 = -10.0;
/// Upper bound (exclusive) of freshly drawn constants.
pub const CONSTANT_MAX: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Rand,
}

impl Operator {
    pub const ALL: [Operator; 5] = [
        Operator::Add,
        Operator::Sub,
        Operator::Mul,
        Operator::Div,
        Operator::Rand,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Rand => "RAND",
        }
    }

    /// Apply the operator to already-evaluated child values.
    pub fn apply<R: Rng + ?Sized>(self, left: f64, right: f64, rng: &mut R) -> f64 {
        match self {
            Operator::Add => left + right,
            Operator::Sub => left - right,
            Operator::Mul => left * right,
            // Protected division
            Operator::Div => {
                if right == 0.0 {
                    0.0
                } else {
                    left / right
                }
            }
            Operator::Rand => left + (right - left) * rng.gen::<f64>(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    Operator(Operator),
    Feature(Feature),
    Constant(f64),
}

impl NodeKind {
    pub fn is_operator(&self) -> bool {
        matches!(self, NodeKind::Operator(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub left: Option<usize>,
    pub right: Option<usize>,
    /// Back-reference for bookkeeping only; never used for ownership.
    pub parent: Option<usize>,
    pub depth: usize,
    pub height: usize,
    pub size: usize,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            left: None,
            right: None,
            parent: None,
            depth: 0,
            height: 0,
            size: 1,
        }
    }

    pub fn children(&self) -> Option<(usize, usize)> {
        match (self.left, self.right) {
            (Some(left), Some(right)) => Some((left, right)),
            _ => None,
        }
    }
}

/// Tree construction method used by ramped half-and-half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthMethod {
    /// Only operators above the depth limit.
    Full,
    /// Operators and terminals drawn uniformly above the depth limit.
    Grow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn feature(feature: Feature) -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Feature(feature))],
        }
    }

    pub fn constant(value: f64) -> Self {
        Self {
            nodes: vec![Node::new(NodeKind::Constant(value))],
        }
    }

    pub fn operator(op: Operator, left: Tree, right: Tree) -> Self {
        let mut nodes = Vec::with_capacity(1 + left.nodes.len() + right.nodes.len());
        nodes.push(Node::new(NodeKind::Operator(op)));
        let l = left.copy_into(&mut nodes, 0, None);
        let r = right.copy_into(&mut nodes, 0, None);
        nodes[0].left = Some(l);
        nodes[0].right = Some(r);

        let mut tree = Self { nodes };
        tree.reset_metrics();
        tree
    }

    /// Randomly build a tree whose root sits at `start_depth` and whose leaves
    /// sit no deeper than `dmax`. Metrics are reset relative to the new root.
    pub fn generate<R: Rng + ?Sized>(
        rng: &mut R,
        method: GrowthMethod,
        terminals: &[TerminalKind],
        start_depth: usize,
        dmax: usize,
    ) -> Self {
        let mut nodes = Vec::new();
        build_node(&mut nodes, rng, method, terminals, start_depth, dmax);
        let mut tree = Self { nodes };
        tree.reset_metrics();
        tree
    }

    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn size(&self) -> usize {
        self.root().size
    }

    pub fn height(&self) -> usize {
        self.root().height
    }

    /// Evaluate the tree on a feature vector. `RAND` nodes draw from `rng`.
    pub fn evaluate<R: Rng + ?Sized>(&self, features: &FeatureVector, rng: &mut R) -> f64 {
        self.evaluate_node(0, features, rng)
    }

    fn evaluate_node<R: Rng + ?Sized>(
        &self,
        index: usize,
        features: &FeatureVector,
        rng: &mut R,
    ) -> f64 {
        let node = &self.nodes[index];
        match node.kind {
            NodeKind::Feature(feature) => features.get(feature),
            NodeKind::Constant(value) => value,
            NodeKind::Operator(op) => match node.children() {
                Some((left, right)) => {
                    let left_val = self.evaluate_node(left, features, rng);
                    let right_val = self.evaluate_node(right, features, rng);
                    op.apply(left_val, right_val, rng)
                }
                None => 0.0,
            },
        }
    }

    /// Arena index of the `n`th node (1-based) in breadth-first order,
    /// left child before right child.
    pub fn find_nth_node(&self, n: usize) -> Option<usize> {
        if n == 0 || n > self.size() {
            return None;
        }

        let mut to_visit = VecDeque::from([0usize]);
        let mut counter = 0;
        while let Some(current) = to_visit.pop_front() {
            counter += 1;
            if counter == n {
                return Some(current);
            }
            if let Some((left, right)) = self.nodes[current].children() {
                to_visit.push_back(left);
                to_visit.push_back(right);
            }
        }
        None
    }

    /// Independent copy of the subtree rooted at `index`.
    pub fn subtree(&self, index: usize) -> Tree {
        let mut nodes = Vec::with_capacity(self.nodes[index].size);
        self.copy_into(&mut nodes, index, None);
        let mut tree = Tree { nodes };
        tree.reset_metrics();
        tree
    }

    /// Copy of this tree with the subtree at `index` replaced by `replacement`.
    pub fn replace_subtree(&self, index: usize, replacement: &Tree) -> Tree {
        let mut nodes = Vec::with_capacity(
            self.size() - self.nodes[index].size + replacement.size(),
        );
        self.copy_into(&mut nodes, 0, Some((index, replacement)));
        let mut tree = Tree { nodes };
        tree.reset_metrics();
        tree
    }

    fn copy_into(
        &self,
        out: &mut Vec<Node>,
        index: usize,
        splice: Option<(usize, &Tree)>,
    ) -> usize {
        if let Some((target, replacement)) = splice {
            if target == index {
                return replacement.copy_into(out, 0, None);
            }
        }

        let node = &self.nodes[index];
        let new_index = out.len();
        out.push(Node::new(node.kind));
        if let Some((left, right)) = node.children() {
            let new_left = self.copy_into(out, left, splice);
            let new_right = self.copy_into(out, right, splice);
            out[new_index].left = Some(new_left);
            out[new_index].right = Some(new_right);
        }
        new_index
    }

    fn reset_metrics(&mut self) {
        self.nodes[0].parent = None;
        self.nodes[0].depth = 0;

        for i in 0..self.nodes.len() {
            let depth = self.nodes[i].depth;
            if let Some((left, right)) = self.nodes[i].children() {
                for child in [left, right] {
                    self.nodes[child].parent = Some(i);
                    self.nodes[child].depth = depth + 1;
                }
            }
        }

        for i in (0..self.nodes.len()).rev() {
            let (size, height) = match self.nodes[i].children() {
                Some((left, right)) => (
                    1 + self.nodes[left].size + self.nodes[right].size,
                    1 + self.nodes[left].height.max(self.nodes[right].height),
                ),
                None => (1, 0),
            };
            self.nodes[i].size = size;
            self.nodes[i].height = height;
        }
    }

    /// Whether every cached depth, height, size and parent matches the shape.
    pub fn is_consistent(&self) -> bool {
        if self.nodes[0].depth != 0 || self.nodes[0].parent.is_some() {
            return false;
        }
        self.nodes.iter().enumerate().all(|(i, node)| match node.children() {
            Some((l, r)) => {
                let (left, right) = (&self.nodes[l], &self.nodes[r]);
                node.kind.is_operator()
                    && l > i
                    && r > i
                    && left.parent == Some(i)
                    && right.parent == Some(i)
                    && left.depth == node.depth + 1
                    && right.depth == node.depth + 1
                    && node.size == 1 + left.size + right.size
                    && node.height == 1 + left.height.max(right.height)
            }
            None => !node.kind.is_operator() && node.size == 1 && node.height == 0,
        })
    }

    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, index: usize, level: usize) -> fmt::Result {
        let node = &self.nodes[index];
        let indent = "|".repeat(level);
        match node.kind {
            NodeKind::Operator(op) => writeln!(f, "{}{}", indent, op.symbol())?,
            NodeKind::Feature(feature) => writeln!(f, "{}{}", indent, feature.symbol())?,
            NodeKind::Constant(value) => writeln!(f, "{}{}", indent, value)?,
        }
        if let Some((left, right)) = node.children() {
            self.fmt_node(f, left, level + 1)?;
            self.fmt_node(f, right, level + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(f, 0, 0)
    }
}

fn build_node<R: Rng + ?Sized>(
    nodes: &mut Vec<Node>,
    rng: &mut R,
    method: GrowthMethod,
    terminals: &[TerminalKind],
    depth: usize,
    dmax: usize,
) -> usize {
    let kind = if depth < dmax {
        match method {
            GrowthMethod::Grow => {
                let pick = rng.gen_range(0..Operator::ALL.len() + terminals.len());
                if pick < Operator::ALL.len() {
                    NodeKind::Operator(Operator::ALL[pick])
                } else {
                    terminal_node(terminals[pick - Operator::ALL.len()], rng)
                }
            }
            GrowthMethod::Full => {
                NodeKind::Operator(Operator::ALL[rng.gen_range(0..Operator::ALL.len())])
            }
        }
    } else {
        terminal_node(terminals[rng.gen_range(0..terminals.len())], rng)
    };

    let index = nodes.len();
    nodes.push(Node::new(kind));
    if kind.is_operator() {
        let left = build_node(nodes, rng, method, terminals, depth + 1, dmax);
        let right = build_node(nodes, rng, method, terminals, depth + 1, dmax);
        nodes[index].left = Some(left);
        nodes[index].right = Some(right);
    }
    index
}

fn terminal_node<R: Rng + ?Sized>(terminal: TerminalKind, rng: &mut R) -> NodeKind {
    match terminal {
        TerminalKind::Feature(feature) => NodeKind::Feature(feature),
        TerminalKind::Constant => NodeKind::Constant(rng.gen_range(CONSTANT_MIN..CONSTANT_MAX)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn assert_metrics_consistent(tree: &Tree) {
        assert!(tree.is_consistent(), "inconsistent metrics:\n{}", tree);
    }

    fn sample_tree() -> Tree {
        // (G + P) * (W - 2)
        Tree::operator(
            Operator::Mul,
            Tree::operator(
                Operator::Add,
                Tree::feature(Feature::NearestPursuer),
                Tree::feature(Feature::NearestPill),
            ),
            Tree::operator(
                Operator::Sub,
                Tree::feature(Feature::AdjacentWalls),
                Tree::constant(2.0),
            ),
        )
    }

    #[test]
    fn test_generated_trees_keep_metrics() {
        let mut rng = StdRng::seed_from_u64(7);
        for i in 0..200 {
            let method = if i % 2 == 0 { GrowthMethod::Full } else { GrowthMethod::Grow };
            let tree = Tree::generate(&mut rng, method, Role::Pursuer.terminals(), 0, 4);
            assert_metrics_consistent(&tree);
            assert!(tree.height() <= 4);
            assert_eq!(tree.size(), tree.nodes().len());
        }
    }

    #[test]
    fn test_full_method_is_balanced() {
        let mut rng = StdRng::seed_from_u64(3);
        let tree = Tree::generate(&mut rng, GrowthMethod::Full, Role::Pursued.terminals(), 0, 3);
        assert_eq!(tree.height(), 3);
        assert_eq!(tree.size(), 15);
    }

    #[test]
    fn test_breadth_first_indexing() {
        let tree = sample_tree();
        let kinds: Vec<NodeKind> = (1..=tree.size())
            .map(|n| tree.node(tree.find_nth_node(n).unwrap()).kind)
            .collect();

        assert_eq!(kinds[0], NodeKind::Operator(Operator::Mul));
        assert_eq!(kinds[1], NodeKind::Operator(Operator::Add));
        assert_eq!(kinds[2], NodeKind::Operator(Operator::Sub));
        assert_eq!(kinds[3], NodeKind::Feature(Feature::NearestPursuer));
        assert_eq!(kinds[4], NodeKind::Feature(Feature::NearestPill));
        assert_eq!(kinds[5], NodeKind::Feature(Feature::AdjacentWalls));
        assert_eq!(kinds[6], NodeKind::Constant(2.0));

        assert_eq!(tree.find_nth_node(0), None);
        assert_eq!(tree.find_nth_node(8), None);
    }

    #[test]
    fn test_indexing_is_a_bijection() {
        let mut rng = StdRng::seed_from_u64(11);
        let tree = Tree::generate(&mut rng, GrowthMethod::Grow, Role::Pursuer.terminals(), 0, 5);
        let mut seen: Vec<usize> = (1..=tree.size())
            .map(|n| tree.find_nth_node(n).unwrap())
            .collect();
        let again: Vec<usize> = (1..=tree.size())
            .map(|n| tree.find_nth_node(n).unwrap())
            .collect();
        assert_eq!(seen, again);
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), tree.size());
    }

    #[test]
    fn test_evaluate() {
        let tree = sample_tree();
        let features = FeatureVector([3.0, 4.0, 5.0, 0.0, 0.0]);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(tree.evaluate(&features, &mut rng), 21.0);
    }

    #[test]
    fn test_protected_division() {
        let tree = Tree::operator(
            Operator::Div,
            Tree::constant(5.0),
            Tree::feature(Feature::Fruit),
        );
        let mut rng = StdRng::seed_from_u64(0);
        let value = tree.evaluate(&FeatureVector::default(), &mut rng);
        assert_eq!(value, 0.0);
        assert!(value.is_finite());
    }

    #[test]
    fn test_rand_operator_stays_between_children() {
        let tree = Tree::operator(Operator::Rand, Tree::constant(-2.0), Tree::constant(3.0));
        let mut rng = StdRng::seed_from_u64(5);
        let before = tree.clone();
        for _ in 0..100 {
            let v = tree.evaluate(&FeatureVector::default(), &mut rng);
            assert!((-2.0..3.0).contains(&v));
        }
        assert_eq!(tree, before);
    }

    #[test]
    fn test_replace_subtree_recomputes_metrics() {
        let tree = sample_tree();
        let target = tree.find_nth_node(6).unwrap(); // W
        let replacement = sample_tree();
        let spliced = tree.replace_subtree(target, &replacement);

        assert_metrics_consistent(&spliced);
        assert_eq!(spliced.size(), tree.size() - 1 + replacement.size());
        assert_eq!(spliced.height(), 4);
        // original untouched
        assert_eq!(tree.size(), 7);
    }

    #[test]
    fn test_subtree_copy() {
        let tree = sample_tree();
        let sub = tree.subtree(tree.find_nth_node(3).unwrap());
        assert_eq!(sub.size(), 3);
        assert_eq!(sub.root().depth, 0);
        assert_eq!(sub.root().parent, None);
        assert_eq!(sub.root().kind, NodeKind::Operator(Operator::Sub));
    }

    #[test]
    fn test_display_dump() {
        let tree = sample_tree();
        let dump = tree.to_string();
        assert_eq!(dump, "*\n|+\n||G\n||P\n|-\n||W\n||2\n");
    }
}
