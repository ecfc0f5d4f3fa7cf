//! CART decision-tree classifier.
//!
//! The tree is grown greedily: at every node each feature is tried (in a
//! seeded random order) at every midpoint between consecutive distinct
//! values, and the split with the lowest weighted child impurity wins.
//! Nodes live in a flat `Vec` in pre-order; node `0` is the root.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::data::model::FeatureTable;
use crate::error::{PipelineError, Result};

/// Node impurity measure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    #[default]
    Gini,
    Entropy,
}

impl Criterion {
    fn impurity(self, counts: &[usize], total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        let total = total as f64;
        match self {
            Criterion::Gini => {
                1.0 - counts
                    .iter()
                    .map(|&c| (c as f64 / total).powi(2))
                    .sum::<f64>()
            }
            Criterion::Entropy => counts
                .iter()
                .filter(|&&c| c > 0)
                .map(|&c| {
                    let p = c as f64 / total;
                    -p * p.log2()
                })
                .sum(),
        }
    }
}

/// Growth settings. The defaults grow the tree until every leaf is pure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeParams {
    pub criterion: Criterion,
    /// `None` means unlimited depth.
    pub max_depth: Option<usize>,
    /// A node with fewer rows than this becomes a leaf.
    pub min_samples_split: usize,
    /// Each child of a split keeps at least this many rows.
    pub min_samples_leaf: usize,
    /// Seed for the per-node feature permutation; `None` draws from the OS.
    pub seed: Option<u64>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            criterion: Criterion::Gini,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf {
        /// Index into `classes`.
        class: usize,
    },
    Split {
        feature: usize,
        /// Rows with `value <= threshold` go left.
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted decision tree. Only obtainable through [`DecisionTreeClassifier::fit`].
#[derive(Debug, Clone)]
pub struct DecisionTreeClassifier {
    classes: Vec<i64>,
    n_features: usize,
    nodes: Vec<Node>,
}

impl DecisionTreeClassifier {
    /// Grow a tree on `x` (one row per sample) against labels `y`.
    pub fn fit(x: &FeatureTable, y: &[i64], params: &TreeParams) -> Result<Self> {
        if x.n_rows() != y.len() {
            return Err(PipelineError::rows(x.n_rows(), y.len()));
        }
        if x.is_empty() {
            return Err(PipelineError::EmptyPartition("training set"));
        }

        let mut classes = y.to_vec();
        classes.sort_unstable();
        classes.dedup();
        let targets = y
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or_default())
            .collect();

        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut grower = Grower {
            rows: x.rows(),
            targets,
            n_classes: classes.len(),
            params,
            features: (0..x.n_cols()).collect(),
            rng,
            nodes: Vec::new(),
        };
        grower.grow((0..x.n_rows()).collect(), 0);

        let tree = DecisionTreeClassifier {
            classes,
            n_features: x.n_cols(),
            nodes: grower.nodes,
        };
        log::info!(
            "Fitted decision tree: {} nodes, {} leaves, depth {}, {} classes",
            tree.n_nodes(),
            tree.n_leaves(),
            tree.depth(),
            tree.classes.len()
        );
        Ok(tree)
    }

    /// Classify a single row.
    pub fn predict_row(&self, row: &[f64]) -> Result<i64> {
        if row.len() != self.n_features {
            return Err(PipelineError::features(self.n_features, row.len()));
        }
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { class } => return Ok(self.classes[class]),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[feature] <= threshold { left } else { right };
                }
            }
        }
    }

    /// Classify every row of `x`.
    pub fn predict(&self, x: &FeatureTable) -> Result<Vec<i64>> {
        if x.n_cols() != self.n_features {
            return Err(PipelineError::features(self.n_features, x.n_cols()));
        }
        x.rows().iter().map(|row| self.predict_row(row)).collect()
    }

    /// Fraction of rows of `x` whose prediction equals the label in `y`.
    pub fn score(&self, x: &FeatureTable, y: &[i64]) -> Result<f64> {
        if x.n_rows() != y.len() {
            return Err(PipelineError::rows(x.n_rows(), y.len()));
        }
        if x.is_empty() {
            return Err(PipelineError::EmptyPartition("scoring set"));
        }
        let predictions = self.predict(x)?;
        let hits = predictions.iter().zip(y).filter(|(p, t)| p == t).count();
        Ok(hits as f64 / y.len() as f64)
    }

    /// Distinct training labels, ascending.
    pub fn classes(&self) -> &[i64] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// Longest root-to-leaf path, counted in edges.
    pub fn depth(&self) -> usize {
        self.node_depth(0)
    }

    fn node_depth(&self, idx: usize) -> usize {
        match self.nodes[idx] {
            Node::Leaf { .. } => 0,
            Node::Split { left, right, .. } => {
                1 + self.node_depth(left).max(self.node_depth(right))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Growing
// ---------------------------------------------------------------------------

struct Grower<'a> {
    rows: &'a [Vec<f64>],
    targets: Vec<usize>,
    n_classes: usize,
    params: &'a TreeParams,
    features: Vec<usize>,
    rng: StdRng,
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl Grower<'_> {
    /// Grow the subtree for `samples` and return its root index.
    fn grow(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let counts = self.class_counts(&samples);
        // First maximum, so ties resolve to the smallest label.
        let majority = counts
            .iter()
            .enumerate()
            .fold((0, 0), |best, (class, &c)| if c > best.1 { (class, c) } else { best })
            .0;

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let too_small = samples.len() < self.params.min_samples_split
            || samples.len() < 2 * self.params.min_samples_leaf.max(1);
        let too_deep = self.params.max_depth.is_some_and(|max| depth >= max);

        if !(pure || too_small || too_deep) {
            if let Some(split) = self.best_split(&samples, &counts) {
                let rows = self.rows;
                let (left, right): (Vec<usize>, Vec<usize>) = samples
                    .iter()
                    .partition(|&&s| rows[s][split.feature] <= split.threshold);

                let id = self.nodes.len();
                self.nodes.push(Node::Leaf { class: majority });
                let left = self.grow(left, depth + 1);
                let right = self.grow(right, depth + 1);
                self.nodes[id] = Node::Split {
                    feature: split.feature,
                    threshold: split.threshold,
                    left,
                    right,
                };
                return id;
            }
        }

        self.nodes.push(Node::Leaf { class: majority });
        self.nodes.len() - 1
    }

    fn class_counts(&self, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &s in samples {
            counts[self.targets[s]] += 1;
        }
        counts
    }

    fn best_split(&mut self, samples: &[usize], counts: &[usize]) -> Option<BestSplit> {
        let rows = self.rows;
        let n = samples.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let criterion = self.params.criterion;

        self.features.shuffle(&mut self.rng);

        let mut order = samples.to_vec();
        let mut best: Option<BestSplit> = None;
        for &feature in &self.features {
            order.sort_by(|&a, &b| rows[a][feature].total_cmp(&rows[b][feature]));
            if rows[order[0]][feature] == rows[order[n - 1]][feature] {
                continue;
            }

            let mut left = vec![0; self.n_classes];
            let mut right = counts.to_vec();
            for i in 0..n - 1 {
                let target = self.targets[order[i]];
                left[target] += 1;
                right[target] -= 1;

                let here = rows[order[i]][feature];
                let next = rows[order[i + 1]][feature];
                let (n_left, n_right) = (i + 1, n - i - 1);
                if next <= here || n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let impurity = (n_left as f64 * criterion.impurity(&left, n_left)
                    + n_right as f64 * criterion.impurity(&right, n_right))
                    / n as f64;
                if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    let mid = here / 2.0 + next / 2.0;
                    best = Some(BestSplit {
                        feature,
                        threshold: if mid < next { mid } else { here },
                        impurity,
                    });
                }
            }
        }
        best
    }
}
