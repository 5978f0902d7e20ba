//! Soft Drop and Recursive Soft Drop
//!
//! Both decluster a C/A tree from the root. Plain Soft Drop follows only the
//! harder branch and stops at the first splitting that passes the condition;
//! the recursive variant keeps a set of prongs and keeps splitting whichever
//! prong has the widest-angle splitting.
//!
//! ```text
//!        root            SD: fail → follow harder
//!        /  \
//!     hard  soft ✗
//!     /  \
//!    a    b  ✓          SD: pass → return (a + b)
//! ```

use super::{recluster_tree, Groomer, SoftDropCondition};
use crate::definition::Algorithm;
use crate::error::JetError;
use crate::history::{MergeHistory, NodeId};
use crate::jet::Jet;
use crate::JetResult;
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// SOFT DROP
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoftDrop {
    pub z_cut: f64,
    pub beta: f64,
    pub r0: f64,
    /// Recluster with C/A before declustering; `false` walks the jet's own history
    pub recluster: bool,
}

impl Default for SoftDrop {
    fn default() -> Self {
        Self {
            z_cut: 0.1,
            beta: 0.0,
            r0: 1.0,
            recluster: true,
        }
    }
}

impl SoftDrop {
    pub fn new(z_cut: f64, beta: f64, r0: f64) -> JetResult<Self> {
        let soft_drop = Self {
            z_cut,
            beta,
            r0,
            recluster: true,
        };
        soft_drop.validate()?;
        Ok(soft_drop)
    }

    pub fn condition(&self) -> SoftDropCondition {
        SoftDropCondition {
            z_cut: self.z_cut,
            beta: self.beta,
            r0: self.r0,
        }
    }

    pub fn validate(&self) -> JetResult<()> {
        self.condition().validate("soft_drop")
    }

    /// Walk down the harder branch until a splitting passes
    fn decluster(&self, history: &MergeHistory, root: NodeId) -> NodeId {
        let condition = self.condition();
        let mut node = root;
        while let Some((harder, softer)) = history.harder_softer(node) {
            if condition.passes(&history.momentum(harder), &history.momentum(softer)) {
                break;
            }
            node = harder;
        }
        node
    }
}

impl Groomer for SoftDrop {
    fn name(&self) -> &'static str {
        "soft_drop"
    }

    fn groom(&self, jet: &Jet, history: &MergeHistory) -> Jet {
        if jet.n_constituents() <= 1 {
            return jet.clone();
        }

        if !self.recluster {
            if let Some(root) = jet.root {
                return Jet::from_node(history, self.decluster(history, root));
            }
            log::debug!("Jet has no history to walk, reclustering with C/A");
        }

        match recluster_tree(jet, Algorithm::CambridgeAachen) {
            Some((tree, root)) => Jet::from_node(&tree, self.decluster(&tree, root)).detached(),
            None => Jet::empty(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECURSIVE SOFT DROP
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecursiveSoftDrop {
    pub z_cut: f64,
    pub beta: f64,
    pub r0: f64,
    /// Number of passing splittings to find; `None` declusters until only
    /// single particles remain
    pub n: Option<usize>,
}

impl Default for RecursiveSoftDrop {
    fn default() -> Self {
        Self {
            z_cut: 0.05,
            beta: 1.0,
            r0: 1.0,
            n: None,
        }
    }
}

impl RecursiveSoftDrop {
    pub fn new(z_cut: f64, beta: f64, r0: f64, n: Option<usize>) -> JetResult<Self> {
        let rsd = Self { z_cut, beta, r0, n };
        rsd.validate()?;
        Ok(rsd)
    }

    pub fn condition(&self) -> SoftDropCondition {
        SoftDropCondition {
            z_cut: self.z_cut,
            beta: self.beta,
            r0: self.r0,
        }
    }

    pub fn validate(&self) -> JetResult<()> {
        self.condition().validate("recursive_soft_drop")?;
        if self.n == Some(0) {
            return Err(JetError::InvalidParameter(
                "recursive_soft_drop: n must be at least 1 (or null for unlimited)".to_string(),
            ));
        }
        Ok(())
    }

    /// Final prongs of the recursive declustering
    pub fn prongs(&self, history: &MergeHistory, root: NodeId) -> Vec<NodeId> {
        let condition = self.condition();
        let splitting_angle = |node: NodeId| {
            history
                .children(node)
                .map(|(a, b)| history.momentum(a).delta_r(&history.momentum(b)))
        };

        let mut prongs = vec![root];
        let mut found = 0;
        loop {
            if self.n.is_some_and(|n| found >= n) {
                break;
            }
            // Widest splitting first; lower node id on ties
            let widest = prongs
                .iter()
                .enumerate()
                .filter_map(|(slot, node)| splitting_angle(*node).map(|dr| (slot, *node, dr)))
                .max_by(|a, b| a.2.total_cmp(&b.2).then(b.1.cmp(&a.1)));
            let Some((slot, node, _)) = widest else {
                break;
            };
            let Some((harder, softer)) = history.harder_softer(node) else {
                break;
            };

            if condition.passes(&history.momentum(harder), &history.momentum(softer)) {
                prongs[slot] = harder;
                prongs.push(softer);
                found += 1;
            } else {
                prongs[slot] = harder;
            }
        }
        prongs
    }
}

impl Groomer for RecursiveSoftDrop {
    fn name(&self) -> &'static str {
        "recursive_soft_drop"
    }

    fn groom(&self, jet: &Jet, _history: &MergeHistory) -> Jet {
        if jet.n_constituents() <= 1 {
            return jet.clone();
        }
        let Some((tree, root)) = recluster_tree(jet, Algorithm::CambridgeAachen) else {
            return Jet::empty();
        };
        let prongs = self.prongs(&tree, root);
        log::trace!("Recursive soft drop kept {} prongs", prongs.len());
        Jet::join(
            prongs
                .into_iter()
                .map(|node| Jet::from_node(&tree, node))
                .collect(),
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
