use crate::manifest::{Manifest, ReplaceTarget, Replacement};
use std::collections::{HashMap, HashSet};

impl Manifest {
    /// Remove redundant and conflicting directives.
    ///
    /// - an empty toolchain is dropped;
    /// - requirements keep the first entry per path;
    /// - excludes keep the first of each duplicate;
    /// - retractions are only dropped when range and rationale both repeat;
    /// - replacements of the same old path and version collapse into the last
    ///   one, kept at the position of the first.
    ///
    /// Cleanup is idempotent.
    #[must_use]
    pub fn cleanup(&self) -> Manifest {
        let toolchain = self
            .toolchain
            .clone()
            .filter(|t| !t.is_empty());

        let mut seen = HashSet::new();
        let requirements = self
            .requirements
            .iter()
            .filter(|r| seen.insert(r.path.as_str()))
            .cloned()
            .collect();

        let mut seen = HashSet::new();
        let excludes = self
            .excludes
            .iter()
            .filter(|e| seen.insert(*e))
            .cloned()
            .collect();

        let mut seen = HashSet::new();
        let retractions = self
            .retractions
            .iter()
            .filter(|r| seen.insert((r.low.as_str(), r.high.as_str(), r.rationale.as_str())))
            .cloned()
            .collect();

        let mut seen = HashSet::new();
        let godebug = self
            .godebug
            .iter()
            .filter(|(k, _)| seen.insert(k.as_str()))
            .cloned()
            .collect();

        let mut seen = HashSet::new();
        let tools = self
            .tools
            .iter()
            .filter(|t| seen.insert(t.as_str()))
            .cloned()
            .collect();

        Manifest {
            module_path: self.module_path.clone(),
            go_version: self.go_version.clone(),
            toolchain,
            godebug,
            requirements,
            excludes,
            replacements: collapse_replacements(&self.replacements),
            retractions,
            tools,
        }
    }
}

fn collapse_replacements(replacements: &[Replacement]) -> Vec<Replacement> {
    let mut slots: HashMap<&ReplaceTarget, usize> = HashMap::new();
    let mut out: Vec<Replacement> = Vec::with_capacity(replacements.len());
    for r in replacements {
        if let Some(&i) = slots.get(&r.old) {
            out[i].new = r.new.clone();
        } else {
            slots.insert(&r.old, out.len());
            out.push(r.clone());
        }
    }
    out
}
