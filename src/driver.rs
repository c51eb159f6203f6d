//! Fixpoint Driver.
//!
//! One sweep only catches directly-dead symbols: deleting a private method
//! can strand the private field that only it referenced. Repeating until a
//! round removes nothing yields maximal safe cleanup without a dependency
//! graph, and terminates because every productive round strictly shrinks
//! the tree.

use crate::config::CleanConfig;
use crate::core::{CleanSummary, Error, NodeId, SourceModel};
use crate::sweep::sweep_unit;

/// Post-mutation hook, invoked exactly once per unit after its fixpoint
/// converges. Host collaborators hang import shortening and reformatting
/// here; cosmetic adjustments only, nothing that could revive a symbol.
pub trait Normalizer {
    fn normalize(&self, model: &mut SourceModel, unit: NodeId) -> anyhow::Result<()>;
}

/// Default normalizer: leaves the unit as the sweeps left it.
pub struct NoopNormalizer;

impl Normalizer for NoopNormalizer {
    fn normalize(&self, _model: &mut SourceModel, _unit: NodeId) -> anyhow::Result<()> {
        Ok(())
    }
}

pub struct Cleaner {
    config: CleanConfig,
    normalizer: Box<dyn Normalizer>,
}

impl Default for Cleaner {
    fn default() -> Self {
        Self::new(CleanConfig::default())
    }
}

impl Cleaner {
    pub fn new(config: CleanConfig) -> Self {
        Self {
            config,
            normalizer: Box::new(NoopNormalizer),
        }
    }

    pub fn with_normalizer(config: CleanConfig, normalizer: Box<dyn Normalizer>) -> Self {
        Self { config, normalizer }
    }

    pub fn config(&self) -> &CleanConfig {
        &self.config
    }

    /// Sweep `unit` to its fixpoint, then normalize it once.
    ///
    /// The summary always reflects what actually left the tree: a failure
    /// mid-processing comes back alongside the deletions already applied,
    /// never instead of them. Each completed round leaves a syntactically
    /// valid tree behind, so an aborted unit is safe to keep, merely
    /// under-cleaned. `units_processed` counts fully processed units only.
    pub fn clean_unit(
        &self,
        model: &mut SourceModel,
        unit: NodeId,
    ) -> (CleanSummary, Option<Error>) {
        let mut summary = CleanSummary::default();
        loop {
            let record = match sweep_unit(model, unit, &self.config) {
                Ok(record) => record,
                Err(e) => return (summary, Some(e)),
            };
            summary.rounds += 1;
            summary.symbols_removed += record.symbols_removed;
            summary.lines_removed += record.lines_removed;
            if record.is_empty() {
                break;
            }
        }
        if let Err(e) = self.normalizer.normalize(model, unit) {
            return (summary, Some(Error::Normalize(e)));
        }
        summary.units_processed = 1;
        log::debug!(
            "unit {:?} converged after {} rounds, removed {} symbols / {} lines",
            unit,
            summary.rounds,
            summary.symbols_removed,
            summary.lines_removed
        );
        (summary, None)
    }

    /// Clean every unit in the model, sequentially. A unit that fails is
    /// logged and skipped, the batch carries on, and whatever the failed
    /// unit had already removed stays in the totals.
    pub fn clean_all(&self, model: &mut SourceModel) -> CleanSummary {
        let mut total = CleanSummary::default();
        for unit in model.units().to_vec() {
            let (summary, failure) = self.clean_unit(model, unit);
            total.absorb(summary);
            if let Some(e) = failure {
                log::warn!("skipping unit {unit:?}: {e}");
                total.units_skipped += 1;
            }
        }
        total
    }
}
