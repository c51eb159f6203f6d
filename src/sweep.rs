//! Single-Pass Sweep: one full pass over a Code Unit.
//!
//! Each category materializes its complete candidate list before any
//! deletion in that category — deleting while discovering would invalidate
//! sibling positions. Safety checks still run per candidate against the
//! current tree, and candidates that earlier deletions already detached are
//! skipped.

use crate::config::CleanConfig;
use crate::core::{
    DeletionRecord, Error, NodeId, NodeKind, Result, Scope, SourceModel, SymbolKind, Visibility,
};
use crate::executor::{delete_symbol, delete_symbol_with_references};
use crate::index::ReferenceIndex;
use crate::policy::{is_safe_to_cascade_delete, is_safe_to_delete};

/// Run one sweep over `unit`. Returns what this pass removed; an empty
/// record means the unit has reached its fixpoint.
pub fn sweep_unit(
    model: &mut SourceModel,
    unit: NodeId,
    config: &CleanConfig,
) -> Result<DeletionRecord> {
    if !matches!(model.try_node(unit)?.kind, NodeKind::Unit { .. }) {
        return Err(Error::structure(unit, "sweep target is not a unit root"));
    }
    if model.is_detached(unit) {
        return Err(Error::Detached(unit));
    }

    let mut record = DeletionRecord::default();

    for kind in [SymbolKind::Method, SymbolKind::NestedType, SymbolKind::Field] {
        let candidates = private_members(model, unit, kind);
        apply(model, &candidates, Scope::Local(unit), &mut record)?;
    }

    let locals = collect_locals(model, unit);
    apply(model, &locals, Scope::Local(unit), &mut record)?;

    if config.cascade_references {
        record.merge(cascade_empty_members(model, unit)?);
    }
    if config.sweep_statics {
        let statics = module_statics(model, unit);
        apply(model, &statics, Scope::Global, &mut record)?;
    }
    if config.delete_unreachable {
        record.merge(delete_unreachable_statements(model, unit)?);
    }
    if config.merge_single_impl_interfaces {
        record.merge(merge_single_impl_interfaces(model, unit)?);
    }

    Ok(record)
}

fn apply(
    model: &mut SourceModel,
    candidates: &[NodeId],
    scope: Scope,
    record: &mut DeletionRecord,
) -> Result<()> {
    for &candidate in candidates {
        if model.is_detached(candidate) {
            continue;
        }
        if !is_safe_to_delete(model, candidate, scope) {
            continue;
        }
        match delete_symbol(model, candidate) {
            Ok(partial) => record.merge(partial),
            Err(e) if e.is_skippable() => {
                log::debug!("skipping candidate {candidate:?}: {e}");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Aggressive extension: empty private methods and types whose remaining
/// references are all disposable go, together with those reference sites.
fn cascade_empty_members(model: &mut SourceModel, unit: NodeId) -> Result<DeletionRecord> {
    let scope = Scope::Local(unit);
    let mut candidates = private_members(model, unit, SymbolKind::Method);
    candidates.extend(private_members(model, unit, SymbolKind::NestedType));

    let mut record = DeletionRecord::default();
    for candidate in candidates {
        if model.is_detached(candidate) {
            continue;
        }
        if !is_safe_to_cascade_delete(model, candidate, scope) {
            continue;
        }
        match delete_symbol_with_references(model, candidate, scope) {
            Ok(partial) => record.merge(partial),
            Err(e) if e.is_skippable() => {
                log::debug!("skipping cascade candidate {candidate:?}: {e}");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(record)
}

/// Direct members of `unit` of one symbol kind with private visibility.
fn private_members(model: &SourceModel, unit: NodeId, kind: SymbolKind) -> Vec<NodeId> {
    model
        .children(unit)
        .into_iter()
        .filter(|&m| model.symbol_kind(m) == Some(kind))
        .filter(|&m| model.visibility(m) == Some(Visibility::Private))
        .collect()
}

/// Every declarator anywhere in the unit's statement trees.
fn collect_locals(model: &SourceModel, unit: NodeId) -> Vec<NodeId> {
    model
        .descendants(unit)
        .into_iter()
        .filter(|&n| model.symbol_kind(n) == Some(SymbolKind::Local))
        .collect()
}

/// Static members other units could reach: module-visible statics. Private
/// statics are already covered by the local member passes.
fn module_statics(model: &SourceModel, unit: NodeId) -> Vec<NodeId> {
    model
        .children(unit)
        .into_iter()
        .filter(|&m| {
            matches!(
                model.symbol_kind(m),
                Some(SymbolKind::Method) | Some(SymbolKind::Field)
            )
        })
        .filter(|&m| model.is_static(m) && model.visibility(m) == Some(Visibility::Module))
        .collect()
}

/// Delete statements that follow an unconditional return in any block of the
/// unit. Blocks are collected up front; statement lists re-read per block.
fn delete_unreachable_statements(model: &mut SourceModel, unit: NodeId) -> Result<DeletionRecord> {
    let blocks: Vec<NodeId> = model
        .descendants(unit)
        .into_iter()
        .filter(|&n| matches!(model.node(n).kind, NodeKind::Block { .. }))
        .collect();

    let mut record = DeletionRecord::default();
    for block in blocks {
        if model.is_detached(block) {
            continue;
        }
        let statements = match &model.node(block).kind {
            NodeKind::Block { statements } => statements.clone(),
            _ => continue,
        };
        let mut unreachable = false;
        for stmt in statements {
            if unreachable {
                match model.detach(stmt) {
                    Ok(partial) => record.merge(partial),
                    Err(e) if e.is_skippable() => {
                        log::debug!("skipping unreachable statement {stmt:?}: {e}");
                    }
                    Err(e) => return Err(e),
                }
            } else if matches!(model.node(stmt).kind, NodeKind::Return { .. }) {
                unreachable = true;
            }
        }
    }
    Ok(record)
}

/// Replace nested private interfaces that have exactly one in-unit
/// implementor with that implementor, then delete the interface.
fn merge_single_impl_interfaces(model: &mut SourceModel, unit: NodeId) -> Result<DeletionRecord> {
    let interfaces: Vec<NodeId> = model
        .children(unit)
        .into_iter()
        .filter(|&m| {
            matches!(
                model.node(m).kind,
                NodeKind::NestedType {
                    is_interface: true,
                    ..
                }
            )
        })
        .collect();

    let mut record = DeletionRecord::default();
    for ifc in interfaces {
        if model.is_detached(ifc) {
            continue;
        }
        // Merging rewrites use sites, so it only applies where a local
        // search is sound and reflection cannot be involved.
        if model.visibility(ifc) != Some(Visibility::Private) || model.is_annotated(ifc) {
            continue;
        }
        let implementors: Vec<NodeId> = model
            .children(unit)
            .into_iter()
            .filter(|&m| match &model.node(m).kind {
                NodeKind::NestedType { implements, .. } => implements.contains(&ifc),
                _ => false,
            })
            .collect();
        let &[implementor] = &implementors[..] else {
            continue;
        };

        let sites = ReferenceIndex::new(model).all_references(ifc, Scope::Local(unit));
        for site in sites {
            if model.is_detached(site) {
                continue;
            }
            if matches!(model.node(site).kind, NodeKind::NameRef { .. }) {
                model.retarget_reference(site, implementor)?;
            }
        }
        model.clear_implements_of(ifc);
        let mut partial = model.detach(ifc)?;
        partial.symbols_removed += 1;
        log::debug!(
            "merged single-implementation interface {:?} into {:?}",
            ifc,
            implementor
        );
        record.merge(partial);
    }
    Ok(record)
}
