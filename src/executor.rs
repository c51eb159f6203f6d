//! Structural Deletion Executor.
//!
//! Performs the tree edit matching a symbol's syntactic shape once the
//! policy has approved it. Declarations detach whole; a declarator leaves
//! alone or takes its owning statement with it depending on how many
//! siblings it has, so a multi-variable declaration is split rather than
//! wholesale-deleted.

use crate::core::{
    DeletionRecord, Error, NodeId, NodeKind, Result, Scope, SourceModel, SymbolKind, Visibility,
};
use crate::index::ReferenceIndex;

/// Remove `symbol` from the tree and report what was excised.
pub fn delete_symbol(model: &mut SourceModel, symbol: NodeId) -> Result<DeletionRecord> {
    let kind = model
        .symbol_kind(symbol)
        .ok_or_else(|| Error::structure(symbol, "not a deletable symbol"))?;
    let name = model.symbol_name(symbol).unwrap_or_default().to_string();

    let mut record = match kind {
        SymbolKind::Method | SymbolKind::NestedType | SymbolKind::Field => model.detach(symbol)?,
        SymbolKind::Local => delete_local(model, symbol)?,
    };
    record.symbols_removed += 1;
    log::debug!(
        "deleted {:?} '{}' ({} lines)",
        kind,
        name,
        record.lines_removed
    );
    Ok(record)
}

/// Single-declarator statements go whole; one declarator of several goes
/// alone, preserving its siblings.
fn delete_local(model: &mut SourceModel, var: NodeId) -> Result<DeletionRecord> {
    let decl = model
        .node(var)
        .parent
        .ok_or_else(|| Error::structure(var, "declarator without owning declaration"))?;
    let declared = match &model.node(decl).kind {
        NodeKind::LocalDecl { declarators } => declarators.len(),
        _ => return Err(Error::structure(var, "declarator outside a declaration")),
    };
    match declared {
        0 => Err(Error::structure(decl, "declaration with no declarators")),
        1 => model.detach(decl),
        _ => model.detach(var),
    }
}

/// How a reference site can be cleaned up when its target goes away.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SiteDisposition {
    /// A bare construct-and-discard or invoke-and-discard statement; the
    /// whole statement can be deleted.
    DiscardedStatement(NodeId),
    /// The reference sits inside the initializer of this field or
    /// declarator; the declaration can be deleted (private-only for fields).
    Declaration(NodeId),
    /// Anything else: load-bearing, leave it alone.
    Opaque,
}

/// Classify a reference site by the shape of its enclosing context.
pub fn site_disposition(model: &SourceModel, site: NodeId) -> SiteDisposition {
    // Implements-clause hits are the implementing type itself; leave those.
    if !matches!(model.node(site).kind, NodeKind::NameRef { .. }) {
        return SiteDisposition::Opaque;
    }
    if let Some(stmt) = enclosing_discarded_expression(model, site) {
        return SiteDisposition::DiscardedStatement(stmt);
    }
    if let Some(owner) = enclosing_declaration(model, site) {
        return SiteDisposition::Declaration(owner);
    }
    SiteDisposition::Opaque
}

/// Cascading variant: visit every reference site first, deleting
/// construct-and-discard statements and (private-only) declarations of the
/// target's type, then delete the symbol itself. Sites that earlier edits
/// already detached, or whose shape does not fit, are skipped.
pub fn delete_symbol_with_references(
    model: &mut SourceModel,
    symbol: NodeId,
    scope: Scope,
) -> Result<DeletionRecord> {
    let sites = ReferenceIndex::new(model).all_references(symbol, scope);
    let mut record = DeletionRecord::default();
    for site in sites {
        if model.is_detached(site) {
            continue;
        }
        match delete_reference_site(model, site) {
            Ok(Some(partial)) => record.merge(partial),
            Ok(None) => {}
            Err(e) if e.is_skippable() => {
                log::debug!("skipping reference site {site:?}: {e}");
            }
            Err(e) => return Err(e),
        }
    }
    record.merge(delete_symbol(model, symbol)?);
    Ok(record)
}

fn delete_reference_site(model: &mut SourceModel, site: NodeId) -> Result<Option<DeletionRecord>> {
    match site_disposition(model, site) {
        SiteDisposition::DiscardedStatement(stmt) => model.detach(stmt).map(Some),
        SiteDisposition::Declaration(owner) => match model.symbol_kind(owner) {
            Some(SymbolKind::Field) => {
                // Non-private fields stay even here, to stay on the safe side.
                if model.visibility(owner) == Some(Visibility::Private) {
                    delete_symbol(model, owner).map(Some)
                } else {
                    Ok(None)
                }
            }
            Some(SymbolKind::Local) => delete_symbol(model, owner).map(Some),
            _ => Ok(None),
        },
        SiteDisposition::Opaque => Ok(None),
    }
}

/// `new X()` or `f()` used as a bare statement: NameRef under New/Call
/// under ExprStmt.
fn enclosing_discarded_expression(model: &SourceModel, site: NodeId) -> Option<NodeId> {
    let expr = model.node(site).parent?;
    if !matches!(
        model.node(expr).kind,
        NodeKind::New { .. } | NodeKind::Call { .. }
    ) {
        return None;
    }
    let stmt = model.node(expr).parent?;
    matches!(model.node(stmt).kind, NodeKind::ExprStmt { .. }).then_some(stmt)
}

/// The field or declarator whose initializer contains `site`, if the climb
/// stays inside expression context.
fn enclosing_declaration(model: &SourceModel, site: NodeId) -> Option<NodeId> {
    let mut current = model.node(site).parent;
    while let Some(id) = current {
        match &model.node(id).kind {
            NodeKind::Field { .. } | NodeKind::LocalVar { .. } => return Some(id),
            NodeKind::Block { .. }
            | NodeKind::Unit { .. }
            | NodeKind::Method { .. }
            | NodeKind::NestedType { .. } => return None,
            _ => current = model.node(id).parent,
        }
    }
    None
}
