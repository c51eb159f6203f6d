//! Deletion Safety Policy.
//!
//! Conservative by construction: leaving dead code behind is acceptable,
//! deleting live code is not. A candidate passes three gates in order —
//! visibility, annotations, references — and any refusal is silent; the
//! sweep simply moves on.

use crate::core::{NodeId, NodeKind, Scope, SourceModel, SymbolKind, Visibility};
use crate::executor::{site_disposition, SiteDisposition};
use crate::index::ReferenceIndex;

/// The sound search scope for a symbol: its own unit for private members and
/// locals. Callers running the project-wide static sweep pass
/// [`Scope::Global`] explicitly; nothing else ever needs it.
pub fn scope_for(model: &SourceModel, symbol: NodeId) -> Scope {
    Scope::Local(model.unit_of(symbol))
}

/// Whether removing `symbol` cannot change observable behavior.
pub fn is_safe_to_delete(model: &SourceModel, symbol: NodeId, scope: Scope) -> bool {
    if !visibility_allows(model, symbol, scope) {
        return false;
    }
    // Annotated members are assumed reachable through reflection, DI,
    // serialization or test runners, all invisible to reference search.
    if model.is_annotated(symbol) {
        return false;
    }
    !ReferenceIndex::new(model).has_reference(symbol, scope)
}

/// Gate for the cascading "delete empty private members" extension.
///
/// A member that still has references may go if it is an empty shell —
/// a method with no statements, a type with no members — and every one of
/// its reference sites is disposable: a construct-and-discard statement, or
/// the initializer of a declaration the executor may delete. Any
/// load-bearing site refuses the whole candidate.
pub fn is_safe_to_cascade_delete(model: &SourceModel, symbol: NodeId, scope: Scope) -> bool {
    if !visibility_allows(model, symbol, scope) || model.is_annotated(symbol) {
        return false;
    }
    if !is_empty_shell(model, symbol) {
        return false;
    }
    ReferenceIndex::new(model)
        .all_references(symbol, scope)
        .into_iter()
        .all(|site| match site_disposition(model, site) {
            SiteDisposition::DiscardedStatement(_) => true,
            SiteDisposition::Declaration(owner) => match model.symbol_kind(owner) {
                Some(SymbolKind::Field) => {
                    model.visibility(owner) == Some(Visibility::Private)
                }
                Some(SymbolKind::Local) => true,
                _ => false,
            },
            SiteDisposition::Opaque => false,
        })
}

/// A method whose body holds no statements, or a type with no members.
pub fn is_empty_shell(model: &SourceModel, symbol: NodeId) -> bool {
    match &model.node(symbol).kind {
        NodeKind::Method { body, .. } => match &model.node(*body).kind {
            NodeKind::Block { statements } => statements.is_empty(),
            _ => false,
        },
        NodeKind::NestedType { members, .. } => members.is_empty(),
        _ => false,
    }
}

fn visibility_allows(model: &SourceModel, symbol: NodeId, scope: Scope) -> bool {
    let Some(visibility) = model.visibility(symbol) else {
        return false;
    };
    match scope {
        // A local search is only sound for symbols no other unit can name.
        Scope::Local(_) => visibility.is_private(),
        // The global static sweep may also consider module-visible members,
        // because it searches the entire source set. Public stays untouchable.
        Scope::Global => matches!(visibility, Visibility::Private | Visibility::Module),
    }
}
