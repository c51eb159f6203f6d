//! Reference Index: does any reference to a symbol exist within a scope?
//!
//! Every query is a fresh preorder walk over the live tree. Nothing is
//! cached between passes: deletions invalidate positions, and re-running the
//! search is what keeps a stale-index hazard out of the design. Detached
//! subtrees are unreachable from the walk roots, so their use sites stop
//! counting the moment their owner is deleted.

use crate::core::{NodeId, NodeKind, Scope, SourceModel};

pub struct ReferenceIndex<'a> {
    model: &'a SourceModel,
}

impl<'a> ReferenceIndex<'a> {
    pub fn new(model: &'a SourceModel) -> Self {
        Self { model }
    }

    /// True when at least one resolvable reference to `symbol` exists within
    /// `scope`. Short-circuits on the first hit.
    pub fn has_reference(&self, symbol: NodeId, scope: Scope) -> bool {
        self.walk(scope, |node| self.refers_to(node, symbol))
    }

    /// Every reference site to `symbol` within `scope`, as a snapshot of the
    /// tree at query time. Consumers that mutate the tree mid-iteration must
    /// re-check each site for detachment instead of trusting the snapshot.
    pub fn all_references(&self, symbol: NodeId, scope: Scope) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk(scope, |node| {
            if self.refers_to(node, symbol) {
                out.push(node);
            }
            false
        });
        out
    }

    fn roots(&self, scope: Scope) -> Vec<NodeId> {
        match scope {
            Scope::Local(unit) => vec![unit],
            Scope::Global => self.model.units().to_vec(),
        }
    }

    fn walk(&self, scope: Scope, mut visit: impl FnMut(NodeId) -> bool) -> bool {
        for root in self.roots(scope) {
            let mut stack = vec![root];
            while let Some(current) = stack.pop() {
                if visit(current) {
                    return true;
                }
                stack.extend(self.model.children(current));
            }
        }
        false
    }

    /// A node references `symbol` if it is a resolved use site pointing at
    /// it, or a type whose implements clause names it.
    fn refers_to(&self, node: NodeId, symbol: NodeId) -> bool {
        match &self.model.node(node).kind {
            NodeKind::NameRef { target } => *target == symbol,
            NodeKind::NestedType { implements, .. } => implements.contains(&symbol),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Span, Visibility};

    #[test]
    fn finds_call_reference_in_local_scope() {
        let mut model = SourceModel::new();
        let unit = model.add_unit("Service", Span::new(1, 30));
        let helper = model
            .add_method(
                unit,
                "helper",
                Visibility::Private,
                false,
                &[],
                Span::new(5, 8),
            )
            .unwrap();
        let caller = model
            .add_method(
                unit,
                "run",
                Visibility::Public,
                false,
                &[],
                Span::new(10, 14),
            )
            .unwrap();
        let body = model.method_body(caller).unwrap();
        let call = model.new_call(helper, vec![], Span::line(11));
        model.add_expr_stmt(body, call, Span::line(11)).unwrap();

        let index = ReferenceIndex::new(&model);
        assert!(index.has_reference(helper, Scope::Local(unit)));
        assert_eq!(index.all_references(helper, Scope::Local(unit)).len(), 1);
    }

    #[test]
    fn local_scope_does_not_see_other_units() {
        let mut model = SourceModel::new();
        let unit_a = model.add_unit("A", Span::new(1, 20));
        let unit_b = model.add_unit("B", Span::new(1, 20));
        let target = model
            .add_method(
                unit_a,
                "shared",
                Visibility::Module,
                true,
                &[],
                Span::new(3, 5),
            )
            .unwrap();
        let caller = model
            .add_method(
                unit_b,
                "use_shared",
                Visibility::Public,
                false,
                &[],
                Span::new(3, 6),
            )
            .unwrap();
        let body = model.method_body(caller).unwrap();
        let call = model.new_call(target, vec![], Span::line(4));
        model.add_expr_stmt(body, call, Span::line(4)).unwrap();

        let index = ReferenceIndex::new(&model);
        assert!(!index.has_reference(target, Scope::Local(unit_a)));
        assert!(index.has_reference(target, Scope::Global));
    }

    #[test]
    fn references_inside_detached_subtrees_stop_counting() {
        let mut model = SourceModel::new();
        let unit = model.add_unit("Holder", Span::new(1, 20));
        let helper = model
            .add_method(
                unit,
                "helper",
                Visibility::Private,
                false,
                &[],
                Span::new(3, 5),
            )
            .unwrap();
        let field = model
            .add_field(
                unit,
                "cache",
                Visibility::Private,
                false,
                &[],
                Span::line(7),
            )
            .unwrap();
        let call = model.new_call(helper, vec![], Span::line(7));
        model.set_field_init(field, call).unwrap();

        let index = ReferenceIndex::new(&model);
        assert!(index.has_reference(helper, Scope::Local(unit)));

        model.detach(field).unwrap();
        let index = ReferenceIndex::new(&model);
        assert!(!index.has_reference(helper, Scope::Local(unit)));
    }

    #[test]
    fn implements_clause_counts_as_reference() {
        let mut model = SourceModel::new();
        let unit = model.add_unit("Outer", Span::new(1, 20));
        let ifc = model
            .add_nested_type(
                unit,
                "Sink",
                Visibility::Private,
                true,
                &[],
                Span::new(3, 5),
            )
            .unwrap();
        let impl_ty = model
            .add_nested_type(
                unit,
                "FileSink",
                Visibility::Private,
                false,
                &[],
                Span::new(7, 12),
            )
            .unwrap();
        model.set_implements(impl_ty, ifc).unwrap();

        let index = ReferenceIndex::new(&model);
        assert!(index.has_reference(ifc, Scope::Local(unit)));
        assert!(!index.has_reference(impl_ty, Scope::Local(unit)));
    }
}
