//! Arena-backed source model.
//!
//! All nodes of every Code Unit live in one `Vec` owned by [`SourceModel`]
//! and are addressed by stable [`NodeId`] handles with explicit parent links.
//! Deletion is "detach subtree at handle": the node is unlinked from its
//! parent's list slot and the whole subtree is flagged, so stale candidate
//! handles collected before a mutation can be recognised and skipped.
//!
//! The model is built by the host from already-parsed, already-resolved
//! source: every use site is a [`NodeKind::NameRef`] carrying the handle of
//! the declaration it resolves to. Reference search therefore never guesses
//! by name.

use crate::core::errors::{Error, Result};
use crate::core::{DeletionRecord, Span, SymbolKind, Visibility};

/// Stable handle of a node in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub span: Span,
    pub kind: NodeKind,
    detached: bool,
}

impl Node {
    pub fn is_detached(&self) -> bool {
        self.detached
    }
}

/// Syntactic shape of a node. Deletable symbols are `Method`, `NestedType`,
/// `Field` and `LocalVar`; everything else is structure or use sites.
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// Code Unit root: one top-level type and its subtree.
    Unit { name: String, members: Vec<NodeId> },
    Method {
        name: String,
        visibility: Visibility,
        is_static: bool,
        annotations: Vec<String>,
        body: NodeId,
    },
    NestedType {
        name: String,
        visibility: Visibility,
        is_interface: bool,
        /// Interfaces this type implements. Reference edges, not child edges.
        implements: Vec<NodeId>,
        annotations: Vec<String>,
        members: Vec<NodeId>,
    },
    Field {
        name: String,
        visibility: Visibility,
        is_static: bool,
        annotations: Vec<String>,
        init: Option<NodeId>,
    },
    Block { statements: Vec<NodeId> },
    /// Declaration statement owning one or more declarators.
    LocalDecl { declarators: Vec<NodeId> },
    /// One declarator of a `LocalDecl`.
    LocalVar { name: String, init: Option<NodeId> },
    ExprStmt { expr: NodeId },
    Return { value: Option<NodeId> },
    /// A resolved use site pointing at a declaration.
    NameRef { target: NodeId },
    /// Instantiation expression; `ty` is a `NameRef` to the constructed type.
    New { ty: NodeId, args: Vec<NodeId> },
    /// Invocation expression; `callee` is a `NameRef` to the method.
    Call { callee: NodeId, args: Vec<NodeId> },
    Literal,
}

/// The indexed source set: every Code Unit handed over by the host.
#[derive(Clone, Debug, Default)]
pub struct SourceModel {
    nodes: Vec<Node>,
    units: Vec<NodeId>,
}

impl SourceModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            parent: None,
            span,
            kind,
            detached: false,
        });
        id
    }

    fn adopt(&mut self, child: NodeId, parent: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn try_node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.index()).ok_or(Error::UnknownNode(id))
    }

    pub fn units(&self) -> &[NodeId] {
        &self.units
    }

    pub fn is_detached(&self, id: NodeId) -> bool {
        self.nodes[id.index()].detached
    }

    // ---- construction API (host-facing) -----------------------------------

    pub fn add_unit(&mut self, name: &str, span: Span) -> NodeId {
        let id = self.alloc(
            NodeKind::Unit {
                name: name.to_string(),
                members: Vec::new(),
            },
            span,
        );
        self.units.push(id);
        id
    }

    /// Add a method with an empty body block to a unit or nested type.
    pub fn add_method(
        &mut self,
        owner: NodeId,
        name: &str,
        visibility: Visibility,
        is_static: bool,
        annotations: &[&str],
        span: Span,
    ) -> Result<NodeId> {
        let body = self.alloc(
            NodeKind::Block {
                statements: Vec::new(),
            },
            span,
        );
        let id = self.alloc(
            NodeKind::Method {
                name: name.to_string(),
                visibility,
                is_static,
                annotations: annotations.iter().map(|a| a.to_string()).collect(),
                body,
            },
            span,
        );
        self.adopt(body, id);
        self.attach_member(owner, id)?;
        Ok(id)
    }

    pub fn add_nested_type(
        &mut self,
        owner: NodeId,
        name: &str,
        visibility: Visibility,
        is_interface: bool,
        annotations: &[&str],
        span: Span,
    ) -> Result<NodeId> {
        let id = self.alloc(
            NodeKind::NestedType {
                name: name.to_string(),
                visibility,
                is_interface,
                implements: Vec::new(),
                annotations: annotations.iter().map(|a| a.to_string()).collect(),
                members: Vec::new(),
            },
            span,
        );
        self.attach_member(owner, id)?;
        Ok(id)
    }

    /// Record that `ty` implements the interface `interface`.
    pub fn set_implements(&mut self, ty: NodeId, interface: NodeId) -> Result<()> {
        self.try_node(ty)?;
        match &mut self.nodes[ty.index()].kind {
            NodeKind::NestedType { implements, .. } => {
                implements.push(interface);
                Ok(())
            }
            _ => Err(Error::structure(ty, "implements clause on a non-type node")),
        }
    }

    pub fn add_field(
        &mut self,
        owner: NodeId,
        name: &str,
        visibility: Visibility,
        is_static: bool,
        annotations: &[&str],
        span: Span,
    ) -> Result<NodeId> {
        let id = self.alloc(
            NodeKind::Field {
                name: name.to_string(),
                visibility,
                is_static,
                annotations: annotations.iter().map(|a| a.to_string()).collect(),
                init: None,
            },
            span,
        );
        self.attach_member(owner, id)?;
        Ok(id)
    }

    pub fn set_field_init(&mut self, field: NodeId, expr: NodeId) -> Result<()> {
        self.try_node(field)?;
        match &mut self.nodes[field.index()].kind {
            NodeKind::Field { init, .. } => *init = Some(expr),
            _ => return Err(Error::structure(field, "initializer on a non-field node")),
        }
        self.adopt(expr, field);
        Ok(())
    }

    pub fn method_body(&self, method: NodeId) -> Result<NodeId> {
        match &self.try_node(method)?.kind {
            NodeKind::Method { body, .. } => Ok(*body),
            _ => Err(Error::structure(method, "body requested from a non-method node")),
        }
    }

    /// Add an empty declaration statement to a block.
    pub fn add_local_decl(&mut self, block: NodeId, span: Span) -> Result<NodeId> {
        let id = self.alloc(
            NodeKind::LocalDecl {
                declarators: Vec::new(),
            },
            span,
        );
        self.attach_statement(block, id)?;
        Ok(id)
    }

    /// Add one declarator to a declaration statement. The span covers the
    /// declarator's own text only, not the whole statement, so splitting a
    /// multi-variable declaration reports just the removed variable's lines.
    pub fn add_declarator(&mut self, decl: NodeId, name: &str, span: Span) -> Result<NodeId> {
        self.try_node(decl)?;
        let id = self.alloc(
            NodeKind::LocalVar {
                name: name.to_string(),
                init: None,
            },
            span,
        );
        match &mut self.nodes[decl.index()].kind {
            NodeKind::LocalDecl { declarators } => declarators.push(id),
            _ => return Err(Error::structure(decl, "declarator on a non-declaration node")),
        }
        self.adopt(id, decl);
        Ok(id)
    }

    pub fn set_declarator_init(&mut self, declarator: NodeId, expr: NodeId) -> Result<()> {
        self.try_node(declarator)?;
        match &mut self.nodes[declarator.index()].kind {
            NodeKind::LocalVar { init, .. } => *init = Some(expr),
            _ => {
                return Err(Error::structure(
                    declarator,
                    "initializer on a non-declarator node",
                ))
            }
        }
        self.adopt(expr, declarator);
        Ok(())
    }

    pub fn add_expr_stmt(&mut self, block: NodeId, expr: NodeId, span: Span) -> Result<NodeId> {
        let id = self.alloc(NodeKind::ExprStmt { expr }, span);
        self.adopt(expr, id);
        self.attach_statement(block, id)?;
        Ok(id)
    }

    pub fn add_return(
        &mut self,
        block: NodeId,
        value: Option<NodeId>,
        span: Span,
    ) -> Result<NodeId> {
        let id = self.alloc(NodeKind::Return { value }, span);
        if let Some(value) = value {
            self.adopt(value, id);
        }
        self.attach_statement(block, id)?;
        Ok(id)
    }

    /// Resolved reference expression to `target`. Unattached until placed.
    pub fn new_name_ref(&mut self, target: NodeId, span: Span) -> NodeId {
        self.alloc(NodeKind::NameRef { target }, span)
    }

    /// Invocation of `method`. Unattached until placed.
    pub fn new_call(&mut self, method: NodeId, args: Vec<NodeId>, span: Span) -> NodeId {
        let callee = self.new_name_ref(method, span);
        let id = self.alloc(NodeKind::Call { callee, args }, span);
        self.adopt(callee, id);
        self.adopt_args(id);
        id
    }

    /// Instantiation of `ty`. Unattached until placed.
    pub fn new_instantiation(&mut self, ty: NodeId, args: Vec<NodeId>, span: Span) -> NodeId {
        let ty_ref = self.new_name_ref(ty, span);
        let id = self.alloc(NodeKind::New { ty: ty_ref, args }, span);
        self.adopt(ty_ref, id);
        self.adopt_args(id);
        id
    }

    pub fn new_literal(&mut self, span: Span) -> NodeId {
        self.alloc(NodeKind::Literal, span)
    }

    fn adopt_args(&mut self, id: NodeId) {
        let args = match &self.nodes[id.index()].kind {
            NodeKind::New { args, .. } | NodeKind::Call { args, .. } => args.clone(),
            _ => return,
        };
        for arg in args {
            self.adopt(arg, id);
        }
    }

    fn attach_member(&mut self, owner: NodeId, member: NodeId) -> Result<()> {
        self.try_node(owner)?;
        match &mut self.nodes[owner.index()].kind {
            NodeKind::Unit { members, .. } | NodeKind::NestedType { members, .. } => {
                members.push(member)
            }
            _ => return Err(Error::structure(owner, "owner cannot hold members")),
        }
        self.adopt(member, owner);
        Ok(())
    }

    fn attach_statement(&mut self, block: NodeId, stmt: NodeId) -> Result<()> {
        self.try_node(block)?;
        match &mut self.nodes[block.index()].kind {
            NodeKind::Block { statements } => statements.push(stmt),
            _ => return Err(Error::structure(block, "statement owner is not a block")),
        }
        self.adopt(stmt, block);
        Ok(())
    }

    // ---- traversal --------------------------------------------------------

    /// Child edges of `id` (tree edges only; `implements` is a reference edge).
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match &self.node(id).kind {
            NodeKind::Unit { members, .. } | NodeKind::NestedType { members, .. } => {
                members.clone()
            }
            NodeKind::Method { body, .. } => vec![*body],
            NodeKind::Field { init, .. } | NodeKind::LocalVar { init, .. } => {
                init.iter().copied().collect()
            }
            NodeKind::Block { statements } => statements.clone(),
            NodeKind::LocalDecl { declarators } => declarators.clone(),
            NodeKind::ExprStmt { expr } => vec![*expr],
            NodeKind::Return { value } => value.iter().copied().collect(),
            NodeKind::New { ty, args } => {
                std::iter::once(*ty).chain(args.iter().copied()).collect()
            }
            NodeKind::Call { callee, args } => std::iter::once(*callee)
                .chain(args.iter().copied())
                .collect(),
            NodeKind::NameRef { .. } | NodeKind::Literal => Vec::new(),
        }
    }

    /// Preorder walk of the subtree rooted at `id`, including `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            let mut children = self.children(current);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// The Code Unit root that owns `id`.
    pub fn unit_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            current = parent;
        }
        current
    }

    // ---- symbol attributes ------------------------------------------------

    pub fn symbol_kind(&self, id: NodeId) -> Option<SymbolKind> {
        match &self.node(id).kind {
            NodeKind::Method { .. } => Some(SymbolKind::Method),
            NodeKind::NestedType { .. } => Some(SymbolKind::NestedType),
            NodeKind::Field { .. } => Some(SymbolKind::Field),
            NodeKind::LocalVar { .. } => Some(SymbolKind::Local),
            _ => None,
        }
    }

    /// Declared visibility; locals are implicitly private to their unit.
    pub fn visibility(&self, id: NodeId) -> Option<Visibility> {
        match &self.node(id).kind {
            NodeKind::Method { visibility, .. }
            | NodeKind::NestedType { visibility, .. }
            | NodeKind::Field { visibility, .. } => Some(*visibility),
            NodeKind::LocalVar { .. } => Some(Visibility::Private),
            _ => None,
        }
    }

    pub fn is_annotated(&self, id: NodeId) -> bool {
        match &self.node(id).kind {
            NodeKind::Method { annotations, .. }
            | NodeKind::NestedType { annotations, .. }
            | NodeKind::Field { annotations, .. } => !annotations.is_empty(),
            _ => false,
        }
    }

    pub fn is_static(&self, id: NodeId) -> bool {
        match &self.node(id).kind {
            NodeKind::Method { is_static, .. } | NodeKind::Field { is_static, .. } => *is_static,
            _ => false,
        }
    }

    pub fn symbol_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            NodeKind::Unit { name, .. }
            | NodeKind::Method { name, .. }
            | NodeKind::NestedType { name, .. }
            | NodeKind::Field { name, .. }
            | NodeKind::LocalVar { name, .. } => Some(name),
            _ => None,
        }
    }

    // ---- mutation ---------------------------------------------------------

    /// Unlink the subtree rooted at `id` from its parent's list slot.
    ///
    /// Only list slots can be detached from (type members, block statements,
    /// declaration declarators); a node sitting in a fixed slot, such as a
    /// method body or a field initializer, can only leave the tree with its
    /// owner.
    pub fn detach(&mut self, id: NodeId) -> Result<DeletionRecord> {
        let node = self.try_node(id)?;
        if node.detached {
            return Err(Error::Detached(id));
        }
        let span = node.span;
        let parent = node
            .parent
            .ok_or_else(|| Error::structure(id, "root nodes cannot be detached"))?;

        let unlinked = match &mut self.nodes[parent.index()].kind {
            NodeKind::Unit { members, .. } | NodeKind::NestedType { members, .. } => {
                remove_handle(members, id)
            }
            NodeKind::Block { statements } => remove_handle(statements, id),
            NodeKind::LocalDecl { declarators } => remove_handle(declarators, id),
            _ => false,
        };
        if !unlinked {
            return Err(Error::structure(id, "parent slot does not allow detachment"));
        }

        let subtree = self.descendants(id);
        for n in &subtree {
            self.nodes[n.index()].detached = true;
        }
        Ok(DeletionRecord {
            symbols_removed: 0,
            nodes_removed: subtree.len(),
            lines_removed: span.line_count(),
        })
    }

    /// Repoint a reference at a different declaration. Used when a
    /// single-implementation interface is merged into its implementor.
    pub fn retarget_reference(&mut self, reference: NodeId, new_target: NodeId) -> Result<()> {
        self.try_node(reference)?;
        match &mut self.nodes[reference.index()].kind {
            NodeKind::NameRef { target } => {
                *target = new_target;
                Ok(())
            }
            _ => Err(Error::structure(reference, "not a reference node")),
        }
    }

    /// Drop `interface` from every implements clause in the model.
    pub fn clear_implements_of(&mut self, interface: NodeId) {
        for node in &mut self.nodes {
            if let NodeKind::NestedType { implements, .. } = &mut node.kind {
                implements.retain(|i| *i != interface);
            }
        }
    }
}

fn remove_handle(list: &mut Vec<NodeId>, id: NodeId) -> bool {
    match list.iter().position(|n| *n == id) {
        Some(pos) => {
            list.remove(pos);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_with_method() -> (SourceModel, NodeId, NodeId) {
        let mut model = SourceModel::new();
        let unit = model.add_unit("Widget", Span::new(1, 40));
        let method = model
            .add_method(
                unit,
                "render",
                Visibility::Private,
                false,
                &[],
                Span::new(10, 14),
            )
            .unwrap();
        (model, unit, method)
    }

    #[test]
    fn detach_unlinks_member_and_flags_subtree() {
        let (mut model, unit, method) = model_with_method();
        let body = model.method_body(method).unwrap();

        let record = model.detach(method).unwrap();
        assert_eq!(record.lines_removed, 5);
        assert_eq!(record.nodes_removed, 2);
        assert!(model.is_detached(method));
        assert!(model.is_detached(body));
        assert!(!model.descendants(unit).contains(&method));
    }

    #[test]
    fn detach_twice_reports_already_detached() {
        let (mut model, _, method) = model_with_method();
        model.detach(method).unwrap();
        assert!(matches!(model.detach(method), Err(Error::Detached(_))));
    }

    #[test]
    fn detach_of_fixed_slot_child_is_structural_error() {
        let (mut model, _, method) = model_with_method();
        let body = model.method_body(method).unwrap();
        assert!(matches!(
            model.detach(body),
            Err(Error::Structure { .. })
        ));
    }

    #[test]
    fn detach_of_unit_root_is_structural_error() {
        let (mut model, unit, _) = model_with_method();
        assert!(matches!(model.detach(unit), Err(Error::Structure { .. })));
    }

    #[test]
    fn builders_reject_shape_misuse() {
        let (mut model, unit, method) = model_with_method();
        let body = model.method_body(method).unwrap();

        assert!(matches!(
            model.set_implements(method, unit),
            Err(Error::Structure { .. })
        ));
        assert!(matches!(
            model.add_declarator(body, "x", Span::line(11)),
            Err(Error::Structure { .. })
        ));
        assert!(matches!(
            model.set_field_init(method, body),
            Err(Error::Structure { .. })
        ));
        assert!(matches!(
            model.method_body(body),
            Err(Error::Structure { .. })
        ));
        assert!(matches!(
            model.add_method(body, "m", Visibility::Private, false, &[], Span::line(11)),
            Err(Error::Structure { .. })
        ));
        assert!(matches!(
            model.add_local_decl(unit, Span::line(11)),
            Err(Error::Structure { .. })
        ));
    }

    #[test]
    fn unit_of_climbs_to_root() {
        let (mut model, unit, method) = model_with_method();
        let body = model.method_body(method).unwrap();
        let decl = model.add_local_decl(body, Span::line(11)).unwrap();
        let var = model.add_declarator(decl, "tmp", Span::line(11)).unwrap();
        assert_eq!(model.unit_of(var), unit);
    }

    #[test]
    fn descendants_walk_is_preorder_and_complete() {
        let (mut model, unit, method) = model_with_method();
        let body = model.method_body(method).unwrap();
        let lit = model.new_literal(Span::line(11));
        let stmt = model.add_expr_stmt(body, lit, Span::line(11)).unwrap();

        let walk = model.descendants(unit);
        assert_eq!(walk, vec![unit, method, body, stmt, lit]);
    }

    #[test]
    fn locals_report_private_visibility() {
        let (mut model, _, method) = model_with_method();
        let body = model.method_body(method).unwrap();
        let decl = model.add_local_decl(body, Span::line(12)).unwrap();
        let var = model.add_declarator(decl, "count", Span::line(12)).unwrap();
        assert_eq!(model.visibility(var), Some(Visibility::Private));
        assert_eq!(model.symbol_kind(var), Some(SymbolKind::Local));
    }
}
