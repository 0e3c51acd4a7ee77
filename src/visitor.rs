//! The single traversal mechanism shared by every rewriting pass.
//!
//! Rules:
//! 1. Passes implement [`ModuleVisitor`] and override only the hooks they need.
//! 2. [`traverse`] owns the walk. It keeps the [`NodePath`] current and skips
//!    statements that cannot contain any of the pass's candidate offsets.
//! 3. Import declarations and the specifier lists of export declarations are
//!    handed to the hooks but never descended into, since none of their
//!    identifiers are ordinary references.

use oxc_ast::ast::{
    ArrowFunctionExpression, AssignmentExpression, AssignmentTargetPropertyIdentifier,
    CallExpression, ComputedMemberExpression, ExportAllDeclaration, ExportDefaultDeclaration,
    ExportNamedDeclaration, Function, IdentifierReference, ImportDeclaration, ImportExpression,
    MetaProperty, NewExpression, ObjectProperty, PrivateFieldExpression, Program,
    SimpleAssignmentTarget, Statement, StaticMemberExpression, UnaryExpression, UpdateExpression,
    WithStatement,
};
use oxc_ast_visit::{walk, Visit};
use oxc_span::{GetSpan, Span};
use oxc_syntax::scope::ScopeFlags;

use crate::path::{Frame, NodePath};

// ═══════════════════════════════════════════════════════════════════════════════
// CANDIDATE OFFSETS
// ═══════════════════════════════════════════════════════════════════════════════

/// Sorted offsets where a pass's target names occur in the source text.
#[derive(Debug, Clone, Default)]
pub struct PossibleIndexes {
    indexes: Vec<u32>,
}

impl PossibleIndexes {
    pub fn new(mut indexes: Vec<u32>) -> Self {
        indexes.sort_unstable();
        indexes.dedup();
        Self { indexes }
    }

    /// True when some candidate offset lies inside `span`.
    pub fn overlaps(&self, span: Span) -> bool {
        let first = self.indexes.partition_point(|&index| index < span.start);
        self.indexes.get(first).is_some_and(|&index| index < span.end)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VISITOR HOOKS
// ═══════════════════════════════════════════════════════════════════════════════

/// How much of a call expression the traversal should descend into after
/// [`ModuleVisitor::visit_call_expression`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallWalk {
    Full,
    ArgumentsOnly,
}

pub trait ModuleVisitor<'a> {
    fn visit_identifier(&mut self, _ident: &IdentifierReference<'a>, _path: &NodePath) {}

    fn visit_call_expression(&mut self, _call: &CallExpression<'a>, _path: &NodePath) -> CallWalk {
        CallWalk::Full
    }

    fn visit_assignment_expression(&mut self, _expr: &AssignmentExpression<'a>, _path: &NodePath) {}

    fn visit_update_expression(&mut self, _expr: &UpdateExpression<'a>, _path: &NodePath) {}

    fn visit_import_declaration(&mut self, _decl: &ImportDeclaration<'a>) {}

    fn visit_export_all_declaration(&mut self, _decl: &ExportAllDeclaration<'a>) {}

    fn visit_export_default_declaration(&mut self, _decl: &ExportDefaultDeclaration<'a>) {}

    fn visit_export_named_declaration(&mut self, _decl: &ExportNamedDeclaration<'a>) {}

    fn visit_import_expression(&mut self, _expr: &ImportExpression<'a>, _path: &NodePath) {}

    fn visit_meta_property(&mut self, _prop: &MetaProperty<'a>, _path: &NodePath) {}
}

/// Walk `program` and feed `visitor` every node it has a hook for.
pub fn traverse<'a, V: ModuleVisitor<'a>>(
    visitor: &mut V,
    program: &Program<'a>,
    indexes: &PossibleIndexes,
) {
    let mut traversal = Traversal {
        visitor,
        path: NodePath::new(),
        indexes,
    };
    traversal.visit_program(program);
}

struct Traversal<'v, 'i, V> {
    visitor: &'v mut V,
    path: NodePath,
    indexes: &'i PossibleIndexes,
}

impl<'v, 'i, V> Traversal<'v, 'i, V> {
    fn framed<F: FnOnce(&mut Self)>(&mut self, frame: Frame, f: F) {
        self.path.push(frame);
        f(self);
        self.path.pop();
    }
}

impl<'a, 'v, 'i, V: ModuleVisitor<'a>> Visit<'a> for Traversal<'v, 'i, V> {
    fn visit_statement(&mut self, it: &Statement<'a>) {
        if !self.indexes.overlaps(it.span()) {
            return;
        }

        match it {
            Statement::ImportDeclaration(decl) => {
                self.visitor.visit_import_declaration(decl);
            }
            Statement::ExportAllDeclaration(decl) => {
                self.visitor.visit_export_all_declaration(decl);
            }
            Statement::ExportDefaultDeclaration(decl) => {
                self.visitor.visit_export_default_declaration(decl);
                walk::walk_export_default_declaration(self, decl);
            }
            Statement::ExportNamedDeclaration(decl) => {
                self.visitor.visit_export_named_declaration(decl);
                if let Some(declaration) = &decl.declaration {
                    self.visit_declaration(declaration);
                }
            }
            _ => walk::walk_statement(self, it),
        }
    }

    fn visit_identifier_reference(&mut self, it: &IdentifierReference<'a>) {
        self.visitor.visit_identifier(it, &self.path);
    }

    fn visit_unary_expression(&mut self, it: &UnaryExpression<'a>) {
        let frame = Frame::Unary {
            operator: it.operator,
            argument: it.argument.span(),
        };
        self.framed(frame, |this| walk::walk_unary_expression(this, it));
    }

    fn visit_object_property(&mut self, it: &ObjectProperty<'a>) {
        let frame = Frame::Property {
            shorthand: it.shorthand,
            value: it.value.span(),
        };
        self.framed(frame, |this| walk::walk_object_property(this, it));
    }

    fn visit_new_expression(&mut self, it: &NewExpression<'a>) {
        let frame = Frame::New {
            callee: it.callee.span(),
        };
        self.framed(frame, |this| walk::walk_new_expression(this, it));
    }

    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        let walk_kind = self.visitor.visit_call_expression(it, &self.path);
        let frame = Frame::Call {
            callee: it.callee.span(),
        };
        self.framed(frame, |this| match walk_kind {
            CallWalk::Full => walk::walk_call_expression(this, it),
            CallWalk::ArgumentsOnly => {
                for argument in &it.arguments {
                    this.visit_argument(argument);
                }
            }
        });
    }

    fn visit_static_member_expression(&mut self, it: &StaticMemberExpression<'a>) {
        let frame = Frame::Member {
            object: it.object.span(),
            span: it.span,
        };
        self.framed(frame, |this| walk::walk_static_member_expression(this, it));
    }

    fn visit_computed_member_expression(&mut self, it: &ComputedMemberExpression<'a>) {
        let frame = Frame::Member {
            object: it.object.span(),
            span: it.span,
        };
        self.framed(frame, |this| walk::walk_computed_member_expression(this, it));
    }

    fn visit_private_field_expression(&mut self, it: &PrivateFieldExpression<'a>) {
        let frame = Frame::Member {
            object: it.object.span(),
            span: it.span,
        };
        self.framed(frame, |this| walk::walk_private_field_expression(this, it));
    }

    fn visit_simple_assignment_target(&mut self, it: &SimpleAssignmentTarget<'a>) {
        match it {
            SimpleAssignmentTarget::AssignmentTargetIdentifier(ident) => {
                self.framed(Frame::AssignTarget, |this| this.visit_identifier_reference(ident));
            }
            _ => walk::walk_simple_assignment_target(self, it),
        }
    }

    fn visit_assignment_target_property_identifier(
        &mut self,
        it: &AssignmentTargetPropertyIdentifier<'a>,
    ) {
        self.framed(Frame::AssignTarget, |this| {
            this.visit_identifier_reference(&it.binding)
        });
        if let Some(init) = &it.init {
            self.visit_expression(init);
        }
    }

    fn visit_assignment_expression(&mut self, it: &AssignmentExpression<'a>) {
        self.visitor.visit_assignment_expression(it, &self.path);
        walk::walk_assignment_expression(self, it);
    }

    fn visit_update_expression(&mut self, it: &UpdateExpression<'a>) {
        self.visitor.visit_update_expression(it, &self.path);
        walk::walk_update_expression(self, it);
    }

    fn visit_with_statement(&mut self, it: &WithStatement<'a>) {
        self.visit_expression(&it.object);
        self.framed(Frame::WithBody, |this| this.visit_statement(&it.body));
    }

    fn visit_function(&mut self, it: &Function<'a>, flags: ScopeFlags) {
        self.framed(Frame::Function { arrow: false }, |this| {
            walk::walk_function(this, it, flags)
        });
    }

    fn visit_arrow_function_expression(&mut self, it: &ArrowFunctionExpression<'a>) {
        self.framed(Frame::Function { arrow: true }, |this| {
            walk::walk_arrow_function_expression(this, it)
        });
    }

    fn visit_import_expression(&mut self, it: &ImportExpression<'a>) {
        self.visitor.visit_import_expression(it, &self.path);
        walk::walk_import_expression(self, it);
    }

    fn visit_meta_property(&mut self, it: &MetaProperty<'a>) {
        self.visitor.visit_meta_property(it, &self.path);
    }
}
