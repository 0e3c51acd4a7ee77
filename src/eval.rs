//! Keeps `eval` from running with the rewritten module's scope.
//!
//! Direct calls get the contained eval spliced in front of their argument
//! list. Every other read of the global `eval` is swapped for the runtime's
//! indirect eval. In sloppy code both forms first check that `eval` still
//! is the real global eval.

use oxc_ast::ast::{CallExpression, Expression, IdentifierReference};

use crate::magic_string::MagicString;
use crate::path::NodePath;
use crate::runtime::{Runtime, UPDATE};
use crate::scope::ScopeResolver;
use crate::visitor::{CallWalk, ModuleVisitor};

pub struct EvalVisitor<'m, 'r, 's> {
    magic: &'m mut MagicString,
    runtime: &'r Runtime,
    resolver: &'s ScopeResolver<'s>,
    strict: bool,
    /// Direct evals can write to exported bindings, so their results are
    /// wrapped in an update call when the module has exports.
    added_import_export: bool,
    pub changed: bool,
}

impl<'m, 'r, 's> EvalVisitor<'m, 'r, 's> {
    pub fn new(
        magic: &'m mut MagicString,
        runtime: &'r Runtime,
        resolver: &'s ScopeResolver<'s>,
        strict: bool,
        added_import_export: bool,
    ) -> Self {
        Self {
            magic,
            runtime,
            resolver,
            strict,
            added_import_export,
            changed: false,
        }
    }

    fn is_global_eval(&self, ident: &IdentifierReference, path: &NodePath) -> bool {
        ident.name == "eval" && !path.in_with_body() && self.resolver.is_free(ident)
    }
}

impl<'a, 'm, 'r, 's> ModuleVisitor<'a> for EvalVisitor<'m, 'r, 's> {
    fn visit_call_expression(&mut self, call: &CallExpression<'a>, path: &NodePath) -> CallWalk {
        let Expression::Identifier(callee) = &call.callee else {
            return CallWalk::Full;
        };
        if call.optional || !self.is_global_eval(callee, path) {
            return CallWalk::Full;
        }
        // `eval()` evaluates nothing and can be left alone.
        if call.arguments.is_empty() {
            return CallWalk::ArgumentsOnly;
        }

        let code = self.runtime.contained_eval(self.strict);
        self.magic
            .prepend_left(callee.span.end, &format!("({}", code))
            .prepend_left(call.span.end, ")");

        if self.added_import_export {
            let update = self.runtime.member(UPDATE);
            self.magic
                .prepend_left(call.span.start, &format!("{}(", update))
                .prepend_left(call.span.end, ")");
        }

        self.changed = true;
        CallWalk::ArgumentsOnly
    }

    fn visit_identifier(&mut self, ident: &IdentifierReference<'a>, path: &NodePath) {
        if path.is_write_target() || path.is_typeof_operand(ident.span) || !self.is_global_eval(ident, path) {
            return;
        }

        let code = self.runtime.indirect_eval(self.strict);
        if path.is_shorthand_value(ident.span) {
            self.magic
                .prepend_left(ident.span.end, &format!(":{}", code));
        } else {
            self.magic
                .overwrite(ident.span.start, ident.span.end, &code);
        }
        self.changed = true;
    }
}
