use oxc_ast::ast::IdentifierReference;

use crate::magic_string::MagicString;
use crate::path::NodePath;
use crate::runtime::Runtime;
use crate::scope::ScopeResolver;
use crate::visitor::ModuleVisitor;

/// Routes free `console` reads through the runtime's global accessor.
pub struct ConsoleVisitor<'m, 'r, 's> {
    magic: &'m mut MagicString,
    runtime: &'r Runtime,
    resolver: &'s ScopeResolver<'s>,
    pub changed: bool,
}

impl<'m, 'r, 's> ConsoleVisitor<'m, 'r, 's> {
    pub fn new(magic: &'m mut MagicString, runtime: &'r Runtime, resolver: &'s ScopeResolver<'s>) -> Self {
        Self {
            magic,
            runtime,
            resolver,
            changed: false,
        }
    }
}

impl<'a, 'm, 'r, 's> ModuleVisitor<'a> for ConsoleVisitor<'m, 'r, 's> {
    fn visit_identifier(&mut self, ident: &IdentifierReference<'a>, path: &NodePath) {
        if ident.name != "console"
            || path.is_typeof_operand(ident.span)
            || path.is_write_target()
            || path.in_with_body()
            || !self.resolver.is_free(ident)
        {
            return;
        }

        let global = self.runtime.global("console");
        if path.is_shorthand_value(ident.span) {
            self.magic
                .prepend_left(ident.span.end, &format!(":{}", global));
        } else {
            self.magic
                .overwrite(ident.span.start, ident.span.end, &global);
        }
        self.changed = true;
    }
}
