//! # ESM Compiler
//!
//! Source-to-source compiler that rewrites ES module syntax into calls on a
//! small runtime object, so a CommonJS-style host can execute it with live
//! bindings and TDZ checks intact.
//!
//! ## Output Invariants
//!
//! 1. **Line Preservation**: Every removed statement is replaced by its own line
//!    terminators. Line N of the input is line N of the output.
//!
//! 2. **Single Runtime Name**: All injected calls go through one identifier
//!    (`_` unless configured), e.g. `_.w("m",[...])`, `_.x([...])`, `_.u(a=1)`.
//!
//! 3. **Hoisting Order**: Generated code is inserted once, after the directive
//!    prologue: import binding declarations, then exports, then imports.
//!
//! 4. **Scope Exactness**: `console`, `eval`, `arguments` and imported names are
//!    only rewritten where they resolve to the binding the rewrite assumes.
//!    Shadowed references are left untouched.
//!
//! 5. **Deferred TDZ**: TDZ assertions are never emitted by `compile` itself.
//!    They are applied by [`CompileResult::enforce_tdz`] once a module is known
//!    to participate in a cycle.

#[cfg(feature = "napi")]
use napi_derive::napi;

mod arguments;
mod assignment;
mod bindings;
mod cache;
mod compiler;
mod console;
mod eval;
mod graph;
mod import_export;
mod magic_string;
mod options;
mod parse;
mod path;
mod runtime;
mod scope;
mod temporal;
mod validate;
mod visitor;

#[cfg(test)]
mod compiler_tests;

pub use arguments::{CompileWarning, WRN_ARGUMENTS_ACCESS};
pub use bindings::{LiveBindings, SubscriptionId};
pub use cache::CompileCache;
pub use compiler::{compile, CompileResult, DependencySpecifier, ExportedSpecifier};
pub use graph::{ModuleEntry, ModuleGraph, ModuleId, ModuleKind};
pub use magic_string::MagicString;
pub use options::{CjsOptions, CompileOptions, SourceType};
pub use validate::*;

/// Compile `code` with a JSON options object and return the serialized
/// result, for hosts that load the crate as a Node addon.
#[cfg(feature = "napi")]
#[napi]
pub fn compile_native(code: String, options_json: Option<String>) -> napi::Result<String> {
    let options = match options_json.as_deref() {
        Some(json) => CompileOptions::from_json(json),
        None => Ok(CompileOptions::default()),
    }
    .map_err(|e| napi::Error::from_reason(e.to_string()))?;

    let result = compile(&code, &options).map_err(|e| napi::Error::from_reason(e.to_string()))?;

    serde_json::to_string(&result)
        .map_err(|e| napi::Error::from_reason(format!("Result serialize error: {}", e)))
}
