//! Compiler configuration.
//!
//! Options arrive either as Rust values or as a JSON object from a host
//! (the NAPI binding, a config file). Every field is optional on the wire and
//! falls back to the defaults below.

use serde::{Deserialize, Serialize};

use crate::validate::{CompilerError, ERR_INVALID_OPTION};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Script,
    Module,
    Unambiguous,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Script => "script",
            SourceType::Module => "module",
            SourceType::Unambiguous => "unambiguous",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CjsOptions {
    /// Allow `return` at the top level even under module grammar.
    pub top_level_return: bool,
    /// Keep CommonJS free variables (`arguments`, `require`, ...) untouched.
    pub vars: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    pub source_type: SourceType,
    /// Only consulted when `source_type` is `Unambiguous`.
    pub hint: SourceType,
    pub pragmas: bool,
    pub strict: Option<bool>,
    pub runtime_name: String,
    pub cjs: CjsOptions,
    /// Declare generated import bindings with `var` instead of `let`.
    pub var: bool,
    pub warnings: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            source_type: SourceType::Script,
            hint: SourceType::Script,
            pragmas: true,
            strict: None,
            runtime_name: "_".to_string(),
            cjs: CjsOptions::default(),
            var: false,
            warnings: false,
        }
    }
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn module() -> Self {
        Self::default().with_source_type(SourceType::Module)
    }

    pub fn with_source_type(mut self, source_type: SourceType) -> Self {
        self.source_type = source_type;
        self
    }

    pub fn with_hint(mut self, hint: SourceType) -> Self {
        self.hint = hint;
        self
    }

    pub fn with_runtime_name(mut self, name: &str) -> Self {
        self.runtime_name = name.to_string();
        self
    }

    pub fn from_json(json: &str) -> Result<Self, CompilerError> {
        let options: CompileOptions = serde_json::from_str(json).map_err(|e| {
            CompilerError::new(
                ERR_INVALID_OPTION,
                &format!("Invalid compiler options: {}", e),
            )
        })?;
        options.check()?;
        Ok(options)
    }

    /// Reject options that would produce unparsable output.
    pub fn check(&self) -> Result<(), CompilerError> {
        if !is_identifier_name(&self.runtime_name) {
            return Err(CompilerError::new(
                ERR_INVALID_OPTION,
                &format!(
                    "The 'runtimeName' option must be a valid identifier. Received '{}'",
                    self.runtime_name
                ),
            ));
        }
        Ok(())
    }

    /// Stable string identifying every option that can change compiler output.
    pub fn fingerprint(&self) -> String {
        format!(
            "{}|{}|{}|{:?}|{}|{}|{}|{}|{}",
            self.source_type,
            self.hint,
            self.pragmas,
            self.strict,
            self.runtime_name,
            self.cjs.top_level_return,
            self.cjs.vars,
            self.var,
            self.warnings
        )
    }
}

fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c == '$' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c == '$' || c.is_alphanumeric())
}
