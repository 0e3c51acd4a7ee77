//! Snippets that call into the loader's runtime object.
//!
//! Every generated call goes through a single identifier (the runtime name,
//! `_` by default). The member letters are part of the contract with the
//! loader and must not change.

pub const ASSERT_TDZ: &str = "a";
pub const CONTAINED_EVAL: &str = "c";
pub const DEFAULT_VALUE: &str = "d";
pub const INDIRECT_EVAL: &str = "e";
pub const REEXPORT_SETTER: &str = "f";
pub const GLOBAL: &str = "g";
pub const DYNAMIC_IMPORT: &str = "i";
pub const INIT_BINDINGS: &str = "j";
pub const KEEP_EVAL: &str = "k";
pub const IMPORT_META: &str = "m";
pub const STAR_SETTER: &str = "n";
pub const CJS_VAR: &str = "t";
pub const UPDATE: &str = "u";
pub const REAL_EVAL: &str = "v";
pub const WATCH: &str = "w";
pub const EXPORT: &str = "x";

/// Prefix written before compiled output so hosts can recognize it.
pub const MAIN_MARKER: &str = "\"main\";";

/// Render `value` as a double-quoted JavaScript string literal.
pub fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value.escape_default()))
}

/// One entry of an import watch list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Setter {
    /// Assign the imported value to a local binding.
    Local { imported: String, local: String },
    /// Forward `imported` to this module's export named `exported`.
    Reexport { imported: String, exported: String },
    /// Merge every export of the dependency into this module's namespace.
    Star,
}

#[derive(Debug, Clone)]
pub struct Runtime {
    name: String,
}

impl Runtime {
    pub fn new(name: &str) -> Self {
        Runtime {
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn member(&self, member: &str) -> String {
        format!("{}.{}", self.name, member)
    }

    /// `_.a("name",` followed by the identifier and `)` from the caller.
    pub fn assert_tdz_open(&self, name: &str) -> String {
        format!("{}.{}({},", self.name, ASSERT_TDZ, js_string(name))
    }

    pub fn assert_tdz(&self, name: &str) -> String {
        format!("{}{})", self.assert_tdz_open(name), name)
    }

    pub fn init_bindings(&self, names: &[String]) -> String {
        format!(";{}.{}({});", self.name, INIT_BINDINGS, js_array(names))
    }

    pub fn cjs_var(&self, name: &str) -> String {
        format!("{}.{}({})", self.name, CJS_VAR, js_string(name))
    }

    pub fn global(&self, name: &str) -> String {
        format!("{}.{}.{}", self.name, GLOBAL, name)
    }

    /// Sloppy-mode form of a bare `eval` read. Only the real global eval
    /// is swapped for the runtime's indirect eval.
    pub fn indirect_eval(&self, strict: bool) -> String {
        if strict {
            self.member(INDIRECT_EVAL)
        } else {
            format!(
                "(eval==={}?{}:eval)",
                self.member(REAL_EVAL),
                self.member(INDIRECT_EVAL)
            )
        }
    }

    /// Wrapper placed between a direct `eval` callee and its argument list.
    pub fn contained_eval(&self, strict: bool) -> String {
        if strict {
            self.member(CONTAINED_EVAL)
        } else {
            format!(
                "(eval==={}?{}:{})",
                self.member(REAL_EVAL),
                self.member(CONTAINED_EVAL),
                self.member(KEEP_EVAL)
            )
        }
    }

    /// `_.x([["name",()=>local],...]);`
    pub fn export(&self, pairs: &[(String, String)]) -> String {
        let getters = pairs
            .iter()
            .map(|(exported, local)| format!("[{},()=>{}]", js_string(exported), local))
            .collect::<Vec<_>>()
            .join(",");
        format!("{}.{}([{}]);", self.name, EXPORT, getters)
    }

    /// `_.w("specifier",[...setters]);` or `_.w("specifier");` when there is
    /// nothing to bind.
    pub fn watch(&self, specifier: &str, setters: &[Setter]) -> String {
        if setters.is_empty() {
            return format!("{}.{}({});", self.name, WATCH, js_string(specifier));
        }

        let entries = setters
            .iter()
            .map(|setter| self.setter(setter))
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "{}.{}({},[{}]);",
            self.name,
            WATCH,
            js_string(specifier),
            entries
        )
    }

    fn setter(&self, setter: &Setter) -> String {
        match setter {
            Setter::Local { imported, local } => format!(
                "[{},[{}],function(v){{{}=v}}]",
                js_string(imported),
                js_string(local),
                local
            ),
            Setter::Reexport { imported, exported } => format!(
                "[{},null,{}.{}({})]",
                js_string(imported),
                self.name,
                REEXPORT_SETTER,
                js_string(exported)
            ),
            Setter::Star => format!("[\"*\",null,{}.{}()]", self.name, STAR_SETTER),
        }
    }
}

fn js_array(names: &[String]) -> String {
    let items = names
        .iter()
        .map(|name| js_string(name))
        .collect::<Vec<_>>()
        .join(",");
    format!("[{}]", items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_string_escapes() {
        assert_eq!(js_string("a\"b\n"), "\"a\\\"b\\n\"");
    }

    #[test]
    fn test_eval_forms() {
        let runtime = Runtime::new("_");
        assert_eq!(runtime.indirect_eval(true), "_.e");
        assert_eq!(runtime.indirect_eval(false), "(eval===_.v?_.e:eval)");
        assert_eq!(runtime.contained_eval(false), "(eval===_.v?_.c:_.k)");
    }

    #[test]
    fn test_watch_forms() {
        let runtime = Runtime::new("_");
        assert_eq!(runtime.watch("a", &[]), "_.w(\"a\");");
        assert_eq!(
            runtime.watch(
                "./m",
                &[
                    Setter::Local {
                        imported: "default".into(),
                        local: "d".into()
                    },
                    Setter::Reexport {
                        imported: "x".into(),
                        exported: "y".into()
                    },
                    Setter::Star,
                ]
            ),
            "_.w(\"./m\",[[\"default\",[\"d\"],function(v){d=v}],[\"x\",null,_.f(\"y\")],[\"*\",null,_.n()]]);"
        );
    }

    #[test]
    fn test_export_and_tdz() {
        let runtime = Runtime::new("rt");
        assert_eq!(
            runtime.export(&[("default".into(), "f".into())]),
            "rt.x([[\"default\",()=>f]]);"
        );
        assert_eq!(runtime.assert_tdz("a"), "rt.a(\"a\",a)");
        assert_eq!(runtime.init_bindings(&["a".into()]), ";rt.j([\"a\"]);");
        assert_eq!(runtime.cjs_var("module"), "rt.t(\"module\")");
        assert_eq!(runtime.global("console"), "rt.g.console");
    }
}
