use std::sync::Arc;

use crate::compiler::{compile, CompileResult};
use crate::options::{CjsOptions, CompileOptions, SourceType};
use crate::validate::{ERR_INVALID_OPTION, ERR_SYNTAX};

const MODERN_TYPES: [SourceType; 2] = [SourceType::Module, SourceType::Unambiguous];
const SOURCE_TYPES: [SourceType; 3] = [
    SourceType::Script,
    SourceType::Module,
    SourceType::Unambiguous,
];

fn options(source_type: SourceType) -> CompileOptions {
    CompileOptions::new().with_source_type(source_type)
}

fn compile_as(code: &str, source_type: SourceType) -> CompileResult {
    compile(code, &options(source_type)).unwrap()
}

fn last_line(result: &CompileResult) -> String {
    result.code().split('\n').last().unwrap_or_default().to_string()
}

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE TYPES AND OPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_top_level_return_option() {
    assert!(compile("return", &CompileOptions::default()).is_ok());

    let mut allowed = options(SourceType::Module);
    allowed.cjs = CjsOptions {
        top_level_return: true,
        vars: false,
    };
    let result = compile("return", &allowed).unwrap();
    assert!(result.top_level_return);

    let err = compile("return", &options(SourceType::Module)).unwrap_err();
    assert_eq!(err.code, ERR_SYNTAX);
    assert_eq!(err.error_type, "SyntaxError");
    assert_eq!(err.source_type, Some(SourceType::Module));
}

#[test]
fn test_modern_types_detect_imports() {
    for source_type in MODERN_TYPES {
        let result = compile_as("import\"a\"", source_type);
        assert_eq!(result.source_type, SourceType::Module);
    }
}

#[test]
fn test_cjs_vars_option() {
    let code = "arguments";

    assert_eq!(&*compile_as(code, SourceType::Script).code(), code);

    let mut keep = options(SourceType::Module);
    keep.cjs.vars = true;
    assert_eq!(&*compile(code, &keep).unwrap().code(), code);

    let result = compile_as(code, SourceType::Module);
    assert!(result.code().contains("_.t(\"arguments\")"));
}

#[test]
fn test_module_source_type_is_kept() {
    let cases = [
        "1+2",
        "1+2//import",
        "1+2//import.meta",
        "\"use module\";1+2",
        "'use module';1+2",
        "\"use script\";1+2",
        "'use script';1+2",
        "import'a'",
        "import\"a\"",
        "import.meta",
    ];

    for code in cases {
        assert_eq!(
            compile_as(code, SourceType::Module).source_type,
            SourceType::Module,
            "{}",
            code
        );
    }
}

#[test]
fn test_unambiguous_resolution() {
    use SourceType::{Module, Script};

    let cases: [(&str, Option<SourceType>, SourceType); 13] = [
        ("1+2", None, Script),
        ("1+2//import", None, Script),
        ("1+2//import.meta", None, Script),
        ("return 1+2//eval", None, Script),
        ("1+2", Some(Module), Module),
        ("\"use module\";1+2", None, Module),
        ("'use module';1+2", Some(Module), Module),
        ("\"use script\";1+2", None, Script),
        // The hint wins over a "use script" pragma.
        ("'use script';1+2", Some(Module), Module),
        ("import'a'", None, Module),
        ("import\"a\"", Some(Module), Module),
        ("import.meta", None, Module),
        ("import.meta", Some(Module), Module),
    ];

    for (code, hint, expected) in cases {
        let mut opts = options(SourceType::Unambiguous);
        if let Some(hint) = hint {
            opts = opts.with_hint(hint);
        }
        let result = compile(code, &opts).unwrap();
        assert_eq!(result.source_type, expected, "{} (hint {:?})", code, hint);
    }
}

#[test]
fn test_var_option() {
    for var in [false, true] {
        for source_type in MODERN_TYPES {
            let mut opts = options(source_type);
            opts.var = var;
            let result = compile("import a from \"a\"", &opts).unwrap();
            assert!(result.code().contains(if var { "var a" } else { "let a" }));
        }
    }
}

#[test]
fn test_use_module_directive() {
    let cases = [
        "'use module';\"use script\";import'a'",
        "'use module';\"use script\";import.meta",
        "\"use module\";'use script';import\"a\"",
        "\"use module\";'use script';import.meta",
    ];

    for code in cases {
        for hint in [SourceType::Module, SourceType::Script] {
            let result = compile(code, &options(SourceType::Unambiguous).with_hint(hint)).unwrap();
            assert_eq!(result.source_type, SourceType::Module, "{}", code);
        }
    }
}

#[test]
fn test_use_script_directive() {
    let cases = [
        "'use script';\"use module\";import'a'",
        "'use script';\"use module\";import.meta",
        "\"use script\";'use module';import\"a\"",
        "\"use script\";'use module';import.meta",
    ];

    for code in cases {
        let err = compile(code, &options(SourceType::Unambiguous)).unwrap_err();
        assert_eq!(err.error_type, "SyntaxError", "{}", code);
    }
}

#[test]
fn test_pragmas_can_be_disabled() {
    let mut opts = options(SourceType::Unambiguous);
    opts.pragmas = false;
    let result = compile("'use module';1+2", &opts).unwrap();
    assert_eq!(result.source_type, SourceType::Script);
}

#[test]
fn test_runtime_name_option() {
    let opts = options(SourceType::Module).with_runtime_name("rt");
    let result = compile("import a from \"a\"", &opts).unwrap();
    assert!(result.code().contains("rt.w(\"a\""));

    let err = compile("1", &CompileOptions::new().with_runtime_name("1x")).unwrap_err();
    assert_eq!(err.code, ERR_INVALID_OPTION);
    assert_eq!(err.error_type, "TypeError");
}

#[test]
fn test_options_from_json() {
    let opts = CompileOptions::from_json(
        r#"{"sourceType":"module","cjs":{"vars":true},"runtimeName":"r","unknown":1}"#,
    )
    .unwrap();
    assert_eq!(opts.source_type, SourceType::Module);
    assert!(opts.cjs.vars);
    assert!(!opts.cjs.top_level_return);
    assert!(opts.pragmas);
    assert_eq!(opts.runtime_name, "r");

    let err = CompileOptions::from_json("{\"sourceType\":\"esm\"}").unwrap_err();
    assert_eq!(err.code, ERR_INVALID_OPTION);
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEXT PRESERVATION
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_shebang_is_removed() {
    let shebang = "#!/usr/bin/env node -r esm";
    let code = format!("{}\nimport a from \"a\"", shebang);

    for source_type in MODERN_TYPES {
        let result = compile_as(&code, source_type);
        assert!(!result.code().contains(shebang));
    }
}

#[test]
fn test_shebang_line_is_dropped_from_count() {
    let code = "#!/usr/bin/env node\nimport a from \"a\"\nexport const b = a\nb";
    for source_type in MODERN_TYPES {
        let result = compile_as(code, source_type);
        assert_eq!(result.code().split('\n').count(), code.split('\n').count() - 1);
        assert_eq!(last_line(&result), "b");
    }

    let script = "#!/usr/bin/env node\nlet a = 1\na";
    let result = compile_as(script, SourceType::Script);
    assert_eq!(&*result.code(), "let a = 1\na");
}

#[test]
fn test_trailing_comment() {
    for source_type in MODERN_TYPES {
        let result = compile_as("import\"a\"//trailing comment", source_type);
        assert!(result.code().ends_with("//trailing comment"));
    }
}

#[test]
fn test_dynamic_import_in_script() {
    let result = compile_as("import(\"a\")", SourceType::Script);
    assert_eq!(result.source_type, SourceType::Script);
    assert!(result.changed);
    assert!(result.code().contains("_.i(\"a\")"));
}

#[test]
fn test_dynamic_import_in_switch() {
    let code = [
        "(async () => {",
        "  switch (await import(\"a\")) {",
        "    case await import(\"b\"):",
        "      return await import (\"c\")",
        "  }",
        "})()",
    ]
    .join("\n");

    for source_type in SOURCE_TYPES {
        let result = compile_as(&code, source_type);
        assert!(!result.code().contains("import"), "{:?}", source_type);
    }
}

#[test]
fn test_line_numbers_are_preserved() {
    let code = [
        "import", "", "a", "", "from \"a\"", "", "export", "", "default", "", "() =>", "//", "{",
        "b", "}",
    ]
    .join("\n");

    for source_type in MODERN_TYPES {
        let result = compile_as(&code, source_type);
        let code = result.code();
        let lines: Vec<&str> = code.split('\n').collect();
        assert_eq!(lines.len(), 15);
        assert_eq!(lines[13], "b");
    }
}

#[test]
fn test_crlf_is_preserved() {
    let code = [
        "import {",
        "  strictEqual,",
        "",
        "  deepEqual",
        "}",
        "from \"assert\"",
    ]
    .join("\r\n");

    for source_type in MODERN_TYPES {
        let result = compile_as(&code, source_type);
        assert!(result.code().ends_with(&"\r\n".repeat(5)));
    }
}

#[test]
fn test_string_literals_are_not_rewritten() {
    let code = "'a; import b from \"c\"; d'\n\"a; import b \" + 'from \"c\"; d'";

    for source_type in SOURCE_TYPES {
        let result = compile_as(code, source_type);
        assert_eq!(&*result.code(), code);
    }
}

#[test]
fn test_fast_path_returns_source() {
    let code = "var x = 1;\nfunction f() { return x }\n";
    let result = compile_as(code, SourceType::Unambiguous);

    assert!(!result.changed);
    assert_eq!(result.source_type, SourceType::Script);
    assert!(!result.has_pending_tdz());
    assert_eq!(&*result.code(), code);
}

#[test]
fn test_code_is_memoized() {
    let result = compile_as("import a from \"a\"", SourceType::Module);
    let first = result.code();
    assert!(first.starts_with("\"main\";"));
    assert!(Arc::ptr_eq(&first, &result.code()));
}

#[test]
fn test_modern_syntax_parses() {
    let snippets = [
        "({ async delete() {} })",
        "({ a = 1 }) => {}",
        "({ a = 1 }, { b = 2 }) => {}",
        "1n\n1234567890123456789n\n0b01n\n0xFn\n0o01n",
        "1_0\n.1_0e1_0\n0b0_1\n0x0_F\n0o0_1\n1_0n\n0x0_an",
    ];

    for code in snippets {
        for source_type in SOURCE_TYPES {
            assert!(compile(code, &options(source_type)).is_ok(), "{}", code);
        }
    }

    let module_snippets = [
        "import { a } from \"a\"",
        "import \"a\"",
        "let a; export { a }",
        "export default a",
        "export default async function * a() {}\nexport const b = {\n  async *b() {}\n}\nexport class C {\n  async *c() {}\n}",
        "export class A { a }\nexport class B { b = \"b\" }\nexport class C { #c }\nexport class D { static = 1 }",
        "export default async function convert(iterable) {\n  const result = []\n  for await (const value of iterable) {\n    result.push(value)\n  }\n  return result\n}",
        "const ab = { a: \"a\", b: \"b\" }\nconst abc = { ...K(ab), c: \"c\" }\nexport const { a, ...bc } = abc\nexport const d = ({ a, ...bcd } = {}) => bcd\nexport default { ...abc, d }",
    ];

    for code in module_snippets {
        for source_type in MODERN_TYPES {
            assert!(compile(code, &options(source_type)).is_ok(), "{}", code);
        }
    }
}

#[test]
fn test_parse_errors() {
    for code in ["a(", "a(b c)", "'", "`a"] {
        let err = compile(code, &options(SourceType::Module)).unwrap_err();
        assert_eq!(err.code, ERR_SYNTAX, "{}", code);
        assert!(err.to_string().starts_with("SyntaxError: "));
    }
}

#[test]
fn test_unambiguous_retry_keeps_module_error() {
    let err = compile("import a from 'a'; return", &options(SourceType::Unambiguous)).unwrap_err();
    assert_eq!(err.code, ERR_SYNTAX);
    assert_eq!(err.source_type, Some(SourceType::Module));
}

#[test]
fn test_top_level_return_is_reported() {
    let result = compile_as("return console", SourceType::Unambiguous);
    assert_eq!(result.source_type, SourceType::Script);
    assert!(result.top_level_return);
    assert_eq!(&*result.code(), "\"main\";return _.g.console");
}

// ═══════════════════════════════════════════════════════════════════════════════
// IMPORT / EXPORT
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_anonymous_default_function() {
    let result = compile_as("export default function () {}", SourceType::Module);
    assert_eq!(&*result.code(), "\"main\";_.d(function () {});");
}

#[test]
fn test_assignments_to_exports_are_wrapped() {
    let code = "export let a = 1;\na = 2;\na++;\n[a] = [3];\n({ a } = {});";
    let result = compile_as(code, SourceType::Module);
    let code = result.code();
    let lines: Vec<&str> = code.split('\n').collect();

    assert_eq!(lines[0], "\"main\";_.x([[\"a\",()=>a]]);let a = 1;");
    assert_eq!(lines[1], "_.u(a = 2);");
    assert_eq!(lines[2], "_.u(a++);");
    assert_eq!(lines[3], "_.u([a] = [3]);");
    assert_eq!(lines[4], "(_.u({ a } = {}));");
}

#[test]
fn test_local_assignments_are_left_alone() {
    let code = "export let a = 1;\nfunction f(a) { a = 2 }";
    let result = compile_as(code, SourceType::Module);
    assert_eq!(last_line(&result), "function f(a) { a = 2 }");
}

#[test]
fn test_dollar_names_are_tracked() {
    let code = "import $ from 'j';\nexport let a$ = 1, $b = 2;\na$ = 2;\n$b++;\n$();";
    let result = compile_as(code, SourceType::Module);
    let output = result.code();
    let lines: Vec<&str> = output.split('\n').collect();

    assert_eq!(lines.len(), 5);
    assert_eq!(lines[2], "_.u(a$ = 2);");
    assert_eq!(lines[3], "_.u($b++);");
    assert_eq!(lines[4], "$();");

    result.enforce_tdz().unwrap();
    assert_eq!(last_line(&result), "_.a(\"$\",$)();");
}

#[test]
fn test_result_serializes_metadata() {
    let code = "import x from 'x';\nexport const a = 1;\nexport { b } from 'm';\nexport * from 'n';";
    let result = compile_as(code, SourceType::Module);
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["sourceType"], "module");
    assert_eq!(json["changed"], true);
    assert_eq!(json["exportedNames"], serde_json::json!(["a", "b"]));
    assert_eq!(json["exportedSpecifiers"]["a"], true);
    assert_eq!(
        json["exportedSpecifiers"]["b"],
        serde_json::json!({ "local": "b", "specifier": "m" })
    );
    assert_eq!(json["exportedStars"], serde_json::json!(["n"]));
    assert_eq!(
        json["dependencySpecifiers"]["x"]["exportedNames"],
        serde_json::json!(["default"])
    );
    assert_eq!(
        json["dependencySpecifiers"]["n"]["exportedNames"],
        serde_json::json!([])
    );
    assert!(json["code"].as_str().unwrap().starts_with("\"main\";"));
}

#[test]
fn test_scripts_carry_no_module_metadata() {
    let result = compile_as("import(\"a\")", SourceType::Script);
    assert!(result.dependency_specifiers.is_empty());
    assert!(result.exported_names.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONSOLE AND EVAL
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_console_is_instrumented() {
    let cases = [
        ("console", "_.g.console"),
        ("console.log(a)", "_.g.console.log(a)"),
        ("new console.Console(a)", "new _.g.console.Console(a)"),
        (
            "class C extends console.Console {}",
            "class C extends _.g.console.Console {}",
        ),
        ("({ console })", "({ console:_.g.console })"),
        ("typeof console", "typeof console"),
    ];

    for (line, expected) in cases {
        for source_type in SOURCE_TYPES {
            let result = compile_as(&format!("\n{}", line), source_type);
            assert_eq!(last_line(&result), expected, "{:?}", source_type);
        }
    }
}

#[test]
fn test_shadowed_console_is_left_alone() {
    let cases = [
        "function f(console) { console.log(1) }",
        "var console = {}; console.log(1)",
        "with (o) { console.log(1) }",
    ];

    for code in cases {
        let result = compile_as(code, SourceType::Script);
        assert_eq!(&*result.code(), code);
    }
}

#[test]
fn test_eval_is_wrapped() {
    let lines = [
        "eval",
        "function b(c, d = 1, ...e) { return eval }",
        "const b = { eval }",
        "const b = { eval() { eval } }",
        "const b = () => eval",
        "b(eval, c)",
        "new eval.b.c()",
        "`eval ${ eval } eval`",
        "switch (eval) { case eval: eval }",
        "try {} catch { eval }",
    ];

    let module = [
        "_.e",
        "function b(c, d = 1, ...e) { return _.e }",
        "const b = { eval:_.e }",
        "const b = { eval() { _.e } }",
        "const b = () => _.e",
        "b(_.e, c)",
        "new _.e.b.c()",
        "`eval ${ _.e } eval`",
        "switch (_.e) { case _.e: _.e }",
        "try {} catch { _.e }",
    ];

    let script = [
        "(eval===_.v?_.e:eval)",
        "function b(c, d = 1, ...e) { return (eval===_.v?_.e:eval) }",
        "const b = { eval:(eval===_.v?_.e:eval) }",
        "const b = { eval() { (eval===_.v?_.e:eval) } }",
        "const b = () => (eval===_.v?_.e:eval)",
        "b((eval===_.v?_.e:eval), c)",
        "new (eval===_.v?_.e:eval).b.c()",
        "`eval ${ (eval===_.v?_.e:eval) } eval`",
        "switch ((eval===_.v?_.e:eval)) { case (eval===_.v?_.e:eval): (eval===_.v?_.e:eval) }",
        "try {} catch { (eval===_.v?_.e:eval) }",
    ];

    for (index, line) in lines.iter().enumerate() {
        for source_type in SOURCE_TYPES {
            let result = compile_as(&format!("\n{}", line), source_type);
            let expected = if source_type == SourceType::Script {
                script[index]
            } else {
                module[index]
            };
            assert_eq!(last_line(&result), expected, "{:?}", source_type);
        }
    }
}

#[test]
fn test_direct_eval_is_contained() {
    let result = compile_as("\neval(x)", SourceType::Script);
    assert_eq!(last_line(&result), "eval((eval===_.v?_.c:_.k)(x))");

    let result = compile_as("\neval(x)", SourceType::Module);
    assert_eq!(last_line(&result), "eval(_.c(x))");

    let mut strict = options(SourceType::Script);
    strict.strict = Some(true);
    let result = compile("\neval(x)", &strict).unwrap();
    assert_eq!(last_line(&result), "eval(_.c(x))");

    let result = compile_as("\neval()", SourceType::Script);
    assert_eq!(last_line(&result), "eval()");
}

#[test]
fn test_strict_option_parses_strictly() {
    let mut strict = options(SourceType::Script);
    strict.strict = Some(true);

    let err = compile("with (a) {} eval", &strict).unwrap_err();
    assert_eq!(err.code, ERR_SYNTAX);
    assert_eq!(err.source_type, Some(SourceType::Script));

    let result = compile_as("with (a) {} eval", SourceType::Script);
    assert_eq!(&*result.code(), "\"main\";with (a) {} (eval===_.v?_.e:eval)");
}

#[test]
fn test_direct_eval_updates_exports() {
    let result = compile_as("export let a = 1;\neval('a = 2')", SourceType::Module);
    assert_eq!(last_line(&result), "_.u(eval(_.c('a = 2')))");
}

#[test]
fn test_shadowed_eval_is_left_alone() {
    let cases = [
        "function b(eval) { eval = eval }",
        "function b(...eval) { eval = eval }",
        "function b(eval = 1) { eval = eval }",
        "const b = { eval: 1 }",
        "const b = function eval() { eval = eval }",
        "try {} catch(eval) { eval = eval }",
        "eval: while (true) { break eval; continue eval }",
    ];

    for code in cases {
        let result = compile(code, &CompileOptions::default()).unwrap();
        assert!(!result.changed, "{}", code);
        assert_eq!(&*result.code(), code);
    }
}

#[test]
fn test_eval_in_typeof_and_with() {
    for source_type in SOURCE_TYPES {
        let result = compile_as("\ntypeof eval", source_type);
        assert_eq!(last_line(&result), "typeof eval");
    }

    let result = compile_as("\nwith (eval) { eval = eval }", SourceType::Script);
    assert_eq!(
        last_line(&result),
        "with ((eval===_.v?_.e:eval)) { eval = eval }"
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEMPORAL DEAD ZONE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_tdz_asserts() {
    let cases = [
        ("a", "_.a(\"a\",a)"),
        (
            "function b(c, d = 1, ...e) { return a }",
            "function b(c, d = 1, ...e) { return _.a(\"a\",a) }",
        ),
        ("const b = { a }", "const b = { a:_.a(\"a\",a) }"),
        ("const b = { a() { a } }", "const b = { a() { _.a(\"a\",a) } }"),
        ("const b = () => a", "const b = () => _.a(\"a\",a)"),
        ("b(a, c)", "b(_.a(\"a\",a), c)"),
        ("new a.b.c()", "new (_.a(\"a\",a)).b.c()"),
        ("`a ${ a } a`", "`a ${ _.a(\"a\",a) } a`"),
        (
            "switch (a) { case a: a }",
            "switch (_.a(\"a\",a)) { case _.a(\"a\",a): _.a(\"a\",a) }",
        ),
        ("try {} catch { a }", "try {} catch { _.a(\"a\",a) }"),
    ];

    for (line, expected) in cases {
        for source_type in MODERN_TYPES {
            let result = compile_as(&format!("import a from \"a\"\n{}", line), source_type);
            assert!(result.has_pending_tdz());
            result.enforce_tdz().unwrap();
            assert_eq!(last_line(&result), expected, "{:?}", source_type);
        }
    }
}

#[test]
fn test_tdz_skips_shadowed_bindings() {
    let cases = [
        "function b(a) { a = a }",
        "function b(...a) { a = a }",
        "function b(a = 1) { a = a }",
        "const b = { a: 1 }",
        "const b = function a() { a = a }",
        "try {} catch(a) { a = a }",
        "a: while (true) { break a; continue a }",
    ];

    for line in cases {
        for source_type in MODERN_TYPES {
            let result = compile_as(&format!("import a from \"a\"\n{}", line), source_type);
            result.enforce_tdz().unwrap();
            assert_eq!(last_line(&result), line);
        }
    }
}

#[test]
fn test_enforce_tdz_runs_once() {
    let result = compile_as("import a from \"a\"\na", SourceType::Module);
    let before = result.code();
    assert_eq!(last_line(&result), "a");

    result.enforce_tdz().unwrap();
    let once = result.code();
    result.enforce_tdz().unwrap();

    assert_ne!(before, once);
    assert_eq!(once, result.code());
    assert_eq!(last_line(&result), "_.a(\"a\",a)");
}

#[test]
fn test_tdz_releases_exported_declarations() {
    let code = "import a from \"a\"\nexport const { b, c: [d] } = a;\nexport class E {}\nexport default a;";
    let result = compile_as(code, SourceType::Module);
    result.enforce_tdz().unwrap();

    let code = result.code();
    let lines: Vec<&str> = code.split('\n').collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("const { b, c: [d] } = _.a(\"a\",a)"));
    assert!(lines[1].ends_with(";_.j([\"b\",\"d\"]);"));
    assert_eq!(lines[2], "class E {};_.j([\"E\"]);");
    assert!(lines[3].starts_with("_.d(_.a(\"a\",a))"));
    assert!(lines[3].ends_with(";_.j([\"default\"]);"));
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMMONJS VARIABLES
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_cjs_vars_in_modules() {
    let cases = [
        ("arguments", "_.t(\"arguments\")"),
        ("function f() { return arguments }", "function f() { return arguments }"),
        ("const f = () => arguments", "const f = () => _.t(\"arguments\")"),
        ("typeof arguments", "typeof void _"),
        ("typeof require", "typeof require"),
        ("require('a')", "_.t(\"require\")('a')"),
        ("new module.constructor()", "new (_.t(\"module\")).constructor()"),
        ("({ exports })", "({ exports:_.t(\"exports\") })"),
        ("exports = 1", "exports = 1"),
        ("function f(require) { require('a') }", "function f(require) { require('a') }"),
        ("__dirname + __filename", "_.t(\"__dirname\") + _.t(\"__filename\")"),
    ];

    for (line, expected) in cases {
        let result = compile_as(&format!("\n{}", line), SourceType::Module);
        assert_eq!(last_line(&result), expected, "{}", line);
    }
}

#[test]
fn test_cjs_var_warnings() {
    let mut opts = options(SourceType::Module);
    opts.warnings = true;

    let result = compile("__dirname;\n  require('a')", &opts).unwrap();
    let warnings = result.warnings.clone().unwrap();
    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0].name, "__dirname");
    assert_eq!((warnings[0].line, warnings[0].column), (1, 0));
    assert_eq!(warnings[1].name, "require");
    assert_eq!((warnings[1].line, warnings[1].column), (2, 2));

    let result = compile_as("__dirname", SourceType::Module);
    assert!(result.warnings.is_none());
}
