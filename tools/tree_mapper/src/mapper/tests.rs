//! The fixtures below are shaped like clang's `-ast-dump=json` output for small headers, with
//! locations computed from the header text.

use super::map_translation_unit;
use crate::{HeaderFilter, MapOptions};
use crate::tokens::tokenize;
use c_ast::{Node, SourceCache, SystemIncludes};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn id() -> String {
    format!("0x{:x}", NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

const COMPAT: MapOptions = MapOptions {
    canonicalization: false,
    compat_cast_to_yaml: true,
};

struct Source<'s> {
    file: &'s str,
    text: &'s str,
}

impl Source<'_> {
    fn loc(&self, offset: usize, len: usize) -> Value {
        let before = &self.text[..offset];
        let line = before.matches('\n').count() + 1;
        let col = offset - before.rfind('\n').map_or(0, |nl| nl + 1) + 1;
        json!({"offset": offset, "file": self.file, "line": line, "col": col, "tokLen": len})
    }

    /// Location of `token` inside the first occurrence of `text`.
    fn loc_in(&self, text: &str, token: &str) -> Value {
        let begin = self.find(text);
        let token = tokenize(text)
            .into_iter()
            .find(|t| t.text == token)
            .unwrap_or_else(|| panic!("no `{token}` in `{text}`"));
        self.loc(begin + token.start, token.text.len())
    }

    fn find(&self, text: &str) -> usize {
        self.text
            .find(text)
            .unwrap_or_else(|| panic!("`{text}` not in source"))
    }

    fn range(&self, text: &str) -> Value {
        let begin = self.find(text);
        let tokens = tokenize(text);
        let (first, last) = (tokens[0], tokens[tokens.len() - 1]);
        json!({
            "begin": self.loc(begin + first.start, first.text.len()),
            "end": self.loc(begin + last.start, last.text.len()),
        })
    }

    /// A declaration spanning `text`, located at its token `name`.
    fn decl(&self, kind: &str, text: &str, name: &str, fields: Value, inner: Vec<Value>) -> Value {
        let mut node = json!({
            "id": id(),
            "kind": kind,
            "loc": self.loc_in(text, name),
            "range": self.range(text),
            "inner": inner,
        });
        if let (Value::Object(node), Value::Object(fields)) = (&mut node, fields) {
            node.extend(fields);
        }
        node
    }

    /// An expression spanning `text` whose value clang computed.
    fn constant(&self, text: &str, value: &str) -> Value {
        json!({"id": id(), "kind": "ConstantExpr", "range": self.range(text), "value": value})
    }
}

/// `typedef struct { ... } T;`-style type tree pointing at `tag`.
fn owned_tag(tag: &Value, type_kind: &str) -> Value {
    let decl = json!({"id": tag["id"], "kind": tag["kind"], "name": ""});
    json!({
        "id": id(),
        "kind": "ElaboratedType",
        "type": {"qualType": "struct T"},
        "ownedTagDecl": decl,
        "inner": [{"id": id(), "kind": type_kind, "decl": decl}],
    })
}

fn map_files(
    files: &[&Source],
    nodes: Vec<Value>,
    pattern: &str,
    options: MapOptions,
) -> serde_yaml::Value {
    let tu = json!({
        "id": "0x0",
        "kind": "TranslationUnitDecl",
        "loc": {},
        "range": {"begin": {}, "end": {}},
        "inner": nodes,
    });
    let tu: Node = serde_json::from_str(&tu.to_string()).unwrap();
    let filter = HeaderFilter::new(pattern, SystemIncludes::default()).unwrap();
    let mut sources = SourceCache::default();
    for file in files {
        sources.preload(file.file, Arc::from(file.text.as_bytes()));
    }
    serde_yaml::to_value(map_translation_unit(&tu, &filter, &mut sources, options)).unwrap()
}

fn map(source: &Source, nodes: Vec<Value>, options: MapOptions) -> serde_yaml::Value {
    map_files(&[source], nodes, ".*", options)
}

fn yaml(text: &str) -> serde_yaml::Value {
    serde_yaml::from_str(text).unwrap()
}

#[test]
fn self_referential_record() {
    let src = Source {
        file: "api.h",
        text: "struct A0 {\n  int x;\n  struct A0 *next;\n};\nstruct A0 *head;\n",
    };
    let nodes = vec![
        src.decl(
            "RecordDecl",
            "struct A0 {\n  int x;\n  struct A0 *next;\n}",
            "A0",
            json!({"name": "A0", "tagUsed": "struct", "completeDefinition": true}),
            vec![
                src.decl(
                    "FieldDecl",
                    "int x",
                    "x",
                    json!({"name": "x", "type": {"qualType": "int"}}),
                    vec![],
                ),
                src.decl(
                    "FieldDecl",
                    "struct A0 *next",
                    "next",
                    json!({"name": "next", "type": {"qualType": "struct A0 *"}}),
                    vec![],
                ),
            ],
        ),
        src.decl(
            "VarDecl",
            "struct A0 *head",
            "head",
            json!({"name": "head", "type": {"qualType": "struct A0 *"}}),
            vec![],
        ),
    ];
    assert_eq!(
        map(&src, nodes, MapOptions::default()),
        yaml(
            "
            structs:
              - name: A0
                members:
                  - {name: x, type: {kind: int, name: int}}
                  - {name: next, type: {kind: pointer, type: {kind: struct, name: A0}}}
            declarations:
              - {name: head, type: {kind: pointer, type: {kind: struct, name: A0}}}
            "
        )
    );
}

#[test]
fn anonymous_records_are_inlined() {
    let text = "typedef struct {\n  int a : 3;\n  unsigned : 0;\n  union {\n    char c;\n    float f;\n  };\n} T;\n";
    let src = Source {
        file: "api.h",
        text,
    };
    let union_text = "union {\n    char c;\n    float f;\n  }";
    let record = src.decl(
        "RecordDecl",
        &text[text.find("struct").unwrap()..text.find(" T;").unwrap()],
        "struct",
        json!({"tagUsed": "struct", "completeDefinition": true}),
        vec![
            src.decl(
                "FieldDecl",
                "int a : 3",
                "a",
                json!({"name": "a", "type": {"qualType": "int"}, "isBitfield": true}),
                vec![src.constant("3", "3")],
            ),
            src.decl(
                "FieldDecl",
                "unsigned : 0",
                "unsigned",
                json!({"type": {"qualType": "unsigned int"}, "isBitfield": true}),
                vec![src.constant("0", "0")],
            ),
            src.decl(
                "RecordDecl",
                union_text,
                "union",
                json!({"tagUsed": "union", "completeDefinition": true}),
                vec![
                    src.decl(
                        "FieldDecl",
                        "char c",
                        "c",
                        json!({"name": "c", "type": {"qualType": "char"}}),
                        vec![],
                    ),
                    src.decl(
                        "FieldDecl",
                        "float f",
                        "f",
                        json!({"name": "f", "type": {"qualType": "float"}}),
                        vec![],
                    ),
                ],
            ),
            src.decl(
                "FieldDecl",
                union_text,
                "union",
                json!({
                    "isImplicit": true,
                    "type": {"qualType": "union (unnamed union at api.h:4:3)"}
                }),
                vec![],
            ),
            src.decl(
                "IndirectFieldDecl",
                "char c",
                "c",
                json!({"name": "c", "isImplicit": true}),
                vec![],
            ),
        ],
    );
    let typedef = src.decl(
        "TypedefDecl",
        &text[..text.find(" T;").unwrap() + 2],
        "T",
        json!({"name": "T", "type": {"qualType": "struct T"}}),
        vec![owned_tag(&record, "RecordType")],
    );
    assert_eq!(
        map(&src, vec![record, typedef], MapOptions::default()),
        yaml(
            "
            typedefs:
              - name: T
                type:
                  kind: struct
                  members:
                    - {name: a, type: {kind: int, name: int}, num_bits: 3}
                    - {type: {kind: int, name: unsigned int}, num_bits: 0}
                    - type:
                        kind: union
                        members:
                          - {name: c, type: {kind: char, name: char}}
                          - {name: f, type: {kind: float, name: float}}
            "
        )
    );
}

fn function_with_callback(src: &Source) -> Vec<Value> {
    vec![src.decl(
        "FunctionDecl",
        "int f(int, void (*cb)(int fd, char *))",
        "f",
        json!({"name": "f", "type": {"qualType": "int (int, void (*)(int, char *))"}}),
        vec![
            src.decl(
                "ParmVarDecl",
                "int,",
                "int",
                json!({"type": {"qualType": "int"}}),
                vec![],
            ),
            src.decl(
                "ParmVarDecl",
                "void (*cb)(int fd, char *)",
                "cb",
                json!({"name": "cb", "type": {"qualType": "void (*)(int, char *)"}}),
                vec![],
            ),
        ],
    )]
}

#[test]
fn parameter_names() {
    let src = Source {
        file: "api.h",
        text: "int f(int, void (*cb)(int fd, char *));\n",
    };
    assert_eq!(
        map(&src, function_with_callback(&src), MapOptions::default()),
        yaml(
            "
            functions:
              - name: f
                type: {kind: int, name: int}
                params:
                  - type: {kind: int, name: int}
                  - name: cb
                    type:
                      kind: pointer
                      type:
                        kind: function
                        type: {kind: void, name: void}
                        params:
                          - {name: fd, type: {kind: int, name: int}}
                          - {type: {kind: pointer, type: {kind: char, name: char}}}
            "
        )
    );

    let canonical = MapOptions {
        canonicalization: true,
        ..Default::default()
    };
    let table = map(&src, function_with_callback(&src), canonical);
    let params = &table["functions"][0]["params"];
    assert_eq!(params[0]["name"], "_arg0");
    assert_eq!(params[1]["name"], "cb");
    assert_eq!(params[1]["type"]["type"]["params"][0]["name"], "fd");
    assert_eq!(params[1]["type"]["type"]["params"][1]["name"], "_arg1");
}

fn enum_with_macro(src: &Source) -> Vec<Value> {
    let spelling = src.find("7");
    let expansion = src.text.rfind("MAX").unwrap();
    let macro_loc = json!({
        "spellingLoc": src.loc(spelling, 1),
        "expansionLoc": src.loc(expansion, 3),
    });
    vec![src.decl(
        "EnumDecl",
        "enum E { A = 1 << 2, B, C = MAX }",
        "E",
        json!({"name": "E"}),
        vec![
            src.decl(
                "EnumConstantDecl",
                "A = 1 << 2",
                "A",
                json!({"name": "A", "type": {"qualType": "int"}}),
                vec![src.constant("1 << 2", "4")],
            ),
            src.decl(
                "EnumConstantDecl",
                "B",
                "B",
                json!({"name": "B", "type": {"qualType": "int"}}),
                vec![],
            ),
            src.decl(
                "EnumConstantDecl",
                "C = MAX",
                "C",
                json!({"name": "C", "type": {"qualType": "int"}}),
                vec![json!({
                    "id": id(),
                    "kind": "ConstantExpr",
                    "range": {"begin": macro_loc, "end": macro_loc},
                    "value": "7",
                })],
            ),
        ],
    )]
}

#[test]
fn enumerator_values() {
    let src = Source {
        file: "api.h",
        text: "#define MAX 7\nenum E { A = 1 << 2, B, C = MAX };\n",
    };
    assert_eq!(
        map(&src, enum_with_macro(&src), MapOptions::default()),
        yaml(
            "
            enums:
              - name: E
                members:
                  - {name: A, val: 1<<2}
                  - {name: B}
                  - {name: C, val: 7}
            "
        )
    );
    assert_eq!(
        map(&src, enum_with_macro(&src), COMPAT),
        yaml(
            "
            enums:
              - name: E
                members:
                  - {name: A, val: 1 << 2}
                  - {name: B}
                  - {name: C, val: MAX}
            "
        )
    );
}

#[test]
fn enum_hoisting() {
    let src = Source {
        file: "api.h",
        text: "enum { H0, H1 };\ntypedef enum { K0 } K;\nvoid g(enum { P0 } p);\nstruct S { enum { F0 } e; };\n",
    };
    let constant = |name: &str| {
        src.decl(
            "EnumConstantDecl",
            name,
            name,
            json!({"name": name, "type": {"qualType": "int"}}),
            vec![],
        )
    };
    let top_level = src.decl(
        "EnumDecl",
        "enum { H0, H1 }",
        "enum",
        json!({}),
        vec![constant("H0"), constant("H1")],
    );
    let typedefed = src.decl("EnumDecl", "enum { K0 }", "enum", json!({}), vec![constant("K0")]);
    let typedef = src.decl(
        "TypedefDecl",
        "typedef enum { K0 } K",
        "K",
        json!({"name": "K", "type": {"qualType": "enum K"}}),
        vec![owned_tag(&typedefed, "EnumType")],
    );
    let in_prototype =
        src.decl("EnumDecl", "enum { P0 }", "enum", json!({}), vec![constant("P0")]);
    let function = src.decl(
        "FunctionDecl",
        "void g(enum { P0 } p)",
        "g",
        json!({"name": "g", "type": {"qualType": "void (enum (unnamed enum at api.h:3:8))"}}),
        vec![src.decl(
            "ParmVarDecl",
            "enum { P0 } p",
            "p",
            json!({"name": "p", "type": {"qualType": "enum (unnamed enum at api.h:3:8)"}}),
            vec![],
        )],
    );
    let record = src.decl(
        "RecordDecl",
        "struct S { enum { F0 } e; }",
        "S",
        json!({"name": "S", "tagUsed": "struct", "completeDefinition": true}),
        vec![
            src.decl("EnumDecl", "enum { F0 }", "enum", json!({}), vec![constant("F0")]),
            src.decl(
                "FieldDecl",
                "enum { F0 } e",
                "e",
                json!({"name": "e", "type": {"qualType": "enum (unnamed enum at api.h:4:12)"}}),
                vec![],
            ),
        ],
    );
    let nodes = vec![top_level, typedefed, typedef, in_prototype, function, record];
    assert_eq!(
        map(&src, nodes, MapOptions::default()),
        yaml(
            "
            structs:
              - name: S
                members:
                  - {name: e, type: {kind: enum, members: [{name: F0}]}}
            typedefs:
              - {name: K, type: {kind: enum, members: [{name: K0}]}}
            functions:
              - name: g
                type: {kind: void, name: void}
                params:
                  - {name: p, type: {kind: enum, members: [{name: P0}]}}
            enums:
              - members: [{name: H0}, {name: H1}]
            "
        )
    );
}

#[test]
fn function_declarations() {
    let src = Source {
        file: "api.h",
        text: "static inline int sq(int x) { return x * x; }\nextern int old();\nstatic inline void tick(void);\nint printf(const char *fmt, ...);\n",
    };
    let nodes = vec![
        src.decl(
            "FunctionDecl",
            "static inline int sq(int x) { return x * x; }",
            "sq",
            json!({
                "name": "sq",
                "type": {"qualType": "int (int)"},
                "storageClass": "static",
                "inline": true
            }),
            vec![
                src.decl(
                    "ParmVarDecl",
                    "int x",
                    "x",
                    json!({"name": "x", "type": {"qualType": "int"}}),
                    vec![],
                ),
                json!({"id": id(), "kind": "CompoundStmt", "range": src.range("{ return x * x; }")}),
            ],
        ),
        src.decl(
            "FunctionDecl",
            "extern int old()",
            "old",
            json!({"name": "old", "type": {"qualType": "int ()"}, "storageClass": "extern"}),
            vec![],
        ),
        src.decl(
            "FunctionDecl",
            "static inline void tick(void)",
            "tick",
            json!({
                "name": "tick",
                "type": {"qualType": "void (void)"},
                "storageClass": "static",
                "inline": true
            }),
            vec![],
        ),
        src.decl(
            "FunctionDecl",
            "int printf(const char *fmt, ...)",
            "printf",
            json!({"name": "printf", "type": {"qualType": "int (const char *, ...)"}}),
            vec![src.decl(
                "ParmVarDecl",
                "const char *fmt",
                "fmt",
                json!({"name": "fmt", "type": {"qualType": "const char *"}}),
                vec![],
            )],
        ),
    ];
    assert_eq!(
        map(&src, nodes, MapOptions::default()),
        yaml(
            "
            functions:
              - {name: old, storage: extern, type: {kind: int, name: int}}
              - {name: tick, storage: static, inline: true, type: {kind: void, name: void}, params: []}
              - name: printf
                type: {kind: int, name: int}
                params:
                  - {name: fmt, type: {kind: pointer, type: {kind: char, name: char, const: true}}}
                var_args: true
            "
        )
    );
}

fn variables(src: &Source) -> Vec<Value> {
    vec![
        src.decl(
            "VarDecl",
            "extern int a[N + 1][2]",
            "a",
            json!({"name": "a", "type": {"qualType": "int [5][2]"}, "storageClass": "extern"}),
            vec![],
        ),
        src.decl(
            "VarDecl",
            "static const char *s = \"hi\"",
            "s",
            json!({
                "name": "s",
                "type": {"qualType": "const char *"},
                "storageClass": "static",
                "init": "c"
            }),
            vec![json!({"id": id(), "kind": "ImplicitCastExpr", "range": src.range("\"hi\"")})],
        ),
        src.decl(
            "VarDecl",
            "int t[]",
            "t",
            json!({"name": "t", "type": {"qualType": "int []"}}),
            vec![],
        ),
        src.decl(
            "VarDecl",
            "unsigned long n = 0x00FF",
            "n",
            json!({"name": "n", "type": {"qualType": "unsigned long"}, "init": "c"}),
            vec![json!({
                "id": id(),
                "kind": "IntegerLiteral",
                "range": src.range("0x00FF"),
                "value": "255"
            })],
        ),
    ]
}

#[test]
fn variable_declarations() {
    let src = Source {
        file: "api.h",
        text: "#define N 4\nextern int a[N + 1][2];\nstatic const char *s = \"hi\";\nint t[];\nunsigned long n = 0x00FF;\n",
    };
    assert_eq!(
        map(&src, variables(&src), MapOptions::default()),
        yaml(
            r#"
            declarations:
              - name: a
                storage: extern
                type: {kind: array, length: 5, type: {kind: array, length: 2, type: {kind: int, name: int}}}
              - name: s
                storage: static
                init: '"hi"'
                type: {kind: pointer, type: {kind: char, name: char, const: true}}
              - {name: n, init: "0x00FF", type: {kind: int, name: unsigned long}}
            "#
        )
    );
    assert_eq!(
        map(&src, variables(&src), COMPAT),
        yaml(
            r#"
            declarations:
              - name: a
                storage: extern
                type: {kind: array, length: N + 1, type: {kind: array, length: "2", type: {kind: int, name: int}}}
              - name: s
                storage: static
                init: '"hi"'
                type: {kind: pointer, type: {kind: char, name: char, const: true}}
              - {name: n, init: "0xff", type: {kind: int, name: unsigned long int}}
            "#
        )
    );
}

#[test]
fn typedefs_and_array_parameters() {
    let src = Source {
        file: "api.h",
        text: "typedef unsigned int u32;\ntypedef unsigned int  u32;\ntypedef void (*cb_t)(u32 code, void *data);\nvoid fill(int buf[4], cb_t cb);\n",
    };
    let nodes = vec![
        src.decl(
            "TypedefDecl",
            "typedef unsigned int u32",
            "u32",
            json!({"name": "u32", "type": {"qualType": "unsigned int"}}),
            vec![],
        ),
        src.decl(
            "TypedefDecl",
            "typedef unsigned int  u32",
            "u32",
            json!({"name": "u32", "type": {"qualType": "unsigned int"}}),
            vec![],
        ),
        src.decl(
            "TypedefDecl",
            "typedef void (*cb_t)(u32 code, void *data)",
            "cb_t",
            json!({"name": "cb_t", "type": {"qualType": "void (*)(u32, void *)"}}),
            vec![],
        ),
        src.decl(
            "FunctionDecl",
            "void fill(int buf[4], cb_t cb)",
            "fill",
            json!({"name": "fill", "type": {"qualType": "void (int *, cb_t)"}}),
            vec![
                src.decl(
                    "ParmVarDecl",
                    "int buf[4]",
                    "buf",
                    json!({"name": "buf", "type": {"qualType": "int *"}}),
                    vec![],
                ),
                src.decl(
                    "ParmVarDecl",
                    "cb_t cb",
                    "cb",
                    json!({"name": "cb", "type": {"qualType": "cb_t"}}),
                    vec![],
                ),
            ],
        ),
    ];
    assert_eq!(
        map(&src, nodes, COMPAT),
        yaml(
            "
            typedefs:
              - {name: u32, type: {kind: int, name: unsigned int}}
              - name: cb_t
                type:
                  kind: pointer
                  type:
                    kind: function
                    type: {kind: void, name: void}
                    params:
                      - {name: code, type: {kind: custom_type, name: u32}}
                      - {name: data, type: {kind: pointer, type: {kind: void, name: void}}}
            functions:
              - name: fill
                type: {kind: void, name: void}
                params:
                  - {name: buf, type: {kind: pointer, type: {kind: int, name: int}}}
                  - {name: cb, type: {kind: custom_type, name: cb_t}}
            "
        )
    );
}

#[test]
fn uninteresting_headers() {
    let other = Source {
        file: "/opt/sdk/other.h",
        text: "struct Opaque { int hidden; };\nenum Mode { M0 };\n",
    };
    let api = Source {
        file: "api.h",
        text: "struct Opaque *open(void);\nenum Mode mode(void);\n",
    };
    let nodes = vec![
        other.decl(
            "RecordDecl",
            "struct Opaque { int hidden; }",
            "Opaque",
            json!({"name": "Opaque", "tagUsed": "struct", "completeDefinition": true}),
            vec![other.decl(
                "FieldDecl",
                "int hidden",
                "hidden",
                json!({"name": "hidden", "type": {"qualType": "int"}}),
                vec![],
            )],
        ),
        other.decl(
            "EnumDecl",
            "enum Mode { M0 }",
            "Mode",
            json!({"name": "Mode"}),
            vec![other.decl(
                "EnumConstantDecl",
                "M0",
                "M0",
                json!({"name": "M0", "type": {"qualType": "int"}}),
                vec![],
            )],
        ),
        api.decl(
            "FunctionDecl",
            "struct Opaque *open(void)",
            "open",
            json!({"name": "open", "type": {"qualType": "struct Opaque *(void)"}}),
            vec![],
        ),
        api.decl(
            "FunctionDecl",
            "enum Mode mode(void)",
            "mode",
            json!({"name": "mode", "type": {"qualType": "enum Mode (void)"}}),
            vec![],
        ),
    ];
    // The enum is still listed, by name only.
    assert_eq!(
        map_files(&[&other, &api], nodes, "^api", MapOptions::default()),
        yaml(
            "
            functions:
              - name: open
                type: {kind: pointer, type: {kind: struct, name: Opaque}}
                params: []
              - name: mode
                type: {kind: enum, name: Mode}
                params: []
            enums:
              - {name: Mode, members: []}
            "
        )
    );
}

#[test]
fn forward_declared_enum() {
    let src = Source {
        file: "api.h",
        text: "enum E;\nenum E { E0 };\nenum E pick(void);\nenum E;\n",
    };
    let forward = || src.decl("EnumDecl", "enum E", "E", json!({"name": "E"}), vec![]);
    let nodes = vec![
        forward(),
        src.decl(
            "EnumDecl",
            "enum E { E0 }",
            "E",
            json!({"name": "E"}),
            vec![src.decl(
                "EnumConstantDecl",
                "E0",
                "E0",
                json!({"name": "E0", "type": {"qualType": "int"}}),
                vec![],
            )],
        ),
        src.decl(
            "FunctionDecl",
            "enum E pick(void)",
            "pick",
            json!({"name": "pick", "type": {"qualType": "enum E (void)"}}),
            vec![],
        ),
        forward(),
    ];
    assert_eq!(
        map(&src, nodes, MapOptions::default()),
        yaml(
            "
            functions:
              - {name: pick, type: {kind: enum, name: E}, params: []}
            enums:
              - {name: E, members: [{name: E0}]}
            "
        )
    );
}

#[test]
fn functions_returning_typedefs() {
    let src = Source {
        file: "api.h",
        text: "typedef unsigned long size_t;\nsize_t slen(const char *s);\ntypedef size_t (*hash_t)(const void *key);\n",
    };
    let nodes = vec![
        src.decl(
            "TypedefDecl",
            "typedef unsigned long size_t",
            "size_t",
            json!({"name": "size_t", "type": {"qualType": "unsigned long"}}),
            vec![],
        ),
        src.decl(
            "FunctionDecl",
            "size_t slen(const char *s)",
            "slen",
            json!({"name": "slen", "type": {"qualType": "size_t (const char *)"}}),
            vec![src.decl(
                "ParmVarDecl",
                "const char *s",
                "s",
                json!({"name": "s", "type": {"qualType": "const char *"}}),
                vec![],
            )],
        ),
        src.decl(
            "TypedefDecl",
            "typedef size_t (*hash_t)(const void *key)",
            "hash_t",
            json!({"name": "hash_t", "type": {"qualType": "size_t (*)(const void *)"}}),
            vec![],
        ),
    ];
    assert_eq!(
        map(&src, nodes, MapOptions::default()),
        yaml(
            "
            typedefs:
              - {name: size_t, type: {kind: int, name: unsigned long}}
              - name: hash_t
                type:
                  kind: pointer
                  type:
                    kind: function
                    type: {kind: custom_type, name: size_t}
                    params:
                      - {name: key, type: {kind: pointer, type: {kind: void, name: void, const: true}}}
            functions:
              - name: slen
                type: {kind: custom_type, name: size_t}
                params:
                  - {name: s, type: {kind: pointer, type: {kind: char, name: char, const: true}}}
            "
        )
    );
}

#[test]
#[should_panic(expected = "StaticAssertDecl")]
fn unknown_declarations_are_fatal() {
    let src = Source {
        file: "api.h",
        text: "_Static_assert(1, \"one\");\n",
    };
    let nodes = vec![src.decl(
        "StaticAssertDecl",
        "_Static_assert(1, \"one\")",
        "_Static_assert",
        json!({}),
        vec![],
    )];
    map(&src, nodes, MapOptions::default());
}
