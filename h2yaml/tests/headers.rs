//! Runs the whole pipeline, clang included, on the headers in `tests/headers`. Skipped when no
//! clang is installed.

use h2yaml::h2yaml;
use h2yaml_core::Error;
use h2yaml_core::config::Config;
use h2yaml_core::test_util::{clang_available, tempdir, write_header};
use serde_yaml::Value;
use std::path::Path;

fn fixture(name: &str) -> Config {
    Config::mock(Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/headers").join(name))
}

fn convert(config: &Config) -> Option<Value> {
    if !clang_available() {
        eprintln!("clang not found; skipping");
        return None;
    }
    let yaml = h2yaml(config).unwrap();
    Some(serde_yaml::from_str(&yaml).unwrap())
}

/// The entry of a declaration table section with the given name.
fn named<'v>(table: &'v Value, section: &str, name: &str) -> &'v Value {
    table[section]
        .as_sequence()
        .and_then(|entries| entries.iter().find(|entry| entry["name"] == name))
        .unwrap_or_else(|| panic!("no {name} in {section}: {table:?}"))
}

fn count(table: &Value, section: &str, name: &str) -> usize {
    table[section]
        .as_sequence()
        .map_or(0, |entries| entries.iter().filter(|e| e["name"] == name).count())
}

fn yaml(text: &str) -> Value {
    serde_yaml::from_str(text).unwrap()
}

#[test]
fn structs() {
    let Some(table) = convert(&fixture("struct.h")) else {
        return;
    };
    assert_eq!(
        named(&table, "structs", "A0")["members"],
        yaml("[{name: x, type: {kind: int, name: int}}]")
    );
    assert_eq!(
        named(&table, "declarations", "A0_v")["type"],
        yaml("{kind: struct, name: A0, volatile: true}")
    );
    assert_eq!(
        named(&table, "declarations", "a1")["type"],
        yaml("{kind: struct, name: A1}")
    );
    assert_eq!(
        named(&table, "structs", "A2")["members"],
        yaml("[{name: b2, type: {kind: struct, members: [{name: x, type: {kind: int, name: int}}]}}]")
    );
    assert_eq!(
        named(&table, "structs", "A3")["members"],
        yaml("[{type: {kind: struct, members: [{name: x, type: {kind: int, name: int}}]}}]")
    );
    assert_eq!(
        named(&table, "structs", "A4")["members"],
        yaml("[{name: b4, type: {kind: struct, name: B4}}]")
    );
    assert_eq!(
        named(&table, "structs", "B5")["members"],
        yaml("[{name: x, type: {kind: int, name: int}}]")
    );
    assert_eq!(
        named(&table, "structs", "A6")["members"],
        yaml(
            "
            - {name: x1, type: {kind: int, name: unsigned int}, num_bits: 5}
            - {type: {kind: int, name: unsigned int}, num_bits: 0}
            - {name: x2, type: {kind: int, name: unsigned int}, num_bits: 6}
            - {name: x3, type: {kind: int, name: unsigned int}, num_bits: 15}
            "
        )
    );
    assert_eq!(
        named(&table, "structs", "A14")["members"],
        yaml("[{name: next, type: {kind: pointer, type: {kind: struct, name: A14}}}]")
    );
    for name in ["A10", "A11", "A12"] {
        assert_eq!(count(&table, "structs", name), 1, "{name} hoisted once");
    }
    assert!(table.get("unions").is_none());
}

#[test]
fn struct_typedefs() {
    let Some(table) = convert(&fixture("struct.h")) else {
        return;
    };
    assert_eq!(
        named(&table, "typedefs", "A7_t")["type"],
        yaml("{kind: struct, members: [{name: x, type: {kind: int, name: int}}]}")
    );
    assert_eq!(
        named(&table, "typedefs", "A8_0_t")["type"],
        yaml("{kind: pointer, type: {kind: struct, name: A8}}")
    );
    assert_eq!(
        named(&table, "typedefs", "A8_1_t")["type"],
        yaml("{kind: struct, name: A8}")
    );
    assert_eq!(
        named(&table, "typedefs", "A12_t")["type"],
        yaml("{kind: struct, name: A12}")
    );
    assert_eq!(count(&table, "typedefs", "A11_t"), 1);
}

#[test]
fn enums() {
    let Some(table) = convert(&fixture("enum.h")) else {
        return;
    };
    assert_eq!(
        named(&table, "enums", "h_0e")["members"],
        yaml("[{name: h_0e_0}]")
    );
    assert_eq!(
        named(&table, "structs", "h_1s")["members"],
        yaml("[{name: A_m, type: {kind: enum, name: h_1e}}]")
    );
    assert_eq!(
        named(&table, "typedefs", "h_2t")["type"],
        yaml("{kind: enum, name: h_2e}")
    );
    let anonymous: Vec<_> = table["enums"]
        .as_sequence()
        .unwrap()
        .iter()
        .filter(|e| e.get("name").is_none())
        .collect();
    assert_eq!(anonymous, [&yaml("{members: [{name: h_0}]}")]);

    assert_eq!(
        named(&table, "typedefs", "i_0t")["type"],
        yaml("{kind: enum, members: [{name: i_0}]}")
    );
    assert_eq!(
        named(&table, "structs", "i_A_s")["members"],
        yaml("[{name: A_m, type: {kind: enum, members: [{name: i_1}]}}]")
    );
    assert_eq!(
        named(&table, "functions", "i_foo1")["params"],
        yaml("[{type: {kind: enum, members: [{name: i_2}]}}]")
    );
    assert_eq!(
        named(&table, "declarations", "i_foo2")["type"]["type"]["params"],
        yaml("[{type: {kind: enum, members: [{name: i_2}]}}]")
    );
    assert_eq!(
        named(&table, "functions", "i_foo3")["params"],
        yaml("[{type: {kind: enum, name: i_a, members: [{name: i_ae_0}]}}]")
    );
    assert_eq!(count(&table, "enums", "i_a"), 0);
}

#[test]
fn enum_values() {
    let Some(table) = convert(&fixture("enum.h")) else {
        return;
    };
    assert_eq!(
        named(&table, "enums", "C")["members"],
        yaml(
            "
            - {name: C0, val: '1'}
            - {name: C1, val: '1'}
            - {name: C2, val: '2'}
            - {name: C3, val: '0x3'}
            - {name: C4, val: 1<<2}
            - {name: C5, val: C1+C4}
            - {name: C6}
            - {name: C7, val: 101}
            "
        )
    );
    assert_eq!(
        named(&table, "enums", "D")["members"],
        yaml("[{name: D0, val: 101}]")
    );
    assert_eq!(
        named(&table, "structs", "S0")["members"],
        yaml("[{name: bar, type: {kind: pointer, type: {kind: enum, name: B}}}]")
    );
    assert_eq!(
        named(&table, "unions", "S1")["members"],
        yaml("[{name: bar, type: {kind: enum, name: C}}]")
    );
    assert_eq!(
        named(&table, "structs", "G")["members"],
        yaml("[{name: f, type: {kind: custom_type, name: F}}]")
    );

    let mut config = fixture("enum.h");
    config.compat_cast_to_yaml = true;
    let Some(compat) = convert(&config) else {
        return;
    };
    let members = &named(&compat, "enums", "C")["members"];
    assert_eq!(members[4], yaml("{name: C4, val: 1 << 2}"));
    assert_eq!(members[5], yaml("{name: C5, val: C1 + C4}"));
    assert_eq!(members[7], yaml("{name: C7, val: MAX_SIZE + 1}"));
}

#[test]
fn functions_and_variables() {
    let dir = tempdir().unwrap();
    let header = write_header(
        &dir,
        "api.h",
        "#define LEN 8\n\
         typedef unsigned long size_t;\n\
         extern char buffer[LEN * 2];\n\
         int api_open(const char *path, int);\n\
         void api_each(void (*visit)(void *item, size_t), void *data);\n\
         int api_log(const char *fmt, ...);\n\
         static inline int api_twice(int x) { return 2 * x; }\n\
         int api_legacy();\n",
    )
    .unwrap();
    let mut config = Config::mock(&header);
    config.canonicalization = true;
    let Some(table) = convert(&config) else {
        return;
    };
    assert_eq!(
        named(&table, "declarations", "buffer"),
        &yaml("{name: buffer, storage: extern, type: {kind: array, length: 16, type: {kind: char, name: char}}}")
    );
    assert_eq!(
        named(&table, "functions", "api_open")["params"],
        yaml(
            "
            - {name: path, type: {kind: pointer, type: {kind: char, name: char, const: true}}}
            - {name: _arg1, type: {kind: int, name: int}}
            "
        )
    );
    assert_eq!(
        named(&table, "functions", "api_each")["params"][0],
        yaml(
            "
            name: visit
            type:
              kind: pointer
              type:
                kind: function
                type: {kind: void, name: void}
                params:
                  - {name: item, type: {kind: pointer, type: {kind: void, name: void}}}
                  - {name: _arg1, type: {kind: custom_type, name: size_t}}
            "
        )
    );
    assert_eq!(named(&table, "functions", "api_log")["var_args"], true);
    assert_eq!(count(&table, "functions", "api_twice"), 0);
    assert!(named(&table, "functions", "api_legacy").get("params").is_none());

    config.canonicalization = false;
    config.compat_cast_to_yaml = true;
    let Some(compat) = convert(&config) else {
        return;
    };
    assert_eq!(
        named(&compat, "declarations", "buffer")["type"]["length"],
        "LEN * 2"
    );
    assert!(named(&compat, "functions", "api_open")["params"][1].get("name").is_none());
    assert_eq!(
        named(&compat, "typedefs", "size_t")["type"],
        yaml("{kind: int, name: unsigned long int}")
    );
}

#[test]
fn header_filter() {
    let dir = tempdir().unwrap();
    write_header(&dir, "bar.h", "struct bar { int b; };\nint bar_fn(void);\n").unwrap();
    let foo = write_header(
        &dir,
        "foo.h",
        "#include \"bar.h\"\nstruct foo { struct bar *b; };\nint foo_fn(struct bar);\n",
    )
    .unwrap();
    let mut config = Config::mock(&foo);
    config.filter_header = "foo.h".into();
    let Some(table) = convert(&config) else {
        return;
    };
    assert_eq!(
        table,
        yaml(
            "
            structs:
              - name: foo
                members:
                  - {name: b, type: {kind: pointer, type: {kind: struct, name: bar}}}
            functions:
              - name: foo_fn
                type: {kind: int, name: int}
                params: [{type: {kind: struct, name: bar}}]
            "
        )
    );
}

#[test]
fn clang_errors() {
    if !clang_available() {
        return;
    }
    let dir = tempdir().unwrap();
    let header = write_header(&dir, "broken.h", "int x = ;\n").unwrap();
    let err = h2yaml(&Config::mock(&header)).unwrap_err();
    assert!(matches!(err, Error::Diagnostics { count, .. } if count >= 1), "unexpected error {err}");
}

#[test]
fn invalid_filter() {
    if !clang_available() {
        return;
    }
    let dir = tempdir().unwrap();
    let header = write_header(&dir, "ok.h", "int ok;\n").unwrap();
    let mut config = Config::mock(&header);
    config.filter_header = "(".into();
    assert!(matches!(h2yaml(&config), Err(Error::HeaderFilter(_))));
}
