use super::TreeMapper;
use super::types::Groups;
use crate::compat::cast_format;
use crate::index::tag_kind;
use crate::model::{Enum, EnumRef, EnumValue, Enumerator, Member, Record, RecordKind, RecordRef};
use crate::spelling::TagKind;
use crate::tokens::tokenize;
use c_ast::{Clang, Node, is_macro_location};
use tracing::debug;

/// Returns true if any part of `node` was written through a macro.
fn has_macro(node: &Node) -> bool {
    node.kind.loc().is_some_and(is_macro_location)
        || node
            .kind
            .range()
            .is_some_and(|r| is_macro_location(&r.begin) || is_macro_location(&r.end))
        || node.inner.iter().any(has_macro)
}

/// The evaluated value clang attached to an enumerator's initializer.
fn constant_value(node: &Node) -> Option<i128> {
    node.inner.iter().find_map(|child| match &child.kind {
        Clang::ConstantExpr {
            value: Some(value), ..
        } => value.parse().ok(),
        _ => constant_value(child),
    })
}

/// The width of a bitfield.
fn bit_width(field: &Node) -> Option<u64> {
    field.inner.iter().find_map(|child| match &child.kind {
        Clang::ConstantExpr {
            value: Some(value), ..
        }
        | Clang::IntegerLiteral { value, .. } => value.parse().ok(),
        _ => None,
    })
}

impl<'a> TreeMapper<'a, '_> {
    /// Visits a struct or union. Named records with members are hoisted to their table and
    /// referred to by name; anonymous ones are referred to by their members.
    pub(super) fn visit_record(&mut self, node: &'a Node) -> RecordRef {
        if let Some(reference) = self.records.get(&node.id) {
            return reference.clone();
        }
        let kind = match tag_kind(node) {
            Some(TagKind::Union) => RecordKind::Union,
            _ => RecordKind::Struct,
        };
        let name = node.kind.name().map(String::from);
        let name_only = RecordRef {
            kind,
            name: name.clone(),
            members: None,
        };
        if self.stack.contains(&node.id) {
            debug!("Self reference to {}", name.as_deref().unwrap_or("<anonymous>"));
            return name_only;
        }
        let Clang::RecordDecl {
            complete_definition,
            ..
        } = &node.kind
        else {
            unreachable!("visit_record called on {}", node.kind.kind_name());
        };
        if !complete_definition || !self.filter.is_interesting(node.kind.loc()) {
            return name_only;
        }

        self.stack.push(node.id);
        let mut members = vec![];
        for field in &node.inner {
            if matches!(field.kind, Clang::FieldDecl { .. })
                && self.filter.is_interesting(field.kind.loc())
            {
                members.push(self.map_field(field));
            }
        }
        self.stack.pop();

        let reference = match name {
            _ if members.is_empty() => name_only,
            Some(name) => {
                let record = Record { name, members };
                match kind {
                    RecordKind::Struct => self.table.structs.push(record),
                    RecordKind::Union => self.table.unions.push(record),
                }
                name_only
            }
            None => RecordRef {
                kind,
                name: None,
                members: Some(members),
            },
        };
        self.records.insert(node.id, reference.clone());
        reference
    }

    fn map_field(&mut self, field: &Node) -> Member {
        let Clang::FieldDecl {
            qtype, is_bitfield, ..
        } = &field.kind
        else {
            unreachable!("map_field called on {}", field.kind.kind_name());
        };
        let parsed = super::parse_spelling(&qtype.qual_type);
        let groups = self.declarator_groups(field);
        let ty = self.map_ty(&parsed, &mut Groups::new(&groups));
        Member {
            name: field.kind.name().map(String::from),
            ty,
            num_bits: if *is_bitfield { bit_width(field) } else { None },
        }
    }

    /// Visits an enum. Enums declared in a prototype are inlined with their name, named enums are
    /// hoisted, and anonymous enums are inlined, and also hoisted when declared on their own at
    /// file scope. A named enum from an uninteresting header is hoisted without its members.
    pub(super) fn visit_enum(&mut self, node: &'a Node) -> EnumRef {
        if let Some(reference) = self.enums.get(&node.id) {
            return reference.clone();
        }
        let name = node.kind.name().map(String::from);
        let interesting = self.filter.is_interesting(node.kind.loc());
        let in_prototype = self.index.is_in_prototype(node.id);
        let reference = match name {
            // `enum E;` ahead of (or after) the definition.
            Some(name)
                if !in_prototype
                    && node.inner.is_empty()
                    && self.index.has_definition(TagKind::Enum, &name) =>
            {
                debug!("Skipping redeclaration of enum {name}");
                EnumRef {
                    name: Some(name),
                    members: None,
                }
            }
            Some(name) if !in_prototype => {
                let members = if interesting {
                    self.enumerators(node)
                } else {
                    vec![]
                };
                self.table.enums.push(Enum {
                    name: Some(name.clone()),
                    members,
                });
                EnumRef {
                    name: Some(name),
                    members: None,
                }
            }
            name if !interesting => EnumRef {
                name,
                members: None,
            },
            Some(name) => EnumRef {
                name: Some(name),
                members: Some(self.enumerators(node)),
            },
            None => {
                let members = self.enumerators(node);
                if !in_prototype
                    && self.index.is_file_scope(node.id)
                    && !self.index.has_typedef_name(node.id)
                {
                    self.table.enums.push(Enum {
                        name: None,
                        members: members.clone(),
                    });
                }
                EnumRef {
                    name: None,
                    members: Some(members),
                }
            }
        };
        self.enums.insert(node.id, reference.clone());
        reference
    }

    fn enumerators(&mut self, node: &Node) -> Vec<Enumerator> {
        let mut next = 0;
        let mut members = vec![];
        for constant in &node.inner {
            let Clang::EnumConstantDecl { name, .. } = &constant.kind else {
                continue;
            };
            let value = constant_value(constant).unwrap_or(next);
            next = value + 1;
            members.push(Enumerator {
                name: name.clone(),
                val: self.enumerator_value(constant, value),
            });
        }
        members
    }

    /// The tokens right of `=`, concatenated. Outside compat mode an initializer that involves a
    /// macro is replaced by its value.
    fn enumerator_value(&mut self, constant: &Node, value: i128) -> Option<EnumValue> {
        let compat = self.options.compat_cast_to_yaml;
        if !compat && has_macro(constant) {
            return Some(EnumValue::Int(value));
        }
        let text = self.sources.range_text(constant.kind.range()?)?;
        let tokens = tokenize(&text);
        let equals = tokens.iter().position(|t| t.is("="))?;
        let written: String = tokens[equals + 1..].iter().map(|t| t.text).collect();
        if written.is_empty() {
            return None;
        }
        Some(EnumValue::Expr(if compat {
            cast_format(&written)
        } else {
            written
        }))
    }
}
