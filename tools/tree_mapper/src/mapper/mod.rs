mod records;
#[cfg(test)]
mod tests;
mod types;

use crate::MapOptions;
use crate::compat::cast_format;
use crate::declarator::{Group, suffix_groups};
use crate::filter::HeaderFilter;
use crate::index::{Span, TagIndex};
use crate::model::{Declarations, EnumRef, Function, RecordRef, Storage, Type, Typedef, Variable};
use crate::spelling::{self, Ty, TyKind};
use c_ast::{Clang, Node, SourceCache, file_location, is_macro_location, location_offset};
use clang_ast::Id;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};
use types::Groups;

/// Maps the declarations of `tu` that pass `filter` to a declaration table. `sources` supplies
/// the text of the files clang read, for what the AST does not record.
///
/// # Panics
/// On declaration kinds, builtin types, storage classes and type constructs h2yaml has no
/// representation for.
pub fn map_translation_unit(
    tu: &Node,
    filter: &HeaderFilter,
    sources: &mut SourceCache,
    options: MapOptions,
) -> Declarations {
    let mut mapper = TreeMapper {
        index: TagIndex::build(tu),
        filter,
        sources,
        options,
        table: Declarations::default(),
        records: HashMap::new(),
        enums: HashMap::new(),
        stack: vec![],
        typedef_names: HashSet::new(),
        scope: None,
    };
    for node in &tu.inner {
        if filter.accepts(node) {
            mapper.scope = Span::of(node);
            mapper.visit_top_level(node);
        }
    }
    debug_assert!(
        mapper.stack.is_empty(),
        "records still under construction: {:?}",
        mapper.stack
    );
    let table = mapper.table;
    info!(
        "Mapped {} structs, {} unions, {} typedefs, {} variables, {} functions, {} enums",
        table.structs.len(),
        table.unions.len(),
        table.typedefs.len(),
        table.declarations.len(),
        table.functions.len(),
        table.enums.len()
    );
    table
}

struct TreeMapper<'a, 's> {
    index: TagIndex<'a>,
    filter: &'a HeaderFilter,
    sources: &'s mut SourceCache,
    options: MapOptions,
    table: Declarations,
    /// What a visited record or enum is referred to as.
    records: HashMap<Id, RecordRef>,
    enums: HashMap<Id, EnumRef>,
    /// Records whose members are being mapped; a reference to one of them is a self reference.
    stack: Vec<Id>,
    typedef_names: HashSet<String>,
    /// The top-level declaration being mapped.
    scope: Option<Span>,
}

/// `file:line:col` of a node, for warnings.
fn location(node: &Node) -> String {
    match node.kind.loc().and_then(file_location) {
        Some(loc) => format!("{}:{}:{}", loc.file, loc.line, loc.col),
        None => "<unknown>".into(),
    }
}

fn storage(storage_class: Option<&str>, name: &str) -> Option<Storage> {
    match storage_class {
        None => None,
        Some("extern") => Some(Storage::Extern),
        Some("static") => Some(Storage::Static),
        Some(other) => unimplemented!("storage class `{other}` of `{name}`"),
    }
}

fn parse_spelling(spelling: &str) -> Ty {
    spelling::parse(spelling).unwrap_or_else(|e| unimplemented!("{e}"))
}

impl<'a> TreeMapper<'a, '_> {
    fn visit_top_level(&mut self, node: &'a Node) {
        debug!(
            "Visiting {} {}",
            node.kind.kind_name(),
            node.kind.name().unwrap_or("<anonymous>")
        );
        match &node.kind {
            Clang::RecordDecl { .. } => {
                self.visit_record(node);
            }
            Clang::EnumDecl { .. } => {
                self.visit_enum(node);
            }
            Clang::TypedefDecl { .. } => self.visit_typedef(node),
            Clang::FunctionDecl { .. } => self.visit_function(node),
            Clang::VarDecl { .. } => self.visit_variable(node),
            Clang::EmptyDecl { .. } => {}
            other => unimplemented!(
                "{} declaration at {}",
                other.kind_name(),
                location(node)
            ),
        }
    }

    fn visit_typedef(&mut self, node: &'a Node) {
        let Clang::TypedefDecl { name, qtype, .. } = &node.kind else {
            unreachable!("visit_typedef called on {}", node.kind.kind_name());
        };
        if !self.typedef_names.insert(name.clone()) {
            debug!("Skipping redeclaration of typedef {name}");
            return;
        }
        let parsed = parse_spelling(&qtype.qual_type);
        let ty = match (self.index.linkage_tag(node.id), &parsed.kind) {
            (Some(tag), TyKind::Tag(..)) => Type::qualified(self.visit_tag(tag), parsed.quals),
            _ => {
                let groups = self.declarator_groups(node);
                self.map_ty(&parsed, &mut Groups::new(&groups))
            }
        };
        self.table.typedefs.push(Typedef {
            name: name.clone(),
            ty,
        });
    }

    fn visit_function(&mut self, node: &'a Node) {
        let Clang::FunctionDecl {
            name,
            storage_class,
            qtype,
            inline,
            ..
        } = &node.kind
        else {
            unreachable!("visit_function called on {}", node.kind.kind_name());
        };
        if node
            .inner
            .iter()
            .any(|n| matches!(n.kind, Clang::CompoundStmt { .. }))
        {
            warn!(
                "{}: `{name}` is a function definition and will be ignored.",
                location(node)
            );
            return;
        }

        let parsed = parse_spelling(&qtype.qual_type);
        let TyKind::Function {
            result,
            params,
            variadic,
        } = &parsed.kind
        else {
            unimplemented!("function `{name}` of type `{}`", qtype.qual_type);
        };
        let storage = storage(storage_class.as_deref(), name);
        let groups = self.declarator_groups(node);
        let mut groups = Groups::new(&groups);
        let written = groups.params();
        let ty = self.map_ty(result, &mut groups);
        let params = match params {
            Some(params) => {
                let declared: Vec<Option<&str>> = node
                    .inner
                    .iter()
                    .filter(|n| matches!(n.kind, Clang::ParmVarDecl { .. }))
                    .map(|n| n.kind.name())
                    .collect();
                Some(self.map_params(params, written, Some(declared.as_slice())))
            }
            None => {
                warn!(
                    "{}: `{name}` defines a function with no parameters, consider specifying `void`.",
                    location(node)
                );
                None
            }
        };
        self.table.functions.push(Function {
            name: name.clone(),
            storage,
            inline: *inline,
            ty,
            params,
            var_args: *variadic,
        });
    }

    fn visit_variable(&mut self, node: &'a Node) {
        let Clang::VarDecl {
            name,
            qtype,
            storage_class,
            init,
            ..
        } = &node.kind
        else {
            unreachable!("visit_variable called on {}", node.kind.kind_name());
        };
        let parsed = parse_spelling(&qtype.qual_type);
        // `int a[];` is completed elsewhere.
        if matches!(parsed.kind, TyKind::Array(_, None)) {
            debug!("Skipping {name} of incomplete array type");
            return;
        }
        let groups = self.declarator_groups(node);
        let ty = self.map_ty(&parsed, &mut Groups::new(&groups));
        let storage = storage(storage_class.as_deref(), name);
        let init = match init {
            Some(_) => self.initializer(node),
            None => None,
        };
        self.table.declarations.push(Variable {
            name: name.clone(),
            ty,
            storage,
            init,
        });
    }

    /// Source text of a variable's initializer.
    fn initializer(&mut self, node: &Node) -> Option<String> {
        let expr = node.inner.iter().find(|n| !n.kind.is_attribute())?;
        let text = self.sources.range_text(expr.kind.range()?)?;
        Some(if self.options.compat_cast_to_yaml {
            cast_format(&text)
        } else {
            text
        })
    }

    /// Scans the suffix groups of a named declarator from the source. Declarators written by
    /// macros are not scanned.
    fn declarator_groups(&mut self, node: &Node) -> Vec<Group> {
        let Some(loc) = node.kind.loc() else {
            return vec![];
        };
        if node.kind.name().is_none() || is_macro_location(loc) {
            return vec![];
        }
        let (Some((file, name)), Some(span)) = (location_offset(loc), Span::of(node)) else {
            return vec![];
        };
        if *file != span.file || name >= span.end {
            return vec![];
        }
        self.sources
            .text(file, name, span.end)
            .map_or_else(Vec::new, |text| suffix_groups(&text))
    }
}
