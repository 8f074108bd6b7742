//! Lookup tables over a whole translation unit, built before the walk: tag declarations by name
//! and by location, the typedefs that name anonymous tags, and where enums are declared.

use crate::spelling::{AnonLocation, TagKind};
use c_ast::{Clang, Node, file_location};
use clang_ast::{BareSourceLocation, Id};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A byte range of one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub file: Arc<str>,
    pub begin: usize,
    pub end: usize,
}

impl Span {
    pub fn of(node: &Node) -> Option<Span> {
        let range = node.kind.range()?;
        let begin = file_location(&range.begin)?;
        let end = file_location(&range.end)?;
        (begin.file == end.file).then(|| Span {
            file: begin.file.clone(),
            begin: begin.offset,
            end: end.offset + end.tok_len,
        })
    }

    fn contains(&self, loc: &BareSourceLocation) -> bool {
        self.file == loc.file && self.begin <= loc.offset && loc.offset < self.end
    }
}

pub struct TagIndex<'a> {
    tags: HashMap<Id, &'a Node>,
    named: HashMap<(TagKind, &'a str), Vec<&'a Node>>,
    anonymous: Vec<(AnonKey, &'a Node)>,
    linkage_by_typedef: HashMap<Id, Id>,
    linkage_by_name: HashMap<&'a str, Id>,
    file_scope: HashSet<Id>,
    in_prototype: HashSet<Id>,
}

/// The places clang may print for an anonymous tag.
struct AnonKey {
    file: Arc<str>,
    line: usize,
    col: usize,
}

/// Returns the tag kind of a record or enum declaration.
pub fn tag_kind(node: &Node) -> Option<TagKind> {
    match &node.kind {
        Clang::RecordDecl { tag_used, .. } => match tag_used.as_deref() {
            Some("union") => Some(TagKind::Union),
            _ => Some(TagKind::Struct),
        },
        Clang::EnumDecl { .. } => Some(TagKind::Enum),
        _ => None,
    }
}

fn is_complete(node: &Node) -> bool {
    match &node.kind {
        Clang::RecordDecl {
            complete_definition,
            ..
        } => *complete_definition,
        // A definition has enumerators; GNU C allows `enum E;` forward declarations.
        Clang::EnumDecl { .. } => !node.inner.is_empty(),
        _ => false,
    }
}

/// Paths compare equal when one is a suffix of the other at a path separator, so `a.h` matches
/// `./a.h` and `/src/a.h`.
fn same_file(a: &str, b: &str) -> bool {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let short = short.trim_start_matches("./");
    long.ends_with(short)
        && (long.len() == short.len() || long[..long.len() - short.len()].ends_with('/'))
}

/// A declarator whose type may be written around an enum: name offset and end of the
/// declaration.
struct DeclaratorSpan {
    name: usize,
    end: usize,
}

#[derive(Default)]
struct Collector<'a> {
    spans: HashMap<Arc<str>, Vec<DeclaratorSpan>>,
    enums: Vec<(Id, Arc<str>, usize)>,
    typedefs: Vec<&'a Node>,
}

impl<'a> TagIndex<'a> {
    pub fn build(tu: &'a Node) -> TagIndex<'a> {
        let mut index = TagIndex {
            tags: HashMap::new(),
            named: HashMap::new(),
            anonymous: vec![],
            linkage_by_typedef: HashMap::new(),
            linkage_by_name: HashMap::new(),
            file_scope: HashSet::new(),
            in_prototype: HashSet::new(),
        };
        let mut collector = Collector::default();
        for node in &tu.inner {
            if tag_kind(node).is_some() {
                index.file_scope.insert(node.id);
            }
            index.collect(node, &mut collector);
        }
        index.link_typedefs(&collector.typedefs);
        index.find_prototype_enums(collector);
        index
    }

    fn collect(&mut self, node: &'a Node, collector: &mut Collector<'a>) {
        if let Some(kind) = tag_kind(node) {
            self.tags.insert(node.id, node);
            match node.kind.name() {
                Some(name) => self.named.entry((kind, name)).or_default().push(node),
                None => {
                    if let Some(loc) = node.kind.loc() {
                        // clang prints the expansion location; it is the spelling location
                        // outside of macros.
                        let places = [loc.expansion_loc.as_ref(), loc.spelling_loc.as_ref()];
                        for place in places.into_iter().flatten() {
                            self.anonymous.push((
                                AnonKey {
                                    file: place.file.clone(),
                                    line: place.line,
                                    col: place.col,
                                },
                                node,
                            ));
                        }
                    }
                }
            }
            if kind == TagKind::Enum
                && let Some(begin) = node.kind.range().and_then(|r| file_location(&r.begin))
            {
                collector
                    .enums
                    .push((node.id, begin.file.clone(), begin.offset));
            }
        }

        match &node.kind {
            Clang::TypedefDecl { .. } => collector.typedefs.push(node),
            Clang::FunctionDecl { .. }
            | Clang::VarDecl { .. }
            | Clang::FieldDecl { .. }
            | Clang::ParmVarDecl { .. } => {}
            _ => {
                for child in &node.inner {
                    self.collect(child, collector);
                }
                return;
            }
        }
        if let (Some(name), Some(span)) = (node.kind.loc().and_then(file_location), Span::of(node))
            && name.file == span.file
        {
            collector
                .spans
                .entry(span.file)
                .or_default()
                .push(DeclaratorSpan {
                    name: name.offset,
                    end: span.end,
                });
        }
        for child in &node.inner {
            self.collect(child, collector);
        }
    }

    /// Records `typedef struct { ... } T;`: the typedef's type is the anonymous tag itself.
    fn link_typedefs(&mut self, typedefs: &[&'a Node]) {
        for &typedef in typedefs {
            let Some(ty) = typedef.inner.iter().find(|n| !n.kind.is_attribute()) else {
                continue;
            };
            let tag = match &ty.kind {
                Clang::ElaboratedType {
                    owned_tag_decl: Some(decl),
                } => Some(decl.id),
                Clang::ElaboratedType { .. } => ty.inner.first().and_then(|n| match &n.kind {
                    Clang::RecordType { decl } | Clang::EnumType { decl } => Some(decl.id),
                    _ => None,
                }),
                Clang::RecordType { decl } | Clang::EnumType { decl } => Some(decl.id),
                _ => None,
            };
            let Some(tag) = tag.filter(|id| {
                self.tags
                    .get(id)
                    .is_some_and(|node| node.kind.name().is_none())
            }) else {
                continue;
            };
            self.linkage_by_typedef.insert(typedef.id, tag);
            if let Some(name) = typedef.kind.name() {
                self.linkage_by_name.entry(name).or_insert(tag);
            }
        }
    }

    /// An enum is declared in a prototype when it starts after the name of a declarator and
    /// before that declarator ends: `void f(enum { A } a);`, `void (*g)(enum { B });`.
    fn find_prototype_enums(&mut self, collector: Collector<'a>) {
        // Per file: spans sorted by name offset, and the furthest end seen so far.
        let mut reach: HashMap<Arc<str>, (Vec<usize>, Vec<usize>)> = HashMap::new();
        for (file, mut file_spans) in collector.spans {
            file_spans.sort_by_key(|s| s.name);
            let names = file_spans.iter().map(|s| s.name).collect();
            let ends = file_spans
                .iter()
                .scan(0, |max, s| {
                    *max = (*max).max(s.end);
                    Some(*max)
                })
                .collect();
            reach.insert(file, (names, ends));
        }
        for (id, file, begin) in collector.enums {
            let Some((names, ends)) = reach.get(&file) else {
                continue;
            };
            let before = names.partition_point(|&name| name < begin);
            if before > 0 && ends[before - 1] > begin {
                self.in_prototype.insert(id);
            }
        }
    }

    pub fn tag(&self, id: Id) -> Option<&'a Node> {
        self.tags.get(&id).copied()
    }

    /// Resolves `struct name`. Prefers a definition inside `scope`, then the first definition,
    /// then the first declaration. Falls back to an anonymous tag named through a typedef, which
    /// clang prints as `struct T` for `typedef struct { ... } T;`.
    pub fn resolve_named(
        &self,
        kind: TagKind,
        name: &str,
        scope: Option<&Span>,
    ) -> Option<&'a Node> {
        if let Some(candidates) = self.named.get(&(kind, name)) {
            let complete = || candidates.iter().copied().filter(|n| is_complete(n));
            let in_scope = scope.and_then(|scope| {
                complete().find(|n| {
                    n.kind
                        .loc()
                        .and_then(file_location)
                        .is_some_and(|loc| scope.contains(loc))
                })
            });
            return in_scope
                .or_else(|| complete().next())
                .or_else(|| candidates.first().copied());
        }
        self.linkage_by_name
            .get(name)
            .and_then(|id| self.tag(*id))
            .filter(|node| tag_kind(node) == Some(kind))
    }

    /// Returns true if some declaration of `kind name` is a definition.
    pub fn has_definition(&self, kind: TagKind, name: &str) -> bool {
        self.named
            .get(&(kind, name))
            .is_some_and(|candidates| candidates.iter().any(|n| is_complete(n)))
    }

    /// Resolves an anonymous tag by the location clang printed for it.
    pub fn resolve_anonymous(&self, loc: &AnonLocation) -> Option<&'a Node> {
        self.anonymous
            .iter()
            .find(|(key, _)| {
                key.line == loc.line && key.col == loc.col && same_file(&key.file, &loc.file)
            })
            .map(|(_, node)| *node)
    }

    /// The anonymous tag a typedef names, for `typedef struct { ... } T;`.
    pub fn linkage_tag(&self, typedef: Id) -> Option<&'a Node> {
        self.linkage_by_typedef
            .get(&typedef)
            .and_then(|id| self.tag(*id))
    }

    /// Returns true if a typedef gives this anonymous tag its name.
    pub fn has_typedef_name(&self, tag: Id) -> bool {
        self.linkage_by_typedef.values().any(|id| *id == tag)
    }

    /// Returns true for tags declared directly in the translation unit.
    pub fn is_file_scope(&self, tag: Id) -> bool {
        self.file_scope.contains(&tag)
    }

    pub fn is_in_prototype(&self, tag: Id) -> bool {
        self.in_prototype.contains(&tag)
    }
}
