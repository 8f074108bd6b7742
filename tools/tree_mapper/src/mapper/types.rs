use super::TreeMapper;
use crate::compat::cast_format;
use crate::declarator::{Group, ParamDeclarator};
use crate::index::tag_kind;
use crate::model::{
    EnumRef, FunctionType, Length, Param, Primitive, RecordKind, RecordRef, Type, TypeKind,
};
use crate::spelling::{TagKind, TagName, Ty, TyKind};
use c_ast::{Clang, Node};
use tracing::{debug, warn};

/// The suffix groups of a declarator, consumed as the type is walked from the outside in. Once
/// a group does not fit the type, the rest are ignored.
pub(super) struct Groups<'g> {
    groups: &'g [Group],
    pos: usize,
    poisoned: bool,
}

impl<'g> Groups<'g> {
    pub(super) fn new(groups: &'g [Group]) -> Groups<'g> {
        Groups {
            groups,
            pos: 0,
            poisoned: false,
        }
    }

    fn next(&mut self) -> Option<&'g Group> {
        if self.poisoned {
            return None;
        }
        let group = self.groups.get(self.pos)?;
        self.pos += 1;
        Some(group)
    }

    /// The parameter declarators of the next function type.
    pub(super) fn params(&mut self) -> Option<&'g [ParamDeclarator]> {
        match self.next()? {
            Group::Params(params) => Some(params),
            Group::Bound(_) => {
                self.poisoned = true;
                None
            }
        }
    }

    /// The written bound of the next array type.
    fn bound(&mut self) -> Option<&'g str> {
        match self.next()? {
            Group::Bound(bound) => Some(bound),
            Group::Params(_) => {
                self.poisoned = true;
                None
            }
        }
    }
}

const INTEGER_WORDS: [&str; 5] = ["signed", "unsigned", "short", "long", "int"];

impl<'a> TreeMapper<'a, '_> {
    pub(super) fn map_ty(&mut self, ty: &Ty, groups: &mut Groups) -> Type {
        let kind = match &ty.kind {
            TyKind::Builtin(words) => self.primitive(words),
            TyKind::Typedef(name) => TypeKind::Custom(name.clone()),
            TyKind::Tag(kind, name) => self.tag_reference(*kind, name),
            TyKind::Pointer(pointee) => TypeKind::Pointer(Box::new(self.map_ty(pointee, groups))),
            TyKind::Array(element, size) => {
                let bound = groups.bound();
                let element = self.map_ty(element, groups);
                let length = match (size, bound) {
                    (None, _) => None,
                    (Some(_), Some(bound)) if self.options.compat_cast_to_yaml && !bound.is_empty() => {
                        Some(Length::Expr(cast_format(bound)))
                    }
                    (Some(size), _) => Some(Length::Count(*size)),
                };
                TypeKind::Array {
                    element: Box::new(element),
                    length,
                }
            }
            TyKind::Function {
                result,
                params,
                variadic,
            } => {
                let written = groups.params();
                let result = self.map_ty(result, groups);
                let params = params
                    .as_ref()
                    .map(|params| self.map_params(params, written, None));
                TypeKind::Function(FunctionType {
                    result: Box::new(result),
                    params,
                    variadic: *variadic,
                })
            }
        };
        Type::qualified(kind, ty.quals)
    }

    /// Maps the parameters of a function type. Names come from `declared` (a function
    /// declaration's parameters) or else from the written declarators, which are only trusted
    /// when there is one per parameter.
    pub(super) fn map_params(
        &mut self,
        params: &[Ty],
        written: Option<&[ParamDeclarator]>,
        declared: Option<&[Option<&str>]>,
    ) -> Vec<Param> {
        let written = written.filter(|written| written.len() == params.len());
        params
            .iter()
            .enumerate()
            .map(|(i, ty)| {
                let declarator = written.map(|written| &written[i]);
                let groups = declarator.map_or(&[][..], |d| d.groups.as_slice());
                let mut groups = Groups::new(groups);
                // `int a[4]` as a parameter is a pointer; its bound belongs to no type.
                if matches!(ty.kind, TyKind::Pointer(_))
                    && matches!(groups.groups.first(), Some(Group::Bound(_)))
                {
                    groups.pos = 1;
                }
                let ty = self.map_ty(ty, &mut groups);
                let name = match declared {
                    Some(declared) => declared.get(i).copied().flatten().map(String::from),
                    None => declarator.and_then(|d| d.name.clone()),
                };
                let name =
                    name.or_else(|| self.options.canonicalization.then(|| format!("_arg{i}")));
                Param { name, ty }
            })
            .collect()
    }

    fn primitive(&self, words: &str) -> TypeKind {
        let class = match words {
            "void" => Primitive::Void,
            "_Bool" | "bool" => Primitive::Bool,
            "float" | "double" | "long double" => Primitive::Float,
            "char" | "signed char" | "unsigned char" => Primitive::Char,
            _ if words.split(' ').all(|w| INTEGER_WORDS.contains(&w)) => Primitive::Int,
            _ => unimplemented!("builtin type `{words}`"),
        };
        let mut name = words.to_string();
        if self.options.compat_cast_to_yaml
            && class == Primitive::Int
            && !words.split(' ').any(|w| w == "int")
        {
            name.push_str(" int");
        }
        TypeKind::Primitive { class, name }
    }

    /// Resolves a tag named in a type spelling and visits its declaration.
    fn tag_reference(&mut self, kind: TagKind, name: &TagName) -> TypeKind {
        let node = match name {
            TagName::Named(name) => self.index.resolve_named(kind, name, self.scope.as_ref()),
            TagName::Anonymous(loc) => {
                let node = self.index.resolve_anonymous(loc);
                if node.is_none() {
                    warn!("Cannot find the anonymous {kind:?} declared at {loc}");
                }
                node
            }
        };
        if let Some(node) = node.filter(|node| tag_kind(node) == Some(kind)) {
            return self.visit_tag(node);
        }
        let name = match name {
            TagName::Named(name) => {
                debug!("No declaration of {kind:?} {name}");
                Some(name.clone())
            }
            TagName::Anonymous(_) => None,
        };
        match kind {
            TagKind::Struct | TagKind::Union => TypeKind::Record(RecordRef {
                kind: if kind == TagKind::Union {
                    RecordKind::Union
                } else {
                    RecordKind::Struct
                },
                name,
                members: None,
            }),
            TagKind::Enum => TypeKind::Enum(EnumRef {
                name,
                members: None,
            }),
        }
    }

    pub(super) fn visit_tag(&mut self, node: &'a Node) -> TypeKind {
        match &node.kind {
            Clang::RecordDecl { .. } => TypeKind::Record(self.visit_record(node)),
            Clang::EnumDecl { .. } => TypeKind::Enum(self.visit_enum(node)),
            other => unreachable!("{} is not a tag declaration", other.kind_name()),
        }
    }
}
