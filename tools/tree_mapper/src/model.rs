//! The declaration table and the type descriptors it is made of, in the shape they are
//! serialized.

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

/// Every declaration extracted from a translation unit, by category. Empty categories are left
/// out of the serialized document.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct Declarations {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub structs: Vec<Record>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unions: Vec<Record>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub typedefs: Vec<Typedef>,
    /// Variables.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub declarations: Vec<Variable>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub functions: Vec<Function>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enums: Vec<Enum>,
}

impl Declarations {
    pub fn is_empty(&self) -> bool {
        self.structs.is_empty()
            && self.unions.is_empty()
            && self.typedefs.is_empty()
            && self.declarations.is_empty()
            && self.functions.is_empty()
            && self.enums.is_empty()
    }
}

/// A hoisted struct or union.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Record {
    pub name: String,
    pub members: Vec<Member>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Member {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: Type,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_bits: Option<u64>,
}

/// A hoisted enum. Anonymous enums declared at file scope are hoisted without a name.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Enum {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub members: Vec<Enumerator>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Enumerator {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub val: Option<EnumValue>,
}

/// The value of an enumerator: the initializer as written, or its evaluated value when the
/// written form goes through a macro.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EnumValue {
    Int(i128),
    Expr(String),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Typedef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Storage {
    Extern,
    Static,
}

/// A function declaration. `ty` is the result type.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Function {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<Storage>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub inline: bool,
    #[serde(rename = "type")]
    pub ty: Type,
    /// `None` for functions declared without a prototype.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<Param>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub var_args: bool,
}

/// A variable declaration.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Variable {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<Storage>,
    /// Source text of the initializer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Param {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub ty: Type,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Qualifiers {
    pub is_const: bool,
    pub is_volatile: bool,
    pub is_restrict: bool,
}

/// A type descriptor.
#[derive(Clone, Debug, PartialEq)]
pub struct Type {
    pub kind: TypeKind,
    pub qualifiers: Qualifiers,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    Void,
    Int,
    Float,
    Char,
    Bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Struct,
    Union,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TypeKind {
    /// A builtin type; `name` is its C spelling without qualifiers, e.g. `unsigned long`.
    Primitive { class: Primitive, name: String },
    Pointer(Box<Type>),
    Array {
        element: Box<Type>,
        length: Option<Length>,
    },
    Function(FunctionType),
    Record(RecordRef),
    Enum(EnumRef),
    /// A typedef name.
    Custom(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionType {
    pub result: Box<Type>,
    /// `None` when the function has no prototype.
    pub params: Option<Vec<Param>>,
    pub variadic: bool,
}

/// Reference to a struct or union: a name for named records, members for inlined anonymous
/// ones.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordRef {
    pub kind: RecordKind,
    pub name: Option<String>,
    pub members: Option<Vec<Member>>,
}

/// Reference to an enum: its name, its members when inlined, or both for enums declared inside
/// a prototype.
#[derive(Clone, Debug, PartialEq)]
pub struct EnumRef {
    pub name: Option<String>,
    pub members: Option<Vec<Enumerator>>,
}

/// The length of an array: the element count, or the bound as written in compat mode.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Length {
    Count(u64),
    Expr(String),
}

impl Type {
    pub fn new(kind: TypeKind) -> Type {
        Type {
            kind,
            qualifiers: Qualifiers::default(),
        }
    }

    pub fn qualified(kind: TypeKind, qualifiers: Qualifiers) -> Type {
        Type { kind, qualifiers }
    }
}

impl TypeKind {
    /// The `kind` key of the serialized descriptor.
    pub fn name(&self) -> &'static str {
        match self {
            TypeKind::Primitive { class, .. } => match class {
                Primitive::Void => "void",
                Primitive::Int => "int",
                Primitive::Float => "float",
                Primitive::Char => "char",
                Primitive::Bool => "bool",
            },
            TypeKind::Pointer(_) => "pointer",
            TypeKind::Array { .. } => "array",
            TypeKind::Function(_) => "function",
            TypeKind::Record(RecordRef {
                kind: RecordKind::Struct,
                ..
            }) => "struct",
            TypeKind::Record(RecordRef {
                kind: RecordKind::Union,
                ..
            }) => "union",
            TypeKind::Enum(_) => "enum",
            TypeKind::Custom(_) => "custom_type",
        }
    }
}

impl Serialize for Type {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("kind", self.kind.name())?;
        match &self.kind {
            TypeKind::Primitive { name, .. } | TypeKind::Custom(name) => {
                map.serialize_entry("name", name)?;
            }
            TypeKind::Pointer(pointee) => map.serialize_entry("type", pointee)?,
            TypeKind::Array { element, length } => {
                map.serialize_entry("type", element)?;
                if let Some(length) = length {
                    map.serialize_entry("length", length)?;
                }
            }
            TypeKind::Function(function) => {
                map.serialize_entry("type", &function.result)?;
                if let Some(params) = &function.params {
                    map.serialize_entry("params", params)?;
                }
                if function.variadic {
                    map.serialize_entry("var_args", &true)?;
                }
            }
            TypeKind::Record(RecordRef { name, members, .. }) => {
                if let Some(name) = name {
                    map.serialize_entry("name", name)?;
                }
                if let Some(members) = members {
                    map.serialize_entry("members", members)?;
                }
            }
            TypeKind::Enum(EnumRef { name, members }) => {
                if let Some(name) = name {
                    map.serialize_entry("name", name)?;
                }
                if let Some(members) = members {
                    map.serialize_entry("members", members)?;
                }
            }
        }
        if self.qualifiers.is_const {
            map.serialize_entry("const", &true)?;
        }
        if self.qualifiers.is_volatile {
            map.serialize_entry("volatile", &true)?;
        }
        if self.qualifiers.is_restrict {
            map.serialize_entry("restrict", &true)?;
        }
        map.end()
    }
}
