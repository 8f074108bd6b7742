//! The subset of clang's JSON AST that h2yaml reads, and the machinery to obtain it: running
//! clang, collecting its diagnostics, locating system headers and reading source text back out
//! of the locations clang reports.

mod clang;
mod includes;
mod source;

pub use clang::{ClangParser, Diagnostic, Input, STDIN_NAME, Severity};
pub use includes::SystemIncludes;
pub use source::{SourceCache, file_location, is_macro_location, location_offset};

use clang_ast::{Id, SourceLocation, SourceRange};
use serde::Deserialize;

pub type Node = clang_ast::Node<Clang>;

/// Represents a (possibly) qualified type in the Clang AST, such as `int`, `const int`, or `const volatile int`.
/// Clang Docs on QualType: https://clang.llvm.org/doxygen/classclang_1_1QualType.html
#[derive(Deserialize, Debug, Clone)]
pub struct QualType {
    /// String representation of the type as written in the source code, i.e., it may include `typedefs` and `typeofs`.
    #[serde(rename = "qualType")]
    pub qual_type: String,
}

/// Reference to a declaration from inside a type node, e.g. the record a `RecordType` names.
#[derive(Deserialize, Debug, Clone)]
pub struct DeclRef {
    pub id: Id,
}

/// Represents a node in the Clang AST.
/// Only the declarations that can appear in a header's API surface are modelled in detail, plus
/// the handful of expression and type nodes the mapper looks into.
#[derive(Deserialize, Debug)]
pub enum Clang {
    TranslationUnitDecl,
    /// Represents a record (struct/union) declaration in the Clang AST.
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1RecordDecl.html
    RecordDecl {
        loc: Option<SourceLocation>,
        range: Option<SourceRange>,
        name: Option<String>,
        #[serde(rename = "tagUsed")]
        tag_used: Option<String>,
        #[serde(rename = "completeDefinition", default)]
        complete_definition: bool,
        #[serde(rename = "isImplicit", default)]
        is_implicit: bool,
    },
    /// Represents an enum declaration in the Clang AST.
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1EnumDecl.html
    EnumDecl {
        loc: Option<SourceLocation>,
        range: Option<SourceRange>,
        name: Option<String>,
        #[serde(rename = "isImplicit", default)]
        is_implicit: bool,
    },
    EnumConstantDecl {
        loc: Option<SourceLocation>,
        range: Option<SourceRange>,
        name: String,
    },
    /// Represents a typedef declaration in the Clang AST.
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1TypedefDecl.html
    TypedefDecl {
        loc: Option<SourceLocation>,
        range: Option<SourceRange>,
        name: String,
        #[serde(rename = "type")]
        qtype: QualType,
        #[serde(rename = "isImplicit", default)]
        is_implicit: bool,
    },
    /// Represents a function declaration in the Clang AST.
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1FunctionDecl.html
    FunctionDecl {
        loc: Option<SourceLocation>,
        range: Option<SourceRange>,
        name: String,
        #[serde(rename = "storageClass")]
        storage_class: Option<String>,
        #[serde(rename = "type")]
        qtype: QualType,
        #[serde(default)]
        inline: bool,
        #[serde(rename = "isImplicit", default)]
        is_implicit: bool,
    },
    /// Represents a parameter variable declaration in the Clang AST.
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1ParmVarDecl.html
    ParmVarDecl {
        loc: Option<SourceLocation>,
        range: Option<SourceRange>,
        name: Option<String>,
        #[serde(rename = "type")]
        qtype: QualType,
    },
    /// Represents a variable declaration in the Clang AST.
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1VarDecl.html
    VarDecl {
        loc: Option<SourceLocation>,
        range: Option<SourceRange>,
        name: String,
        #[serde(rename = "type")]
        qtype: QualType,
        #[serde(rename = "storageClass")]
        storage_class: Option<String>,
        /// Initialization style (`c`, `call` or `list`) when the variable has an initializer.
        init: Option<String>,
        #[serde(rename = "isImplicit", default)]
        is_implicit: bool,
    },
    /// Represents a struct or union member in the Clang AST.
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1FieldDecl.html
    FieldDecl {
        loc: Option<SourceLocation>,
        range: Option<SourceRange>,
        name: Option<String>,
        #[serde(rename = "type")]
        qtype: QualType,
        #[serde(rename = "isBitfield", default)]
        is_bitfield: bool,
        #[serde(rename = "isImplicit", default)]
        is_implicit: bool,
    },
    EmptyDecl {
        loc: Option<SourceLocation>,
        range: Option<SourceRange>,
    },
    /// Represents a compound statement in the Clang AST. Its presence under a function marks a
    /// definition.
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1CompoundStmt.html
    CompoundStmt {
        loc: Option<SourceLocation>,
        range: Option<SourceRange>,
    },
    /// An integer constant expression together with its evaluated value, e.g. a bitfield width
    /// or an enumerator initializer.
    ConstantExpr {
        range: Option<SourceRange>,
        value: Option<String>,
    },
    IntegerLiteral {
        range: Option<SourceRange>,
        value: String,
    },
    /// The type written in a typedef, possibly owning the tag it declares
    /// (`typedef struct { ... } T;`).
    ElaboratedType {
        #[serde(rename = "ownedTagDecl")]
        owned_tag_decl: Option<DeclRef>,
    },
    RecordType {
        decl: DeclRef,
    },
    EnumType {
        decl: DeclRef,
    },
    /// Every other node. Locations are kept so macro-expanded expressions can be recognized.
    Other {
        kind: Option<String>,
        loc: Option<SourceLocation>,
        range: Option<SourceRange>,
    },
}

impl Clang {
    /// Returns the source location of this AST node, if available.
    ///
    /// # Returns
    /// - `Some(&SourceLocation)` if the node has a location field
    /// - `None` if the node doesn't have a location or if the location field is None
    pub fn loc(&self) -> Option<&SourceLocation> {
        match self {
            Clang::RecordDecl { loc, .. }
            | Clang::EnumDecl { loc, .. }
            | Clang::EnumConstantDecl { loc, .. }
            | Clang::TypedefDecl { loc, .. }
            | Clang::FunctionDecl { loc, .. }
            | Clang::ParmVarDecl { loc, .. }
            | Clang::VarDecl { loc, .. }
            | Clang::FieldDecl { loc, .. }
            | Clang::EmptyDecl { loc, .. }
            | Clang::CompoundStmt { loc, .. }
            | Clang::Other { loc, .. } => loc.as_ref(),
            Clang::TranslationUnitDecl
            | Clang::ConstantExpr { .. }
            | Clang::IntegerLiteral { .. }
            | Clang::ElaboratedType { .. }
            | Clang::RecordType { .. }
            | Clang::EnumType { .. } => None,
        }
    }

    /// Returns the source range of this AST node, if available.
    pub fn range(&self) -> Option<&SourceRange> {
        match self {
            Clang::RecordDecl { range, .. }
            | Clang::EnumDecl { range, .. }
            | Clang::EnumConstantDecl { range, .. }
            | Clang::TypedefDecl { range, .. }
            | Clang::FunctionDecl { range, .. }
            | Clang::ParmVarDecl { range, .. }
            | Clang::VarDecl { range, .. }
            | Clang::FieldDecl { range, .. }
            | Clang::EmptyDecl { range, .. }
            | Clang::CompoundStmt { range, .. }
            | Clang::ConstantExpr { range, .. }
            | Clang::IntegerLiteral { range, .. }
            | Clang::Other { range, .. } => range.as_ref(),
            Clang::TranslationUnitDecl
            | Clang::ElaboratedType { .. }
            | Clang::RecordType { .. }
            | Clang::EnumType { .. } => None,
        }
    }

    /// Returns the name of this declaration. Anonymous records, enums, fields and parameters
    /// have none.
    pub fn name(&self) -> Option<&str> {
        match self {
            Clang::RecordDecl { name, .. }
            | Clang::EnumDecl { name, .. }
            | Clang::ParmVarDecl { name, .. }
            | Clang::FieldDecl { name, .. } => name.as_deref().filter(|n| !n.is_empty()),
            Clang::EnumConstantDecl { name, .. }
            | Clang::TypedefDecl { name, .. }
            | Clang::FunctionDecl { name, .. }
            | Clang::VarDecl { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Returns true for declarations the compiler created rather than the user wrote.
    pub fn is_implicit(&self) -> bool {
        match self {
            Clang::RecordDecl { is_implicit, .. }
            | Clang::EnumDecl { is_implicit, .. }
            | Clang::TypedefDecl { is_implicit, .. }
            | Clang::FunctionDecl { is_implicit, .. }
            | Clang::VarDecl { is_implicit, .. }
            | Clang::FieldDecl { is_implicit, .. } => *is_implicit,
            _ => false,
        }
    }

    /// Returns true for attribute nodes (`AlignedAttr`, `DeprecatedAttr`, ...), which clang lists
    /// among a declaration's children.
    pub fn is_attribute(&self) -> bool {
        matches!(self, Clang::Other { kind: Some(kind), .. } if kind.ends_with("Attr"))
    }

    /// The clang node kind, for log and panic messages.
    pub fn kind_name(&self) -> &str {
        match self {
            Clang::TranslationUnitDecl => "TranslationUnitDecl",
            Clang::RecordDecl { .. } => "RecordDecl",
            Clang::EnumDecl { .. } => "EnumDecl",
            Clang::EnumConstantDecl { .. } => "EnumConstantDecl",
            Clang::TypedefDecl { .. } => "TypedefDecl",
            Clang::FunctionDecl { .. } => "FunctionDecl",
            Clang::ParmVarDecl { .. } => "ParmVarDecl",
            Clang::VarDecl { .. } => "VarDecl",
            Clang::FieldDecl { .. } => "FieldDecl",
            Clang::EmptyDecl { .. } => "EmptyDecl",
            Clang::CompoundStmt { .. } => "CompoundStmt",
            Clang::ConstantExpr { .. } => "ConstantExpr",
            Clang::IntegerLiteral { .. } => "IntegerLiteral",
            Clang::ElaboratedType { .. } => "ElaboratedType",
            Clang::RecordType { .. } => "RecordType",
            Clang::EnumType { .. } => "EnumType",
            Clang::Other { kind, .. } => kind.as_deref().unwrap_or("<unknown>"),
        }
    }
}
