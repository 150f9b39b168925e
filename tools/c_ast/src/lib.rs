//! The declaration tree of a C header, as produced by clang's JSON AST dump, plus the tools to
//! obtain it ([FrontEnd]) and to traverse it ([walk], [HeaderFilter]).

mod front_end;
mod walk;

pub use front_end::{FrontEnd, FrontEndError, HeaderAst};
pub use walk::{HeaderFilter, Walk, walk};

use clang_ast::Node;
use serde::{Deserialize, Serialize};

/// Represents a (possibly) qualified type in the Clang AST, such as `int`, `const int`, or `const volatile int`.
/// Clang Docs on QualType: https://clang.llvm.org/doxygen/classclang_1_1QualType.html
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct QualType {
    /// String representation of the desugared type, i.e., it will have `typedefs` and `typeofs` resolved.
    #[serde(rename = "desugaredQualType")]
    pub desugared_qual_type: Option<String>,
    /// String representation of the type as written in the source code, i.e., it may include `typedefs` and `typeofs`.
    #[serde(rename = "qualType")]
    pub qual_type: String,
}

/// Represents a node in the Clang AST.
/// Only the node kinds that can contribute to a binding module are modeled; everything else is
/// collapsed into [Clang::Other].
#[derive(Serialize, Deserialize, Debug)]
pub enum Clang {
    TranslationUnitDecl,
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1FunctionDecl.html
    FunctionDecl {
        loc: Option<clang_ast::SourceLocation>,
        range: Option<clang_ast::SourceRange>,
        name: String,
        #[serde(rename = "type")]
        qtype: QualType,
        /// Clang only writes this when it is true.
        variadic: Option<bool>,
        #[serde(rename = "isImplicit", default)]
        is_implicit: bool,
    },
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1ParmVarDecl.html
    ParmVarDecl {
        loc: Option<clang_ast::SourceLocation>,
        range: Option<clang_ast::SourceRange>,
        name: Option<String>,
        #[serde(rename = "type")]
        qtype: QualType,
    },
    /// A struct or union. Forward declarations have `complete_definition == false`.
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1RecordDecl.html
    RecordDecl {
        loc: Option<clang_ast::SourceLocation>,
        range: Option<clang_ast::SourceRange>,
        name: Option<String>,
        #[serde(rename = "tagUsed")]
        tag_used: Option<String>,
        #[serde(rename = "completeDefinition", default)]
        complete_definition: bool,
        #[serde(rename = "isImplicit", default)]
        is_implicit: bool,
    },
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1FieldDecl.html
    FieldDecl {
        loc: Option<clang_ast::SourceLocation>,
        range: Option<clang_ast::SourceRange>,
        name: Option<String>,
        #[serde(rename = "type")]
        qtype: QualType,
        #[serde(rename = "isImplicit", default)]
        is_implicit: bool,
    },
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1EnumDecl.html
    EnumDecl {
        loc: Option<clang_ast::SourceLocation>,
        range: Option<clang_ast::SourceRange>,
        name: Option<String>,
        /// Present when the enum declares its storage type (`enum E : unsigned char`).
        #[serde(rename = "fixedUnderlyingType")]
        fixed_underlying_type: Option<QualType>,
        #[serde(rename = "isImplicit", default)]
        is_implicit: bool,
    },
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1EnumConstantDecl.html
    EnumConstantDecl {
        loc: Option<clang_ast::SourceLocation>,
        range: Option<clang_ast::SourceRange>,
        name: String,
    },
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1TypedefDecl.html
    TypedefDecl {
        loc: Option<clang_ast::SourceLocation>,
        range: Option<clang_ast::SourceRange>,
        name: String,
        #[serde(rename = "type")]
        qtype: QualType,
        #[serde(rename = "isImplicit", default)]
        is_implicit: bool,
    },
    /// Clang Docs: https://clang.llvm.org/doxygen/classclang_1_1VarDecl.html
    VarDecl {
        loc: Option<clang_ast::SourceLocation>,
        range: Option<clang_ast::SourceRange>,
        name: String,
        #[serde(rename = "type")]
        qtype: QualType,
        #[serde(rename = "isImplicit", default)]
        is_implicit: bool,
    },
    /// A function body. Nothing below it is visible to a binding.
    CompoundStmt {
        range: Option<clang_ast::SourceRange>,
    },
    /// A constant-folded expression, e.g. an enumerator's initializer. `value` is clang's decimal
    /// rendering of the folded result.
    ConstantExpr {
        range: Option<clang_ast::SourceRange>,
        value: Option<String>,
    },
    IntegerLiteral {
        range: Option<clang_ast::SourceRange>,
        value: Option<String>,
    },
    /// Every other node (not relevant to binding generation). Its locations are still
    /// deserialized: clang omits a location's file when it matches the previous location written,
    /// so skipping any of them would attribute later nodes to the wrong file.
    Other {
        kind: Option<String>,
        loc: Option<clang_ast::SourceLocation>,
        range: Option<clang_ast::SourceRange>,
    },
}

impl Clang {
    /// Returns the source location of this AST node, if available.
    pub fn loc(&self) -> Option<&clang_ast::SourceLocation> {
        match self {
            Clang::FunctionDecl { loc, .. }
            | Clang::ParmVarDecl { loc, .. }
            | Clang::RecordDecl { loc, .. }
            | Clang::FieldDecl { loc, .. }
            | Clang::EnumDecl { loc, .. }
            | Clang::EnumConstantDecl { loc, .. }
            | Clang::TypedefDecl { loc, .. }
            | Clang::VarDecl { loc, .. }
            | Clang::Other { loc, .. } => loc.as_ref(),
            Clang::TranslationUnitDecl
            | Clang::CompoundStmt { .. }
            | Clang::ConstantExpr { .. }
            | Clang::IntegerLiteral { .. } => None,
        }
    }

    /// Returns the name of this declaration, if it has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Clang::FunctionDecl { name, .. }
            | Clang::EnumConstantDecl { name, .. }
            | Clang::TypedefDecl { name, .. }
            | Clang::VarDecl { name, .. } => Some(name.as_str()),
            Clang::ParmVarDecl { name, .. }
            | Clang::RecordDecl { name, .. }
            | Clang::FieldDecl { name, .. }
            | Clang::EnumDecl { name, .. } => name.as_deref(),
            _ => None,
        }
    }

    /// Whether clang synthesized this declaration rather than reading it from a source file
    /// (builtin typedefs such as `__builtin_va_list`, for example).
    pub fn is_implicit(&self) -> bool {
        match self {
            Clang::FunctionDecl { is_implicit, .. }
            | Clang::RecordDecl { is_implicit, .. }
            | Clang::FieldDecl { is_implicit, .. }
            | Clang::EnumDecl { is_implicit, .. }
            | Clang::TypedefDecl { is_implicit, .. }
            | Clang::VarDecl { is_implicit, .. } => *is_implicit,
            _ => false,
        }
    }

    /// Returns the numeric value carried by an expression node, if it has one. Wide enough for
    /// every C integer constant, signed or unsigned.
    pub fn value(&self) -> Option<i128> {
        match self {
            Clang::ConstantExpr { value, .. } | Clang::IntegerLiteral { value, .. } => {
                value.as_deref()?.trim().parse().ok()
            }
            _ => None,
        }
    }
}

/// Parses a clang JSON AST dump.
pub fn parse_ast(json: &[u8]) -> serde_json::Result<Node<Clang>> {
    serde_json::from_slice(json)
}
