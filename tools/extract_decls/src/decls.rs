//! The declarations a binding module is made of. Built once by [crate::extract], then only read.

use crate::ForeignType;
use cimport_core::Representation;
use serde::Serialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ForeignType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDecl {
    pub name: String,
    pub return_type: ForeignType,
    pub params: Vec<Param>,
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ForeignType,
}

/// A struct or union definition. Fields are in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordDecl {
    pub name: String,
    pub fields: Vec<Field>,
    pub is_union: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumConst {
    pub name: String,
    /// Wide enough for both `long long` and `unsigned long long` enumerators.
    pub value: i128,
}

/// An enum definition. Enumerators are in declaration order, with their values resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDecl {
    pub name: String,
    pub underlying: ForeignType,
    pub values: Vec<EnumConst>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypedefDecl {
    pub name: String,
    pub target: ForeignType,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ForeignType,
}

/// Everything extracted from one header, one list per category. Each list is sorted by name and
/// holds at most one declaration per name.
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct Declarations {
    pub functions: Vec<FunctionDecl>,
    pub structs: Vec<RecordDecl>,
    pub unions: Vec<RecordDecl>,
    pub enums: Vec<EnumDecl>,
    pub typedefs: Vec<TypedefDecl>,
    pub globals: Vec<GlobalDecl>,
}

impl fmt::Display for Declarations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} functions, {} structs, {} unions, {} enums, {} typedefs, {} globals",
            self.functions.len(),
            self.structs.len(),
            self.unions.len(),
            self.enums.len(),
            self.typedefs.len(),
            self.globals.len()
        )
    }
}

impl Representation for Declarations {
    fn name(&self) -> &'static str {
        "declarations"
    }

    fn materialize(&self, path: &Path) -> std::io::Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self).map_err(Into::into)
    }
}

/// Implemented by every top-level declaration so the lists can be ordered by name.
pub(crate) trait Named {
    fn name(&self) -> &str;
}

macro_rules! impl_named {
    ($($t:ty),*) => {
        $(impl Named for $t {
            fn name(&self) -> &str {
                &self.name
            }
        })*
    };
}

impl_named!(FunctionDecl, RecordDecl, EnumDecl, TypedefDecl, GlobalDecl);

/// Sorts `decls` by name. When a name occurs more than once the last occurrence is kept.
pub(crate) fn sort_by_name<T: Named>(mut decls: Vec<T>) -> Vec<T> {
    // Reversing first makes the stable sort put the last occurrence of each name first.
    decls.reverse();
    decls.sort_by(|a, b| a.name().cmp(b.name()));
    decls.dedup_by(|later, earlier| later.name() == earlier.name());
    decls
}
