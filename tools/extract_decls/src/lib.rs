//! Extraction of the declarations a binding module needs from a header's declaration tree.
//!
//! [extract] walks the nodes that belong to the header and sorts them into six categories
//! (functions, structs, unions, enums, typedefs and globals), mapping every C type it meets
//! through [map_type].

mod decls;
mod extract;
mod type_map;

pub use decls::{
    Declarations, EnumConst, EnumDecl, Field, FunctionDecl, GlobalDecl, Param, RecordDecl,
    TypedefDecl,
};
pub use extract::{ExtractError, extract};
pub use type_map::{ForeignType, map_type};
