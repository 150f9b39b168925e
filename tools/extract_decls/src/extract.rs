use crate::decls::sort_by_name;
use crate::{
    Declarations, EnumConst, EnumDecl, Field, ForeignType, FunctionDecl, GlobalDecl, Param,
    RecordDecl, TypedefDecl, map_type,
};
use c_ast::{Clang, HeaderFilter, QualType, walk};
use clang_ast::Node;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The header declares something a binding module cannot express.
    #[error("{construct} `{name}` cannot be represented in a binding module")]
    UnsupportedConstruct {
        construct: &'static str,
        name: String,
    },
}

/// Extracts every declaration written in the filter's header from the tree rooted at `root`.
///
/// Fails if the header declares a variadic function; no partial result is returned in that case.
pub fn extract(filter: &HeaderFilter, root: &Node<Clang>) -> Result<Declarations, ExtractError> {
    let mut functions = vec![];
    let mut structs = vec![];
    let mut unions = vec![];
    let mut enums = vec![];
    let mut typedefs = vec![];
    let mut globals = vec![];

    for node in filter.declarations(root) {
        match &node.kind {
            Clang::FunctionDecl {
                name,
                qtype,
                variadic,
                ..
            } => functions.push(function(node, name, qtype, *variadic)),
            Clang::RecordDecl {
                name: Some(name),
                tag_used,
                complete_definition: true,
                ..
            } if !name.is_empty() => {
                let record = record(node, name, tag_used.as_deref() == Some("union"));
                if record.is_union {
                    unions.push(record);
                } else {
                    structs.push(record);
                }
            }
            Clang::RecordDecl { .. } => debug!(
                "Skipping anonymous or forward-declared record {:?}",
                node.kind.name()
            ),
            Clang::EnumDecl {
                name: Some(name),
                fixed_underlying_type,
                ..
            } if !name.is_empty() => enums.push(enumeration(
                node,
                name,
                fixed_underlying_type.as_ref(),
            )),
            Clang::EnumDecl { .. } => debug!("Skipping anonymous enum {:?}", node.kind.name()),
            Clang::TypedefDecl { name, qtype, .. } => typedefs.push(TypedefDecl {
                name: name.clone(),
                target: map(qtype.desugared_qual_type.as_ref().unwrap_or(&qtype.qual_type)),
            }),
            Clang::VarDecl { name, qtype, .. } => globals.push(GlobalDecl {
                name: name.clone(),
                ty: map(&qtype.qual_type),
            }),
            _ => {}
        }
    }

    let declarations = Declarations {
        functions: sort_by_name(functions),
        structs: sort_by_name(structs),
        unions: sort_by_name(unions),
        enums: sort_by_name(enums),
        typedefs: sort_by_name(typedefs),
        globals: sort_by_name(globals),
    };
    if let Some(function) = declarations.functions.iter().find(|f| f.variadic) {
        return Err(ExtractError::UnsupportedConstruct {
            construct: "variadic function",
            name: function.name.clone(),
        });
    }
    info!("Extracted {declarations}");
    Ok(declarations)
}

/// Maps a spelling, noting types that will be passed through unresolved.
fn map(spelling: &str) -> ForeignType {
    let ty = map_type(spelling);
    if let Some(name) = ty.opaque_name() {
        debug!("Passing through unrecognized type {name:?}");
    }
    ty
}

fn function(
    node: &Node<Clang>,
    name: &str,
    qtype: &QualType,
    variadic: Option<bool>,
) -> FunctionDecl {
    // A function declared through a typedef'd function type (`handler_fn on_event;`) is only
    // spelled out in full in the desugared type.
    let spelling: &str = match &qtype.desugared_qual_type {
        Some(desugared) if !qtype.qual_type.contains('(') => desugared,
        _ => &qtype.qual_type,
    };
    let (return_type, params_spelling) =
        split_function_type(spelling).unwrap_or_else(|| (spelling.to_string(), ""));
    let params = node
        .inner
        .iter()
        .filter_map(|child| match &child.kind {
            Clang::ParmVarDecl { name, qtype, .. } => Some((name.as_deref(), qtype)),
            _ => None,
        })
        .enumerate()
        .map(|(i, (param, qtype))| Param {
            name: non_empty(param).unwrap_or_else(|| format!("param{}", i + 1)),
            ty: map(&qtype.qual_type),
        })
        .collect();
    FunctionDecl {
        name: name.into(),
        return_type: map(&return_type),
        params,
        variadic: variadic.unwrap_or_else(|| params_spelling.ends_with("...)")),
    }
}

/// Splits a function type spelling into its return type and its own parameter list, parentheses
/// included. `int (*(void))(const char *, ...)` (no arguments, returning a pointer to a variadic
/// function) splits into `int (*)(const char *, ...)` and `(void)`.
fn split_function_type(spelling: &str) -> Option<(String, &str)> {
    let spelling = spelling.trim_end();
    let open = matching_open(spelling)?;
    let (head, params) = spelling.split_at(open);
    // A parenthesized declarator in front means `params` belongs to the returned function type,
    // and the function's own list is inside the declarator.
    if let Some(inner) = matching_open(head.trim_end()) {
        let declarator = &head.trim_end()[inner + 1..head.trim_end().len() - 1];
        if let Some((inner_return, own_params)) = split_function_type(declarator) {
            return Some((format!("{}({inner_return}){params}", &head[..inner]), own_params));
        }
    }
    Some((head.trim_end().to_string(), params))
}

/// Returns the index of the `(` matching the `)` that ends `spelling`.
fn matching_open(spelling: &str) -> Option<usize> {
    if !spelling.ends_with(')') {
        return None;
    }
    let mut depth = 0;
    for (i, c) in spelling.char_indices().rev() {
        match c {
            ')' => depth += 1,
            '(' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn record(node: &Node<Clang>, name: &str, is_union: bool) -> RecordDecl {
    let fields = node
        .inner
        .iter()
        .filter_map(|child| match &child.kind {
            Clang::FieldDecl { name, qtype, .. } => Some((name.as_deref(), qtype)),
            _ => None,
        })
        .enumerate()
        .map(|(i, (field, qtype))| Field {
            name: non_empty(field).unwrap_or_else(|| format!("field{}", i + 1)),
            ty: map(&qtype.qual_type),
        })
        .collect();
    RecordDecl {
        name: name.into(),
        fields,
        is_union,
    }
}

/// Builds an enum, resolving each enumerator's value the way C does: an explicit initializer
/// sets the value, otherwise it is one more than the previous enumerator (0 for the first).
fn enumeration(node: &Node<Clang>, name: &str, fixed: Option<&QualType>) -> EnumDecl {
    let mut counter: i128 = -1;
    let values = node
        .inner
        .iter()
        .filter_map(|child| match &child.kind {
            Clang::EnumConstantDecl { name, .. } => Some((name, child)),
            _ => None,
        })
        .map(|(constant, child)| {
            counter = initializer(child).unwrap_or(counter + 1);
            EnumConst {
                name: constant.clone(),
                value: counter,
            }
        })
        .collect();
    EnumDecl {
        name: name.into(),
        underlying: fixed.map_or(ForeignType::I32, |ty| {
            map(ty.desugared_qual_type.as_ref().unwrap_or(&ty.qual_type))
        }),
        values,
    }
}

/// The value of an enumerator's explicit initializer: the first expression below it carrying a
/// numeric value (clang wraps initializers in a `ConstantExpr` holding the folded result).
fn initializer(enumerator: &Node<Clang>) -> Option<i128> {
    enumerator
        .inner
        .iter()
        .flat_map(walk)
        .find_map(|node| node.kind.value())
}

fn non_empty(name: Option<&str>) -> Option<String> {
    name.filter(|n| !n.is_empty()).map(Into::into)
}
