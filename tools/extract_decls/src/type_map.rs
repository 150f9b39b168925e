//! Mapping from C type spellings (as clang prints them) to the binding language's type tokens.

use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// A type in the binding language. Rendered through `Display` as its token, e.g. `c.i32` or
/// `c.ptr<c.f64>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ForeignType {
    Void,
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
    /// Pointer-sized unsigned integer (`size_t`).
    Usize,
    /// Pointer-sized signed integer (`ssize_t`, `ptrdiff_t`).
    Isize,
    /// `char *`
    CString,
    /// `const char *`
    ConstCString,
    Ptr(Box<ForeignType>),
    /// A type this mapper does not know, passed through verbatim. Usually a typedef or tag
    /// declared elsewhere.
    Named(String),
}

impl ForeignType {
    /// Returns the unrecognized type name at the bottom of this type, if any (`Foo` for both
    /// `Foo` and `Foo **`).
    pub fn opaque_name(&self) -> Option<&str> {
        match self {
            ForeignType::Named(name) => Some(name.as_str()),
            ForeignType::Ptr(base) => base.opaque_name(),
            _ => None,
        }
    }
}

impl fmt::Display for ForeignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ForeignType::*;
        let token = match self {
            Void => "c.void",
            Bool => "c.bool",
            I8 => "c.i8",
            U8 => "c.u8",
            I16 => "c.i16",
            U16 => "c.u16",
            I32 => "c.i32",
            U32 => "c.u32",
            I64 => "c.i64",
            U64 => "c.u64",
            F32 => "c.f32",
            F64 => "c.f64",
            Usize => "c.usize",
            Isize => "c.isize",
            CString => "c.cstring",
            ConstCString => "c.const_cstring",
            Ptr(base) => return write!(f, "c.ptr<{base}>"),
            Named(name) => name.as_str(),
        };
        f.write_str(token)
    }
}

impl Serialize for ForeignType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

static QUALIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:const|volatile|restrict|__restrict)\b").unwrap());
static TRAILING_QUALIFIERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\s*\b(?:const|volatile|restrict|__restrict)\b)+\s*$").unwrap()
});
static ARRAY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.*?)\s*\[[^\[\]]*\]$").unwrap());

/// Maps a C type spelling to its binding type. Never fails: anything unrecognized comes back as
/// [ForeignType::Named] with the (unqualified) spelling unchanged.
///
/// Arrays decay to pointers and lose their length. `long` is 64 bits wide.
pub fn map_type(spelling: &str) -> ForeignType {
    let spelling = spelling.trim();
    if let Some(caps) = ARRAY.captures(spelling) {
        return ForeignType::Ptr(Box::new(map_type(&caps[1])));
    }

    // Qualifiers on the pointer itself (`char *const`) do not change its type.
    let pointer = TRAILING_QUALIFIERS.replace(spelling, "");
    if let Some(pointee) = pointer.strip_suffix('*') {
        if strip_qualifiers(pointee).eq_ignore_ascii_case("char") {
            let is_const = QUALIFIER.find_iter(pointee).any(|q| q.as_str() == "const");
            return if is_const {
                ForeignType::ConstCString
            } else {
                ForeignType::CString
            };
        }
        return ForeignType::Ptr(Box::new(map_type(pointee)));
    }

    let base = strip_qualifiers(spelling);
    builtin(&base.to_ascii_lowercase())
        .or_else(|| tag_name(&base).map(|tag| ForeignType::Named(tag.into())))
        .unwrap_or(ForeignType::Named(base))
}

/// Removes `const`/`volatile`/`restrict` and normalizes whitespace.
fn strip_qualifiers(spelling: &str) -> String {
    QUALIFIER
        .replace_all(spelling, "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Looks up a lowercased, unqualified spelling among the builtin and standard library types.
fn builtin(base: &str) -> Option<ForeignType> {
    use ForeignType::*;
    Some(match base {
        "void" => Void,
        "_bool" | "bool" => Bool,
        "float" => F32,
        "double" => F64,
        "size_t" | "uintptr_t" => Usize,
        "ssize_t" | "ptrdiff_t" | "intptr_t" => Isize,
        "int8_t" => I8,
        "uint8_t" => U8,
        "int16_t" => I16,
        "uint16_t" => U16,
        "int32_t" => I32,
        "uint32_t" => U32,
        "int64_t" => I64,
        "uint64_t" => U64,
        _ => return integer(base),
    })
}

/// Classifies any combination of the integer keywords (`long unsigned int`, `signed char`,
/// `short`, ...).
fn integer(base: &str) -> Option<ForeignType> {
    use ForeignType::*;
    let (mut unsigned, mut longs, mut short, mut is_char, mut has_int) =
        (false, 0, false, false, false);
    for word in base.split(' ') {
        match word {
            "unsigned" => unsigned = true,
            "signed" => {}
            "long" => longs += 1,
            "short" => short = true,
            "char" => is_char = true,
            "int" => has_int = true,
            _ => return None,
        }
    }
    let (signed, unsigned_type) = match (is_char, short, longs) {
        (true, false, 0) if !has_int => (I8, U8),
        (false, true, 0) => (I16, U16),
        (false, false, 0) => (I32, U32),
        (false, false, 1 | 2) => (I64, U64),
        _ => return None,
    };
    Some(if unsigned { unsigned_type } else { signed })
}

/// Returns `X` for `struct X`, `union X` and `enum X`.
fn tag_name(base: &str) -> Option<&str> {
    let (keyword, tag) = base.split_once(' ')?;
    ["struct", "union", "enum"]
        .iter()
        .any(|k| keyword.eq_ignore_ascii_case(k))
        .then_some(tag)
}
