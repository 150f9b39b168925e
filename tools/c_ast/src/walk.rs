//! Traversal of a declaration tree, and the filter that keeps only the declarations written in the
//! header being imported.

use crate::Clang;
use clang_ast::Node;
use std::path::{Path, PathBuf};

/// Lazy pre-order traversal of a declaration tree: each node is yielded before its children, and
/// children in source order. Function bodies are not entered.
///
/// Only the pending siblings along the current path are held, never the flattened tree.
pub struct Walk<'a> {
    stack: Vec<&'a Node<Clang>>,
}

/// Starts a new traversal at `root` (which is yielded first).
pub fn walk(root: &Node<Clang>) -> Walk<'_> {
    Walk { stack: vec![root] }
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Node<Clang>;

    fn next(&mut self) -> Option<&'a Node<Clang>> {
        let node = self.stack.pop()?;
        if !matches!(node.kind, Clang::CompoundStmt { .. }) {
            self.stack.extend(node.inner.iter().rev());
        }
        Some(node)
    }
}

/// Decides which nodes of a translation unit belong to the header under import, as opposed to
/// headers it includes or declarations clang synthesized.
#[derive(Debug, Clone)]
pub struct HeaderFilter {
    header: PathBuf,
}

impl HeaderFilter {
    pub fn new(header: &Path) -> HeaderFilter {
        HeaderFilter {
            header: resolve(header),
        }
    }

    /// Walks `root`, yielding only the non-implicit nodes located in the header.
    pub fn declarations<'a>(&self, root: &'a Node<Clang>) -> impl Iterator<Item = &'a Node<Clang>> {
        walk(root).filter(|node| !node.kind.is_implicit() && self.is_local(node))
    }

    /// Returns true if `node` was written in the header. The expansion location is consulted
    /// first, so a declaration produced by a macro counts as belonging to the file that expanded
    /// it.
    pub fn is_local(&self, node: &Node<Clang>) -> bool {
        let Some(loc) = node.kind.loc() else {
            return false;
        };
        let Some(bare) = loc.expansion_loc.as_ref().or(loc.spelling_loc.as_ref()) else {
            return false;
        };
        self.located_in_header(
            Some(&*bare.file),
            bare.included_from.as_ref().map(|from| &*from.file),
        )
    }

    /// Locality rule for a node that has a position. `file` is where the node is written and
    /// `included_from` the file that included it; either may be unknown.
    ///
    /// A position with neither file recorded is assumed to be in the header. This is a heuristic:
    /// clang omits the file only when it is unchanged from the previous node, which is usually,
    /// but not always, the header itself.
    pub fn located_in_header(&self, file: Option<&str>, included_from: Option<&str>) -> bool {
        match (file.filter(|f| !f.is_empty()), included_from) {
            (Some(file), _) => self.is_header(file),
            (None, Some(from)) if !from.is_empty() => self.is_header(from),
            _ => true,
        }
    }

    fn is_header(&self, file: &str) -> bool {
        resolve(Path::new(file)) == self.header
    }
}

/// Resolves `path` to an absolute path, following symlinks when the file exists.
fn resolve(path: &Path) -> PathBuf {
    path.canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_ast;

    fn names<'a>(nodes: impl Iterator<Item = &'a Node<Clang>>) -> Vec<&'a str> {
        nodes.filter_map(|n| n.kind.name()).collect()
    }

    #[test]
    fn pre_order_skips_bodies() {
        let ast = parse_ast(
            br#"{"id": "0x1", "kind": "TranslationUnitDecl", "inner": [
                {"id": "0x2", "kind": "RecordDecl", "name": "outer", "tagUsed": "struct", "inner": [
                    {"id": "0x3", "kind": "RecordDecl", "name": "inner", "tagUsed": "struct"},
                    {"id": "0x4", "kind": "FieldDecl", "name": "a", "type": {"qualType": "int"}}
                ]},
                {"id": "0x5", "kind": "FunctionDecl", "name": "f", "type": {"qualType": "int (int)"}, "inner": [
                    {"id": "0x6", "kind": "ParmVarDecl", "name": "x", "type": {"qualType": "int"}},
                    {"id": "0x7", "kind": "CompoundStmt", "inner": [
                        {"id": "0x8", "kind": "DeclStmt", "inner": [
                            {"id": "0x9", "kind": "VarDecl", "name": "local", "type": {"qualType": "int"}}
                        ]}
                    ]}
                ]},
                {"id": "0xa", "kind": "VarDecl", "name": "g", "type": {"qualType": "int"}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(names(walk(&ast)), ["outer", "inner", "a", "f", "x", "g"]);
        assert_eq!(walk(&ast).count(), 8);
        // Restartable: a second walk sees the same sequence.
        assert_eq!(names(walk(&ast)), names(walk(&ast)));
    }

    #[test]
    fn locality() {
        let dir = cimport_core::test_util::tempdir().unwrap();
        let header = dir.path().join("lib.h");
        std::fs::write(&header, "int f(void);\n").unwrap();
        let filter = HeaderFilter::new(&header);
        let header_str = header.to_str().unwrap();

        assert!(filter.located_in_header(Some(header_str), None));
        // Different spellings of the same file are the same file.
        let dotted = dir.path().join(".").join("lib.h");
        assert!(filter.located_in_header(dotted.to_str(), None));
        assert!(!filter.located_in_header(Some("/usr/include/stdio.h"), Some(header_str)));
        assert!(filter.located_in_header(None, Some(header_str)));
        assert!(!filter.located_in_header(Some(""), Some("/usr/include/stdlib.h")));
        assert!(filter.located_in_header(None, None));
    }

    #[test]
    fn declarations_filters_implicit_and_foreign_nodes() {
        let dir = cimport_core::test_util::tempdir().unwrap();
        let header = dir.path().join("lib.h");
        std::fs::write(&header, "int f(void);\n").unwrap();
        let json = format!(
            r#"{{"id": "0x1", "kind": "TranslationUnitDecl", "loc": {{}}, "inner": [
                {{"id": "0x2", "kind": "TypedefDecl", "loc": {{}}, "isImplicit": true,
                  "name": "__int128_t", "type": {{"qualType": "__int128"}}}},
                {{"id": "0x3", "kind": "FunctionDecl", "name": "puts",
                  "loc": {{"offset": 10, "file": "/usr/include/stdio.h", "line": 3, "col": 5, "tokLen": 4,
                          "includedFrom": {{"file": "{h}"}}}},
                  "type": {{"qualType": "int (const char *)"}}}},
                {{"id": "0x4", "kind": "FunctionDecl", "name": "f",
                  "loc": {{"offset": 4, "file": "{h}", "line": 1, "col": 5, "tokLen": 1}},
                  "type": {{"qualType": "int (void)"}}}}
            ]}}"#,
            h = header.display()
        );
        let ast = parse_ast(json.as_bytes()).unwrap();
        assert_eq!(names(filter_decls(&header, &ast).into_iter()), ["f"]);
    }

    #[test]
    fn omitted_files_follow_every_recorded_location() {
        const HDR: &str = "/test/include/lib.h";
        // Clang writes a location's file only when it differs from the previous location
        // written, including those on ranges and on node kinds that are not modeled.
        let json = r#"{"id": "0x1", "kind": "TranslationUnitDecl", "inner": [
            {"id": "0x2", "kind": "FunctionDecl", "name": "puts",
              "loc": {"offset": 10, "file": "/usr/include/stdio.h", "line": 3, "col": 5, "tokLen": 4,
                      "includedFrom": {"file": "HDR"}},
              "range": {"begin": {"offset": 6, "col": 1, "tokLen": 3}, "end": {"offset": 30, "col": 25, "tokLen": 1}},
              "type": {"qualType": "int (const char *)"}},
            {"id": "0x3", "kind": "StaticAssertDecl",
              "loc": {"offset": 20, "file": "HDR", "line": 2, "col": 1, "tokLen": 14},
              "range": {"begin": {"offset": 20, "col": 1, "tokLen": 14}, "end": {"offset": 50, "col": 31, "tokLen": 1}}},
            {"id": "0x4", "kind": "FunctionDecl", "name": "add",
              "loc": {"offset": 60, "line": 3, "col": 5, "tokLen": 3},
              "range": {"begin": {"offset": 56, "col": 1, "tokLen": 3}, "end": {"offset": 75, "col": 20, "tokLen": 1}},
              "type": {"qualType": "int (int, int)"}},
            {"id": "0x5", "kind": "VarDecl", "name": "pi",
              "loc": {"offset": 90, "line": 4, "col": 15, "tokLen": 2},
              "range": {"begin": {"offset": 76, "col": 1, "tokLen": 6},
                        "end": {"offset": 12, "file": "/usr/include/math.h", "line": 7, "col": 20, "tokLen": 4,
                                "includedFrom": {"file": "HDR"}}},
              "type": {"qualType": "const double"}},
            {"id": "0x6", "kind": "FunctionDecl", "name": "sqrt",
              "loc": {"offset": 40, "line": 9, "col": 8, "tokLen": 4},
              "type": {"qualType": "double (double)"}}
        ]}"#
        .replace("HDR", HDR);
        let ast = parse_ast(json.as_bytes()).unwrap();
        assert_eq!(
            names(HeaderFilter::new(Path::new(HDR)).declarations(&ast)),
            ["add", "pi"]
        );
    }

    #[test]
    fn expansion_location_decides_for_macro_declarations() {
        const HDR: &str = "/test/include/lib.h";
        let json = r#"{"id": "0x1", "kind": "TranslationUnitDecl", "inner": [
            {"id": "0x2", "kind": "TypedefDecl", "name": "from_macro",
              "loc": {"spellingLoc": {"offset": 5, "file": "/usr/include/sys/cdefs.h", "line": 9, "col": 3,
                                      "tokLen": 4, "includedFrom": {"file": "HDR"}},
                      "expansionLoc": {"offset": 40, "file": "HDR", "line": 3, "col": 1, "tokLen": 10}},
              "type": {"qualType": "int"}},
            {"id": "0x3", "kind": "TypedefDecl", "name": "from_system_macro",
              "loc": {"spellingLoc": {"offset": 60, "file": "HDR", "line": 5, "col": 9, "tokLen": 4},
                      "expansionLoc": {"offset": 80, "file": "/usr/include/stdio.h", "line": 12, "col": 1,
                                       "tokLen": 7, "includedFrom": {"file": "HDR"}}},
              "type": {"qualType": "int"}}
        ]}"#
        .replace("HDR", HDR);
        let ast = parse_ast(json.as_bytes()).unwrap();
        let filter = HeaderFilter::new(Path::new(HDR));
        assert!(filter.is_local(&ast.inner[0]));
        assert!(!filter.is_local(&ast.inner[1]));
    }

    fn filter_decls<'a>(header: &Path, ast: &'a Node<Clang>) -> Vec<&'a Node<Clang>> {
        HeaderFilter::new(header).declarations(ast).collect()
    }
}
