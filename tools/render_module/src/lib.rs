//! Renders extracted declarations as a foreign module in the binding language.
//!
//! The output is a pure function of its inputs: the same header, links and declarations always
//! render to the same bytes.

use cimport_core::Representation;
use extract_decls::{Declarations, RecordDecl};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use tracing::debug;

/// What goes on the module's first lines.
#[derive(Debug, Clone, Copy)]
pub struct ModuleHeader<'a> {
    pub name: &'a str,
    /// Native libraries to link, in order. The link clause is omitted when empty.
    pub links: &'a [String],
    /// The imported header, recorded in a comment banner. No banner is written when `None`.
    pub source: Option<&'a Path>,
}

/// Renders the whole module: header line, then structs, unions, enums, typedefs, globals and
/// functions, each category in the order given.
pub fn render_module(header: &ModuleHeader, decls: &Declarations) -> String {
    let mut lines = vec![];
    if let Some(source) = header.source {
        lines.push("# Auto-generated by c-import".to_string());
        lines.push(format!("# Source: {}", source.display()));
    }

    let mut module_line = format!("foreign module {}", header.name);
    if !header.links.is_empty() {
        let links: Vec<_> = header.links.iter().map(|l| quote(l)).collect();
        module_line += &format!(" links {}", links.join(", "));
    }
    module_line.push(':');
    lines.push(module_line);

    for record in decls.structs.iter().chain(&decls.unions) {
        render_record(&mut lines, record);
    }
    for decl in &decls.enums {
        lines.push(format!(
            "  foreign enum {} layout {}:",
            decl.name, decl.underlying
        ));
        for constant in &decl.values {
            lines.push(format!("    const {} = {}", constant.name, constant.value));
        }
        lines.push(String::new());
    }
    for typedef in &decls.typedefs {
        lines.push(format!("  foreign alias {} = {}", typedef.name, typedef.target));
    }
    for global in &decls.globals {
        lines.push(format!("  foreign global {}: {}", global.name, global.ty));
    }
    for function in &decls.functions {
        let params: Vec<_> = function
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect();
        lines.push(format!(
            "  foreign define {}({}) -> {}",
            function.name,
            params.join(", "),
            function.return_type
        ));
    }

    let mut text = lines
        .iter()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string();
    text.push('\n');
    text
}

/// Quotes a string literal, escaping `\` and `"`.
fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

fn render_record(lines: &mut Vec<String>, record: &RecordDecl) {
    let layout = if record.is_union { "c union" } else { "c" };
    lines.push(format!("  foreign type {} layout {layout}:", record.name));
    for field in &record.fields {
        lines.push(format!("    field {}: {}", field.name, field.ty));
    }
    lines.push(String::new());
}

/// A rendered binding module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingModule {
    pub name: String,
    pub text: String,
}

impl BindingModule {
    pub fn render(header: &ModuleHeader, decls: &Declarations) -> BindingModule {
        BindingModule {
            name: header.name.into(),
            text: render_module(header, decls),
        }
    }
}

impl std::fmt::Display for BindingModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl Representation for BindingModule {
    fn name(&self) -> &'static str {
        "binding_module"
    }

    /// Writes the module to `path`, creating missing parent directories. The text is written to a
    /// temporary file next to `path` and renamed over it, so `path` is never left half-written.
    fn materialize(&self, path: &Path) -> io::Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;
        let mut file = tempfile::NamedTempFile::new_in(&dir)?;
        file.write_all(self.text.as_bytes())?;
        file.as_file().sync_all()?;
        debug!("Persisting {} to {}", file.path().display(), path.display());
        file.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extract_decls::{
        EnumConst, EnumDecl, Field, ForeignType, FunctionDecl, GlobalDecl, Param, TypedefDecl,
    };

    fn simple_math() -> Declarations {
        Declarations {
            functions: vec![
                FunctionDecl {
                    name: "add".into(),
                    return_type: ForeignType::I32,
                    params: vec![
                        Param {
                            name: "a".into(),
                            ty: ForeignType::I32,
                        },
                        Param {
                            name: "b".into(),
                            ty: ForeignType::I32,
                        },
                    ],
                    variadic: false,
                },
                FunctionDecl {
                    name: "tick".into(),
                    return_type: ForeignType::Void,
                    params: vec![],
                    variadic: false,
                },
            ],
            structs: vec![RecordDecl {
                name: "point".into(),
                fields: vec![
                    Field {
                        name: "x".into(),
                        ty: ForeignType::F64,
                    },
                    Field {
                        name: "y".into(),
                        ty: ForeignType::F64,
                    },
                ],
                is_union: false,
            }],
            unions: vec![RecordDecl {
                name: "value_box".into(),
                fields: vec![Field {
                    name: "i".into(),
                    ty: ForeignType::I32,
                }],
                is_union: true,
            }],
            enums: vec![EnumDecl {
                name: "Color".into(),
                underlying: ForeignType::I32,
                values: vec![
                    EnumConst {
                        name: "RED".into(),
                        value: 0,
                    },
                    EnumConst {
                        name: "GREEN".into(),
                        value: 5,
                    },
                    EnumConst {
                        name: "BLUE".into(),
                        value: 6,
                    },
                ],
            }],
            typedefs: vec![TypedefDecl {
                name: "u64_t".into(),
                target: ForeignType::U64,
            }],
            globals: vec![GlobalDecl {
                name: "consts".into(),
                ty: ForeignType::Ptr(Box::new(ForeignType::F32)),
            }],
        }
    }

    #[test]
    fn full_module() {
        let links = ["m".to_string(), "simple_math".to_string()];
        let header = ModuleHeader {
            name: "simple_math",
            links: &links,
            source: Some(Path::new("include/simple_math.h")),
        };
        assert_eq!(
            render_module(&header, &simple_math()),
            "\
# Auto-generated by c-import
# Source: include/simple_math.h
foreign module simple_math links \"m\", \"simple_math\":
  foreign type point layout c:
    field x: c.f64
    field y: c.f64

  foreign type value_box layout c union:
    field i: c.i32

  foreign enum Color layout c.i32:
    const RED = 0
    const GREEN = 5
    const BLUE = 6

  foreign alias u64_t = c.u64
  foreign global consts: c.ptr<c.f32>
  foreign define add(a: c.i32, b: c.i32) -> c.i32
  foreign define tick() -> c.void
"
        );
    }

    #[test]
    fn empty_module_has_single_trailing_newline() {
        let header = ModuleHeader {
            name: "empty",
            links: &[],
            source: None,
        };
        assert_eq!(
            render_module(&header, &Declarations::default()),
            "foreign module empty:\n"
        );
    }

    #[test]
    fn trailing_blank_block_line_is_trimmed() {
        let header = ModuleHeader {
            name: "shapes",
            links: &[],
            source: None,
        };
        let decls = Declarations {
            structs: simple_math().structs,
            ..Default::default()
        };
        let text = render_module(&header, &decls);
        assert!(text.ends_with("    field y: c.f64\n"), "{text:?}");
        assert!(text.lines().all(|line| line == line.trim_end()));
    }

    #[test]
    fn link_names_are_escaped() {
        let links = [r#"odd"name"#.to_string(), r"dir\lib".to_string()];
        let header = ModuleHeader {
            name: "odd",
            links: &links,
            source: None,
        };
        assert_eq!(
            render_module(&header, &Declarations::default()),
            "foreign module odd links \"odd\\\"name\", \"dir\\\\lib\":\n"
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        let header = ModuleHeader {
            name: "simple_math",
            links: &[],
            source: None,
        };
        let first = BindingModule::render(&header, &simple_math());
        let second = BindingModule::render(&header, &simple_math());
        assert_eq!(first.text.as_bytes(), second.text.as_bytes());
    }

    #[test]
    fn materialize_replaces_existing_file() {
        let dir = cimport_core::test_util::tempdir().unwrap();
        let path = dir.path().join("bindings").join("simple_math.astra");
        let header = ModuleHeader {
            name: "simple_math",
            links: &[],
            source: None,
        };
        let module = BindingModule::render(&header, &simple_math());
        module.materialize(&path).unwrap();
        std::fs::write(&path, "stale").unwrap();
        module.materialize(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), module.text);
        // Nothing but the module is left behind in the directory.
        assert_eq!(std::fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }
}
