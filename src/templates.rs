//! Project scaffolding for `forge init`.
//!
//! The default template is a two-library project: `<name>_core` and
//! `<name>_gui`, where the GUI library depends on the core one. Each library
//! exports its symbols through a `<NAME>_EXPORT` macro keyed on the
//! `<NAME>_LIBRARY` define that forge sets while compiling it.

use crate::config::{MANIFEST_FILE, export_macro};
use std::path::PathBuf;

/// Files to write, relative to the project root.
pub fn project_template(name: &str) -> Vec<(PathBuf, String)> {
    let core = format!("{}_core", name);
    let gui = format!("{}_gui", name);

    let manifest = format!(
        r#"[project]
name = "{name}"
version = "0.1.0"
standard = "c++11"

[install]
prefix = "install"

[[library]]
name = "{core}"

[[library]]
name = "{gui}"
depends = ["{core}"]
"#
    );

    let mut files = vec![
        (PathBuf::from(MANIFEST_FILE), manifest),
        (PathBuf::from(".gitignore"), ".forge/\ninstall/\n".to_string()),
    ];
    files.extend(library_files(&core, None));
    files.extend(library_files(&gui, Some(&core)));
    files
}

fn export_name(lib: &str) -> String {
    format!("{}_EXPORT", lib.to_uppercase())
}

fn library_files(lib: &str, dependency: Option<&str>) -> Vec<(PathBuf, String)> {
    let guard = format!("{}_H", lib.to_uppercase());
    let export = export_name(lib);
    let define = export_macro(lib);

    let include_dep = dependency
        .map(|dep| format!("#include \"{}.h\"\n", dep))
        .unwrap_or_default();

    let header = format!(
        r#"#ifndef {guard}
#define {guard}

{include_dep}#if defined(_WIN32)
#  if defined({define})
#    define {export} __declspec(dllexport)
#  else
#    define {export} __declspec(dllimport)
#  endif
#else
#  define {export} __attribute__((visibility("default")))
#endif

class {export} {class} {{
public:
    {class}();
    int value() const;

private:
    int m_value;
}};

#endif
"#,
        class = class_name(lib)
    );

    let ctor_body = match dependency {
        Some(dep) => format!("m_value({}().value() + 1)", class_name(dep)),
        None => "m_value(1)".to_string(),
    };
    let source = format!(
        r#"#include "{lib}.h"

{class}::{class}() : {ctor_body} {{}}

int {class}::value() const {{
    return m_value;
}}
"#,
        class = class_name(lib)
    );

    vec![
        (PathBuf::from(lib).join(format!("{}.h", lib)), header),
        (PathBuf::from(lib).join(format!("{}.cpp", lib)), source),
    ]
}

/// `moqt_core` -> `MoqtCore`
fn class_name(lib: &str) -> String {
    lib.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
