use std::fmt::Write as _;

use crate::error::{Error, Malformed};

/// ANSI bold, used for markdown headings on a terminal.
const BOLD: &str = "\x1b[1m";
/// ANSI reset.
const RESET: &str = "\x1b[0m";

/// A caret line pointing at byte `position` of `input`, counted in characters.
fn caret_under(input: &str, position: usize) -> String {
    let column = input.char_indices().take_while(|&(offset, _)| return offset < position).count();
    return format!("{}^", " ".repeat(column));
}

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
    return;
}

/// Catalog could not be found at the configured path.
fn render_catalog_not_found(path: &std::path::Path) -> String {
    return format!(
        "\
# Error: Catalog Not Found

`{}` does not exist.

## Fix

Point `catalog` in `.docid.toml` at your catalog file, or pass it directly:

    docid --catalog path/to/catalog.toml check
",
        path.display()
    );
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is one,
/// how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::CatalogCorrupt { reason } => format!(
            "\
# Error: Catalog Corrupt

{reason}

## Fix

Signatures use ID type syntax: `System.Int32`, `` `0[] ``, `Demo.Box{{``0}}`.
"
        ),
        Error::CatalogInconsistency { member, reason } => format!(
            "\
# Error: Catalog Inconsistency

Cannot encode an ID for `{member}`: {reason}
"
        ),
        Error::CatalogNotFound { path } => render_catalog_not_found(path),
        Error::DuplicateType { name } => format!(
            "\
# Error: Duplicate Type

`{name}` is declared more than once in the catalog.
"
        ),
        Error::MalformedReference { input, position, reason } => render_malformed(input, *position, reason),
        Error::UnknownType { name } => format!(
            "\
# Error: Unknown Type

`{name}` is not in the catalog.

## Fix

List the known IDs:

    docid ids
"
        ),
        Error::Unresolved { reference } => format!(
            "\
# Error: Unresolved Reference

`{reference}` names nothing in the catalog, or more than one overload.

## Fix

Add a parameter list to pick one overload, e.g. `Widget.Parse(System.String)`.
"
        ),
        Error::Io(_) | Error::Json(_) | Error::TomlDe(_) => render_generic(e),
    };
}

/// Fallback block for wrapped library errors.
fn render_generic(e: &Error) -> String {
    return match e {
        Error::Io(inner) => format!("# Error: I/O\n\n{inner}\n"),
        Error::TomlDe(inner) => format!("# Error: Invalid TOML\n\n{inner}\n"),
        _ => format!("# Error\n\n{e}\n"),
    };
}

/// Malformed reference, with the input echoed and a caret at the offending offset.
fn render_malformed(input: &str, position: usize, reason: &Malformed) -> String {
    let mut out = format!(
        "\
# Error: Malformed Reference

{reason} at offset {position}:

    {input}
    {}
",
        caret_under(input, position)
    );

    if let Malformed::UnterminatedGroup { opener } = reason {
        let closer = if *opener == '(' { ')' } else { '}' };
        let _ = write!(out, "\n## Fix\n\nClose the `{opener}` with `{closer}`.\n");
    }
    return out;
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc, reason = "tests")]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn malformed_reference_points_at_offset() {
        let err = parse("Widget.Fill(System.Int32").unwrap_err();
        let md = render_error(&err);
        assert!(md.starts_with("# Error: Malformed Reference"), "{md}");
        assert!(md.contains("    Widget.Fill(System.Int32\n"), "{md}");
        assert!(md.contains(&format!("    {}^\n", " ".repeat(11))), "{md}");
        assert!(md.contains("Close the `(` with `)`"), "{md}");
    }

    #[test]
    fn caret_counts_characters() {
        assert_eq!(caret_under("ab", 0), "^");
        assert_eq!(caret_under("é$", 2), " ^");
    }

    #[test]
    fn unresolved_suggests_parameter_list() {
        let md = render_error(&Error::Unresolved { reference: "Demo.Widget.Parse".to_string() });
        assert!(md.contains("`Demo.Widget.Parse`"));
        assert!(md.contains("## Fix"));
    }
}
