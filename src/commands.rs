//! CLI command bodies for docid: parse, resolve, ids, members, check.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::encoder::Encoder;
use crate::error::Error;
use crate::hiding;
use crate::parser;
use crate::resolver::Resolver;
use crate::scanner::{self, CrefOccurrence};
use crate::types::{CanonicalId, ResolvedSymbol, TypeRef};

/// Outcome of checking one cref.
enum CheckResult {
    /// Grammar violation, with the rendered reason.
    Malformed(String),
    /// Names exactly one symbol.
    Resolved,
    /// Well-formed but names nothing, or is ambiguous.
    Unresolved,
}

/// Scan documentation sources, parse and resolve every cref.
/// Exit code priority: malformed (2) > unresolved (1) > clean (0).
///
/// # Errors
///
/// Returns errors from config loading, catalog loading, or scanning.
/// Individual bad references are reported, never propagated.
pub fn check(catalog_flag: Option<&Path>) -> Result<ExitCode, Error> {
    let root = PathBuf::from(".");
    let (config, catalog) = load_catalog(&root, catalog_flag)?;
    let resolver = Resolver::new(&catalog);
    let occurrences = scanner::scan(&root, &config)?;

    let mut malformed_count = 0_u32;
    let mut unresolved_count = 0_u32;
    for occurrence in &occurrences {
        match check_occurrence(&resolver, occurrence) {
            CheckResult::Malformed(reason) => {
                malformed_count = malformed_count.saturating_add(1);
                println!("MALFORMED   {}:{}  {}  ({reason})", occurrence.file.display(), occurrence.line, occurrence.text);
            },
            CheckResult::Resolved => {},
            CheckResult::Unresolved => {
                unresolved_count = unresolved_count.saturating_add(1);
                println!("UNRESOLVED  {}:{}  {}", occurrence.file.display(), occurrence.line, occurrence.text);
            },
        }
    }

    if malformed_count > 0 {
        println!();
        println!("{malformed_count} malformed, {unresolved_count} unresolved");
        return Ok(ExitCode::from(2));
    } else if unresolved_count > 0 {
        println!();
        println!("{unresolved_count} unresolved");
        return Ok(ExitCode::from(1));
    } else {
        let total = occurrences.len();
        println!("All {total} references resolve");
        return Ok(ExitCode::SUCCESS);
    }
}

/// Parse and resolve one occurrence. Never fails: problems are classified.
fn check_occurrence(resolver: &Resolver<'_, Catalog>, occurrence: &CrefOccurrence) -> CheckResult {
    let reference = match parser::parse(&occurrence.text) {
        Err(Error::MalformedReference { position, reason, .. }) => {
            return CheckResult::Malformed(format!("{reason} at offset {position}"));
        },
        Err(e) => return CheckResult::Malformed(e.to_string()),
        Ok(r) => r,
    };
    return match resolver.resolve_reference(&reference) {
        ResolvedSymbol::Member(_) | ResolvedSymbol::Type(_) => CheckResult::Resolved,
        ResolvedSymbol::Unresolved => CheckResult::Unresolved,
    };
}

/// Print the canonical ID of every type and member in the catalog, sorted.
///
/// # Errors
///
/// Returns errors from catalog loading, encoding, or JSON output.
pub fn ids(catalog_flag: Option<&Path>, json: bool) -> Result<(), Error> {
    let root = PathBuf::from(".");
    let (_config, catalog) = load_catalog(&root, catalog_flag)?;
    let encoder = Encoder::new(&catalog);

    let mut all: Vec<CanonicalId> = catalog.type_ids().map(|ty| return encoder.encode_type(ty)).collect::<Result<_, _>>()?;
    for member in catalog.member_ids() {
        all.push(encoder.encode_member(member)?);
    }
    all.sort();

    if json {
        println!("{}", serde_json::to_string_pretty(&all)?);
    } else {
        for id in &all {
            println!("{id}");
        }
    }
    return Ok(());
}

/// Load config and the catalog it points at; `catalog_flag` overrides the config.
///
/// # Errors
///
/// Returns errors from config or catalog loading.
fn load_catalog(root: &Path, catalog_flag: Option<&Path>) -> Result<(Config, Catalog), Error> {
    let mut config = Config::load(root)?;
    if let Some(path) = catalog_flag {
        config = config.with_catalog(path.to_path_buf());
    }
    let catalog = Catalog::load(&config.catalog_path(root))?;
    return Ok((config, catalog));
}

/// List the members a type exposes, inherited ones included, and which
/// inherited members are hidden by nearer declarations.
///
/// # Errors
///
/// Returns `Error::MalformedReference` or `Error::UnknownType` for a bad type
/// argument, plus errors from catalog loading and encoding.
pub fn members(catalog_flag: Option<&Path>, type_name: &str) -> Result<(), Error> {
    let root = PathBuf::from(".");
    let (_config, catalog) = load_catalog(&root, catalog_flag)?;

    let reference = parser::parse(type_name)?;
    let ty = match Resolver::new(&catalog).resolve_reference(&reference) {
        ResolvedSymbol::Type(TypeRef::Named(id)) => id,
        ResolvedSymbol::Type(TypeRef::Generic { definition, .. }) => definition,
        ResolvedSymbol::Member(_) | ResolvedSymbol::Type(_) | ResolvedSymbol::Unresolved => {
            return Err(Error::UnknownType { name: type_name.to_string() });
        },
    };

    let encoder = Encoder::new(&catalog);
    let set = hiding::merge_inherited_members(&catalog, ty)?;
    println!("{}", encoder.encode_type(ty)?);
    for member in &set.visible {
        println!("  {}", encoder.encode_member(*member)?);
    }
    for hidden in &set.hidden {
        println!("  HIDDEN  {}  by {}", encoder.encode_member(hidden.hidden)?, encoder.encode_member(hidden.hidden_by)?);
    }
    return Ok(());
}

/// Parse a reference and print its AST.
///
/// # Errors
///
/// Returns `Error::MalformedReference` if the reference is invalid, or
/// `Error::Json` if JSON output fails.
pub fn parse(reference: &str, json: bool) -> Result<(), Error> {
    let parsed = parser::parse(reference)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
    } else {
        println!("{parsed:#?}");
    }
    return Ok(());
}

/// Resolve a reference against the catalog and print its canonical ID.
///
/// # Errors
///
/// Returns `Error::MalformedReference`, `Error::Unresolved`, or errors from
/// catalog loading and encoding.
pub fn resolve(catalog_flag: Option<&Path>, reference: &str) -> Result<(), Error> {
    let root = PathBuf::from(".");
    let (_config, catalog) = load_catalog(&root, catalog_flag)?;

    let parsed = parser::parse(reference)?;
    let symbol = Resolver::new(&catalog).resolve_reference(&parsed);
    let Some(id) = Encoder::new(&catalog).encode_symbol(&symbol)? else {
        return Err(Error::Unresolved { reference: reference.to_string() });
    };
    println!("{id}");
    return Ok(());
}
