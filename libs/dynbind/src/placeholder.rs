//! Recognition of `${...}` variable references.
//!
//! A reference body is a dotted path of identifiers, each optionally indexed:
//! `${var.foo}`, `${resources.jobs.my-job.tasks[0].key}`. Identifiers start
//! with a letter; a single `-` or `_` may separate alphanumeric runs.

use std::sync::LazyLock;

use regex::Regex;

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    const IDENT: &str = r"[a-zA-Z]+(?:[-_]?[a-zA-Z0-9]+)*";
    let segment = format!(r"{IDENT}(?:\[[0-9]+\])*");
    Regex::new(&format!(r"\$\{{{segment}(?:\.{segment})*\}}"))
        .expect("variable reference pattern is valid")
});

/// True if `s` is exactly one variable reference and nothing else.
pub fn is_pure_variable_reference(s: &str) -> bool {
    REFERENCE
        .find(s)
        .is_some_and(|m| m.start() == 0 && m.end() == s.len())
}

/// True if `s` contains at least one variable reference.
pub fn contains_variable_reference(s: &str) -> bool {
    REFERENCE.is_match(s)
}
