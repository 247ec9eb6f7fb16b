//! Print CREATE TABLE statements.

use super::Target;

/// The DDL for `target`, one statement per table, blank-line separated.
#[must_use]
pub fn statements(target: Target) -> String {
    target
        .entities()
        .iter()
        .map(|entity| entity.schema().create_statement())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[allow(clippy::print_stdout)]
pub fn print(target: Target) {
    println!("{}", statements(target));
}
