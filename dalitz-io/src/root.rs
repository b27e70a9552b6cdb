//! ROOT `TTree` event input.
//!
//! Only the twelve candidate branches are loaded. Scalar `float` branches are
//! promoted to `f64`; branches of any other type are left out, so the event
//! loop reports them as missing fields.

use crate::{Error, Result};
use dalitz_core::{required_fields, EventColumns};
use oxyroot::{Branch, Named, ReaderTree, RootFile};
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScalarKind {
    F32,
    F64,
}

fn scalar_kind(branch: &Branch) -> Option<ScalarKind> {
    let type_name = branch.item_type_name().to_ascii_lowercase();
    if type_name.contains("vector") {
        return None;
    }
    match type_name.as_str() {
        "float" | "float_t" | "float32_t" => Some(ScalarKind::F32),
        "double" | "double_t" | "double32_t" => Some(ScalarKind::F64),
        _ => None,
    }
}

fn root_error<E: std::fmt::Display>(context: &str, err: E) -> Error {
    Error::Root(format!("{context}: {err}"))
}

/// Loads the candidate branches of the tree `tree` in `path`.
///
/// # Errors
/// Returns an error if the file or tree cannot be opened, a branch cannot be
/// decoded, or branches have different entry counts.
pub fn read_root_tree<P: AsRef<Path>>(path: P, tree: &str) -> Result<EventColumns> {
    read_root_branches(path, tree, &required_fields())
}

/// Loads the named scalar branches of the tree `tree` in `path`.
///
/// Names with no matching scalar branch are skipped.
///
/// # Errors
/// See [`read_root_tree`].
pub fn read_root_branches<P: AsRef<Path>>(
    path: P,
    tree: &str,
    names: &[&str],
) -> Result<EventColumns> {
    let path = path.as_ref();
    let mut file = RootFile::open(path)
        .map_err(|e| root_error(&format!("cannot open {}", path.display()), e))?;
    let reader: ReaderTree = file
        .get_tree(tree)
        .map_err(|e| root_error(&format!("{}: no tree `{tree}`", path.display()), e))?;

    let mut table = EventColumns::new();
    for &name in names {
        let Some(branch) = reader.branches().find(|b| b.name() == name) else {
            log::debug!("{tree}/{name}: no such branch");
            continue;
        };
        let values: Vec<f64> = match scalar_kind(branch) {
            Some(ScalarKind::F64) => branch
                .as_iter::<f64>()
                .map_err(|e| root_error(&format!("cannot read branch `{name}`"), e))?
                .collect(),
            Some(ScalarKind::F32) => branch
                .as_iter::<f32>()
                .map_err(|e| root_error(&format!("cannot read branch `{name}`"), e))?
                .map(f64::from)
                .collect(),
            None => {
                log::debug!(
                    "{tree}/{name}: unsupported type `{}`, skipped",
                    branch.item_type_name()
                );
                continue;
            }
        };
        table.push_column(name, values)?;
    }

    log::debug!(
        "loaded {}:{tree} ({} events, {} branches)",
        path.display(),
        table.len(),
        table.column_names().len()
    );
    Ok(table)
}
