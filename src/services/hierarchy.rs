//! src/services/hierarchy.rs
//!
//! Virtual folders over flat object keys. The backing store has no directory
//! objects; one level of a directory view is reconstructed from the keys that
//! share a prefix, and navigation only ever moves between prefixes built here.

use crate::{
    errors::{ConsoleError, ConsoleResult},
    models::{
        listing::{ListingEntry, NavigationState},
        object::ObjectSummary,
    },
};
use std::{cmp::Ordering, collections::BTreeSet};

const SEPARATOR: char = '/';

/// Project the objects sharing `query_prefix` onto one directory level.
///
/// Immediate subfolders come first, then files directly under the prefix;
/// both groups are sorted with [`name_order`]. A key nested several levels
/// down collapses into a single folder entry named after its first segment.
pub fn project(objects: &[ObjectSummary], query_prefix: &str) -> Vec<ListingEntry> {
    let mut folders = BTreeSet::new();
    let mut files = Vec::new();

    for obj in objects {
        let Some(relative) = obj.key.strip_prefix(query_prefix) else {
            continue;
        };
        if relative.is_empty() {
            // the prefix marker object itself
            continue;
        }

        match relative.split_once(SEPARATOR) {
            Some((first, _)) if !first.is_empty() => {
                folders.insert(first);
            }
            Some(_) => {}
            None => files.push(ListingEntry::file(
                relative,
                obj.key.clone(),
                obj.size,
                obj.last_modified,
            )),
        }
    }

    let mut folders: Vec<&str> = folders.into_iter().collect();
    folders.sort_by(|a, b| name_order(a, b));
    files.sort_by(|a, b| name_order(&a.name, &b.name));

    folders
        .into_iter()
        .map(|name| ListingEntry::folder(name, query_prefix))
        .chain(files)
        .collect()
}

/// Human ordering of entry names: letters compare without regard to case or
/// accents first (`alpha`, `Beta`, `Éclair`, `zeta`), then accented after
/// plain, then lowercase before uppercase. Byte order breaks remaining ties
/// so the result is total.
pub fn name_order(a: &str, b: &str) -> Ordering {
    let primary = |s: &str| {
        s.chars()
            .flat_map(char::to_lowercase)
            .map(fold_accent)
            .collect::<String>()
    };
    let secondary = |s: &str| s.chars().flat_map(char::to_lowercase).collect::<String>();
    let tertiary = |s: &str| s.chars().map(char::is_uppercase).collect::<Vec<_>>();

    primary(a)
        .cmp(&primary(b))
        .then_with(|| secondary(a).cmp(&secondary(b)))
        .then_with(|| tertiary(a).cmp(&tertiary(b)))
        .then_with(|| a.cmp(b))
}

/// Base letter of a lowercase Latin-1 accented letter.
fn fold_accent(c: char) -> char {
    match c {
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

/// Descend into `folder_name` below the current path.
///
/// Rejects anything that is not a single plain segment, so the resulting
/// path can never climb above the root prefix.
pub fn enter_folder(state: &NavigationState, folder_name: &str) -> ConsoleResult<NavigationState> {
    ensure_folder_name_safe(folder_name)?;
    let path = format!("{}{}{}", state.current_path(), folder_name, SEPARATOR);
    Ok(state.with_path(path))
}

/// Segments of `path`, empty segments discarded.
pub fn breadcrumbs(path: &str) -> Vec<&str> {
    path.split(SEPARATOR).filter(|s| !s.is_empty()).collect()
}

/// Truncate the current path to (and including) segment `index`.
///
/// `-1` returns to the root of the grant.
pub fn jump_to_breadcrumb(state: &NavigationState, index: isize) -> ConsoleResult<NavigationState> {
    let crumbs = breadcrumbs(state.current_path());
    if index == -1 {
        return Ok(state.with_path(String::new()));
    }
    if index < -1 || index as usize >= crumbs.len() {
        return Err(ConsoleError::BreadcrumbOutOfRange {
            index,
            depth: crumbs.len(),
        });
    }

    let mut path = crumbs[..=index as usize].join("/");
    path.push(SEPARATOR);
    Ok(state.with_path(path))
}

/// Resolve a user-typed relative path (`"a/b"`, `"a/b/"`) by entering each
/// segment in turn from the root.
pub fn resolve_path(state: &NavigationState, relative: &str) -> ConsoleResult<NavigationState> {
    let mut resolved = state.with_path(String::new());
    for segment in relative.split(SEPARATOR).filter(|s| !s.is_empty()) {
        resolved = enter_folder(&resolved, segment)?;
    }
    Ok(resolved)
}

/// Split a relative object path into the folder it lives in and its name.
///
/// `"a/b/c.txt"` becomes (`a/b/` state, `"c.txt"`).
pub fn resolve_object(
    state: &NavigationState,
    relative: &str,
) -> ConsoleResult<(NavigationState, String)> {
    let trimmed = relative.trim_matches(SEPARATOR);
    let (dir, name) = match trimmed.rsplit_once(SEPARATOR) {
        Some((dir, name)) => (dir, name),
        None => ("", trimmed),
    };
    ensure_folder_name_safe(name)?;
    let folder = resolve_path(state, dir)?;
    Ok((folder, name.to_string()))
}

/// Check that an object `key` addresses something under the grant's root: it
/// starts with the root prefix, names more than the root itself, and has no
/// `.`/`..` segments below it.
pub fn ensure_within_root(state: &NavigationState, key: &str) -> ConsoleResult<()> {
    let root = state.root_prefix();
    let inside = key
        .strip_prefix(root)
        .filter(|rest| !rest.is_empty())
        .is_some_and(|rest| rest.split(SEPARATOR).all(|s| s != "." && s != ".."));
    if !inside {
        return Err(ConsoleError::OutsideRoot {
            key: key.to_string(),
            root: root.to_string(),
        });
    }
    Ok(())
}

fn ensure_folder_name_safe(name: &str) -> ConsoleResult<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(SEPARATOR)
        || name.chars().any(|c| c.is_control())
    {
        return Err(ConsoleError::InvalidFolderName(name.to_string()));
    }
    Ok(())
}
