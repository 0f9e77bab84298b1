//! Composition of package dependency maps contributed by modules.
//!
//! Version constraints are compared by a literal numeric-tuple rule only; no
//! semantic-version range intersection is attempted.

use crate::error::{Error, Result};
use crate::module::{DependencyMap, DependencySpec};
use log::{debug, warn};
use std::cmp::Ordering;

/// Extracts the numeric tuple of a version constraint.
///
/// Any non-numeric prefix (`^`, `>=`, `~`) is dropped, then each dotted
/// component contributes its leading digits, without leading zeros. Returns
/// `None` when the string holds no number at all (`any`, a git ref).
///
/// Components stay digit strings so that arbitrarily long numbers compare
/// correctly.
pub fn parse_version_tuple(constraint: &str) -> Option<Vec<&str>> {
    let start = constraint.find(|c: char| c.is_ascii_digit())?;
    let numeric = &constraint[start..];

    let mut tuple = Vec::new();
    for component in numeric.split('.') {
        let end = component.find(|c: char| !c.is_ascii_digit()).unwrap_or(component.len());
        let digits = &component[..end];
        if digits.is_empty() {
            break;
        }
        let trimmed = digits.trim_start_matches('0');
        tuple.push(if trimmed.is_empty() { "0" } else { trimmed });
        if end != component.len() {
            // `1.2.3-beta.4`: the pre-release tail is not part of the tuple.
            break;
        }
    }
    Some(tuple)
}

/// Orders two zero-trimmed digit strings numerically.
fn compare_components(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Compares two numeric tuples, treating missing trailing components as 0.
fn compare_tuples(a: &[&str], b: &[&str]) -> Ordering {
    let len = a.len().max(b.len());
    (0..len)
        .map(|i| compare_components(a.get(i).copied().unwrap_or("0"), b.get(i).copied().unwrap_or("0")))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Returns whichever constraint names the larger version, or `a` on a tie.
///
/// Returns `None` when the two strings differ and at least one has no
/// numeric part, since there is no order to pick from.
///
/// # Examples
/// ```
/// use stencil::composer::pick_newer_version;
///
/// assert_eq!(pick_newer_version("^4.0.0", "^5.7.0"), Some("^5.7.0"));
/// assert_eq!(pick_newer_version("^1.2", "1.2.0"), Some("^1.2"));
/// assert_eq!(pick_newer_version("any", "^1.0.0"), None);
/// ```
pub fn pick_newer_version<'a>(a: &'a str, b: &'a str) -> Option<&'a str> {
    if a == b {
        return Some(a);
    }
    let (left, right) = (parse_version_tuple(a)?, parse_version_tuple(b)?);
    match compare_tuples(&left, &right) {
        Ordering::Less => Some(b),
        Ordering::Equal | Ordering::Greater => Some(a),
    }
}

/// Merges one dependency entry into `current`.
fn merge_entry(package: &str, current: &DependencySpec, incoming: &DependencySpec) -> Result<DependencySpec> {
    match (current, incoming) {
        (DependencySpec::Version(a), DependencySpec::Version(b)) => {
            let picked = pick_newer_version(a, b).ok_or_else(|| Error::IncomparableVersions {
                package: package.to_string(),
                left: a.clone(),
                right: b.clone(),
            })?;
            Ok(DependencySpec::Version(picked.to_string()))
        }
        (DependencySpec::Structured(_), DependencySpec::Version(_)) => Ok(current.clone()),
        (DependencySpec::Version(_), DependencySpec::Structured(_)) => Ok(incoming.clone()),
        (DependencySpec::Structured(a), DependencySpec::Structured(b)) => {
            if a != b {
                warn!("Conflicting structured entries for '{package}'; keeping the first one");
            }
            Ok(current.clone())
        }
    }
}

/// Merges `incoming` into `accumulator` in place.
///
/// Packages only present on one side are kept as they are; packages present
/// on both sides keep the newer version. Structured entries always win over
/// version strings and are never rewritten.
///
/// # Errors
/// * `Error::IncomparableVersions` if two different constraints for the same
///   package cannot be ordered
pub fn merge_dependencies(accumulator: &mut DependencyMap, incoming: &DependencyMap) -> Result<()> {
    for (package, spec) in incoming {
        let merged = match accumulator.get(package) {
            Some(current) => merge_entry(package, current, spec)?,
            None => spec.clone(),
        };
        debug!("Dependency '{package}' -> {merged:?}");
        accumulator.insert(package.clone(), merged);
    }
    Ok(())
}
