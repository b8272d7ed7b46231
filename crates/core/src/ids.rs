//! Resource id sanity rules for path parameters.

/// Parses a path segment as a resource id.
///
/// Accepts only integers that fit the id column and are strictly positive.
#[must_use]
pub fn parse_resource_id(raw: &str) -> Option<i32> {
    raw.parse::<i32>().ok().filter(|id| *id > 0)
}
