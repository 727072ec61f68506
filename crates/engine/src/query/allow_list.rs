//! Closed sets of values accepted in positions that cannot be bound.
//!
//! `ORDER BY` targets and directions are written into the statement text, so
//! caller input is only ever used to *select* one of these static entries.

use super::types::SortDirection;

/// A fixed set of accepted values with a fallback.
#[derive(Debug, Clone, Copy)]
pub struct AllowList {
    entries: &'static [&'static str],
    default: &'static str,
}

impl AllowList {
    pub const fn new(entries: &'static [&'static str], default: &'static str) -> Self {
        Self { entries, default }
    }

    pub fn entries(&self) -> &'static [&'static str] {
        self.entries
    }

    pub fn contains(&self, value: &str) -> bool {
        self.entries.contains(&value)
    }

    /// Return the matching static entry, or the default when `requested` is
    /// not in the list. The result never borrows from `requested`.
    pub fn resolve(&self, requested: &str) -> &'static str {
        self.entries
            .iter()
            .copied()
            .find(|entry| *entry == requested)
            .unwrap_or(self.default)
    }
}

/// Columns of `posts` a search may be ordered by.
pub const POST_ORDER_FIELDS: AllowList =
    AllowList::new(&["title", "created_at", "updated_at"], "created_at");

/// Accepted sort directions, compared after upper-casing.
pub const SORT_DIRECTIONS: AllowList = AllowList::new(&["ASC", "DESC"], "DESC");

/// Resolve a caller-supplied direction case-insensitively.
pub fn resolve_direction(requested: &str) -> SortDirection {
    match SORT_DIRECTIONS.resolve(&requested.to_ascii_uppercase()) {
        "ASC" => SortDirection::Asc,
        _ => SortDirection::Desc,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn known_fields_resolve_to_themselves() {
        for field in ["title", "created_at", "updated_at"] {
            assert_eq!(POST_ORDER_FIELDS.resolve(field), field);
        }
    }

    #[test]
    fn unknown_fields_fall_back() {
        assert_eq!(POST_ORDER_FIELDS.resolve(""), "created_at");
        assert_eq!(POST_ORDER_FIELDS.resolve("content"), "created_at");
        assert_eq!(POST_ORDER_FIELDS.resolve("TITLE"), "created_at");
        assert_eq!(
            POST_ORDER_FIELDS.resolve("title; DROP TABLE posts"),
            "created_at"
        );
    }

    #[test]
    fn direction_is_case_insensitive() {
        assert_eq!(resolve_direction("asc"), SortDirection::Asc);
        assert_eq!(resolve_direction("AsC"), SortDirection::Asc);
        assert_eq!(resolve_direction("desc"), SortDirection::Desc);
    }

    #[test]
    fn direction_falls_back_to_desc() {
        assert_eq!(resolve_direction(""), SortDirection::Desc);
        assert_eq!(resolve_direction("sideways"), SortDirection::Desc);
        assert_eq!(resolve_direction("ASC NULLS FIRST"), SortDirection::Desc);
    }
}
