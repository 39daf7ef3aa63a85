//! Static permission catalog.
//!
//! Source of truth for permission names, their human labels and the category
//! they are grouped under. The Postgres store syncs these rows into the
//! `permissions` table at startup.

use std::collections::BTreeMap;

use serde::Serialize;

/// One catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PermissionDef {
    pub name: &'static str,
    pub label: &'static str,
    #[serde(skip)]
    pub category: &'static str,
}

const fn def(name: &'static str, label: &'static str, category: &'static str) -> PermissionDef {
    PermissionDef {
        name,
        label,
        category,
    }
}

/// Category used when a name has neither a catalog entry nor a `.` prefix
pub const FALLBACK_CATEGORY: &str = "general";

/// Permission required to change another user's role in a tenant
pub const ROLES_ASSIGN: &str = "roles.assign";

static CATALOG: &[PermissionDef] = &[
    // users
    def("users.read", "View users", "users"),
    def("users.create", "Invite users", "users"),
    def("users.update", "Edit users", "users"),
    def("users.delete", "Remove users", "users"),
    // roles
    def("roles.read", "View roles", "roles"),
    def("roles.create", "Create roles", "roles"),
    def("roles.update", "Edit roles", "roles"),
    def("roles.delete", "Delete roles", "roles"),
    def(ROLES_ASSIGN, "Assign roles to users", "roles"),
    // courses
    def("courses.read", "View courses", "courses"),
    def("courses.create", "Create courses", "courses"),
    def("courses.update", "Edit courses", "courses"),
    def("courses.delete", "Delete courses", "courses"),
    def("courses.publish", "Publish courses", "courses"),
    // quizzes
    def("quizzes.read", "View quizzes", "quizzes"),
    def("quizzes.create", "Create quizzes", "quizzes"),
    def("quizzes.update", "Edit quizzes", "quizzes"),
    def("quizzes.delete", "Delete quizzes", "quizzes"),
    def("quizzes.grade", "Grade quiz attempts", "quizzes"),
    // flashcards
    def("flashcards.read", "View flashcards", "flashcards"),
    def("flashcards.create", "Create flashcards", "flashcards"),
    def("flashcards.update", "Edit flashcards", "flashcards"),
    def("flashcards.delete", "Delete flashcards", "flashcards"),
    // rewards
    def("rewards.read", "View rewards", "rewards"),
    def("rewards.create", "Create rewards", "rewards"),
    def("rewards.update", "Edit rewards", "rewards"),
    def("rewards.delete", "Delete rewards", "rewards"),
    def("rewards.redeem", "Redeem rewards", "rewards"),
    // analytics
    def("analytics.read", "View analytics", "analytics"),
    def("analytics.export", "Export reports", "analytics"),
    // settings
    def("settings.read", "View workspace settings", "settings"),
    def("settings.update", "Edit workspace settings", "settings"),
    // billing
    def("billing.read", "View billing", "billing"),
    def("billing.manage", "Manage subscription", "billing"),
];

pub fn catalog() -> &'static [PermissionDef] {
    CATALOG
}

pub fn lookup(name: &str) -> Option<&'static PermissionDef> {
    CATALOG.iter().find(|d| d.name == name)
}

/// Human label, or the name itself for unknown permissions
pub fn label(name: &str) -> &str {
    lookup(name).map(|d| d.label).unwrap_or(name)
}

/// Catalog category, else the prefix before the first `.`
pub fn category_of(name: &str) -> &str {
    if let Some(d) = lookup(name) {
        return d.category;
    }

    match name.split_once('.') {
        Some((prefix, _)) if !prefix.is_empty() => prefix,
        _ => FALLBACK_CATEGORY,
    }
}

/// Catalog entries keyed by category, catalog order within a category
pub fn grouped() -> BTreeMap<&'static str, Vec<&'static PermissionDef>> {
    let mut groups: BTreeMap<&'static str, Vec<&'static PermissionDef>> = BTreeMap::new();
    for d in CATALOG {
        groups.entry(d.category).or_default().push(d);
    }
    groups
}

/// Groups arbitrary permission names by category
pub fn group_by_category<'a, I>(names: I) -> BTreeMap<String, Vec<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for name in names {
        groups
            .entry(category_of(name).to_string())
            .or_default()
            .push(name.to_string());
    }
    groups
}
