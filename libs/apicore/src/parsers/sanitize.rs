//! Shared sanitization helpers applied by every dialect parser before a
//! field name is allowed to reach the filter/search validators.

/// Field names are restricted to ASCII alphanumerics, `_` and `.` (the
/// latter for nested-path style field references). Anything else is
/// stripped, matching the "reject, don't attempt to interpret" posture
/// spec.md's sanitization property calls for.
#[must_use]
pub fn sanitize_field_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '.')
        .collect()
}

/// Fields the pipeline never allows to be filtered or searched on
/// regardless of what the metadata engine reports, by name — a last-resort
/// backstop underneath `FieldType::Password`'s empty capability set.
pub const ALWAYS_BLOCKED_FIELDS: &[&str] = &["password", "password_hash", "secret"];

#[must_use]
pub fn is_always_blocked(field: &str) -> bool {
    ALWAYS_BLOCKED_FIELDS.contains(&field.to_ascii_lowercase().as_str())
}
