//! Field-name resolution shared by both codecs.
//!
//! External names derive from the name serde reports for a field: either
//! the declared identifier or a `#[serde(rename)]` override. Derivation
//! inserts a separator before each internal uppercase transition and
//! case-folds the result, so `ServerPort` becomes `SERVER_PORT` /
//! `server_port`. The splitting is deliberately naive: every capital
//! starts a new word, so `APIKey` derives to `A_P_I_KEY`, not `API_KEY`.
//! Use a rename when that is not what you want.
//!
//! A literal `-` name marks a field as excluded from resolution.

/// Derive an UPPER_SNAKE name (the line-format convention).
pub fn upper_snake(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 4);
    for (i, ch) in ident.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch);
        } else {
            out.extend(ch.to_uppercase());
        }
    }
    out
}

/// Derive a lower_snake name (the tree-format convention).
pub fn lower_snake(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 4);
    for (i, ch) in ident.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Resolve a field's line-format name; `None` means excluded.
pub fn resolve_upper(raw: &str) -> Option<String> {
    (raw != "-").then(|| upper_snake(raw))
}

/// Resolve a field's tree-format name; `None` means excluded.
pub fn resolve_lower(raw: &str) -> Option<String> {
    (raw != "-").then(|| lower_snake(raw))
}

/// Compose a nested name with its parent prefix. The separator is only
/// inserted when the prefix is non-empty.
pub fn prefixed(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}_{name}")
    }
}
