//! Rendering of [`FileQuery`] into the Drive search language
//!
//! Every rendered query excludes trashed objects. String literals are quoted
//! with single quotes; backslashes and quotes inside names are escaped so a
//! name can never break out of its literal.

use gdpath_core::ports::{FileQuery, KindFilter, FOLDER_MIME};

/// Renders `query` as a `q=` expression
pub fn render(query: &FileQuery) -> String {
    let mut clauses = vec!["trashed = false".to_string()];

    match query.kind {
        KindFilter::Any => {}
        KindFilter::FoldersOnly => clauses.push(format!("mimeType = '{FOLDER_MIME}'")),
        KindFilter::FilesOnly => clauses.push(format!("mimeType != '{FOLDER_MIME}'")),
    }

    if let Some(parent) = &query.parent {
        clauses.push(format!("'{}' in parents", escape(parent.as_str())));
    }

    if let Some(name) = &query.name {
        clauses.push(format!("name = '{}'", escape(name)));
    }

    clauses.join(" and ")
}

/// Escapes a value for use inside a single-quoted literal
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\\' || c == '\'' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
