//! Handle (username) comparison and rename logic.

use std::fmt;

pub type Result<T> = std::result::Result<T, HandleError>;

/// Errors raised while validating a new handle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandleError {
    #[error("username cannot be empty")]
    Empty,
    #[error("username `{handle}` is already taken")]
    Taken { handle: String },
}

/// Comparison form of a handle: trimmed and lowercased.
///
/// Only used to decide whether two handles point to the same identity, the
/// display form is kept wherever a handle is stored.
#[inline]
pub fn normalize(handle: &str) -> String {
    handle.trim().to_lowercase()
}

/// Whether two handles refer to the same identity.
pub fn same_identity(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Check a proposed handle against the handles of every *other* identity.
///
/// Returns the trimmed handle ready to be stored.
///
/// # Errors
///
/// Returns [`HandleError::Empty`] if nothing is left after trimming, and
/// [`HandleError::Taken`] when another identity already uses the same
/// normalized handle.
pub fn validate_handle<'a, I>(proposed: &str, others: I) -> Result<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let trimmed = proposed.trim();
    if trimmed.is_empty() {
        return Err(HandleError::Empty);
    }

    let key = normalize(trimmed);
    if others.into_iter().any(|other| normalize(other) == key) {
        return Err(HandleError::Taken {
            handle: trimmed.to_string(),
        });
    }

    Ok(trimmed.to_string())
}

/// A committed change from one handle to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    old: String,
    old_key: String,
    new: String,
}

impl Rename {
    /// Create a new [`Rename`]. `new` is stored trimmed.
    pub fn new(old: impl AsRef<str>, new: impl AsRef<str>) -> Self {
        let old = old.as_ref().trim().to_string();
        Self {
            old_key: normalize(&old),
            old,
            new: new.as_ref().trim().to_string(),
        }
    }

    /// Previous handle, trimmed.
    pub fn old(&self) -> &str {
        &self.old
    }

    /// Normalized previous handle.
    pub fn old_key(&self) -> &str {
        &self.old_key
    }

    /// Handle to write in place of the old one.
    pub fn new_handle(&self) -> &str {
        &self.new
    }

    /// Whether `value` is a copy of the old handle.
    pub fn matches(&self, value: &str) -> bool {
        !self.old_key.is_empty() && normalize(value) == self.old_key
    }

    /// Rewritten value if `value` matches, `None` otherwise.
    pub fn apply(&self, value: &str) -> Option<String> {
        self.matches(value).then(|| self.new.clone())
    }

    /// Rewrite every matching entry of a handle list.
    ///
    /// Returns `None` when nothing matched. Copies of the new handle are
    /// collapsed into the first one, other entries are kept as they are.
    pub fn apply_list(&self, values: &[String]) -> Option<Vec<String>> {
        if !values.iter().any(|v| self.matches(v)) {
            return None;
        }

        let mut rewritten: Vec<String> = Vec::with_capacity(values.len());
        let mut has_new = false;
        for value in values {
            let value = self.apply(value).unwrap_or_else(|| value.clone());
            if same_identity(&value, &self.new) {
                if has_new {
                    continue;
                }
                has_new = true;
            }
            rewritten.push(value);
        }
        Some(rewritten)
    }
}

impl fmt::Display for Rename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.old, self.new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Sadullah "), "sadullah");
        assert_eq!(normalize("AYŞE"), "ayşe");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_validate_handle() {
        let others = ["vicdan", "Mehmet"];

        assert_eq!(validate_handle("   ", others), Err(HandleError::Empty));
        assert_eq!(
            validate_handle(" MEHMET ", others),
            Err(HandleError::Taken {
                handle: "MEHMET".into()
            })
        );
        assert_eq!(validate_handle(" sadullah_tg ", others).unwrap(), "sadullah_tg");
    }

    #[test]
    fn test_rename_matches_whole_identity() {
        let rename = Rename::new("Ayşe", "ayse_b");

        for stored in ["AYŞE", " ayşe ", "ayşe"] {
            assert_eq!(rename.apply(stored).as_deref(), Some("ayse_b"));
        }
        assert_eq!(rename.apply("ayşegul"), None);
        assert_eq!(rename.apply(""), None);
    }

    #[test]
    fn test_apply_list() {
        let rename = Rename::new("oldname", "newname");

        let list = vec!["vicdan".to_string(), "OldName".to_string()];
        assert_eq!(
            rename.apply_list(&list),
            Some(vec!["vicdan".to_string(), "newname".to_string()])
        );

        let list = vec!["newname".to_string(), "oldname".to_string()];
        assert_eq!(rename.apply_list(&list), Some(vec!["newname".to_string()]));

        assert_eq!(rename.apply_list(&["vicdan".to_string()]), None);
    }

    #[test]
    fn test_apply_list_keeps_unrelated_duplicates() {
        let rename = Rename::new("oldname", "newname");

        let list: Vec<String> = ["vicdan", "VICDAN", "oldname", "NewName"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            rename.apply_list(&list),
            Some(vec![
                "vicdan".to_string(),
                "VICDAN".to_string(),
                "newname".to_string(),
            ])
        );
    }

    #[test]
    fn test_empty_old_handle_never_matches() {
        let rename = Rename::new("  ", "someone");
        assert!(!rename.matches(""));
    }
}
