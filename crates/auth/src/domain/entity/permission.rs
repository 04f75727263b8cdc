use std::collections::BTreeSet;

use serde::Serialize;

/// Distinct permission names granted to a user through their roles.
///
/// Ordered, so tokens issued for the same grants are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<String>);

impl PermissionSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_set_dedups_and_orders() {
        let set: PermissionSet = ["event:read", "article:write", "event:read"].into_iter().collect();

        assert_eq!(set.len(), 2);
        assert_eq!(set.to_vec(), vec!["article:write", "event:read"]);
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["article:write","event:read"]"#);
    }

    #[test]
    fn test_empty_permission_set() {
        let set = PermissionSet::default();

        assert!(set.is_empty());
        assert_eq!(serde_json::to_string(&set).unwrap(), "[]");
    }
}
