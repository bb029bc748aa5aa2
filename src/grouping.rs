//! Affinity groups used to cluster related items.

use std::fmt;

use crate::signature::ItemSignature;

/// Clustering key of an item, fixed for the duration of a planning run.
///
/// Ordering is derived so groups can serve as a deterministic sort key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupKey {
    Category(String),
    Size(String),
    Keyword(String),
    Misc,
}

impl GroupKey {
    /// Precedence: category id, then size family, then first token, then `misc`.
    ///
    /// # Examples
    /// ```
    /// use drawer_tidy::grouping::GroupKey;
    /// use drawer_tidy::signature::ItemSignature;
    ///
    /// let signature = ItemSignature { tokens: vec!["relais".into()], size: None };
    /// assert_eq!(GroupKey::for_item(None, &signature).to_string(), "keyword:relais");
    /// assert_eq!(GroupKey::for_item(Some("c7"), &signature).to_string(), "category:c7");
    /// ```
    pub fn for_item(category_id: Option<&str>, signature: &ItemSignature) -> Self {
        if let Some(id) = category_id.filter(|id| !id.is_empty()) {
            return GroupKey::Category(id.to_owned());
        }
        if let Some(size) = &signature.size {
            return GroupKey::Size(size.family());
        }
        match signature.first_token() {
            Some(token) => GroupKey::Keyword(token.to_owned()),
            None => GroupKey::Misc,
        }
    }

    pub fn category_id(&self) -> Option<&str> {
        match self {
            GroupKey::Category(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Category(id) => write!(f, "category:{id}"),
            GroupKey::Size(family) => write!(f, "size:{family}"),
            GroupKey::Keyword(token) => write!(f, "keyword:{token}"),
            GroupKey::Misc => f.write_str("misc"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::extract_size_signature;

    fn signature(tokens: &[&str], text: &str) -> ItemSignature {
        ItemSignature {
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            size: extract_size_signature(text),
        }
    }

    #[test]
    fn category_takes_precedence() {
        let sig = signature(&["vis"], "M3x10");
        assert_eq!(
            GroupKey::for_item(Some("c1"), &sig),
            GroupKey::Category("c1".to_string())
        );
    }

    #[test]
    fn size_family_before_keyword() {
        let sig = signature(&["vis"], "M3x10");
        assert_eq!(GroupKey::for_item(None, &sig).to_string(), "size:M3");
    }

    #[test]
    fn empty_category_is_ignored() {
        let sig = signature(&["fusibles"], "");
        assert_eq!(GroupKey::for_item(Some(""), &sig).to_string(), "keyword:fusibles");
    }

    #[test]
    fn falls_back_to_misc() {
        let sig = signature(&[], "");
        assert_eq!(GroupKey::for_item(None, &sig), GroupKey::Misc);
        assert_eq!(GroupKey::Misc.to_string(), "misc");
    }
}
