use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "public" => Some(Self::Public),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

/// Which documents a read may see. `Public` hides private documents from
/// every lookup, including link resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    Admin,
    Public,
}

impl Scope {
    pub(crate) fn filter_clause(self, alias: &str) -> String {
        match self {
            Self::Admin => String::new(),
            Self::Public => format!(" AND {alias}.visibility = 'public'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub path: String,
    pub title: String,
    pub body: String,
    pub visibility: Visibility,
    pub created_at: String,
    pub updated_at: String,
    pub published_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_parse_is_case_insensitive() {
        assert_eq!(Visibility::parse("Public"), Some(Visibility::Public));
        assert_eq!(Visibility::parse(" private "), Some(Visibility::Private));
        assert_eq!(Visibility::parse("draft"), None);
    }

    #[test]
    fn public_scope_adds_visibility_filter() {
        assert_eq!(Scope::Admin.filter_clause("d"), "");
        assert_eq!(
            Scope::Public.filter_clause("d"),
            " AND d.visibility = 'public'"
        );
    }
}
