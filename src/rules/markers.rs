//! Marker annotations that make a method's result must-use

use crate::resolve::Declaration;
use std::collections::BTreeSet;

/// Retrofit HTTP method annotations
pub const RETROFIT_HTTP_METHODS: &[&str] = &[
    "retrofit2.http.GET",
    "retrofit2.http.POST",
    "retrofit2.http.PUT",
    "retrofit2.http.DELETE",
    "retrofit2.http.HEAD",
    "retrofit2.http.OPTIONS",
    "retrofit2.http.PATCH",
    "retrofit2.http.HTTP",
];

/// Immutable set of qualified annotation names. Matching is exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerSet {
    names: BTreeSet<String>,
}

impl Default for MarkerSet {
    fn default() -> Self {
        Self::new(RETROFIT_HTTP_METHODS.iter().copied())
    }
}

impl MarkerSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names
                .into_iter()
                .map(Into::into)
                .map(|n: String| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    /// A copy of this set with additional names
    pub fn with<I, S>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names = self.names.clone();
        names.extend(Self::new(extra).names);
        Self { names }
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.names.contains(qualified_name)
    }

    /// Whether any annotation on `decl` is a marker
    pub fn is_marked(&self, decl: &Declaration) -> bool {
        decl.annotations.iter().any(|a| self.contains(a))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decl(annotations: &[&str]) -> Declaration {
        Declaration {
            owner: "com.example.ApiInterface".into(),
            name: "foo".into(),
            params: 0,
            param_types: Vec::new(),
            varargs: false,
            return_type: Some("retrofit2.Call".into()),
            annotations: annotations.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_default_is_retrofit_set() {
        let markers = MarkerSet::default();
        assert_eq!(markers.len(), 8);
        for name in RETROFIT_HTTP_METHODS {
            assert!(markers.contains(name));
        }
    }

    #[test]
    fn test_is_marked() {
        let markers = MarkerSet::default();
        assert!(markers.is_marked(&decl(&["retrofit2.http.GET"])));
        assert!(markers.is_marked(&decl(&["java.lang.Deprecated", "retrofit2.http.HTTP"])));
        assert!(!markers.is_marked(&decl(&[])));
        assert!(!markers.is_marked(&decl(&["java.lang.Deprecated"])));
    }

    #[test]
    fn test_matching_is_exact() {
        let markers = MarkerSet::default();
        assert!(!markers.is_marked(&decl(&["GET"])));
        assert!(!markers.is_marked(&decl(&["retrofit2.http.GETS"])));
        assert!(!markers.is_marked(&decl(&["com.example.retrofit2.http.GET"])));
        assert!(!markers.is_marked(&decl(&["retrofit.http.GET"])));
    }

    #[test]
    fn test_custom_and_extended_sets() {
        let custom = MarkerSet::new(["com.acme.Endpoint", "  ", ""]);
        assert_eq!(custom.len(), 1);
        assert!(custom.is_marked(&decl(&["com.acme.Endpoint"])));
        assert!(!custom.is_marked(&decl(&["retrofit2.http.GET"])));

        let extended = MarkerSet::default().with(["com.acme.Endpoint"]);
        assert_eq!(extended.len(), 9);
        assert!(extended.is_marked(&decl(&["com.acme.Endpoint"])));
        assert!(extended.is_marked(&decl(&["retrofit2.http.GET"])));
    }
}
