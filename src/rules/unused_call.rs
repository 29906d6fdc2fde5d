//! The `UnusedCallObject` detector

use super::markers::MarkerSet;
use super::usage::is_result_used;
use crate::resolve::Resolve;
use crate::syntax::{NodeId, SyntaxTree};

/// Flags calls to marked methods whose result is discarded
#[derive(Debug, Clone, Default)]
pub struct UnusedCallObject {
    markers: MarkerSet,
}

impl UnusedCallObject {
    pub fn new(markers: MarkerSet) -> Self {
        Self { markers }
    }

    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    /// True when `call` is a violation. Unresolved and unmarked calls never are.
    pub fn check(&self, tree: &SyntaxTree, call: NodeId, resolver: &dyn Resolve) -> bool {
        let Some(decl) = resolver.resolve_call(call) else {
            return false;
        };
        if !self.markers.is_marked(decl) {
            return false;
        }
        !is_result_used(tree, call, resolver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{FileResolver, ProjectIndex};

    const API: &str = r#"package com.example;

import retrofit2.Call;
import retrofit2.http.GET;

public interface ApiInterface {
    @GET("foo")
    Call<Void> foo();

    Call<Void> unmarked();

    @GET("item")
    Call<Void> get(String id);

    Call<Void> get(int id);
}
"#;

    fn client(body: &str) -> String {
        format!(
            r#"package com.example;

import retrofit2.Call;

public class TestClient {{
    public Object callFoo(ApiInterface apiInterface) {{
{}
        return null;
    }}

    private void bar(Object o) {{}}
}}
"#,
            body
        )
    }

    /// Texts of the calls flagged by `rule` in `body`
    fn flagged_with(rule: &UnusedCallObject, body: &str) -> Vec<String> {
        let trees = vec![
            SyntaxTree::parse_str(API).unwrap(),
            SyntaxTree::parse_str(&client(body)).unwrap(),
        ];
        let index = ProjectIndex::build(&trees);
        let tree = &trees[1];
        let resolver = FileResolver::new(tree, &index);
        tree.calls()
            .into_iter()
            .filter(|&c| rule.check(tree, c, &resolver))
            .map(|c| tree.text(c).to_string())
            .collect()
    }

    fn flagged(body: &str) -> Vec<String> {
        flagged_with(&UnusedCallObject::default(), body)
    }

    #[test]
    fn test_bare_call_is_flagged() {
        assert_eq!(flagged("        apiInterface.foo();"), vec!["apiInterface.foo()"]);
    }

    #[test]
    fn test_chained_call_is_clean() {
        assert!(flagged("        apiInterface.foo().execute();").is_empty());
    }

    #[test]
    fn test_local_binding_is_clean() {
        assert!(flagged("        Call<Void> call = apiInterface.foo();").is_empty());
    }

    #[test]
    fn test_assignment_to_existing_variable_is_clean() {
        assert!(flagged("        Call<Void> call;\n        call = apiInterface.foo();").is_empty());
    }

    #[test]
    fn test_return_is_clean() {
        assert!(flagged("        if (apiInterface != null) return apiInterface.foo();").is_empty());
    }

    #[test]
    fn test_argument_is_clean() {
        assert!(flagged("        bar(apiInterface.foo());").is_empty());
    }

    #[test]
    fn test_unmarked_call_is_never_flagged() {
        assert!(flagged("        apiInterface.unmarked();").is_empty());
    }

    #[test]
    fn test_unresolved_call_is_never_flagged() {
        assert!(flagged("        somethingElse.foo();").is_empty());
    }

    #[test]
    fn test_each_discarded_call_reported_once() {
        let body = "        apiInterface.foo();\n        apiInterface.foo().execute();\n        apiInterface.foo();";
        assert_eq!(flagged(body).len(), 2);
    }

    #[test]
    fn test_custom_marker_set() {
        let rule = UnusedCallObject::new(MarkerSet::new(["com.acme.Endpoint"]));
        assert!(flagged_with(&rule, "        apiInterface.foo();").is_empty());
        assert_eq!(rule.markers().len(), 1);
    }

    #[test]
    fn test_unmarked_overload_is_never_flagged() {
        assert!(flagged("        apiInterface.get(5);").is_empty());
        assert_eq!(
            flagged("        apiInterface.get(5);\n        apiInterface.get(\"x\");"),
            vec!["apiInterface.get(\"x\")"]
        );
    }

    #[test]
    fn test_constructor_argument_is_flagged() {
        assert_eq!(
            flagged("        new Holder(apiInterface.foo());"),
            vec!["apiInterface.foo()"]
        );
        assert_eq!(
            flagged("        Holder h = new Holder(apiInterface.foo());"),
            vec!["apiInterface.foo()"]
        );
    }
}
