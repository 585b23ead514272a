//! Resolution-scoped information handed to query builders

/// Identity of the caller, attached to a GraphQL request as data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer(pub String);

/// What is being resolved and for whom: the field name, the sub-fields
/// requested on it, and the caller when the request carries one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryContext {
    pub field: String,
    pub selection: Vec<String>,
    pub viewer: Option<String>,
}

impl QueryContext {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            selection: Vec::new(),
            viewer: None,
        }
    }

    pub fn with_viewer(mut self, viewer: impl Into<String>) -> Self {
        self.viewer = Some(viewer.into());
        self
    }

    /// Capture the current field, its selection set and the request's
    /// [`Viewer`] from a resolver context.
    pub fn from_graphql(ctx: &async_graphql::Context<'_>) -> Self {
        let field = ctx.field();
        Self {
            field: field.name().to_string(),
            selection: field
                .selection_set()
                .map(|f| f.name().to_string())
                .collect(),
            viewer: ctx.data_opt::<Viewer>().map(|v| v.0.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::{EmptyMutation, EmptySubscription, Object, Request, Schema, SimpleObject};
    use pretty_assertions::assert_eq;

    #[derive(SimpleObject)]
    struct Seen {
        field: String,
        selection: Vec<String>,
        viewer: Option<String>,
    }

    struct Query;

    #[Object]
    impl Query {
        async fn seen(&self, ctx: &async_graphql::Context<'_>) -> Seen {
            let qc = QueryContext::from_graphql(ctx);
            Seen {
                field: qc.field,
                selection: qc.selection,
                viewer: qc.viewer,
            }
        }
    }

    async fn run(request: Request) -> serde_json::Value {
        let schema = Schema::new(Query, EmptyMutation, EmptySubscription);
        let response = schema.execute(request).await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        response.data.into_json().unwrap()
    }

    #[tokio::test]
    async fn test_from_graphql_reads_field_and_viewer() {
        let data = run(Request::new("{ seen { field viewer } }").data(Viewer("ada".into()))).await;
        assert_eq!(
            data,
            serde_json::json!({ "seen": { "field": "seen", "viewer": "ada" } })
        );
    }

    #[tokio::test]
    async fn test_from_graphql_without_viewer() {
        let data = run(Request::new("{ seen { selection viewer } }")).await;
        assert_eq!(
            data,
            serde_json::json!({ "seen": { "selection": ["selection", "viewer"], "viewer": null } })
        );
    }
}
