use reqwest::Method;
use serde_json::Value;
use tokio::time::Instant;

/// Ordered query-string parameters.
///
/// Values are plain strings; callers format numbers and timestamps
/// themselves.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query(Vec<(String, String)>);

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pair, keeping insertion order.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    /// Builder form of [`Query::push`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

impl From<()> for Query {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl From<Vec<(String, String)>> for Query {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Query
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        Self(
            pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// One call against the API: method, relative path, query, body, deadline.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the base URL; a leading `/` is optional.
    pub path: String,
    pub query: Query,
    pub body: Option<Value>,
    /// Instant after which no further attempt or backoff is started.
    pub deadline: Option<Instant>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Query::default(),
            body: None,
            deadline: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, path).body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query<Q: Into<Query>>(mut self, query: Q) -> Self {
        self.query = query.into();
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the deadline relative to now.
    ///
    /// A timeout too large to represent as an instant leaves the request
    /// without a deadline.
    pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::Method;
    use serde_json::json;
    use tokio::time::Instant;

    use crate::{ApiRequest, Query};

    #[test]
    fn query_from_array_keeps_order() {
        let query: Query = [("page", "2"), ("per_page", "50")].into();
        assert_eq!(
            query.pairs(),
            &[
                ("page".to_owned(), "2".to_owned()),
                ("per_page".to_owned(), "50".to_owned())
            ]
        );
    }

    #[test]
    fn unit_is_empty_query() {
        let query: Query = ().into();
        assert!(query.is_empty());
    }

    #[test]
    fn request_constructors() {
        let get = ApiRequest::get("projects").query([("query", "Main St")]);
        assert_eq!(get.method, Method::GET);
        assert!(get.body.is_none());
        assert_eq!(get.query.pairs().len(), 1);

        let put = ApiRequest::put("projects/1/notepad", json!({"notepad": "x"}));
        assert_eq!(put.method, Method::PUT);
        assert_eq!(put.body, Some(json!({"notepad": "x"})));

        let delete = ApiRequest::delete("projects/1");
        assert_eq!(delete.method, Method::DELETE);
        assert!(delete.deadline.is_none());
    }

    #[test]
    fn huge_timeout_leaves_deadline_unset() {
        let request = ApiRequest::get("projects").timeout(Duration::MAX);
        assert!(request.deadline.is_none());

        let before = Instant::now();
        let bounded = ApiRequest::get("projects").timeout(Duration::from_secs(5));
        let deadline = bounded.deadline.expect("finite timeout must set a deadline");
        assert!(deadline >= before + Duration::from_secs(5));
    }
}
