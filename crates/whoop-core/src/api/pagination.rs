//! Cursor pagination for the v1 collection endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The paginated record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Cycle,
    Recovery,
    Sleep,
    Workout,
}

impl Collection {
    /// Path relative to the API base URL.
    pub fn path(self) -> &'static str {
        match self {
            Collection::Cycle => "v1/cycle",
            Collection::Recovery => "v1/recovery",
            Collection::Sleep => "v1/activity/sleep",
            Collection::Workout => "v1/activity/workout",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Collection::Cycle => "cycle collection",
            Collection::Recovery => "recovery collection",
            Collection::Sleep => "sleep collection",
            Collection::Workout => "workout collection",
        }
    }
}

/// One page of a collection response.
#[derive(Debug, Deserialize)]
pub struct Page {
    pub records: Vec<Value>,
    #[serde(default)]
    pub next_token: Option<String>,
}

impl Page {
    /// Cursor for the next page. An empty token also ends the walk.
    pub fn next_cursor(&self) -> Option<&str> {
        self.next_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Query string for a collection request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageQuery {
    pub start: String,
    pub end: String,
    pub limit: u32,
    #[serde(rename = "nextToken", skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl PageQuery {
    pub fn new(start: String, end: String, limit: u32) -> Self {
        Self {
            start,
            end,
            limit,
            next_token: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_paths() {
        assert_eq!(Collection::Cycle.path(), "v1/cycle");
        assert_eq!(Collection::Recovery.path(), "v1/recovery");
        assert_eq!(Collection::Sleep.path(), "v1/activity/sleep");
        assert_eq!(Collection::Workout.path(), "v1/activity/workout");
    }

    #[test]
    fn test_page_cursor() {
        let page: Page =
            serde_json::from_str(r#"{"records": [{"id": 1}], "next_token": "abc"}"#).unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.next_cursor(), Some("abc"));

        let last: Page = serde_json::from_str(r#"{"records": []}"#).unwrap();
        assert_eq!(last.next_cursor(), None);

        let empty: Page = serde_json::from_str(r#"{"records": [], "next_token": ""}"#).unwrap();
        assert_eq!(empty.next_cursor(), None);

        let null: Page = serde_json::from_str(r#"{"records": [], "next_token": null}"#).unwrap();
        assert_eq!(null.next_cursor(), None);
    }

    #[test]
    fn test_page_requires_records() {
        assert!(serde_json::from_str::<Page>(r#"{"next_token": "abc"}"#).is_err());
    }

    #[test]
    fn test_query_serialization() {
        let mut query = PageQuery::new(
            "2024-01-01T00:00:00.000Z".into(),
            "2024-01-08T00:00:00.000Z".into(),
            25,
        );
        let value = serde_json::to_value(&query).unwrap();
        assert!(value.get("nextToken").is_none());

        query.next_token = Some("cursor".into());
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value["nextToken"], "cursor");
        assert_eq!(value["limit"], 25);
    }
}
