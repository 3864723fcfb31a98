//! Endpoint helpers for projects, photos, labels, comments, users and tags.
//!
//! Each helper validates its arguments, builds the path, query and body the
//! API expects, and returns the response as untyped JSON. Validation failures
//! never reach the network.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{json, Value};

use crate::{transport::Transport, CompanyCamClient, CompanyCamError, Query, Result};

const MAX_SEARCH_LEN: usize = 200;
const MAX_COMMENT_LEN: usize = 5_000;
const MAX_NOTEPAD_LEN: usize = 10_000;
const MAX_PER_PAGE: u32 = 100;

/// Pagination for list endpoints.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Page {
    /// One-based page number.
    pub page: u32,
    /// Items per page, `1..=100`.
    pub per_page: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 25,
        }
    }
}

impl Page {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }

    /// First page with the maximum page size.
    pub fn wide() -> Self {
        Self::new(1, MAX_PER_PAGE)
    }

    /// The page after this one, same size.
    pub fn next(self) -> Self {
        Self::new(self.page.saturating_add(1), self.per_page)
    }

    fn validate(&self) -> Result<()> {
        if self.page == 0 {
            return Err(invalid("page must be at least 1"));
        }
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(invalid(format!(
                "per_page must be between 1 and {MAX_PER_PAGE}, got {}",
                self.per_page
            )));
        }
        Ok(())
    }

    fn push_to(&self, query: &mut Query) {
        query.push("page", self.page.to_string());
        query.push("per_page", self.per_page.to_string());
    }
}

/// Optional filters for [`CompanyCamClient::list_project_photos`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhotoFilter {
    /// Earliest capture date, ISO 8601 (`2025-01-15` or RFC 3339).
    pub start_date: Option<String>,
    /// Latest capture date, same formats as `start_date`.
    pub end_date: Option<String>,
    /// Photographer user ID.
    pub user_id: Option<String>,
    pub tag_id: Option<String>,
}

impl PhotoFilter {
    fn push_to(&self, query: &mut Query) -> Result<()> {
        if let Some(date) = non_blank(&self.start_date) {
            query.push("start_date", iso_to_unix(date)?.to_string());
        }
        if let Some(date) = non_blank(&self.end_date) {
            query.push("end_date", iso_to_unix(date)?.to_string());
        }
        if let Some(user_id) = non_blank(&self.user_id) {
            query.push("user_ids[]", user_id);
        }
        if let Some(tag_id) = non_blank(&self.tag_id) {
            query.push("tag_ids[]", tag_id);
        }
        Ok(())
    }
}

/// Converts an ISO 8601 date or date-time to Unix seconds.
///
/// Accepts `YYYY-MM-DD` (midnight UTC), RFC 3339 with `Z` or an offset, and
/// date-times without offset (read as UTC). The date and time may be joined
/// by `T` or a space, and fractional seconds are truncated.
pub fn iso_to_unix(input: &str) -> Result<i64> {
    let input = input.trim();
    if let Ok(date_time) = DateTime::parse_from_rfc3339(input) {
        return Ok(date_time.timestamp());
    }
    if let Ok(date_time) = DateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(date_time.timestamp());
    }
    // `%.f` also matches when no fraction is present.
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(naive.and_utc().timestamp());
        }
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp())
        .ok_or_else(|| invalid(format!("'{input}' is not an ISO 8601 date")))
}

impl<T: Transport> CompanyCamClient<T> {
    /// Searches projects by name or first address line.
    pub async fn search_projects(&self, query: &str, page: Page) -> Result<Value> {
        let query = query.trim();
        if query.is_empty() || query.chars().count() > MAX_SEARCH_LEN {
            return Err(invalid(format!(
                "search query must be 1 to {MAX_SEARCH_LEN} characters"
            )));
        }
        page.validate()?;

        let mut params = Query::new().with("query", query);
        page.push_to(&mut params);
        self.get("projects", params).await
    }

    pub async fn get_project(&self, project_id: &str) -> Result<Value> {
        let id = segment("project_id", project_id)?;
        self.get(&format!("projects/{id}"), ()).await
    }

    /// Lists photos of a project, optionally filtered by date range, photographer or tag.
    pub async fn list_project_photos(
        &self,
        project_id: &str,
        filter: &PhotoFilter,
        page: Page,
    ) -> Result<Value> {
        let id = segment("project_id", project_id)?;
        page.validate()?;

        let mut params = Query::new();
        page.push_to(&mut params);
        filter.push_to(&mut params)?;
        self.get(&format!("projects/{id}/photos"), params).await
    }

    pub async fn get_photo(&self, photo_id: &str) -> Result<Value> {
        let id = segment("photo_id", photo_id)?;
        self.get(&format!("photos/{id}"), ()).await
    }

    /// Lists labels on a project. Labels are project-level, unlike photo tags.
    pub async fn list_project_labels(&self, project_id: &str) -> Result<Value> {
        let id = segment("project_id", project_id)?;
        self.get(&format!("projects/{id}/labels"), ()).await
    }

    pub async fn list_project_comments(&self, project_id: &str, page: Page) -> Result<Value> {
        let id = segment("project_id", project_id)?;
        page.validate()?;

        let mut params = Query::new();
        page.push_to(&mut params);
        self.get(&format!("projects/{id}/comments"), params).await
    }

    pub async fn list_users(&self, page: Page) -> Result<Value> {
        page.validate()?;
        let mut params = Query::new();
        page.push_to(&mut params);
        self.get("users", params).await
    }

    /// Lists company-wide photo tags.
    pub async fn list_tags(&self, page: Page) -> Result<Value> {
        page.validate()?;
        let mut params = Query::new();
        page.push_to(&mut params);
        self.get("tags", params).await
    }

    pub async fn add_project_comment(&self, project_id: &str, content: &str) -> Result<Value> {
        let id = segment("project_id", project_id)?;
        let content = comment_content(content)?;
        self.post(
            &format!("projects/{id}/comments"),
            &json!({ "comment": { "content": content } }),
        )
        .await
    }

    pub async fn add_photo_comment(&self, photo_id: &str, content: &str) -> Result<Value> {
        let id = segment("photo_id", photo_id)?;
        let content = comment_content(content)?;
        self.post(
            &format!("photos/{id}/comments"),
            &json!({ "comment": { "content": content } }),
        )
        .await
    }

    /// Adds tags to a photo. Unknown tags are created company-wide by the API.
    pub async fn add_photo_tags<S: AsRef<str>>(&self, photo_id: &str, tags: &[S]) -> Result<Value> {
        let id = segment("photo_id", photo_id)?;
        let tags = names("tags", tags)?;
        self.post(
            &format!("photos/{id}/tags"),
            &json!({ "tag": { "display_values": tags } }),
        )
        .await
    }

    pub async fn add_project_labels<S: AsRef<str>>(
        &self,
        project_id: &str,
        labels: &[S],
    ) -> Result<Value> {
        let id = segment("project_id", project_id)?;
        let labels = names("labels", labels)?;
        self.post(
            &format!("projects/{id}/labels"),
            &json!({ "project": { "labels": labels } }),
        )
        .await
    }

    /// Replaces the whole notepad of a project. Read it first to append.
    pub async fn update_project_notepad(&self, project_id: &str, notepad: &str) -> Result<Value> {
        let id = segment("project_id", project_id)?;
        let notepad = notepad.trim();
        if notepad.chars().count() > MAX_NOTEPAD_LEN {
            return Err(invalid(format!(
                "notepad must be at most {MAX_NOTEPAD_LEN} characters"
            )));
        }
        self.put(
            &format!("projects/{id}/notepad"),
            &json!({ "notepad": notepad }),
        )
        .await
    }
}

fn invalid(message: impl Into<String>) -> CompanyCamError {
    CompanyCamError::InvalidInput(message.into())
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Trims an ID and percent-encodes it as a single path segment.
fn segment(name: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid(format!("{name} must not be empty")));
    }
    Ok(urlencoding::encode(value).into_owned())
}

fn comment_content(content: &str) -> Result<&str> {
    let content = content.trim();
    if content.is_empty() || content.chars().count() > MAX_COMMENT_LEN {
        return Err(invalid(format!(
            "comment must be 1 to {MAX_COMMENT_LEN} characters"
        )));
    }
    Ok(content)
}

fn names<S: AsRef<str>>(kind: &str, values: &[S]) -> Result<Vec<String>> {
    let names: Vec<String> = values
        .iter()
        .map(|value| value.as_ref().trim())
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .collect();
    if names.is_empty() {
        return Err(invalid(format!("at least one of {kind} is required")));
    }
    Ok(names)
}
