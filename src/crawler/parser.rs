//! Article API response parser
//!
//! This module turns a response body shaped as
//! `{"data": {"articles": [{"id", "slug", "mainSection": {"path"}}, ...]}}`
//! into item records. Individual articles are never rejected here: a record
//! with missing fields is kept and fails later, when its identifier is built.

use serde_json::Value;
use thiserror::Error;

/// Error building the identifier of a single article
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("article {article} has no {field}")]
    MissingField {
        article: String,
        field: &'static str,
    },
}

/// Why a response body could not be read as an article page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("body is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("unexpected response shape: {0}")]
    UnexpectedShape(&'static str),
}

/// One article as listed by the API
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemRecord {
    /// Numeric article id, kept as text
    pub article_id: Option<String>,

    /// URL slug of the article
    pub slug: Option<String>,

    /// Path of the article's main section; doubles as its category
    pub section_path: Option<String>,
}

impl ItemRecord {
    pub fn new(article_id: &str, slug: &str, section_path: &str) -> Self {
        Self {
            article_id: Some(article_id.to_string()),
            slug: Some(slug.to_string()),
            section_path: Some(section_path.to_string()),
        }
    }

    /// Category key used for statistics
    pub fn category(&self) -> Option<&str> {
        self.section_path.as_deref()
    }

    /// Builds `{base}/{section}/{slug}-{id}`
    pub fn identifier(&self, base: &str) -> Result<String, RecordError> {
        let article = self.article_id.clone().unwrap_or_else(|| "?".to_string());
        let missing = |field| RecordError::MissingField {
            article: article.clone(),
            field,
        };

        let section = self.section_path.as_deref().ok_or_else(|| missing("mainSection.path"))?;
        let slug = self.slug.as_deref().ok_or_else(|| missing("slug"))?;
        let id = self.article_id.as_deref().ok_or_else(|| missing("id"))?;

        Ok(format!(
            "{}/{}/{}-{}",
            base.trim_end_matches('/'),
            section,
            slug,
            id
        ))
    }

    /// Reads one entry of the `articles` array
    pub fn from_json(value: &Value) -> Self {
        let article_id = match value.get("id") {
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::String(s)) => non_empty(s),
            _ => None,
        };
        let slug = value.get("slug").and_then(Value::as_str).and_then(non_empty);
        let section_path = value
            .get("mainSection")
            .and_then(|section| section.get("path"))
            .and_then(Value::as_str)
            .and_then(non_empty);

        Self {
            article_id,
            slug,
            section_path,
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// Parses a full response body into the articles of one page
///
/// A missing or null `data` / `articles` is an empty page. Anything that is
/// not an object at the top, or has the wrong type at either level, is an
/// unexpected shape.
pub fn parse_page(body: &str) -> Result<Vec<ItemRecord>, ParseError> {
    let root: Value =
        serde_json::from_str(body).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    if !root.is_object() {
        return Err(ParseError::UnexpectedShape("top level is not an object"));
    }

    let data = match root.get("data") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(data @ Value::Object(_)) => data,
        Some(_) => return Err(ParseError::UnexpectedShape("data is not an object")),
    };

    match data.get("articles") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(articles)) => Ok(articles.iter().map(ItemRecord::from_json).collect()),
        Some(_) => Err(ParseError::UnexpectedShape("articles is not an array")),
    }
}
