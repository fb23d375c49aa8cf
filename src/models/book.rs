//! Book (catalog record) model and request payloads.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use validator::Validate;

use super::pagination::Pagination;
use crate::error::{AppError, AppResult};

pub const INVALID_STATUS_MESSAGE: &str =
    "Invalid status. Must be: available, borrowed, or maintenance";

/// Circulation status of a book
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    #[default]
    Available,
    Borrowed,
    Maintenance,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "available",
            BookStatus::Borrowed => "borrowed",
            BookStatus::Maintenance => "maintenance",
        }
    }

    /// Parse an optional raw status. Missing or blank means "no status given".
    pub fn parse_optional(raw: Option<&str>) -> AppResult<Option<Self>> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some(s) => s
                .parse()
                .map(Some)
                .map_err(|_| AppError::Validation(INVALID_STATUS_MESSAGE.to_string())),
        }
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(BookStatus::Available),
            "borrowed" => Ok(BookStatus::Borrowed),
            "maintenance" => Ok(BookStatus::Maintenance),
            _ => Err(format!("Invalid book status: {}", s)),
        }
    }
}

// Stored as TEXT, constrained by a CHECK in the schema
impl sqlx::Type<Postgres> for BookStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for BookStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as Decode<Postgres>>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BookStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

/// Accepts a plain `YYYY-MM-DD` date or an RFC 3339 timestamp, keeping the date as written.
fn flexible_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.date_naive()))
            .map(Some)
            .map_err(|_| {
                serde::de::Error::custom(format!(
                    "invalid date `{}`, expected YYYY-MM-DD or an RFC 3339 timestamp",
                    s
                ))
            }),
    }
}

/// Catalog record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub total_pages: i32,
    pub publisher: Option<String>,
    /// Publication date
    #[serde(default, alias = "publisher_at", deserialize_with = "flexible_date")]
    pub published_at: Option<NaiveDate>,
    pub status: BookStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set when the book has been deleted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Create book request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Title is required (max 255 characters)"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Author is required (max 255 characters)"))]
    pub author: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 20, message = "ISBN is required (max 20 characters)"))]
    pub isbn: String,
    pub description: Option<String>,
    #[validate(length(max = 100, message = "Category must be at most 100 characters"))]
    pub category: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "Total pages cannot be negative"))]
    pub total_pages: i32,
    #[validate(length(max = 255, message = "Publisher must be at most 255 characters"))]
    pub publisher: Option<String>,
    #[serde(default, alias = "publisher_at", deserialize_with = "flexible_date")]
    pub published_at: Option<NaiveDate>,
    /// Defaults to `available`
    pub status: Option<String>,
}

impl CreateBook {
    /// Run field validation and resolve the initial status
    pub fn validate_new(&self) -> AppResult<BookStatus> {
        self.validate()?;
        reject_nul(&[
            ("title", Some(self.title.as_str())),
            ("author", Some(self.author.as_str())),
            ("isbn", Some(self.isbn.as_str())),
            ("description", self.description.as_deref()),
            ("category", self.category.as_deref()),
            ("publisher", self.publisher.as_deref()),
        ])?;
        Ok(BookStatus::parse_optional(self.status.as_deref())?.unwrap_or_default())
    }
}

/// Partial update request. Only non-empty fields overwrite stored values.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(max = 255, message = "Title must be at most 255 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 255, message = "Author must be at most 255 characters"))]
    pub author: Option<String>,
    #[validate(length(max = 20, message = "ISBN must be at most 20 characters"))]
    pub isbn: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 100, message = "Category must be at most 100 characters"))]
    pub category: Option<String>,
    #[validate(range(min = 0, message = "Total pages cannot be negative"))]
    pub total_pages: Option<i32>,
    #[validate(length(max = 255, message = "Publisher must be at most 255 characters"))]
    pub publisher: Option<String>,
    #[serde(default, alias = "publisher_at", deserialize_with = "flexible_date")]
    pub published_at: Option<NaiveDate>,
    pub status: Option<String>,
}

/// Postgres text cannot hold NUL, so it is a client error rather than a storage one
fn reject_nul(fields: &[(&str, Option<&str>)]) -> AppResult<()> {
    match fields
        .iter()
        .find(|(_, value)| value.is_some_and(|v| v.contains('\0')))
    {
        Some((name, _)) => Err(AppError::Validation(format!(
            "{}: must not contain NUL characters",
            name
        ))),
        None => Ok(()),
    }
}

fn provided(value: &Option<String>) -> Option<&String> {
    value.as_ref().filter(|s| !s.is_empty())
}

impl UpdateBook {
    /// New ISBN carried by this patch, if it differs from `current`
    pub fn changed_isbn(&self, current: &str) -> Option<&str> {
        provided(&self.isbn)
            .map(String::as_str)
            .filter(|isbn| *isbn != current)
    }

    /// Merge this patch into `book`. Validation happens before any field is touched.
    pub fn apply_to(&self, book: &mut Book) -> AppResult<()> {
        self.validate()?;
        reject_nul(&[
            ("title", self.title.as_deref()),
            ("author", self.author.as_deref()),
            ("isbn", self.isbn.as_deref()),
            ("description", self.description.as_deref()),
            ("category", self.category.as_deref()),
            ("publisher", self.publisher.as_deref()),
        ])?;
        let status = BookStatus::parse_optional(self.status.as_deref())?;

        if let Some(title) = provided(&self.title) {
            book.title = title.clone();
        }
        if let Some(author) = provided(&self.author) {
            book.author = author.clone();
        }
        if let Some(isbn) = provided(&self.isbn) {
            book.isbn = isbn.clone();
        }
        if let Some(description) = provided(&self.description) {
            book.description = Some(description.clone());
        }
        if let Some(category) = provided(&self.category) {
            book.category = Some(category.clone());
        }
        if let Some(pages) = self.total_pages.filter(|p| *p > 0) {
            book.total_pages = pages;
        }
        if let Some(publisher) = provided(&self.publisher) {
            book.publisher = Some(publisher.clone());
        }
        if let Some(date) = self.published_at {
            book.published_at = Some(date);
        }
        if let Some(status) = status {
            book.status = status;
        }
        Ok(())
    }
}

/// Set status request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateBookStatus {
    #[serde(default)]
    pub status: String,
}

impl UpdateBookStatus {
    pub fn parse(&self) -> AppResult<BookStatus> {
        self.status
            .parse()
            .map_err(|_| AppError::Validation(INVALID_STATUS_MESSAGE.to_string()))
    }
}

/// Set status response
#[derive(Debug, Serialize, ToSchema)]
pub struct BookStatusResponse {
    pub message: String,
    pub status: BookStatus,
}

/// One page of books with its pagination metadata
#[derive(Debug, Serialize, ToSchema)]
pub struct BookPage {
    pub data: Vec<Book>,
    pub meta: Pagination,
}
