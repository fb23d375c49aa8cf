//! Books domain methods on Repository

use chrono::Utc;

use super::Repository;
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookStatus, CreateBook},
        filter::BookFilter,
    },
};

const BOOK_COLUMNS: &str = "id, title, author, isbn, description, category, total_pages, \
     publisher, published_at, status, created_at, updated_at, deleted_at";

pub const DUPLICATE_ISBN: &str = "A book with this ISBN already exists";

/// Escape LIKE wildcards so the search term matches literally
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Compose the WHERE clause for a filter. Returns the clause and its positional text arguments.
pub fn filter_conditions(filter: &BookFilter, include_deleted: bool) -> (String, Vec<String>) {
    let mut conditions = Vec::new();
    let mut args = Vec::new();

    if let Some(ref search) = filter.search {
        args.push(format!("%{}%", escape_like(search)));
        let idx = args.len();
        conditions.push(format!(
            "(title ILIKE ${idx} OR author ILIKE ${idx} OR isbn ILIKE ${idx})"
        ));
    }

    if let Some(ref status) = filter.status {
        args.push(status.clone());
        conditions.push(format!("status = ${}", args.len()));
    }

    if let Some(ref category) = filter.category {
        args.push(category.clone());
        conditions.push(format!("category = ${}", args.len()));
    }

    if !include_deleted {
        conditions.push("deleted_at IS NULL".to_string());
    }

    let clause = if conditions.is_empty() {
        "TRUE".to_string()
    } else {
        conditions.join(" AND ")
    };
    (clause, args)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Book {} not found", id))
}

impl Repository {
    /// Count the books matching `filter` and fetch the requested page, newest first
    pub async fn books_list(
        &self,
        filter: &BookFilter,
        include_deleted: bool,
    ) -> AppResult<(Vec<Book>, i64)> {
        let (where_clause, args) = filter_conditions(filter, include_deleted);

        let count_query = format!("SELECT COUNT(*) FROM books WHERE {}", where_clause);
        let mut count = sqlx::query_scalar::<_, i64>(&count_query);
        for arg in &args {
            count = count.bind(arg);
        }
        let total = count.fetch_one(&self.pool).await?;

        let select_query = format!(
            "SELECT {} FROM books WHERE {} ORDER BY created_at DESC, id DESC LIMIT ${} OFFSET ${}",
            BOOK_COLUMNS,
            where_clause,
            args.len() + 1,
            args.len() + 2
        );
        let mut select = sqlx::query_as::<_, Book>(&select_query);
        for arg in &args {
            select = select.bind(arg);
        }
        let books = select
            .bind(filter.limit)
            .bind(filter.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((books, total))
    }

    /// Get a book by ID
    pub async fn books_get_by_id(&self, id: i64, include_deleted: bool) -> AppResult<Book> {
        let query = format!(
            "SELECT {} FROM books WHERE id = $1 AND ($2::boolean OR deleted_at IS NULL)",
            BOOK_COLUMNS
        );
        sqlx::query_as::<_, Book>(&query)
            .bind(id)
            .bind(include_deleted)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Get an active book by exact ISBN
    pub async fn books_get_by_isbn(&self, isbn: &str) -> AppResult<Book> {
        let query = format!(
            "SELECT {} FROM books WHERE isbn = $1 AND deleted_at IS NULL",
            BOOK_COLUMNS
        );
        sqlx::query_as::<_, Book>(&query)
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with ISBN {} not found", isbn)))
    }

    /// Whether another active book already holds `isbn`
    pub async fn books_isbn_exists(&self, isbn: &str, exclude_id: Option<i64>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND id <> $2 AND deleted_at IS NULL)",
            )
            .bind(isbn)
            .bind(id)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND deleted_at IS NULL)",
            )
            .bind(isbn)
            .fetch_one(&self.pool)
            .await?
        };

        Ok(exists)
    }

    /// Insert a new book
    pub async fn books_create(&self, data: &CreateBook, status: BookStatus) -> AppResult<Book> {
        let now = Utc::now();
        let query = format!(
            r#"
            INSERT INTO books (
                title, author, isbn, description, category, total_pages,
                publisher, published_at, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );

        sqlx::query_as::<_, Book>(&query)
            .bind(&data.title)
            .bind(&data.author)
            .bind(&data.isbn)
            .bind(non_empty(&data.description))
            .bind(non_empty(&data.category))
            .bind(data.total_pages)
            .bind(non_empty(&data.publisher))
            .bind(data.published_at)
            .bind(status)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::unique_violation_as_conflict(e, DUPLICATE_ISBN))
    }

    /// Persist every mutable field of `book` and refresh its update time
    pub async fn books_update(&self, book: &Book) -> AppResult<Book> {
        let query = format!(
            r#"
            UPDATE books SET
                title = $1,
                author = $2,
                isbn = $3,
                description = $4,
                category = $5,
                total_pages = $6,
                publisher = $7,
                published_at = $8,
                status = $9,
                updated_at = $10
            WHERE id = $11 AND deleted_at IS NULL
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );

        sqlx::query_as::<_, Book>(&query)
            .bind(&book.title)
            .bind(&book.author)
            .bind(&book.isbn)
            .bind(&book.description)
            .bind(&book.category)
            .bind(book.total_pages)
            .bind(&book.publisher)
            .bind(book.published_at)
            .bind(book.status)
            .bind(Utc::now())
            .bind(book.id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::unique_violation_as_conflict(e, DUPLICATE_ISBN))?
            .ok_or_else(|| not_found(book.id))
    }

    /// Change only the status of an active book
    pub async fn books_update_status(&self, id: i64, status: BookStatus) -> AppResult<Book> {
        let query = format!(
            "UPDATE books SET status = $1, updated_at = $2 WHERE id = $3 AND deleted_at IS NULL RETURNING {}",
            BOOK_COLUMNS
        );
        sqlx::query_as::<_, Book>(&query)
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Soft delete: stamp `deleted_at` on an active book
    pub async fn books_delete(&self, id: i64) -> AppResult<()> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE books SET deleted_at = $1, updated_at = $1 WHERE id = $2 AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}
