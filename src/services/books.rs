//! Catalog management service

use crate::{
    config::CatalogConfig,
    error::{AppError, AppResult},
    models::{
        book::{Book, BookPage, BookStatus, CreateBook, UpdateBook},
        filter::BookQuery,
        pagination::Pagination,
    },
    repository::{books::DUPLICATE_ISBN, Repository},
};

#[derive(Clone)]
pub struct BooksService {
    repository: Repository,
    config: CatalogConfig,
}

impl BooksService {
    pub fn new(repository: Repository, config: CatalogConfig) -> Self {
        Self { repository, config }
    }

    /// List books matching the query, one page at a time
    #[tracing::instrument(skip(self))]
    pub async fn list_books(&self, query: &BookQuery) -> AppResult<BookPage> {
        let filter = query.normalize(self.config.default_limit, self.config.max_limit);
        let (data, total) = self
            .repository
            .books_list(&filter, self.config.show_deleted)
            .await?;

        Ok(BookPage {
            data,
            meta: Pagination::new(filter.page, filter.limit, total),
        })
    }

    /// Get a book by ID
    pub async fn get_book(&self, id: i64) -> AppResult<Book> {
        self.repository
            .books_get_by_id(id, self.config.show_deleted)
            .await
    }

    /// Get an active book by exact ISBN
    pub async fn get_book_by_isbn(&self, isbn: &str) -> AppResult<Book> {
        // Stored ISBNs never contain NUL
        if isbn.contains('\0') {
            return Err(AppError::NotFound(format!("Book with ISBN {} not found", isbn.escape_default())));
        }
        self.repository.books_get_by_isbn(isbn).await
    }

    /// Create a new book. The ISBN must not be held by another active book.
    #[tracing::instrument(skip(self, data), fields(isbn = %data.isbn))]
    pub async fn create_book(&self, data: CreateBook) -> AppResult<Book> {
        let status = data.validate_new()?;

        if self.repository.books_isbn_exists(&data.isbn, None).await? {
            return Err(AppError::Conflict(DUPLICATE_ISBN.to_string()));
        }

        let book = self.repository.books_create(&data, status).await?;
        tracing::info!(id = book.id, "Book created");
        Ok(book)
    }

    /// Merge a partial update into an existing book
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_book(&self, id: i64, patch: UpdateBook) -> AppResult<Book> {
        let mut book = self.repository.books_get_by_id(id, false).await?;
        let current_isbn = book.isbn.clone();

        patch.apply_to(&mut book)?;

        // Keeping its own ISBN never conflicts; only a changed one is checked
        if let Some(isbn) = patch.changed_isbn(&current_isbn) {
            if self.repository.books_isbn_exists(isbn, Some(id)).await? {
                return Err(AppError::Conflict(DUPLICATE_ISBN.to_string()));
            }
        }

        self.repository.books_update(&book).await
    }

    /// Set the circulation status of a book
    #[tracing::instrument(skip(self))]
    pub async fn set_status(&self, id: i64, status: BookStatus) -> AppResult<Book> {
        self.repository.books_update_status(id, status).await
    }

    /// Delete a book
    #[tracing::instrument(skip(self))]
    pub async fn delete_book(&self, id: i64) -> AppResult<()> {
        self.repository.books_delete(id).await?;
        tracing::info!("Book deleted");
        Ok(())
    }
}
