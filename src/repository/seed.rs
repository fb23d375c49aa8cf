//! Sample catalog data inserted at startup when `database.seed` is on

use chrono::NaiveDate;

use super::Repository;
use crate::{
    error::AppResult,
    models::book::{BookStatus, CreateBook},
};

#[allow(clippy::too_many_arguments)]
fn sample(
    title: &str,
    author: &str,
    isbn: &str,
    description: &str,
    category: &str,
    total_pages: i32,
    publisher: &str,
    published_at: Option<NaiveDate>,
    status: BookStatus,
) -> CreateBook {
    CreateBook {
        title: title.to_string(),
        author: author.to_string(),
        isbn: isbn.to_string(),
        description: Some(description.to_string()),
        category: Some(category.to_string()),
        total_pages,
        publisher: Some(publisher.to_string()),
        published_at,
        status: Some(status.to_string()),
    }
}

pub fn sample_books() -> Vec<CreateBook> {
    vec![
        sample(
            "The Great Gatsby",
            "F. Scott Fitzgerald",
            "978-0743273565",
            "A classic novel of the Jazz Age",
            "Fiction",
            180,
            "Scribner",
            NaiveDate::from_ymd_opt(1925, 4, 10),
            BookStatus::Available,
        ),
        sample(
            "To Kill a Mockingbird",
            "Harper Lee",
            "978-0061120084",
            "A novel about racial inequality",
            "Fiction",
            281,
            "J.B. Lippincott & Co.",
            NaiveDate::from_ymd_opt(1960, 7, 11),
            BookStatus::Available,
        ),
        sample(
            "1984",
            "George Orwell",
            "978-0452284234",
            "Dystopian social science fiction",
            "Science Fiction",
            328,
            "Secker & Warburg",
            NaiveDate::from_ymd_opt(1949, 6, 8),
            BookStatus::Borrowed,
        ),
    ]
}

impl Repository {
    /// Insert the sample books whose ISBN is not already taken. Returns how many were inserted.
    pub async fn seed_books(&self) -> AppResult<usize> {
        let mut inserted = 0;
        for book in sample_books() {
            if self.books_isbn_exists(&book.isbn, None).await? {
                tracing::debug!(isbn = %book.isbn, "Seed book already present");
                continue;
            }
            let status = book.validate_new()?;
            match self.books_create(&book, status).await {
                Ok(_) => inserted += 1,
                Err(e) => tracing::warn!(isbn = %book.isbn, "Failed to seed book: {}", e),
            }
        }
        tracing::info!("Database seeding completed ({} inserted)", inserted);
        Ok(inserted)
    }
}
