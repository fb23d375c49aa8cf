//! Data models for the library catalog

pub mod book;
pub mod claims;
pub mod filter;
pub mod pagination;

// Re-export commonly used types
pub use book::{Book, BookPage, BookStatus, CreateBook, UpdateBook, UpdateBookStatus};
pub use claims::{Claims, UserRole};
pub use filter::{BookFilter, BookQuery};
pub use pagination::Pagination;
