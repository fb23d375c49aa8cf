//! API integration tests
//!
//! Each test gets a fresh database with migrations applied.
//! Run with: DATABASE_URL=postgres://... cargo test

mod common;

use std::collections::HashSet;

use axum::http::{Method, StatusCode};
use serde_json::json;
use sqlx::PgPool;

use common::{request, TestApp};
use library_api::{
    models::{
        book::{BookStatus, CreateBook},
        claims::UserRole,
    },
    repository::Repository,
    AppError,
};

#[sqlx::test(migrations = "./migrations")]
async fn test_health_check(pool: PgPool) {
    let app = TestApp::new(pool);

    let (status, body) = app.get("/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.get("/api/v1/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unknown_route_is_json_404(pool: PgPool) {
    let app = TestApp::new(pool);

    let (status, body) = app.get("/api/v1/nothing-here").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Endpoint not found");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_book_lifecycle(pool: PgPool) {
    let app = TestApp::new(pool);

    let (status, created) = app
        .post_json(
            "/api/v1/books",
            json!({
                "title": "1984",
                "author": "George Orwell",
                "isbn": "978-0452284234",
                "category": "Science Fiction",
                "total_pages": 328,
                "published_at": "1949-06-08"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "available");
    assert_eq!(created["published_at"], "1949-06-08");
    let id = created["id"].as_i64().unwrap();
    assert!(id >= 1);

    let (status, page) = app.get("/api/v1/books?status=available").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["meta"]["total"], 1);
    assert_eq!(page["data"][0]["id"], id);

    let (status, body) = app
        .patch_json(&format!("/api/v1/books/{}/status", id), json!({ "status": "borrowed" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Book status updated successfully");
    assert_eq!(body["status"], "borrowed");

    let (status, fetched) = app.get(&format!("/api/v1/books/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["status"], "borrowed");

    let (status, page) = app.get("/api/v1/books?status=available").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["meta"]["total"], 0);
    assert_eq!(page["data"].as_array().unwrap().len(), 0);

    let (status, body) = app
        .post_json(
            "/api/v1/books",
            json!({ "title": "Another", "author": "Someone", "isbn": "978-0452284234" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "A book with this ISBN already exists");

    let (status, _) = app.delete(&format!("/api/v1/books/{}", id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/api/v1/books/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&format!("/api/v1/books/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_deleted_isbn_can_be_reused(pool: PgPool) {
    let app = TestApp::new(pool);

    let id = app.create_book("Dune", "Frank Herbert", "978-0441013593").await;
    let (status, _) = app.delete(&format!("/api/v1/books/{}", id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let again = app.create_book("Dune", "Frank Herbert", "978-0441013593").await;
    assert_ne!(again, id);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_show_deleted_exposes_soft_deleted_books(pool: PgPool) {
    let app = TestApp::with_config(pool, |config| config.catalog.show_deleted = true);

    let id = app.create_book("Emma", "Jane Austen", "978-0141439587").await;
    let (status, _) = app.delete(&format!("/api/v1/books/{}", id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, book) = app.get(&format!("/api/v1/books/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(book["deleted_at"].is_string());

    let (_, page) = app.get("/api/v1/books").await;
    assert_eq!(page["meta"]["total"], 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_pages_partition_the_result_set(pool: PgPool) {
    let app = TestApp::new(pool);

    let mut created = HashSet::new();
    for n in 0..7 {
        let id = app
            .create_book(&format!("Volume {}", n), "Series Author", &format!("ISBN-{:04}", n))
            .await;
        created.insert(id);
    }

    let mut seen = HashSet::new();
    let mut sizes = 0;
    for page in 1..=3 {
        let (status, body) = app.get(&format!("/api/v1/books?page={}&limit=3", page)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meta"]["total"], 7);
        assert_eq!(body["meta"]["total_page"], 3);
        assert_eq!(body["meta"]["page"], page);
        let data = body["data"].as_array().unwrap();
        sizes += data.len();
        for book in data {
            assert!(seen.insert(book["id"].as_i64().unwrap()), "book on two pages");
        }
    }
    assert_eq!(sizes, 7);
    assert_eq!(seen, created);

    // Newest first
    let (_, first) = app.get("/api/v1/books?limit=1").await;
    assert_eq!(first["data"][0]["id"].as_i64(), created.iter().max().copied());

    let (status, beyond) = app.get("/api/v1/books?page=9&limit=3").await;
    assert_eq!(status, StatusCode::OK);
    assert!(beyond["data"].as_array().unwrap().is_empty());
    assert_eq!(beyond["meta"]["total"], 7);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_invalid_paging_falls_back_to_defaults(pool: PgPool) {
    let app = TestApp::new(pool);
    app.create_book("Walden", "Henry David Thoreau", "978-0486284958").await;

    let (status, body) = app.get("/api/v1/books?page=0&limit=-5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["page"], 1);
    assert_eq!(body["meta"]["limit"], 10);

    let (status, body) = app.get("/api/v1/books?page=abc&limit=xyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["page"], 1);
    assert_eq!(body["meta"]["limit"], 10);

    let (_, body) = app.get("/api/v1/books?limit=5000").await;
    assert_eq!(body["meta"]["limit"], 100);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_empty_catalog_has_zero_pages(pool: PgPool) {
    let app = TestApp::new(pool);

    let (status, body) = app.get("/api/v1/books").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 0);
    assert_eq!(body["meta"]["total_page"], 0);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_search_is_case_insensitive(pool: PgPool) {
    let app = TestApp::new(pool);
    app.create_book("Animal Farm", "George Orwell", "978-0451526342").await;
    app.create_book("Brave New World", "Aldous Huxley", "978-0060850524").await;

    let (_, body) = app.get("/api/v1/books?search=ORWELL").await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "Animal Farm");

    let (_, body) = app.get("/api/v1/books?search=0060850524").await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["author"], "Aldous Huxley");

    // Wildcards are literal
    let (_, body) = app.get("/api/v1/books?search=%25").await;
    assert_eq!(body["meta"]["total"], 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_filters_combine(pool: PgPool) {
    let app = TestApp::new(pool);
    for (title, isbn, category) in [
        ("Foundation", "F-1", "Science Fiction"),
        ("Hyperion", "F-2", "Science Fiction"),
        ("Middlemarch", "F-3", "Fiction"),
    ] {
        let (status, _) = app
            .post_json(
                "/api/v1/books",
                json!({ "title": title, "author": "Various", "isbn": isbn, "category": category }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, body) = app.get("/api/v1/books?category=Science%20Fiction").await;
    assert_eq!(body["meta"]["total"], 2);

    let (_, body) = app
        .get("/api/v1/books?category=Science%20Fiction&search=hyper&status=available")
        .await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "Hyperion");

    let (status, body) = app.get("/api/v1/books?status=lost").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_get_by_isbn(pool: PgPool) {
    let app = TestApp::new(pool);
    let id = app.create_book("Ulysses", "James Joyce", "978-0679722762").await;

    let (status, body) = app.get("/api/v1/books/isbn/978-0679722762").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id);

    let (status, _) = app.get("/api/v1/books/isbn/000-0000000000").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_partial_update_keeps_unsupplied_fields(pool: PgPool) {
    let app = TestApp::new(pool);
    let (_, created) = app
        .post_json(
            "/api/v1/books",
            json!({
                "title": "Persuasion",
                "author": "Jane Austen",
                "isbn": "978-0141439686",
                "category": "Fiction",
                "total_pages": 249
            }),
        )
        .await;
    let id = created["id"].as_i64().unwrap();

    let (status, updated) = app
        .put_json(
            &format!("/api/v1/books/{}", id),
            json!({ "title": "Persuasion (Penguin Classics)", "author": "", "total_pages": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Persuasion (Penguin Classics)");
    assert_eq!(updated["author"], "Jane Austen");
    assert_eq!(updated["category"], "Fiction");
    assert_eq!(updated["total_pages"], 249);
    assert_eq!(updated["created_at"], created["created_at"]);

    let (status, patched) = app
        .patch_json(&format!("/api/v1/books/{}", id), json!({ "status": "maintenance" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["status"], "maintenance");
    assert_eq!(patched["title"], "Persuasion (Penguin Classics)");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_with_own_isbn_does_not_conflict(pool: PgPool) {
    let app = TestApp::new(pool);
    let id = app.create_book("Beloved", "Toni Morrison", "978-1400033416").await;

    let (status, body) = app
        .put_json(
            &format!("/api/v1/books/{}", id),
            json!({ "isbn": "978-1400033416", "title": "Beloved: A Novel" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isbn"], "978-1400033416");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_to_isbn_of_older_book_conflicts(pool: PgPool) {
    let app = TestApp::new(pool);
    let older = app.create_book("Lolita", "Vladimir Nabokov", "978-0679723165").await;
    let newer = app.create_book("Pale Fire", "Vladimir Nabokov", "978-0679723424").await;
    assert!(older < newer);

    let (status, body) = app
        .put_json(&format!("/api/v1/books/{}", newer), json!({ "isbn": "978-0679723165" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "A book with this ISBN already exists");

    let (_, unchanged) = app.get(&format!("/api/v1/books/{}", newer)).await;
    assert_eq!(unchanged["isbn"], "978-0679723424");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_missing_book_is_404(pool: PgPool) {
    let app = TestApp::new(pool);

    let (status, _) = app.put_json("/api/v1/books/4242", json!({ "title": "Ghost" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_malformed_id_is_400(pool: PgPool) {
    let app = TestApp::new(pool);

    for uri in ["/api/v1/books/abc", "/api/v1/books/0", "/api/v1/books/-3"] {
        let (status, body) = app.get(uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["message"], "Invalid book ID");
    }

    let (status, _) = app.delete("/api/v1/books/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_rejects_invalid_input(pool: PgPool) {
    let app = TestApp::new(pool);

    let (status, body) = app
        .post_json("/api/v1/books", json!({ "title": "Nameless" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("isbn"));

    let (status, _) = app
        .post_json(
            "/api/v1/books",
            json!({ "title": "T", "author": "A", "isbn": "I-1", "status": "lost" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_json(
            "/api/v1/books",
            json!({ "title": "T", "author": "A", "isbn": "I-2", "total_pages": -1 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(request(Method::POST, "/api/v1/books", None, None))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, page) = app.get("/api/v1/books").await;
    assert_eq!(page["meta"]["total"], 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_set_status_validation(pool: PgPool) {
    let app = TestApp::new(pool);
    let id = app.create_book("Hamlet", "William Shakespeare", "978-0743477123").await;

    let (status, _) = app
        .patch_json(&format!("/api/v1/books/{}/status", id), json!({ "status": "lost" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Status is checked before existence
    let (status, _) = app
        .patch_json("/api/v1/books/9999/status", json!({ "status": "lost" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .patch_json("/api/v1/books/9999/status", json!({ "status": "available" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, book) = app.get(&format!("/api/v1/books/{}", id)).await;
    assert_eq!(book["status"], "available");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_protected_writes_require_admin_token(pool: PgPool) {
    let app = TestApp::with_config(pool, |config| config.auth.protect_writes = true);
    let payload = json!({ "title": "Kafka on the Shore", "author": "Haruki Murakami", "isbn": "978-1400079278" });

    let (status, _) = app
        .send(request(Method::POST, "/api/v1/books", Some(payload.clone()), None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(request(Method::POST, "/api/v1/books", Some(payload.clone()), Some("not-a-jwt")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let user = app.token(UserRole::User);
    let (status, _) = app
        .send(request(Method::POST, "/api/v1/books", Some(payload.clone()), Some(&user)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = app.token(UserRole::Admin);
    let (status, _) = app
        .send(request(Method::POST, "/api/v1/books", Some(payload), Some(&admin)))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Reads stay open
    let (status, body) = app.get("/api/v1/books").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_auth_me_returns_claims(pool: PgPool) {
    let app = TestApp::new(pool);

    let (status, _) = app.get("/api/v1/auth/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = app.token(UserRole::Admin);
    let (status, body) = app
        .send(request(Method::GET, "/api/v1/auth/me", None, Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");
    assert_eq!(body["email"], "librarian@example.com");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_seed_is_idempotent(pool: PgPool) {
    let repository = Repository::new(pool.clone());
    assert_eq!(repository.seed_books().await.unwrap(), 3);
    assert_eq!(repository.seed_books().await.unwrap(), 0);

    let app = TestApp::new(pool);
    let (_, body) = app.get("/api/v1/books?status=borrowed").await;
    assert_eq!(body["meta"]["total"], 1);
    assert_eq!(body["data"][0]["title"], "1984");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_nul_characters_are_client_errors(pool: PgPool) {
    let app = TestApp::new(pool);
    let id = app.create_book("Crab Cannery", "John Steinbeck", "978-0140177381").await;

    let (status, body) = app.get("/api/v1/books?search=a%00b&category=%00").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 1);

    let (status, _) = app.get("/api/v1/books/isbn/978%000140177381").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .post_json(
            "/api/v1/books",
            json!({ "title": "a\u{0}b", "author": "Someone", "isbn": "NUL-1" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().starts_with("title"));

    let (status, _) = app
        .put_json(&format!("/api/v1/books/{}", id), json!({ "author": "\u{0}" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, book) = app.get(&format!("/api/v1/books/{}", id)).await;
    assert_eq!(book["author"], "John Steinbeck");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_malformed_query_string_uses_error_body(pool: PgPool) {
    let app = TestApp::new(pool);

    let (status, body) = app.get("/api/v1/books?page=1&page=2").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 18);
    assert_eq!(body["error"], "BadValue");
    assert!(body["message"].as_str().unwrap().starts_with("Invalid query string"));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_unique_index_reports_conflict(pool: PgPool) {
    let repository = Repository::new(pool);
    let book = CreateBook {
        title: "Middlemarch".to_string(),
        author: "George Eliot".to_string(),
        isbn: "978-0141439549".to_string(),
        ..CreateBook::default()
    };

    repository.books_create(&book, BookStatus::Available).await.unwrap();
    let err = repository
        .books_create(&book, BookStatus::Available)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(m) if m == "A book with this ISBN already exists"));

    let other = CreateBook {
        isbn: "978-0141439556".to_string(),
        ..book.clone()
    };
    let mut stored = repository.books_create(&other, BookStatus::Available).await.unwrap();
    stored.isbn = book.isbn.clone();
    let err = repository.books_update(&stored).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_concurrent_creates_with_same_isbn(pool: PgPool) {
    let app = TestApp::new(pool);

    let mut handles = Vec::new();
    for n in 0..16 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            app.post_json(
                "/api/v1/books",
                json!({ "title": format!("Copy {}", n), "author": "Racer", "isbn": "978-0000000001" }),
            )
            .await
            .0
        }));
    }

    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.unwrap());
    }

    let created = statuses.iter().filter(|s| **s == StatusCode::CREATED).count();
    let conflicts = statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count();
    assert_eq!(created, 1, "{statuses:?}");
    assert_eq!(conflicts, 15, "{statuses:?}");
}
