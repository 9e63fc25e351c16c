//! Inventory integration tests.
//!
//! Run against a live Postgres with: DATABASE_URL=... cargo test -- --ignored

use chrono::{Duration, Utc};
use sqlx::postgres::PgPoolOptions;

use lectern_core::{
    error::AppError,
    models::{
        book::{CreateBook, UpdateBook},
        copy::{CopyStatus, CopyStatusUpdate},
        loan::{CreateLoan, UpdateLoan},
    },
    repository::Repository,
};

async fn setup() -> Repository {
    let url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for integration tests");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await
        .expect("Failed to connect to database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    Repository::new(pool)
}

fn book(title: &str, quantity: i32) -> CreateBook {
    CreateBook {
        title: title.to_string(),
        author: "Frank Herbert".to_string(),
        category: Some("Science fiction".to_string()),
        publisher: Some("Chilton Books".to_string()),
        publication_year: Some(1965),
        description: None,
        quantity,
    }
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_create_allocates_available_copies() {
    let repo = setup().await;

    let created = repo.books.create(&book("Dune", 3)).await.expect("create");
    assert_eq!(created.copies.len(), 3);
    assert_eq!(created.available_copies(), 3);

    let added = repo.books.add_copies(created.id, 2).await.expect("add copies");
    assert_eq!(added.len(), 2);

    let fetched = repo.books.get_by_id(created.id).await.expect("get");
    assert_eq!(fetched.copies.len(), 5);
    assert_eq!(fetched.available_copies(), 5);
}

#[tokio::test]
#[ignore]
async fn test_create_rejects_non_positive_quantity() {
    let repo = setup().await;

    for quantity in [0, -3] {
        let err = repo.books.create(&book("Dune Messiah", quantity)).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidQuantity(_)), "got {:?}", err);
    }
}

#[tokio::test]
#[ignore]
async fn test_borrowed_copy_only_released_by_loan_return() {
    let repo = setup().await;

    let created = repo.books.create(&book("Children of Dune", 1)).await.expect("create");
    let copy_id = created.copies[0].id;

    let outcome = repo
        .books
        .update_copy_status(copy_id, CopyStatus::Borrowed)
        .await
        .expect("borrow");
    assert!(matches!(outcome, CopyStatusUpdate::Updated(_)));

    let err = repo
        .books
        .update_copy_status(copy_id, CopyStatus::Available)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidStatusTransition(_)), "got {:?}", err);

    // Stored status must be untouched by the rejected write
    let copy = repo.books.get_copy(copy_id).await.expect("get copy");
    assert_eq!(CopyStatus::from(copy.status), CopyStatus::Borrowed);
}

#[tokio::test]
#[ignore]
async fn test_same_status_write_reports_no_change() {
    let repo = setup().await;

    let created = repo.books.create(&book("God Emperor of Dune", 1)).await.expect("create");
    let copy_id = created.copies[0].id;

    let outcome = repo
        .books
        .update_copy_status(copy_id, CopyStatus::Available)
        .await
        .expect("no-op write");
    assert!(matches!(outcome, CopyStatusUpdate::NoChange(_)));

    let copy = repo.books.get_copy(copy_id).await.expect("get copy");
    assert_eq!(CopyStatus::from(copy.status), CopyStatus::Available);
}

#[tokio::test]
#[ignore]
async fn test_shrink_draws_only_from_available_pool() {
    let repo = setup().await;

    let created = repo.books.create(&book("Heretics of Dune", 3)).await.expect("create");
    for copy in &created.copies[..2] {
        repo.books
            .update_copy_status(copy.id, CopyStatus::Borrowed)
            .await
            .expect("borrow");
    }

    // Reduction of 2 with only 1 Available copy: refused, nothing removed
    let err = repo
        .books
        .update(
            created.id,
            &UpdateBook { quantity: Some(1), ..Default::default() },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidCopiesQuantity(_)), "got {:?}", err);

    let fetched = repo.books.get_by_id(created.id).await.expect("get");
    assert_eq!(fetched.copies.len(), 3);

    // Reduction of 1 fits the Available pool; borrowed copies survive
    let updated = repo
        .books
        .update(
            created.id,
            &UpdateBook { quantity: Some(2), ..Default::default() },
        )
        .await
        .expect("shrink");
    assert_eq!(updated.copies.len(), 2);
    assert_eq!(updated.available_copies(), 0);
}

#[tokio::test]
#[ignore]
async fn test_grow_appends_available_copies() {
    let repo = setup().await;

    let created = repo.books.create(&book("Chapterhouse: Dune", 2)).await.expect("create");
    let updated = repo
        .books
        .update(
            created.id,
            &UpdateBook {
                description: Some("Final volume".to_string()),
                quantity: Some(5),
                ..Default::default()
            },
        )
        .await
        .expect("grow");
    assert_eq!(updated.copies.len(), 5);
    assert_eq!(updated.available_copies(), 5);
    assert_eq!(updated.description.as_deref(), Some("Final volume"));
}

#[tokio::test]
#[ignore]
async fn test_delete_refused_while_copy_is_out_on_loan() {
    let repo = setup().await;

    let created = repo.books.create(&book("Dune: The Duke of Caladan", 1)).await.expect("create");
    let copy_id = created.copies[0].id;

    repo.books
        .update_copy_status(copy_id, CopyStatus::Borrowed)
        .await
        .expect("borrow");

    let loan = repo
        .loans
        .create(&CreateLoan {
            user_id: 101,
            book_id: created.id,
            librarian_id: 7,
            book_copy_id: Some(copy_id),
            loan_date: Utc::now(),
            return_date: Utc::now() + Duration::days(7),
            status: None,
        })
        .await
        .expect("create loan");
    repo.loans
        .update(
            loan.id,
            &UpdateLoan {
                status: Some(lectern_core::models::loan::LoanStatus::InProgress as i16),
                ..Default::default()
            },
        )
        .await
        .expect("activate loan");

    let err = repo.books.delete(created.id).await.unwrap_err();
    assert!(matches!(err, AppError::CannotDelete(_)), "got {:?}", err);

    // Once returned the cascade delete goes through
    repo.loans.register_return(loan.id).await.expect("return");
    repo.books.delete(created.id).await.expect("delete");

    let err = repo.books.get_by_id(created.id).await.unwrap_err();
    assert!(matches!(err, AppError::BookNotFound(_)));
}

#[tokio::test]
#[ignore]
async fn test_delete_copy_checks_parent_book() {
    let repo = setup().await;

    let first = repo.books.create(&book("Sandworms of Dune", 1)).await.expect("create");
    let second = repo.books.create(&book("Hunters of Dune", 1)).await.expect("create");
    let stray_copy = second.copies[0].id;

    let err = repo.books.delete_copy(first.id, stray_copy).await.unwrap_err();
    assert!(matches!(err, AppError::CopyNotInBook(_)), "got {:?}", err);

    repo.books.delete_copy(second.id, stray_copy).await.expect("delete copy");
    let err = repo.books.get_copy(stray_copy).await.unwrap_err();
    assert!(matches!(err, AppError::BookCopyNotFound(_)));
}

#[tokio::test]
#[ignore]
async fn test_id_validation_precedes_lookup() {
    let repo = setup().await;

    let err = repo.books.get_by_id(0).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidId(_)));

    let err = repo.books.add_copies(-1, 5).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidId(_)));

    let err = repo.books.delete_copy(1, 0).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidId(_)));
}
