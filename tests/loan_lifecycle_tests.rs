//! Loan lifecycle integration tests.
//!
//! Run against a live Postgres with: DATABASE_URL=... cargo test -- --ignored

use chrono::{Duration, Utc};
use sqlx::postgres::PgPoolOptions;

use lectern_core::{
    error::AppError,
    models::{
        book::CreateBook,
        copy::CopyStatus,
        loan::{CreateLoan, LoanStatus, UpdateLoan},
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

/// One book with one copy, returning (book_id, copy_id)
async fn seed_book(repo: &Repository, title: &str) -> (i32, i32) {
    let book = repo
        .books
        .create(&CreateBook {
            title: title.to_string(),
            author: "Ursula K. Le Guin".to_string(),
            category: None,
            publisher: None,
            publication_year: Some(1969),
            description: None,
            quantity: 1,
        })
        .await
        .expect("create book");
    let copy_id = book.copies[0].id;
    (book.id, copy_id)
}

fn loan_request(book_id: i32, copy_id: Option<i32>) -> CreateLoan {
    CreateLoan {
        user_id: 42,
        book_id,
        librarian_id: 7,
        book_copy_id: copy_id,
        loan_date: Utc::now(),
        return_date: Utc::now() + Duration::days(14),
        // Caller-supplied status must be ignored
        status: Some(LoanStatus::Finished as i16),
    }
}

fn set_status(status: LoanStatus) -> UpdateLoan {
    UpdateLoan {
        status: Some(status as i16),
        ..Default::default()
    }
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_create_forces_pending() {
    let repo = setup().await;
    let (book_id, _) = seed_book(&repo, "The Left Hand of Darkness").await;

    let loan = repo.loans.create(&loan_request(book_id, None)).await.expect("create");
    assert_eq!(LoanStatus::from(loan.status), LoanStatus::Pending);
}

#[tokio::test]
#[ignore]
async fn test_register_return_requires_in_progress() {
    let repo = setup().await;
    let (book_id, _) = seed_book(&repo, "The Dispossessed").await;

    let loan = repo.loans.create(&loan_request(book_id, None)).await.expect("create");
    let err = repo.loans.register_return(loan.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidStatus(_)), "got {:?}", err);
}

#[tokio::test]
#[ignore]
async fn test_full_cycle_releases_copy() {
    let repo = setup().await;
    let (book_id, copy_id) = seed_book(&repo, "A Wizard of Earthsea").await;

    repo.books
        .update_copy_status(copy_id, CopyStatus::Borrowed)
        .await
        .expect("borrow copy");

    let loan = repo
        .loans
        .create(&loan_request(book_id, Some(copy_id)))
        .await
        .expect("create");
    repo.loans
        .update(loan.id, &set_status(LoanStatus::InProgress))
        .await
        .expect("activate");

    assert!(!repo.loans.is_book_available(book_id).await.expect("availability"));

    let closed = repo.loans.register_return(loan.id).await.expect("return");
    assert_eq!(LoanStatus::from(closed.status), LoanStatus::Finished);

    let copy = repo.books.get_copy(copy_id).await.expect("get copy");
    assert_eq!(CopyStatus::from(copy.status), CopyStatus::Available);
    assert!(repo.loans.is_book_available(book_id).await.expect("availability"));
}

#[tokio::test]
#[ignore]
async fn test_settled_states_only_flip_into_each_other() {
    let repo = setup().await;
    let (book_id, copy_id) = seed_book(&repo, "The Tombs of Atuan").await;

    let loan = repo
        .loans
        .create(&loan_request(book_id, Some(copy_id)))
        .await
        .expect("create");
    repo.loans
        .update(loan.id, &set_status(LoanStatus::InProgress))
        .await
        .expect("activate");
    repo.loans.register_return(loan.id).await.expect("return");

    // Finished -> InProgress is illegal
    let err = repo
        .loans
        .update(loan.id, &set_status(LoanStatus::InProgress))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidStatusTransition(_)), "got {:?}", err);

    // Finished -> Canceled, then Canceled -> Finished, are the two legal flips
    let canceled = repo
        .loans
        .update(loan.id, &set_status(LoanStatus::Canceled))
        .await
        .expect("cancel");
    assert_eq!(LoanStatus::from(canceled.status), LoanStatus::Canceled);

    let err = repo
        .loans
        .update(loan.id, &set_status(LoanStatus::Pending))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidStatusTransition(_)));

    let finished = repo
        .loans
        .update(loan.id, &set_status(LoanStatus::Finished))
        .await
        .expect("finish again");
    assert_eq!(LoanStatus::from(finished.status), LoanStatus::Finished);
}

#[tokio::test]
#[ignore]
async fn test_completion_without_copy_is_atomic() {
    let repo = setup().await;
    let (book_id, _) = seed_book(&repo, "The Farthest Shore").await;

    let loan = repo.loans.create(&loan_request(book_id, None)).await.expect("create");
    let err = repo
        .loans
        .update(loan.id, &set_status(LoanStatus::Finished))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BookNotFound(_)), "got {:?}", err);

    // The aborted unit of work must leave the loan untouched
    let fetched = repo.loans.get_by_id(loan.id).await.expect("get");
    assert_eq!(LoanStatus::from(fetched.status), LoanStatus::Pending);
}

#[tokio::test]
#[ignore]
async fn test_backdated_return_date_only_when_finishing() {
    let repo = setup().await;
    let (book_id, copy_id) = seed_book(&repo, "Tehanu").await;

    let loan = repo
        .loans
        .create(&loan_request(book_id, Some(copy_id)))
        .await
        .expect("create");
    repo.loans
        .update(loan.id, &set_status(LoanStatus::InProgress))
        .await
        .expect("activate");

    let yesterday = Utc::now() - Duration::days(1);

    let err = repo
        .loans
        .update(
            loan.id,
            &UpdateLoan {
                return_date: Some(yesterday),
                status: Some(LoanStatus::InProgress as i16),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidReturnDate(_)), "got {:?}", err);

    // Backdating is fine when the same update closes the loan
    let closed = repo
        .loans
        .update(
            loan.id,
            &UpdateLoan {
                return_date: Some(yesterday),
                status: Some(LoanStatus::Finished as i16),
                ..Default::default()
            },
        )
        .await
        .expect("close with backdated return");
    assert_eq!(LoanStatus::from(closed.status), LoanStatus::Finished);
    // Postgres stores microseconds; compare within a millisecond
    assert!((closed.return_date - yesterday).num_milliseconds().abs() < 1);

    let copy = repo.books.get_copy(copy_id).await.expect("get copy");
    assert_eq!(CopyStatus::from(copy.status), CopyStatus::Available);
}

#[tokio::test]
#[ignore]
async fn test_extend_rules() {
    let repo = setup().await;
    let (book_id, copy_id) = seed_book(&repo, "The Word for World Is Forest").await;

    let loan = repo
        .loans
        .create(&loan_request(book_id, Some(copy_id)))
        .await
        .expect("create");

    // Not in progress yet
    let err = repo
        .loans
        .extend(loan.id, Utc::now() + Duration::days(30))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidStatus(_)));

    repo.loans
        .update(loan.id, &set_status(LoanStatus::InProgress))
        .await
        .expect("activate");

    let before = repo.loans.get_by_id(loan.id).await.expect("get").return_date;

    // New date must be strictly later than the current one
    let err = repo.loans.extend(loan.id, before - Duration::days(1)).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidDate(_)));
    let after = repo.loans.get_by_id(loan.id).await.expect("get").return_date;
    assert_eq!(before, after);

    let extended = repo
        .loans
        .extend(loan.id, before + Duration::days(7))
        .await
        .expect("extend");
    assert_eq!(extended.return_date, before + Duration::days(7));
}

#[tokio::test]
#[ignore]
async fn test_delete_requires_resolved_loan() {
    let repo = setup().await;
    let (book_id, _) = seed_book(&repo, "The Lathe of Heaven").await;

    let loan = repo.loans.create(&loan_request(book_id, None)).await.expect("create");

    let err = repo.loans.delete(loan.id).await.unwrap_err();
    assert!(matches!(err, AppError::CannotDelete(_)), "got {:?}", err);

    repo.loans
        .update(loan.id, &set_status(LoanStatus::Canceled))
        .await
        .expect("cancel");
    repo.loans.delete(loan.id).await.expect("delete");

    let err = repo.loans.get_by_id(loan.id).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
