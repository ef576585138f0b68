use rusty_library_lending::adapters::book_service::HttpBookService;
use rusty_library_lending::domain::value_objects::BookId;
use rusty_library_lending::ports::{BookService, BookServiceError};
use std::time::Duration;

mod common;

use common::TestLending;

/// インメモリ環境のルーターを実ソケットで起動し、そのURLを返す
async fn serve(env: &TestLending) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().unwrap();
    let app = env.router();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/", addr)
}

async fn client(env: &TestLending) -> HttpBookService {
    HttpBookService::new(serve(env).await, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_find_and_adjust_stock_over_http() {
    let env = TestLending::new();
    let book_id = env.book_with_stock(2);
    let books = client(&env).await;

    assert_eq!(books.find_stock(book_id).await.unwrap(), 2);
    assert_eq!(books.adjust_stock(book_id, -1).await.unwrap(), 1);
    assert_eq!(books.adjust_stock(book_id, 3).await.unwrap(), 4);
    assert_eq!(env.stock_of(book_id), 4);
}

#[tokio::test]
async fn test_remote_errors_keep_their_kind() {
    let env = TestLending::new();
    let book_id = env.book_with_stock(1);
    let books = client(&env).await;

    let err = books.adjust_stock(book_id, 0).await.unwrap_err();
    assert!(matches!(err, BookServiceError::InvalidArgument(_)));

    let err = books.adjust_stock(book_id, -2).await.unwrap_err();
    assert!(matches!(err, BookServiceError::ResourceExhausted(_)));

    let unknown = BookId::new();
    let err = books.find_stock(unknown).await.unwrap_err();
    assert!(matches!(err, BookServiceError::NotFound(id) if id == unknown));

    assert_eq!(env.stock_of(book_id), 1);
}

#[tokio::test]
async fn test_exhausted_conflicts_map_to_conflict() {
    let env = TestLending::new();
    let book_id = env.book_with_stock(1);
    env.ledger.force_conflicts(3);
    let books = client(&env).await;

    let err = books.adjust_stock(book_id, -1).await.unwrap_err();
    assert!(matches!(err, BookServiceError::Conflict(_)));
}

#[tokio::test]
async fn test_unreachable_service_is_a_transport_error() {
    let books = HttpBookService::new("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();

    let err = books.find_stock(BookId::new()).await.unwrap_err();
    assert!(matches!(err, BookServiceError::Transport(_)));
}
