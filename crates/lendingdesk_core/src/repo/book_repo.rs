//! Book repository contract and HTTP implementation.

use super::{item_path, RepoResult};
use crate::http::ApiClient;
use crate::model::book::{Book, BookDraft};

const BOOKS_PATH: &str = "books";

/// Repository interface for the book catalog.
pub trait BookRepository {
    fn list_books(&self) -> RepoResult<Vec<Book>>;
    fn create_book(&self, draft: &BookDraft) -> RepoResult<Book>;
    fn update_book(&self, id: &str, draft: &BookDraft) -> RepoResult<Book>;
    fn delete_book(&self, id: &str) -> RepoResult<()>;
}

/// Book repository backed by the `books` REST collection.
pub struct HttpBookRepository<'client> {
    client: &'client ApiClient,
}

impl<'client> HttpBookRepository<'client> {
    pub fn new(client: &'client ApiClient) -> Self {
        Self { client }
    }
}

impl BookRepository for HttpBookRepository<'_> {
    fn list_books(&self) -> RepoResult<Vec<Book>> {
        self.client.get_json(BOOKS_PATH)
    }

    fn create_book(&self, draft: &BookDraft) -> RepoResult<Book> {
        self.client.post_json(BOOKS_PATH, draft)
    }

    fn update_book(&self, id: &str, draft: &BookDraft) -> RepoResult<Book> {
        self.client.put_json(&item_path(BOOKS_PATH, id), draft)
    }

    fn delete_book(&self, id: &str) -> RepoResult<()> {
        self.client.delete(&item_path(BOOKS_PATH, id))
    }
}
