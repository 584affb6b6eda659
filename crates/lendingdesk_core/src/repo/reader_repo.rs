//! Reader repository contract and HTTP implementation.

use super::{item_path, RepoResult};
use crate::http::ApiClient;
use crate::model::reader::{Reader, ReaderDraft};

const READERS_PATH: &str = "readers";

/// Repository interface for library members.
pub trait ReaderRepository {
    fn list_readers(&self) -> RepoResult<Vec<Reader>>;
    fn create_reader(&self, draft: &ReaderDraft) -> RepoResult<Reader>;
    fn update_reader(&self, id: &str, draft: &ReaderDraft) -> RepoResult<Reader>;
    fn delete_reader(&self, id: &str) -> RepoResult<()>;
}

/// Reader repository backed by the `readers` REST collection.
pub struct HttpReaderRepository<'client> {
    client: &'client ApiClient,
}

impl<'client> HttpReaderRepository<'client> {
    pub fn new(client: &'client ApiClient) -> Self {
        Self { client }
    }
}

impl ReaderRepository for HttpReaderRepository<'_> {
    fn list_readers(&self) -> RepoResult<Vec<Reader>> {
        self.client.get_json(READERS_PATH)
    }

    fn create_reader(&self, draft: &ReaderDraft) -> RepoResult<Reader> {
        self.client.post_json(READERS_PATH, draft)
    }

    fn update_reader(&self, id: &str, draft: &ReaderDraft) -> RepoResult<Reader> {
        self.client.put_json(&item_path(READERS_PATH, id), draft)
    }

    fn delete_reader(&self, id: &str) -> RepoResult<()> {
        self.client.delete(&item_path(READERS_PATH, id))
    }
}
