//! Lending transaction repository contract and HTTP implementation.

use super::{item_path, RepoResult};
use crate::http::ApiClient;
use crate::model::lending::{LendingDraft, LendingTransaction};

const LENDINGS_PATH: &str = "lendings";

/// Repository interface for lending transactions.
pub trait LendingRepository {
    /// Returns every transaction, returned ones included.
    fn list_lendings(&self) -> RepoResult<Vec<LendingTransaction>>;
    fn create_lending(&self, draft: &LendingDraft) -> RepoResult<LendingTransaction>;
    fn update_lending(&self, id: &str, draft: &LendingDraft) -> RepoResult<LendingTransaction>;
    fn delete_lending(&self, id: &str) -> RepoResult<()>;
}

/// Lending repository backed by the `lendings` REST collection.
pub struct HttpLendingRepository<'client> {
    client: &'client ApiClient,
}

impl<'client> HttpLendingRepository<'client> {
    pub fn new(client: &'client ApiClient) -> Self {
        Self { client }
    }
}

impl LendingRepository for HttpLendingRepository<'_> {
    fn list_lendings(&self) -> RepoResult<Vec<LendingTransaction>> {
        self.client.get_json(LENDINGS_PATH)
    }

    fn create_lending(&self, draft: &LendingDraft) -> RepoResult<LendingTransaction> {
        self.client.post_json(LENDINGS_PATH, draft)
    }

    fn update_lending(&self, id: &str, draft: &LendingDraft) -> RepoResult<LendingTransaction> {
        self.client.put_json(&item_path(LENDINGS_PATH, id), draft)
    }

    fn delete_lending(&self, id: &str) -> RepoResult<()> {
        self.client.delete(&item_path(LENDINGS_PATH, id))
    }
}
