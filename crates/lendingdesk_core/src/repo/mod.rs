//! Backend data access collaborators.
//!
//! # Responsibility
//! - Define list/create/update/delete contracts for readers, books and lendings.
//! - Map those contracts onto the backend REST collections.
//!
//! # Invariants
//! - List calls fetch the whole collection; filtering happens in core.
//! - Transport errors propagate unchanged; repositories never retry on their own.

use crate::http::ApiResult;

pub mod book_repo;
pub mod lending_repo;
pub mod reader_repo;

pub type RepoResult<T> = ApiResult<T>;

fn item_path(collection: &str, id: &str) -> String {
    format!("{collection}/{}", id.trim())
}
