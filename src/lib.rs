//! Personal notes service.
//!
//! Authenticated users keep short text notes addressed by a unique slug.
//! Every note belongs to exactly one author, and only that author can see,
//! change or delete it.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod slug;

#[cfg(test)]
mod test_support;
