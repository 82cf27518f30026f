//! Storage backends implementing [`crate::job::storage::disk::Client`].

pub mod local;
pub mod yandex;
