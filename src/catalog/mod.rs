pub mod ingest;
pub mod search;

#[cfg(test)]
mod tests;

pub use ingest::{ingest, normalize, populate, IngestError, IngestReport};
pub use search::{search, SearchQuery};
