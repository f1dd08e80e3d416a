// Sentiq Infrastructure - HTTP Adapter
// Implements: ContentFetcher

mod fetcher;
mod title;

pub use fetcher::{HttpContentFetcher, DEFAULT_MAX_BODY_BYTES};
pub use title::{decode_entities, extract_title};
