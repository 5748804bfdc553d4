pub mod extract;
pub mod normalize;

pub use extract::{LinkExtractor, extract_links};
pub use normalize::{normalize_title, titles_match};
