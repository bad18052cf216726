pub mod browser;
pub mod extract;
pub mod pagination;
pub mod tayara;
pub mod traits;
pub mod types;

pub use pagination::search;
pub use tayara::TayaraBrowserScraper;
pub use traits::ScraperTrait;
pub use types::SearchParams;
