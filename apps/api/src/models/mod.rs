pub mod extracted;
pub mod posting;
pub mod scraped;
