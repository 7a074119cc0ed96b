pub mod categories;
pub mod entries;
pub mod feeds;

pub use categories::CategoryService;
pub use entries::EntryService;
pub use feeds::FeedService;
