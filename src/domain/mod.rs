pub mod category;
pub mod entry;
pub mod feed;
pub mod page;
pub mod stats;

pub use category::Category;
pub use entry::{Entry, Marker};
pub use feed::{Feed, FeedUpdate};
pub use page::{Cursor, Filter, Page};
pub use stats::Stats;
