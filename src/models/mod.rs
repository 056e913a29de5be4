pub mod loaders;
pub mod queue_item;
pub mod seo;

pub use loaders::{load_all_articles, load_article_file, ArticleFile};
pub use queue_item::{ItemId, ItemState, ItemStatus, QueueItem};
pub use seo::{
    ChecklistStatus, GroundingSource, ReadabilityItem, ReadabilityStatus, SavedSeoResult,
    SeoChecklistItem, SeoResult,
};
