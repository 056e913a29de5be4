pub mod article_loader;

pub use article_loader::{load_all_articles, load_article_file, ArticleFile};
