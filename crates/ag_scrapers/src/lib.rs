pub mod article_scraper;
pub mod articles;
pub mod blog_index;
pub mod cli;
pub mod dates;
pub mod fetch;
pub mod gmail;
pub mod html;
pub mod jsonld;
pub mod logging;
pub mod twitter;
pub mod urls;

pub use article_scraper::{ArticleScraper, ScrapeSummary};
pub use blog_index::{BlogIndexProcessor, IndexDiscovery};
pub use cli::{handle_command, ScraperArgs, ScraperCommands, ScraperContext};
pub use fetch::Fetcher;
pub use gmail::GmailClient;
pub use logging::{init_logging, Logger};
pub use twitter::{HttpTimelineSource, TimelineSource, TwitterRunSummary, TwitterScraper};

pub mod prelude {
    pub use super::article_scraper::ArticleScraper;
    pub use super::blog_index::BlogIndexProcessor;
    pub use super::twitter::{TimelineSource, TwitterScraper};
    pub use ag_core::{Error, Result, ScrapedArticle, TweetRecord};
}
