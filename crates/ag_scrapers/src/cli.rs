use crate::article_scraper::ArticleScraper;
use crate::blog_index::BlogIndexProcessor;
use crate::fetch::Fetcher;
use crate::gmail::GmailClient;
use crate::twitter::{load_twitter_config, TwitterScraper};
use ag_core::{AppConfig, Error, Result};
use ag_inference::Classifier;
use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Args, Debug, Clone)]
pub struct ScraperArgs {
    #[command(subcommand)]
    pub command: ScraperCommands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ScraperCommands {
    /// Find the blog/news index pages of a site
    Discover {
        /// Site root, e.g. https://acme.com
        base_url: String,
    },
    /// Collect new articles of a client site since its stored cursor
    Articles {
        base_url: String,
        #[arg(long)]
        client_name: String,
    },
    /// Collect new tweets of every monitored profile
    Tweets {
        /// Monitored-profile list; defaults to twitter_config.json in the data directory
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List unread Gmail messages
    Unread,
}

/// What a scraper command needs beyond its arguments.
#[derive(Debug, Clone)]
pub struct ScraperContext {
    pub config: AppConfig,
    pub classifier: Classifier,
}

pub async fn handle_command(args: ScraperArgs, ctx: &ScraperContext) -> Result<()> {
    match args.command {
        ScraperCommands::Discover { base_url } => {
            let processor = BlogIndexProcessor::new(Fetcher::new()?, ctx.classifier.clone());
            let discovery = processor.find_blog_index_urls(&base_url).await;
            println!("Found {} index pages for {}", discovery.accepted.len(), base_url);
            for decision in &discovery.accepted_details {
                println!("  ✅ {} ({})", decision.url, decision.analysis.reason);
            }
            for decision in &discovery.rejected_details {
                println!("  ❌ {} ({})", decision.url, decision.analysis.reason);
            }
            for feed in &discovery.feed_urls {
                println!("  📰 {}", feed);
            }
        }
        ScraperCommands::Articles {
            base_url,
            client_name,
        } => {
            let mut scraper = ArticleScraper::from_config(&ctx.config, ctx.classifier.clone()).await?;
            let summary = scraper.run(&base_url, &client_name).await?;
            println!(
                "{}: {} new articles from {} index pages (latest: {})",
                summary.client_key,
                summary.new_articles,
                summary.indexes,
                summary.latest_article_date.as_deref().unwrap_or("none")
            );
        }
        ScraperCommands::Tweets { config } => {
            let path = config.unwrap_or_else(|| ctx.config.twitter_config_path());
            let twitter_config = load_twitter_config(&path).await;
            let summary = TwitterScraper::from_config(&ctx.config)?.run(&twitter_config).await?;
            println!(
                "Scraped {} tweets from {} profiles, {} new",
                summary.scraped, summary.profiles, summary.saved
            );
        }
        ScraperCommands::Unread => {
            let token = ctx
                .config
                .gmail_access_token
                .clone()
                .ok_or_else(|| Error::Config("GMAIL_ACCESS_TOKEN is not set".to_string()))?;
            let emails = GmailClient::new(token)?.fetch_unread().await?;
            println!("{} unread messages", emails.len());
            for email in emails {
                println!("  ✉️ {} - {}", email.sender, email.subject);
            }
        }
    }
    Ok(())
}
