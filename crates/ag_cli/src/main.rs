use ag_core::validation::{analysis_schema, validate_json};
use ag_core::{AppConfig, Error, Result, TweetRecord, TweetStatus};
use ag_delivery::{
    load_context_inputs, load_user_profile, ClientContextFetcher, ContextAgent, DashboardSender,
    EmailAgent, RagClient, TwitterAgent, WebsiteAgent,
};
use ag_inference::{create_model, Classifier, ModelKind};
use ag_scrapers::cli::{handle_command, ScraperArgs, ScraperCommands, ScraperContext};
use ag_scrapers::twitter::load_twitter_config;
use ag_scrapers::{init_logging, ArticleScraper, GmailClient, TwitterScraper};
use ag_storage::TweetStore;
use clap::Parser;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Interval such as `90`, `30m` or `1h15m30s`; a bare number counts as seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
struct HumanDuration(Duration);

fn unit_seconds(unit: char) -> Option<u64> {
    match unit {
        's' => Some(1),
        'm' => Some(60),
        'h' => Some(3_600),
        'd' => Some(86_400),
        _ => None,
    }
}

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let overflow = || format!("Duration {:?} is too large", s);
        let mut total: u64 = 0;
        let mut rest = s.trim();

        while !rest.is_empty() {
            let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
            if digits == 0 {
                return Err(format!("Expected a number at {:?}", rest));
            }
            let amount: u64 = rest[..digits].parse().map_err(|_| overflow())?;
            rest = &rest[digits..];

            let mut chars = rest.chars();
            let factor = match chars.next() {
                None => 1,
                Some(unit) => {
                    rest = chars.as_str().trim_start();
                    unit_seconds(unit).ok_or_else(|| format!("Invalid duration unit: {}", unit))?
                }
            };
            total = amount
                .checked_mul(factor)
                .and_then(|secs| total.checked_add(secs))
                .ok_or_else(overflow)?;
        }

        if total == 0 {
            return Err("Duration must include a non-zero number".to_string());
        }
        Ok(HumanDuration(Duration::from_secs(total)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Business-signal collection agents", long_about = None)]
struct Cli {
    /// Directory holding state, stores and the payload log (overrides AG_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Model used for classification
    #[arg(long, value_enum, default_value_t = ModelKind::Azure, global = true)]
    model: ModelKind,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Find the blog/news index pages of a site
    Discover { base_url: String },
    /// Collect new articles of a client site, classify them and send them to the dashboard
    Articles {
        base_url: String,
        #[arg(long)]
        client_name: String,
        /// Repeat with this interval (e.g. 1h, 30m, 1d, 1h15m30s)
        #[arg(long)]
        interval: Option<HumanDuration>,
        /// Only collect and store
        #[arg(long)]
        no_send: bool,
    },
    /// Collect new tweets, classify them and send them to the dashboard
    Tweets {
        #[arg(long)]
        config: Option<PathBuf>,
        /// Only collect and store
        #[arg(long)]
        no_send: bool,
    },
    /// Set the review status of a stored tweet
    TweetStatus { tweet_id: String, status: TweetStatus },
    /// Attach a reply to a stored tweet, typed or generated by the model
    TweetReply {
        tweet_id: String,
        #[arg(required_unless_present = "generate")]
        reply: Option<String>,
        #[arg(long, conflicts_with = "reply")]
        generate: bool,
    },
    /// Classify a single tweet text and print the judgement
    ClassifyTweet {
        text: String,
        #[arg(long)]
        client_name: Option<String>,
        /// User profile JSON file
        #[arg(long)]
        profile: Option<PathBuf>,
    },
    /// Read unread Gmail messages, enrich them and send them to the dashboard
    Emails {
        /// Only list the unread messages
        #[arg(long)]
        no_send: bool,
    },
    /// Analyse pending items against RAG history and forward the actionable ones
    ContextAgent,
    /// Validate a JSON document against a schema (the analysis schema by default)
    Validate {
        document: PathBuf,
        #[arg(long)]
        schema: Option<PathBuf>,
    },
    /// Serve the HTTP triggers
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        addr: String,
    },
}

async fn read_json(path: &Path) -> Result<Value> {
    let raw = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn classifier(kind: ModelKind, config: &AppConfig) -> Result<Classifier> {
    let model = create_model(kind, &config.llm)?;
    info!("🧠 Inference model initialized (using {})", model.name());
    Ok(Classifier::new(model))
}

async fn scrape(command: ScraperCommands, ctx: &ScraperContext) -> Result<()> {
    handle_command(ScraperArgs { command }, ctx).await
}

async fn deliver_tweets(tweets: &[TweetRecord], config: &AppConfig, classifier: Classifier) -> Result<()> {
    let context = Arc::new(ClientContextFetcher::from_config(config)?);
    let agent = TwitterAgent::new(classifier, context, DashboardSender::from_config(config));
    let summary = agent.run(tweets).await;
    info!(
        "📤 {} tweets classified, {} actionable, {} sent",
        summary.processed, summary.actionable, summary.sent
    );
    Ok(())
}

async fn collect_articles(
    scraper: &mut ArticleScraper,
    agent: Option<&WebsiteAgent>,
    base_url: &str,
    client_name: &str,
) -> Result<()> {
    let summary = scraper.run(base_url, client_name).await?;
    println!(
        "✅ {}: {} new articles from {} indexes (latest: {})",
        summary.client_key,
        summary.new_articles,
        summary.indexes,
        summary.latest_article_date.as_deref().unwrap_or("none")
    );
    if let Some(agent) = agent {
        let delivered = agent.run(&summary.articles).await;
        info!(
            "📤 {} articles classified, {} actionable, {} sent",
            delivered.processed, delivered.actionable, delivered.sent
        );
    }
    Ok(())
}

/// Generates a reply for a stored tweet and saves it.
async fn generate_tweet_reply(store: &TweetStore, classifier: &Classifier, tweet_id: &str) -> Result<String> {
    let tweet = store
        .load_existing()
        .await
        .into_iter()
        .find(|t| t.tweet_id == tweet_id)
        .ok_or_else(|| Error::Storage(format!("Tweet {} not found", tweet_id)))?;
    let reply = classifier.generate_reply(&tweet.text).await;
    store.add_reply(tweet_id, &reply).await?;
    Ok(reply)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }

    match cli.command {
        Commands::Discover { base_url } => {
            let ctx = ScraperContext {
                classifier: classifier(cli.model, &config)?,
                config,
            };
            scrape(ScraperCommands::Discover { base_url }, &ctx).await?;
        }
        Commands::Articles {
            base_url,
            client_name,
            interval,
            no_send,
        } => {
            let classifier = classifier(cli.model, &config)?;
            let mut scraper = ArticleScraper::from_config(&config, classifier.clone()).await?;
            let agent = if no_send {
                None
            } else {
                let context = Arc::new(ClientContextFetcher::from_config(&config)?);
                Some(
                    WebsiteAgent::new(classifier, context, DashboardSender::from_config(&config))
                        .with_profile(load_user_profile(&config).await),
                )
            };
            match interval {
                Some(HumanDuration(every)) => {
                    info!("Running in periodic mode with {}s interval", every.as_secs());
                    loop {
                        info!("Starting scrape cycle");
                        if let Err(e) = collect_articles(&mut scraper, agent.as_ref(), &base_url, &client_name).await {
                            tracing::error!("Error during scrape: {}", e);
                        }
                        info!("Waiting {}s before next scrape", every.as_secs());
                        tokio::time::sleep(every).await;
                    }
                }
                None => collect_articles(&mut scraper, agent.as_ref(), &base_url, &client_name).await?,
            }
        }
        Commands::Tweets { config: path, no_send } => {
            if no_send {
                let ctx = ScraperContext {
                    classifier: classifier(ModelKind::Offline, &config)?,
                    config,
                };
                scrape(ScraperCommands::Tweets { config: path }, &ctx).await?;
            } else {
                let path = path.unwrap_or_else(|| config.twitter_config_path());
                let twitter_config = load_twitter_config(&path).await;
                let scraped = TwitterScraper::from_config(&config)?.run(&twitter_config).await?;
                info!("🐦 {} new tweets from {} profiles", scraped.saved, scraped.profiles);
                deliver_tweets(&scraped.tweets, &config, classifier(cli.model, &config)?).await?;
            }
        }
        Commands::TweetStatus { tweet_id, status } => {
            let store = TweetStore::open(config.tweets_path());
            if !store.update_status(&tweet_id, status).await? {
                return Err(Error::Storage(format!("Tweet {} not found", tweet_id)));
            }
            println!("Tweet {} is now {}", tweet_id, status);
        }
        Commands::TweetReply {
            tweet_id,
            reply,
            generate,
        } => {
            let store = TweetStore::open(config.tweets_path());
            match reply {
                Some(reply) if !generate => {
                    if !store.add_reply(&tweet_id, &reply).await? {
                        return Err(Error::Storage(format!("Tweet {} not found", tweet_id)));
                    }
                }
                _ => {
                    let reply = generate_tweet_reply(&store, &classifier(cli.model, &config)?, &tweet_id).await?;
                    println!("{}", reply);
                }
            }
            println!("Reply saved for tweet {}", tweet_id);
        }
        Commands::ClassifyTweet {
            text,
            client_name,
            profile,
        } => {
            let profile = match profile {
                Some(path) => Some(read_json(&path).await?),
                None => None,
            };
            let context = ClientContextFetcher::from_config(&config)?;
            let classification = classifier(cli.model, &config)?
                .classify_tweet(&text, profile.as_ref(), client_name.as_deref(), &context)
                .await;
            print_json(&classification)?;
        }
        Commands::Emails { no_send } => {
            if no_send {
                let ctx = ScraperContext {
                    classifier: classifier(ModelKind::Offline, &config)?,
                    config,
                };
                scrape(ScraperCommands::Unread, &ctx).await?;
            } else {
                let token = config
                    .gmail_access_token
                    .clone()
                    .ok_or_else(|| Error::Config("GMAIL_ACCESS_TOKEN is not set".to_string()))?;
                let mut emails = GmailClient::new(token)?.fetch_unread().await?;
                let agent = EmailAgent::new(classifier(cli.model, &config)?, DashboardSender::from_config(&config));
                let summary = agent.run(&mut emails).await;
                info!(
                    "📧 {} emails enriched, {} actionable, {} sent",
                    summary.processed, summary.actionable, summary.sent
                );
            }
        }
        Commands::ContextAgent => {
            let (profile, items) = load_context_inputs(&config).await;
            let agent = ContextAgent::new(
                classifier(cli.model, &config)?,
                RagClient::new(config.rag.clone())?,
                DashboardSender::from_config(&config),
            );
            print_json(&agent.run(&profile, &items).await)?;
        }
        Commands::Validate { document, schema } => {
            let document = read_json(&document).await?;
            let schema = match schema {
                Some(path) => read_json(&path).await?,
                None => analysis_schema(),
            };
            let (valid, message) = validate_json(&document, &schema);
            println!("{}", message);
            if !valid {
                return Err(Error::Validation(message));
            }
        }
        Commands::Serve { addr } => {
            let state = ag_web::AppState::new(config.clone(), classifier(cli.model, &config)?);
            ag_web::serve(state, &addr).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_duration() {
        let parse = |s: &str| HumanDuration::from_str(s).map(|d| d.0.as_secs());
        assert_eq!(parse("90"), Ok(90));
        assert_eq!(parse("30m"), Ok(1800));
        assert_eq!(parse("1h15m30s"), Ok(4530));
        assert_eq!(parse("1d"), Ok(86400));
        assert!(parse("5x").is_err());
        assert!(parse("").is_err());
        assert!(parse("0s").is_err());
        assert!(parse("m").is_err());
    }

    #[test]
    fn test_human_duration_overflow() {
        assert!(HumanDuration::from_str("999999999999999d").is_err());
        assert!(HumanDuration::from_str("99999999999999999999").is_err());
        assert!(HumanDuration::from_str(&format!("{}s1s", u64::MAX)).is_err());
        assert_eq!(
            HumanDuration::from_str(&format!("{}s", u64::MAX)),
            Ok(HumanDuration(Duration::from_secs(u64::MAX)))
        );
    }

    #[test]
    fn test_parse_commands() {
        let cli = Cli::try_parse_from([
            "ag", "--model", "offline", "articles", "https://acme.com", "--client-name", "Acme", "--interval", "1h",
        ])
        .unwrap();
        assert_eq!(cli.model, ModelKind::Offline);
        match cli.command {
            Commands::Articles { interval, .. } => {
                assert_eq!(interval, Some(HumanDuration(Duration::from_secs(3600))))
            }
            other => panic!("unexpected command {:?}", other),
        }

        let cli = Cli::try_parse_from(["ag", "tweet-status", "42", "posted", "--data-dir", "/tmp/x"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
        assert!(matches!(
            cli.command,
            Commands::TweetStatus { status: TweetStatus::Posted, .. }
        ));

        assert!(Cli::try_parse_from(["ag", "tweet-status", "42", "archived"]).is_err());
    }

    #[test]
    fn test_parse_tweet_reply() {
        let cli = Cli::try_parse_from(["ag", "tweet-reply", "42", "--generate"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::TweetReply { reply: None, generate: true, .. }
        ));
        let cli = Cli::try_parse_from(["ag", "tweet-reply", "42", "Thanks!"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::TweetReply { reply: Some(_), generate: false, .. }
        ));
        assert!(Cli::try_parse_from(["ag", "tweet-reply", "42"]).is_err());
        assert!(Cli::try_parse_from(["ag", "tweet-reply", "42", "Thanks!", "--generate"]).is_err());
    }

    #[tokio::test]
    async fn test_generate_tweet_reply_is_stored() {
        use ag_inference::prelude::ScriptedModel;

        let store = TweetStore::in_memory();
        store
            .save_new_tweets(&[TweetRecord {
                tweet_id: "42".into(),
                client_name: "Acme".into(),
                text: "We just opened a Berlin office".into(),
                url: "https://twitter.com/acme/status/42".into(),
                created_at: String::new(),
                status: TweetStatus::Pending,
                reply: None,
            }])
            .await
            .unwrap();

        let model = Arc::new(ScriptedModel::new(["Congrats on Berlin!"]));
        let reply = generate_tweet_reply(&store, &Classifier::new(model.clone()), "42")
            .await
            .unwrap();
        assert_eq!(reply, "Congrats on Berlin!");
        assert!(model.prompts()[0].contains("Berlin office"));
        let saved = store.load_existing().await;
        assert_eq!(saved[0].reply.as_deref(), Some("Congrats on Berlin!"));

        let failing = Classifier::new(Arc::new(ScriptedModel::failing()));
        assert!(generate_tweet_reply(&store, &failing, "missing").await.is_err());
    }
}
