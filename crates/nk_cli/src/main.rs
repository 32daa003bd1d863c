use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use nk_app::home::HomeFeedLoader;
use nk_app::{AdminConsole, AppShell, ChatSession, StaticPasswordAuthenticator};
use nk_core::cache::MemoryCache;
use nk_core::{Article, Error, KeyValueStore};
use nk_inference::images::placeholder_data_url;
use nk_inference::{Config, Gateway};
use nk_storage::{
    create_storage, AdminArticles, ArticleCatalog, NewArticle, SavedArticles, StorageConfig,
    StorageKind,
};

mod browse;
mod logging;
mod render;

const CATALOG_TTL: Duration = Duration::from_secs(300);
const PROBE_KEY: &str = "nk-health-probe";

#[derive(Debug, Clone, Copy)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    /// `30s`, `2m`, `1m30s`; a bare number counts as seconds.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total = 0u64;
        let mut number = String::new();
        for c in s.trim().chars() {
            if c.is_ascii_digit() {
                number.push(c);
                continue;
            }
            let value: u64 = number
                .parse()
                .map_err(|_| format!("Expected a number before '{}'", c))?;
            total += match c {
                's' => value,
                'm' => value * 60,
                'h' => value * 3600,
                _ => return Err(format!("Invalid duration unit: {}", c)),
            };
            number.clear();
        }
        if !number.is_empty() {
            total += number.parse::<u64>().map_err(|e| e.to_string())?;
        }
        if total == 0 {
            return Err("Duration must be positive".to_string());
        }
        Ok(HumanDuration(Duration::from_secs(total)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Read, save and generate news from the terminal", long_about = None)]
pub struct Cli {
    /// Storage backend: memory, file or sqlite (with the `sqlite` feature)
    #[arg(long, global = true, default_value = "file")]
    storage: String,
    /// Where the file and sqlite backends keep their data [default: ~/.newskit]
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Bundled articles file used for breaking, trending and learning lists
    #[arg(long, global = true, default_value = "data/articles.json")]
    catalog: PathBuf,
    /// Model to use for generated content: gemini or dummy
    #[arg(long, global = true, default_value = "gemini")]
    model: String,
    #[arg(long, global = true, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Gemini model name
    #[arg(long, global = true)]
    model_name: Option<String>,
    /// Upper bound for each AI call (e.g. 30s, 1m)
    #[arg(long, global = true, default_value = "30s")]
    timeout: HumanDuration,
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage saved articles
    Saved {
        #[command(subcommand)]
        command: SavedCommands,
    },
    /// Author articles (password protected)
    Admin {
        #[arg(long, env = "NK_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
        /// Password the console accepts
        #[arg(long, env = "NK_ADMIN_SECRET", hide_env_values = true, default_value = nk_app::admin::DEFAULT_ADMIN_PASSWORD, hide_default_value = true)]
        secret: String,
        #[command(subcommand)]
        command: AdminCommands,
    },
    /// Show the home feed
    Home {
        #[arg(long)]
        city: Option<String>,
    },
    /// List bundled articles
    Library {
        #[arg(value_enum, default_value = "all")]
        kind: LibraryKind,
    },
    /// Write a news article about a topic
    Generate {
        topic: String,
        /// Also add the article to the saved list
        #[arg(long)]
        save: bool,
    },
    Weather {
        #[arg(default_value = nk_app::home::DEFAULT_CITY)]
        city: String,
    },
    /// Today's quote
    Quote,
    /// A short creative prompt
    Idea,
    /// Top financial stories
    Finance,
    /// Index and stock prices
    Markets,
    /// Follow a live feed about a topic
    Feed { topic: String },
    /// Talk to the news assistant
    Chat,
    /// Image URL for a prompt
    Image { prompt: String },
    /// The showcase image gallery
    Gallery,
    /// Placeholder image data URL for WIDTHxHEIGHT
    Placeholder {
        #[arg(default_value = "800x600")]
        dimensions: String,
    },
    /// Navigate the app interactively
    Browse,
    /// Check that storage and the model are usable
    Check,
}

#[derive(Subcommand, Debug)]
enum SavedCommands {
    List,
    /// Save an article read from a JSON file
    Add { file: PathBuf },
    Remove { id: String },
    Has { id: String },
    /// Save the article if it is not saved yet, otherwise remove it
    Toggle { file: PathBuf },
}

#[derive(Subcommand, Debug)]
enum AdminCommands {
    List,
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        summary: String,
        /// Body text; `## ` lines are subheadings, `> ` lines quotes
        #[arg(long, conflicts_with = "content_file")]
        content: Option<String>,
        #[arg(long)]
        content_file: Option<PathBuf>,
        #[arg(long)]
        category: String,
        #[arg(long)]
        image_url: String,
        #[arg(long)]
        source_url: String,
        #[arg(long)]
        source_name: String,
    },
    Delete { id: String },
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum LibraryKind {
    All,
    Breaking,
    Trending,
    HowTo,
}

struct Services {
    storage: Arc<dyn KeyValueStore>,
    saved: Arc<SavedArticles>,
    admin: Arc<AdminArticles>,
    catalog: Arc<ArticleCatalog>,
    model: String,
    model_config: Config,
}

impl Services {
    async fn build(cli: &Cli) -> anyhow::Result<Self> {
        let kind = StorageKind::from_str(&cli.storage)?;
        let storage_config = cli
            .data_dir
            .clone()
            .map(StorageConfig::new)
            .unwrap_or_default();
        let storage = create_storage(kind, &storage_config).await?;

        Ok(Self {
            saved: Arc::new(SavedArticles::new(storage.clone())),
            admin: Arc::new(AdminArticles::new(storage.clone())),
            catalog: Arc::new(ArticleCatalog::new(&cli.catalog, Arc::new(MemoryCache::new()), CATALOG_TTL)),
            storage,
            model: cli.model.clone(),
            model_config: Config {
                api_key: cli.api_key.clone(),
                model_name: cli.model_name.clone(),
                base_url: None,
                timeout: cli.timeout.0,
            },
        })
    }

    /// Set up the model on first use, so store commands run without one.
    fn gateway(&self) -> anyhow::Result<Gateway> {
        let gateway = Gateway::from_config(&self.model, &self.model_config)
            .with_context(|| format!("Could not set up the {} model", self.model))?;
        info!("🧠 Inference model initialized (using {})", gateway.model_name());
        Ok(gateway)
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_articles(json: bool, articles: &[Article]) -> anyhow::Result<()> {
    if json {
        print_json(&articles)
    } else {
        println!("{}", render::article_list(articles));
        Ok(())
    }
}

fn read_article(path: &Path) -> anyhow::Result<Article> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not an article", path.display()))
}

async fn check(services: &Services, timeout: Duration) -> anyhow::Result<()> {
    let probe = async {
        services.storage.set(PROBE_KEY, "ok").await?;
        let value = services.storage.get(PROBE_KEY).await?;
        services.storage.remove(PROBE_KEY).await?;
        if value.as_deref() != Some("ok") {
            return Err(Error::Storage("Probe record did not round-trip".to_string()));
        }
        Ok::<(), Error>(())
    };
    match tokio::time::timeout(timeout, probe).await {
        Ok(result) => result?,
        Err(_) => bail!("Storage health check timed out after {:?}", timeout),
    }
    println!("✅ Storage: {}", services.storage.name());

    match services.gateway() {
        Ok(gateway) => {
            let quote = gateway.fetch_daily_quote().await;
            println!("✅ Model: {} ({})", gateway.model_name(), render::quote(&quote));
        }
        Err(e) => println!("⚠️  Model: {:#}", e),
    }
    Ok(())
}

async fn run_chat(gateway: Gateway) -> anyhow::Result<()> {
    let mut session = ChatSession::new(gateway, None);
    if let Some(greeting) = session.messages().first() {
        println!("Kamo: {}", greeting.text);
    }
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        if matches!(line.trim(), "/quit" | "/exit") {
            break;
        }
        print!("Kamo: ");
        let reply = session
            .send(&line, |fragment| {
                print!("{}", fragment);
                let _ = std::io::stdout().flush();
            })
            .await?;
        if reply.text == nk_app::chat::CHAT_ERROR_MESSAGE {
            print!("{}", reply.text);
        }
        println!();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    // These need neither storage nor a model.
    match &cli.command {
        Commands::Image { prompt } => {
            println!("{}", nk_inference::images::generate_image(prompt));
            return Ok(());
        }
        Commands::Gallery => {
            let gallery = nk_inference::images::generate_image_gallery();
            if cli.json {
                return print_json(&gallery);
            }
            println!("{}", render::gallery(&gallery));
            return Ok(());
        }
        Commands::Placeholder { dimensions } => {
            println!("{}", placeholder_data_url(dimensions));
            return Ok(());
        }
        _ => {}
    }

    let services = Services::build(&cli).await?;
    let json = cli.json;

    match cli.command {
        Commands::Saved { command } => match command {
            SavedCommands::List => print_articles(json, &services.saved.list().await)?,
            SavedCommands::Add { file } => {
                let article = read_article(&file)?;
                services.saved.save(&article).await?;
                println!("Saved {}", article.id);
            }
            SavedCommands::Remove { id } => {
                services.saved.remove(&id).await?;
                println!("Removed {}", id);
            }
            SavedCommands::Has { id } => println!("{}", services.saved.has(&id).await),
            SavedCommands::Toggle { file } => {
                let article = read_article(&file)?;
                let saved = services.saved.toggle(&article).await?;
                println!("{} {}", if saved { "Saved" } else { "Removed" }, article.id);
            }
        },
        Commands::Admin { password, secret, command } => {
            let console = AdminConsole::new(services.admin.clone(), Arc::new(StaticPasswordAuthenticator::new(secret)));
            match console.login(&password).await {
                Ok(()) => {}
                Err(Error::Unauthorized) => bail!("Incorrect password."),
                Err(e) => return Err(e.into()),
            }
            match command {
                AdminCommands::List => print_articles(json, &console.list().await?)?,
                AdminCommands::Create {
                    title,
                    summary,
                    content,
                    content_file,
                    category,
                    image_url,
                    source_url,
                    source_name,
                } => {
                    let full_content_text = match (content, content_file) {
                        (Some(text), _) => text,
                        (None, Some(path)) => std::fs::read_to_string(&path)
                            .with_context(|| format!("Could not read {}", path.display()))?,
                        (None, None) => String::new(),
                    };
                    let article = console
                        .create(NewArticle {
                            title,
                            summary,
                            full_content_text,
                            category,
                            image_url,
                            source_url,
                            source_name,
                        })
                        .await?;
                    if json {
                        print_json(&article)?;
                    } else {
                        println!("Created {}", article.id);
                    }
                }
                AdminCommands::Delete { id } => {
                    console.delete(&id).await?;
                    println!("Deleted {}", id);
                }
            }
        }
        Commands::Home { city } => {
            let mut loader = HomeFeedLoader::new(services.catalog.clone(), services.gateway()?, services.saved.clone());
            if let Some(city) = city {
                loader = loader.with_city(city);
            }
            let feed = loader.load().await;
            println!("{}", render::home(&feed));
        }
        Commands::Library { kind } => {
            let articles = match kind {
                LibraryKind::All => services.catalog.fetch_library().await,
                LibraryKind::Breaking => services.catalog.fetch_news().await,
                LibraryKind::Trending => services.catalog.fetch_trending_news().await,
                LibraryKind::HowTo => services.catalog.fetch_how_to_guides().await,
            };
            print_articles(json, &articles)?;
        }
        Commands::Generate { topic, save } => {
            let article = services.gateway()?.generate_article(&topic).await?;
            if save {
                services.saved.save(&article).await?;
            }
            if json {
                print_json(&article)?;
            } else {
                println!("{}", render::article(&article));
            }
        }
        Commands::Weather { city } => {
            let weather = services.gateway()?.fetch_weather(&city).await?;
            if json {
                print_json(&weather)?;
            } else {
                print!("{}", render::weather(&weather));
            }
        }
        Commands::Quote => {
            let quote = services.gateway()?.fetch_daily_quote().await;
            if json {
                print_json(&quote)?;
            } else {
                println!("{}", render::quote(&quote));
            }
        }
        Commands::Idea => println!("{}", services.gateway()?.generate_creative_idea().await),
        Commands::Finance => print_articles(json, &services.gateway()?.fetch_financial_news().await?)?,
        Commands::Markets => {
            let stocks = services.gateway()?.fetch_market_data().await?;
            if json {
                print_json(&stocks)?;
            } else {
                println!("{}", render::markets(&stocks));
            }
        }
        Commands::Feed { topic } => {
            let mut feed = services.gateway()?.stream_news_updates(&topic).await?;
            while let Some(fragment) = feed.next().await {
                print!("{}", fragment);
                std::io::stdout().flush()?;
            }
            println!();
        }
        Commands::Chat => run_chat(services.gateway()?).await?,
        Commands::Browse => {
            let mut shell = AppShell::new();
            browse::run(&mut shell, &services.catalog, &services.saved, &services.gateway()?).await?;
        }
        Commands::Check => check(&services, cli.timeout.0).await?,
        Commands::Image { .. } | Commands::Gallery | Commands::Placeholder { .. } => {
            warn!("Handled before service setup");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_duration() {
        assert_eq!(HumanDuration::from_str("30s").unwrap().0, Duration::from_secs(30));
        assert_eq!(HumanDuration::from_str("1m30s").unwrap().0, Duration::from_secs(90));
        assert_eq!(HumanDuration::from_str("45").unwrap().0, Duration::from_secs(45));
        assert!(HumanDuration::from_str("0s").is_err());
        assert!(HumanDuration::from_str("5d").is_err());
        assert!(HumanDuration::from_str("m").is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["nk", "--model", "dummy", "--timeout", "5s", "saved", "has", "42"]).unwrap();
        assert_eq!(cli.timeout.0, Duration::from_secs(5));
        assert!(matches!(cli.command, Commands::Saved { command: SavedCommands::Has { .. } }));

        let cli = Cli::try_parse_from(["nk", "library", "how-to"]).unwrap();
        assert!(matches!(cli.command, Commands::Library { kind: LibraryKind::HowTo }));
    }

    #[tokio::test]
    async fn test_store_commands_need_no_model() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_str().unwrap();
        let mut cli = Cli::try_parse_from(["nk", "--data-dir", data_dir, "saved", "list"]).unwrap();
        cli.api_key = None;

        let services = Services::build(&cli).await.unwrap();
        assert!(services.saved.list().await.is_empty());
        assert!(services.admin.list().await.is_empty());
        assert!(services.gateway().is_err());

        cli.model = "dummy".to_string();
        let services = Services::build(&cli).await.unwrap();
        assert_eq!(services.gateway().unwrap().model_name(), "Dummy");
    }

    #[test]
    fn test_cli_verify() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
