//! Word Bank CLI
//!
//! The `wordbank` command manages a word bank on disk and replays messages
//! against it, for administration and for checking rules before a bot picks
//! them up.
//!
//! ## Commands
//!
//! - `set` / `author`: add a reply to a trigger
//! - `delete` / `clear`: remove rules
//! - `list`: show the triggers of one scope
//! - `match`: print the replies a message would select
//! - `respond`: render the reply a message would receive
//! - `media`: save or fetch attachment bytes

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use wordbank_core::metrics::METRICS;
use wordbank_core::{
    ClearTarget, Conversation, FsMediaStore, HttpFetcher, InboundMessage, MediaStore,
    ModerationAction, RemoteFetch, Responder, RuleStore, Scope, SetCommand, Strategy,
    TemplateRenderer, WordBankConfig,
};

#[derive(Parser)]
#[command(name = "wordbank")]
#[command(author = "Stevedores Org")]
#[command(version = wordbank_core::VERSION)]
#[command(about = "Trigger/response word bank for chat bots", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Data directory holding bank.json and the media directory
    #[arg(long, global = true, env = "WORDBANK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append a reply to a trigger
    Set {
        trigger: String,

        reply: String,

        /// Conversation scope (default: global)
        #[arg(short, long)]
        scope: Option<String>,

        /// Match strategy: exact, substring or regex
        #[arg(long, default_value = "exact")]
        strategy: Strategy,
    },

    /// Add a rule from an authoring command such as `模糊问 hi 答 hello`
    Author {
        command: String,

        /// Conversation the command was issued in
        #[arg(short, long)]
        scope: String,
    },

    /// Remove a trigger and all its replies
    Delete {
        trigger: String,

        #[arg(short, long)]
        scope: Option<String>,

        #[arg(long, default_value = "exact")]
        strategy: Strategy,
    },

    /// Clear the whole bank or one scope
    Clear {
        /// Reset every scope and strategy
        #[arg(long, conflicts_with = "scope")]
        all: bool,

        /// Scope to clear ("0" is the global scope)
        #[arg(short, long)]
        scope: Option<String>,
    },

    /// List triggers stored in a scope
    List {
        #[arg(short, long)]
        scope: Option<String>,

        /// Restrict to one strategy (default: all)
        #[arg(long)]
        strategy: Option<Strategy>,
    },

    /// Print the reply list a message would select
    Match {
        message: String,

        #[arg(short, long)]
        scope: Option<String>,

        /// Treat the message as addressed to the bot
        #[arg(long)]
        to_me: bool,

        /// Only try one strategy
        #[arg(long)]
        strategy: Option<Strategy>,
    },

    /// Render the reply a message would receive
    Respond {
        message: String,

        /// Group conversation id
        #[arg(short, long, conflicts_with = "private")]
        group: Option<String>,

        /// Private conversation id
        #[arg(short, long)]
        private: Option<String>,

        #[arg(long)]
        to_me: bool,

        #[arg(long, default_value = "someone")]
        sender_name: String,

        #[arg(long, default_value = "0")]
        sender_id: String,
    },

    /// Media store operations
    Media {
        #[command(subcommand)]
        action: MediaAction,
    },
}

#[derive(Subcommand)]
enum MediaAction {
    /// Copy a local file into the media store
    Save {
        file: PathBuf,

        /// Stored name (default: the file name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Download a URL into the media store
    Fetch {
        url: String,

        #[arg(short, long)]
        name: String,
    },
}

/// Prints mute requests instead of performing them.
struct PrintModeration;

#[async_trait]
impl ModerationAction for PrintModeration {
    async fn mute(
        &self,
        scope: &Scope,
        user_id: &str,
        duration: Duration,
    ) -> wordbank_core::Result<()> {
        println!("(would mute {} in {} for {}s)", user_id, scope, duration.as_secs());
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    wordbank_core::init_tracing(cli.json, level);

    let mut config = WordBankConfig::from_env();
    if let Some(dir) = &cli.data_dir {
        config = config.with_data_dir(dir);
    }

    let result = run(cli.command, &config).await;
    METRICS.flush();
    result
}

async fn run(command: Commands, config: &WordBankConfig) -> Result<()> {
    match command {
        Commands::Set {
            trigger,
            reply,
            scope,
            strategy,
        } => cmd_set(config, &scope_or_global(scope), &trigger, &reply, strategy),
        Commands::Author { command, scope } => cmd_author(config, &command, Scope::new(scope)),
        Commands::Delete {
            trigger,
            scope,
            strategy,
        } => cmd_delete(config, &scope_or_global(scope), &trigger, strategy),
        Commands::Clear { all, scope } => {
            let target = match (all, scope) {
                (true, _) => ClearTarget::All,
                (false, Some(scope)) => ClearTarget::Scope(Scope::new(scope)),
                (false, None) => bail!("pass --all or --scope <id>"),
            };
            cmd_clear(config, target)
        }
        Commands::List { scope, strategy } => cmd_list(config, &scope_or_global(scope), strategy),
        Commands::Match {
            message,
            scope,
            to_me,
            strategy,
        } => cmd_match(config, &scope_or_global(scope), &message, to_me, strategy),
        Commands::Respond {
            message,
            group,
            private,
            to_me,
            sender_name,
            sender_id,
        } => {
            let conversation = match (group, private) {
                (Some(id), _) => Conversation::Group(id),
                (None, Some(id)) => Conversation::Private(id),
                (None, None) => bail!("pass --group <id> or --private <id>"),
            };
            let inbound = InboundMessage {
                conversation,
                text: message,
                to_me,
                sender_name,
                sender_id,
            };
            cmd_respond(config, inbound).await
        }
        Commands::Media { action } => match action {
            MediaAction::Save { file, name } => cmd_media_save(config, &file, name).await,
            MediaAction::Fetch { url, name } => cmd_media_fetch(config, &url, &name).await,
        },
    }
}

fn scope_or_global(scope: Option<String>) -> Scope {
    scope.map(Scope::new).unwrap_or_else(Scope::global)
}

fn open_store(config: &WordBankConfig) -> Result<RuleStore> {
    RuleStore::open_with_config(config)
        .with_context(|| format!("Failed to open word bank at {:?}", config.bank_path()))
}

fn open_media(config: &WordBankConfig) -> Result<FsMediaStore> {
    FsMediaStore::new(config.media_dir())
        .with_context(|| format!("Failed to open media store at {:?}", config.media_dir()))
}

fn cmd_set(
    config: &WordBankConfig,
    scope: &Scope,
    trigger: &str,
    reply: &str,
    strategy: Strategy,
) -> Result<()> {
    let store = open_store(config)?;
    let count = store.set(scope, trigger, reply, strategy)?;
    println!(
        "[{}] {} {:?} now has {} repl{}",
        scope,
        strategy,
        trigger,
        count,
        if count == 1 { "y" } else { "ies" }
    );
    store.close()?;
    Ok(())
}

fn cmd_author(config: &WordBankConfig, command: &str, conversation: Scope) -> Result<()> {
    let draft = SetCommand::parse(command)
        .context("Not an authoring command")?
        .into_draft(conversation, &config.nicknames);
    cmd_set(config, &draft.scope, &draft.trigger, &draft.reply, draft.strategy)
}

fn cmd_delete(
    config: &WordBankConfig,
    scope: &Scope,
    trigger: &str,
    strategy: Strategy,
) -> Result<()> {
    let store = open_store(config)?;
    if store.delete(scope, trigger, strategy)? {
        println!("Deleted [{}] {} {:?}", scope, strategy, trigger);
    } else {
        println!("No {} trigger {:?} in [{}]", strategy, trigger, scope);
    }
    store.close()?;
    Ok(())
}

fn cmd_clear(config: &WordBankConfig, target: ClearTarget) -> Result<()> {
    let store = open_store(config)?;
    store.clear(target.clone())?;
    match target {
        ClearTarget::All => println!("Cleared the whole word bank"),
        ClearTarget::Scope(scope) => println!("Cleared scope [{}]", scope),
    }
    store.close()?;
    Ok(())
}

fn cmd_list(config: &WordBankConfig, scope: &Scope, strategy: Option<Strategy>) -> Result<()> {
    let store = open_store(config)?;
    let strategies = match strategy {
        Some(s) => vec![s],
        None => Strategy::ALL.to_vec(),
    };
    for strategy in strategies {
        let triggers = store.triggers(scope, strategy);
        if triggers.is_empty() {
            continue;
        }
        println!("{}:", strategy);
        for trigger in triggers {
            let replies = store.replies(scope, &trigger, strategy).unwrap_or_default();
            println!("  {:?} ({} replies)", trigger, replies.len());
        }
    }
    Ok(())
}

fn cmd_match(
    config: &WordBankConfig,
    scope: &Scope,
    message: &str,
    to_me: bool,
    strategy: Option<Strategy>,
) -> Result<()> {
    let store = open_store(config)?;
    match store.find(scope, message, to_me, strategy) {
        Some(found) => {
            println!("matched {} trigger {:?}", found.strategy, found.trigger);
            for reply in found.replies {
                println!("  {}", reply);
            }
        }
        None => println!("no match"),
    }
    Ok(())
}

async fn cmd_respond(config: &WordBankConfig, inbound: InboundMessage) -> Result<()> {
    let store = Arc::new(open_store(config)?);
    let media = Arc::new(open_media(config)?);
    let responder = Responder::new(store, TemplateRenderer::new(media))
        .with_reply_mode(config.reply_mode)
        .with_moderation(Arc::new(PrintModeration));

    match responder.respond(&inbound).await? {
        Some(message) => println!("{}", message),
        None => println!("(no reply)"),
    }
    Ok(())
}

async fn cmd_media_save(config: &WordBankConfig, file: &Path, name: Option<String>) -> Result<()> {
    let data = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {:?}", file))?;
    let name = match name {
        Some(name) => name,
        None => file
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from)
            .context("File has no usable name; pass --name")?,
    };
    let media = open_media(config)?;
    media.save(&name, &data).await?;
    info!(name = %name, bytes = data.len(), "media saved");
    println!("Saved {} ({} bytes)", name, data.len());
    Ok(())
}

async fn cmd_media_fetch(config: &WordBankConfig, url: &str, name: &str) -> Result<()> {
    let fetcher = HttpFetcher::new()?;
    let data = fetcher
        .fetch(url)
        .await
        .with_context(|| format!("Failed to fetch {}", url))?;
    let media = open_media(config)?;
    media.save(name, &data).await?;
    println!("Saved {} ({} bytes)", name, data.len());
    Ok(())
}
