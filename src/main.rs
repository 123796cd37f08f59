//! Command line front end for the mock backend.
//!
//! ```bash
//! mockfetch users
//! mockfetch --delay-ms 0 posts --user 1
//! mockfetch create --title "Hello" --body "World" --user 1
//! RUST_LOG=mockfetch=debug mockfetch demo
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::executor::block_on;
use mockfetch::{
    Client, Config, Id, NewPost,
    screens::{PostBoard, ProfileChain, Status, UserDirectory},
};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Mock REST backend with simulated latency, failures and a tagged query cache.
#[derive(Parser)]
#[command(name = "mockfetch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory searched for `mockfetch.toml`.
    #[arg(long, global = true, default_value = ".")]
    config_dir: PathBuf,

    /// Seed of the fixture generator.
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Delay of every request in milliseconds.
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    /// Probability of an injected network failure.
    #[arg(long, global = true)]
    error_rate: Option<f64>,

    /// Report failed reads instead of serving generated fixtures.
    #[arg(long, global = true)]
    no_fallback: bool,

    /// Log every request and cache decision.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all users.
    Users,

    /// Show one user.
    User { id: Id },

    /// List posts.
    Posts {
        /// Only posts of this user.
        #[arg(long)]
        user: Option<Id>,
    },

    /// Create a post.
    Create {
        #[arg(long)]
        title: String,

        #[arg(long)]
        body: String,

        #[arg(long)]
        user: Id,
    },

    /// Delete a post.
    Delete { id: Id },

    /// Load a user and then that user's posts.
    Chain { id: Id },

    /// List, create, refresh, delete and refresh again.
    Demo,
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let mut config = Config::load(&self.config_dir).context("failed to load configuration")?;
        if let Some(seed) = self.seed {
            config.fixtures.seed = Some(seed);
        }
        if let Some(delay_ms) = self.delay_ms {
            config.network = config.network.with_delay(delay_ms);
        }
        if let Some(error_rate) = self.error_rate {
            config.network.error_rate = error_rate;
        }
        if self.no_fallback {
            config.network.fallback = false;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config()?;
    let client = Client::from_config(&config).context("failed to read the bundled fixtures")?;
    block_on(run(cli.command, client))
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("mockfetch=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mockfetch=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(command: Command, client: Client) -> Result<()> {
    match command {
        Command::Users => print(&*client.users().await?),
        Command::User { id } => print(&client.user(id).await?),
        Command::Posts { user: None } => print(&*client.posts().await?),
        Command::Posts { user: Some(id) } => print(&*client.user_posts(id).await?),
        Command::Create { title, body, user } => {
            print(&client.create_post(NewPost::new(title, body, user)).await?)
        }
        Command::Delete { id } => {
            client.delete_post(id).await?;
            info!(id, "deleted post");
            Ok(())
        }
        Command::Chain { id } => {
            let profile = ProfileChain::new(client)
                .load(id)
                .await
                .context("profile load was superseded")??;
            print(&json!({ "user": profile.user, "posts": &*profile.posts }))
        }
        Command::Demo => demo(client).await,
    }
}

async fn demo(client: Client) -> Result<()> {
    let board = PostBoard::new(client.clone());
    board.refresh().await;
    info!(posts = len(&board.posts()), "loaded posts");

    let created = board
        .create(NewPost::new(
            "Hello from mockfetch",
            "Written by the demo command and removed right after.",
            1,
        ))
        .await?;
    info!(id = created.id, posts = len(&board.posts()), "created post");

    board.delete(created.id).await?;
    info!(posts = len(&board.posts()), "deleted post");

    let directory = UserDirectory::new(client.clone());
    directory.load().await;
    directory.select(1).await;
    if let Some(user) = directory.selected().ready() {
        info!(id = user.id, name = %user.name, "selected user");
    }

    let chain = ProfileChain::new(client.clone());
    if let Some(Err(e)) = chain.load(11).await {
        warn!(error = %e, "profile chain stopped");
    }

    print(&json!({
        "posts": len(&board.posts()),
        "users": len(&directory.users()),
        "requests": client.api().total_calls(),
        "cachedQueries": client.cache().len(),
    }))
}

fn len<T>(status: &Status<std::rc::Rc<Vec<T>>>) -> usize {
    status.ready().map_or(0, |items| items.len())
}

fn print(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
