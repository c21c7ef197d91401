//! CLI command definitions, routing, and tracing setup.

use std::sync::Arc;

use blackstar_client::{BlackstarClient, ContentBinder};
use blackstar_core::{Collection, Query, RawQuery};
use blackstar_shared::{
    AppConfig, Chunk, ChunkId, ClientConfig, ErrorReport, NewChunk, init_config, load_config,
    parse_base_url,
};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Blackstar — read and edit content chunks on a Blackstar CMS server.
#[derive(Parser)]
#[command(
    name = "blackstar",
    version,
    about = "Read and edit content chunks on a Blackstar CMS server.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Server origin; overrides `[server] base_url` from the config file.
    #[arg(long, global = true, env = "BLACKSTAR_URL")]
    pub base_url: Option<String>,

    /// Print chunks as pretty JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Post failures to the server's error endpoint.
    #[arg(long, global = true)]
    pub report_errors: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    #[command(flatten)]
    Remote(RemoteCommand),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Subcommands that talk to the server.
#[derive(Subcommand)]
pub(crate) enum RemoteCommand {
    /// Fetch chunks by ids, names, or tags (exactly one).
    Get {
        /// Chunk ids, comma separated.
        #[arg(long, value_delimiter = ',')]
        ids: Option<Vec<i64>>,

        /// Chunk names, comma separated.
        #[arg(long, value_delimiter = ',')]
        names: Option<Vec<String>>,

        /// Tags, comma separated.
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
    },

    /// Fetch every chunk.
    List,

    /// Create a new chunk.
    Create {
        /// Chunk name.
        #[arg(long)]
        name: String,

        /// Tags, comma separated.
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,

        /// Content; parsed as JSON when possible, otherwise stored as a string.
        #[arg(long, default_value = "")]
        value: String,
    },

    /// Change fields of an existing chunk.
    Update {
        /// Id of the chunk to change.
        #[arg(long)]
        id: i64,

        /// New name.
        #[arg(long)]
        name: Option<String>,

        /// New tags, comma separated (replaces all tags).
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,

        /// New content.
        #[arg(long)]
        value: Option<String>,
    },

    /// Delete a chunk.
    Delete {
        /// Id of the chunk to delete.
        #[arg(long)]
        id: i64,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "blackstar=info",
        1 => "blackstar=debug",
        _ => "blackstar=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let Cli {
        base_url,
        json,
        report_errors,
        command,
        ..
    } = cli;

    let command = match command {
        Command::Config { action } => {
            return match action {
                ConfigAction::Init => cmd_config_init(),
                ConfigAction::Show => cmd_config_show(base_url.as_deref()),
            };
        }
        Command::Remote(command) => command,
    };

    let config = resolve_config(base_url.as_deref())?;
    let client = build_client(&config, json)?;

    let outcome = match command {
        RemoteCommand::Get { ids, names, tags } => {
            // An ambiguous selection fails here and sends nothing but the
            // optional error report.
            match Query::from_raw(RawQuery {
                ids: ids.map(to_ids),
                names,
                tags,
            }) {
                Ok(query) => cmd_get(&client, &query).await,
                Err(e) => Err(e.into()),
            }
        }
        RemoteCommand::List => cmd_list(&client).await,
        RemoteCommand::Create { name, tags, value } => {
            cmd_create(&client, name, tags, &value, json).await
        }
        RemoteCommand::Update {
            id,
            name,
            tags,
            value,
        } => cmd_update(&client, ChunkId(id), name, tags, value.as_deref(), json).await,
        RemoteCommand::Delete { id } => cmd_delete(&client, ChunkId(id)).await,
    };

    if let (Err(e), true) = (&outcome, report_errors) {
        client
            .report_error(&ErrorReport::new(e.to_string()).with_source("blackstar-cli"))
            .await;
    }

    outcome
}

fn to_ids(ids: Vec<i64>) -> Vec<ChunkId> {
    ids.into_iter().map(ChunkId).collect()
}

fn resolve_config(base_url: Option<&str>) -> Result<ClientConfig> {
    let mut app = load_config()?;
    if let Some(url) = base_url {
        app.server.base_url = url.to_string();
    }
    Ok(ClientConfig::try_from(&app)?)
}

fn build_client(config: &ClientConfig, json: bool) -> Result<BlackstarClient> {
    if config.token.is_none() {
        info!("no bearer token configured; relying on cookies only");
    }

    let client = BlackstarClient::new(config)?
        .with_binder(Arc::new(StdoutBinder { json }))
        .with_auth_hook(Arc::new(|url: &str| {
            warn!(%url, "authentication required; set the token env var named in [auth] token_env");
        }));
    Ok(client)
}

// ---------------------------------------------------------------------------
// Stdout binder
// ---------------------------------------------------------------------------

/// Writes every fetched collection to stdout.
struct StdoutBinder {
    json: bool,
}

impl ContentBinder for StdoutBinder {
    fn bind(&self, chunks: &Collection) {
        if self.json {
            match serde_json::to_string_pretty(chunks) {
                Ok(out) => println!("{out}"),
                Err(e) => warn!(error = %e, "failed to render chunks as JSON"),
            }
            return;
        }

        if chunks.is_empty() {
            println!("(no chunks)");
            return;
        }
        for chunk in chunks {
            print_chunk(chunk);
        }
    }
}

fn print_chunk(chunk: &Chunk) {
    println!("#{:<6} {}", chunk.id, chunk.name);
    if !chunk.tags.is_empty() {
        println!("        tags:  {}", chunk.tags.join(", "));
    }
    match &chunk.value {
        serde_json::Value::Null => {}
        serde_json::Value::String(s) => println!("        value: {s}"),
        other => println!("        value: {other}"),
    }
}

fn print_saved(chunk: &Chunk, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(chunk)?);
    } else {
        print_chunk(chunk);
    }
    Ok(())
}

fn parse_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_get(client: &BlackstarClient, query: &Query) -> Result<()> {
    info!(kind = %query.kind(), values = query.len(), "fetching chunks");
    client.get(query).await?;
    Ok(())
}

async fn cmd_list(client: &BlackstarClient) -> Result<()> {
    info!("fetching all chunks");
    client.get_all().await?;
    Ok(())
}

async fn cmd_create(
    client: &BlackstarClient,
    name: String,
    tags: Vec<String>,
    value: &str,
    json: bool,
) -> Result<()> {
    let new_chunk = NewChunk {
        name,
        tags,
        value: parse_value(value),
    };
    let saved = client.create(&new_chunk).await?;
    print_saved(&saved, json)
}

async fn cmd_update(
    client: &BlackstarClient,
    id: ChunkId,
    name: Option<String>,
    tags: Option<Vec<String>>,
    value: Option<&str>,
    json: bool,
) -> Result<()> {
    if name.is_none() && tags.is_none() && value.is_none() {
        return Err(eyre!("nothing to update: pass --name, --tags, or --value"));
    }

    // Read through a binder-free client so only the saved chunk is printed.
    let current = client.without_binder().get(&Query::Ids(vec![id])).await?;
    let mut chunk = current
        .by_id(id)
        .cloned()
        .ok_or_else(|| eyre!("chunk {id} not found"))?;

    if let Some(name) = name {
        chunk.name = name;
    }
    if let Some(tags) = tags {
        chunk.tags = tags;
    }
    if let Some(value) = value {
        chunk.value = parse_value(value);
    }

    let saved = client.update(&chunk).await?;
    print_saved(&saved, json)
}

async fn cmd_delete(client: &BlackstarClient, id: ChunkId) -> Result<()> {
    client.delete(id).await?;
    println!("deleted chunk {id}");
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(base_url: Option<&str>) -> Result<()> {
    let mut config: AppConfig = load_config()?;
    if let Some(url) = base_url {
        parse_base_url(url)?;
        config.server.base_url = url.to_string();
    }
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
