/// WebAmp - headless player and library manager
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use webamp_cli::{
    commands::{self, library, PlayOptions, SongInput},
    CliConfig,
};
use webamp_core::{PlaylistId, Provider, TrackId};
use webamp_storage::LocalStorageContext;

#[derive(Parser)]
#[command(name = "webamp")]
#[command(about = "WebAmp playlist manager and terminal player", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./webamp.toml when present)
    #[arg(short, long, global = true, env = "WEBAMP_CONFIG")]
    config: Option<PathBuf>,

    /// Data directory, overriding the configuration
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage playlists
    #[command(subcommand)]
    Playlist(PlaylistCommand),
    /// Listening statistics
    #[command(subcommand)]
    Usage(UsageCommand),
    /// Show the playable id a URL resolves to
    Resolve {
        url: String,
        #[arg(short, long, value_enum, default_value_t = ProviderArg::Youtube)]
        provider: ProviderArg,
    },
    /// Play a playlist through the simulated backend
    Play {
        /// Playlist id
        playlist: String,
        /// Start with shuffle on
        #[arg(long)]
        shuffle: bool,
        /// Start with repeat on
        #[arg(long)]
        repeat: bool,
    },
}

#[derive(Subcommand)]
enum PlaylistCommand {
    /// List all playlists
    List,
    /// Create an empty playlist
    Create {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Show a playlist and its songs
    Show { id: String },
    /// Add a song to a playlist
    Add {
        id: String,
        url: String,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        artist: Option<String>,
        #[arg(short, long, value_enum, default_value_t = ProviderArg::Youtube)]
        provider: ProviderArg,
        /// Song length in seconds
        #[arg(long)]
        length: Option<f64>,
    },
    /// Remove a song from a playlist
    Remove { id: String, song_id: String },
    /// Turn a vibe playlist into a permanent one
    Keep { id: String },
    /// Import a playlist (or an array of playlists) from a JSON file
    Import { path: PathBuf },
    /// Export one playlist, or all of them, as JSON
    Export { id: Option<String> },
    /// Delete a playlist
    Delete { id: String },
}

#[derive(Subcommand)]
enum UsageCommand {
    /// Most listened playlists
    Top {
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProviderArg {
    Youtube,
    Soundcloud,
    Vimeo,
    Dailymotion,
}

impl From<ProviderArg> for Provider {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Youtube => Provider::Youtube,
            ProviderArg::Soundcloud => Provider::Soundcloud,
            ProviderArg::Vimeo => Provider::Vimeo,
            ProviderArg::Dailymotion => Provider::Dailymotion,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webamp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = CliConfig::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir;
    }

    if let Commands::Resolve { url, provider } = &cli.command {
        return library::resolve(url, (*provider).into(), &mut std::io::stdout());
    }

    tracing::debug!("Using data directory {}", config.storage.data_dir.display());
    let ctx = LocalStorageContext::open(&config.storage.data_dir).await?;
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Playlist(command) => run_playlist(&ctx, command, &mut out).await?,
        Commands::Usage(UsageCommand::Top { limit }) => {
            library::top_playlists(&ctx, limit, &mut out).await?;
        }
        Commands::Play {
            playlist,
            shuffle,
            repeat,
        } => {
            drop(out);
            let options = PlayOptions { shuffle, repeat };
            commands::run_player(ctx, &config, &PlaylistId::new(playlist), options).await?;
        }
        Commands::Resolve { .. } => {}
    }

    Ok(())
}

async fn run_playlist(
    ctx: &LocalStorageContext,
    command: PlaylistCommand,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        PlaylistCommand::List => library::list_playlists(ctx, out).await,
        PlaylistCommand::Create { name, description } => {
            library::create_playlist(ctx, &name, description, out).await
        }
        PlaylistCommand::Show { id } => library::show_playlist(ctx, &PlaylistId::new(id), out).await,
        PlaylistCommand::Add {
            id,
            url,
            title,
            artist,
            provider,
            length,
        } => {
            let song = SongInput {
                url,
                title,
                artist,
                provider: provider.into(),
                length_secs: length,
            };
            library::add_song(ctx, &PlaylistId::new(id), song, out).await
        }
        PlaylistCommand::Remove { id, song_id } => {
            library::remove_song(ctx, &PlaylistId::new(id), &TrackId::new(song_id), out).await
        }
        PlaylistCommand::Keep { id } => library::keep_playlist(ctx, &PlaylistId::new(id), out).await,
        PlaylistCommand::Import { path } => library::import_playlists(ctx, &path, out).await,
        PlaylistCommand::Export { id } => {
            let id = id.map(PlaylistId::new);
            library::export_playlists(ctx, id.as_ref(), out).await
        }
        PlaylistCommand::Delete { id } => library::delete_playlist(ctx, &PlaylistId::new(id), out).await,
    }
}
