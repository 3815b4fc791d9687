use std::sync::Arc;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use dancefloor::{cli, config, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the web app
    Serve,

    /// Authorize with Spotify API
    Auth,

    /// Show the most danceable tracks of all playlists
    Rank(RankOptions),

    #[clap(about = "Create a playlist from the most danceable tracks")]
    Playlist(PlaylistOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct RankOptions {
    /// Ignore the cached ranking and recompute it
    #[clap(long)]
    refresh: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct PlaylistOptions {
    /// Name of the playlist to create
    #[clap(long)]
    name: String,

    /// Ignore the cached ranking and recompute it
    #[clap(long)]
    refresh: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    if let Command::Completions(opt) = &cli.command {
        let mut cmd = Cli::command_for_update();
        let name = cmd.get_name().to_string();
        generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
        return;
    }

    let config = match config::Config::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => error!("Invalid configuration: {}", e),
    };

    match cli.command {
        Command::Serve => cli::serve(config).await,
        Command::Auth => cli::auth(config).await,
        Command::Rank(opt) => cli::rank(config, opt.refresh).await,
        Command::Playlist(opt) => cli::playlist(config, opt.name, opt.refresh).await,
        Command::Completions(_) => {}
    }
}
