use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use clipseek_core::api::{Category, ComboMode, FrameNumber};

#[derive(Parser, Debug)]
#[command(name = "clipseek", version, about = "Find and fetch replay clips in recorded match logs")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file to load instead of ~/.clipseek/config.toml or ./config.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Tenant to act as. Defaults to the configured tenant.
    #[arg(long, global = true)]
    pub tenant: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Search for clips and print the stubs as JSON.
    Query(QueryArgs),
    /// Fetch frame data for a match window (or the full match).
    Replay(ReplayArgs),
    /// Set the `bugged` tag of a clip.
    Tag(TagArgs),
    /// List the built-in categories.
    Categories,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ServeArgs {
    /// Overrides `http_server.host`.
    #[arg(long)]
    pub host: Option<String>,

    /// Overrides `http_server.port`.
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct QueryArgs {
    #[command(subcommand)]
    pub kind: QueryKind,

    /// Print the cached result without waiting for the background refresh.
    #[arg(long, global = true, default_value_t = false)]
    pub no_wait: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum QueryKind {
    /// Action-state sequence. Steps are `ACTION[:MIN[:MAX]]`, e.g.
    /// `--step CLIFF_WAIT:7 --step FALL:1:3 --step AIR_DODGE`.
    Sequence {
        #[arg(long = "step", required = true, action = clap::ArgAction::Append)]
        steps: Vec<String>,

        #[arg(long)]
        buffer_frames: Option<u32>,

        #[arg(long)]
        match_id: Option<String>,
    },
    /// Top combos per match.
    Combo {
        #[arg(value_parser = parse_combo_mode)]
        mode: ComboMode,

        #[arg(long)]
        match_id: Option<String>,
    },
    /// One of the built-in categories (see `clipseek categories`).
    Category {
        #[arg(value_parser = parse_category)]
        category: Category,

        #[arg(long)]
        buffer_frames: Option<u32>,

        #[arg(long)]
        match_id: Option<String>,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ReplayArgs {
    #[arg(long)]
    pub match_id: String,

    /// Window start in match frames. Omit both bounds for the full replay.
    #[arg(long, requires = "frame_end")]
    pub frame_start: Option<FrameNumber>,

    #[arg(long, requires = "frame_start")]
    pub frame_end: Option<FrameNumber>,

    /// Print only the settings and frame count summary.
    #[arg(long, default_value_t = false)]
    pub summary: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct TagArgs {
    #[arg(long)]
    pub match_id: String,

    #[arg(long)]
    pub frame_start: FrameNumber,

    #[arg(long)]
    pub frame_end: FrameNumber,

    #[arg(long, action = clap::ArgAction::Set, default_value_t = true)]
    pub bugged: bool,
}

fn parse_combo_mode(raw: &str) -> Result<ComboMode, String> {
    raw.parse()
}

fn parse_category(raw: &str) -> Result<Category, String> {
    raw.parse()
}
