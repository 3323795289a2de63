//! Command-line interface.

use crate::config::ApiConfig;
use clap::{Parser, Subcommand};

/// Browse the track platform from your terminal.
#[derive(Parser, Debug)]
#[command(name = "Trackmap")]
#[command(version)]
#[command(author)]
#[command(about = "Browse GPS tracks, users and campuses", long_about = None)]
pub struct Cli {
    /// JSON file containing the API endpoint configuration.
    #[arg(long = "api-config", value_parser = clap::value_parser!(ApiConfig))]
    pub api_config: ApiConfig,

    /// Maximum number of requests to send in parallel to the server.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub parallel_requests: u32,

    /// What to query.
    #[command(subcommand)]
    pub command: Command,
}

/// Available queries.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Query tracks.
    #[command(subcommand)]
    Tracks(TracksCommand),

    /// Query users.
    #[command(subcommand)]
    Users(UsersCommand),

    /// Query campuses.
    #[command(subcommand)]
    Campuses(CampusesCommand),

    /// Check that the backend is up.
    Health,
}

/// Queries over tracks.
#[derive(Subcommand, Debug)]
pub enum TracksCommand {
    /// List track summaries.
    List,

    /// List every track with its full data.
    All,

    /// Print the points of one track.
    Points {
        /// Identifier of the track.
        #[arg(long)]
        track_id: String,
    },

    /// List tracks, then fetch every track's points in parallel.
    Fetch,

    /// Upload a track data file.
    Upload {
        /// Path of the file to upload.
        #[arg(long, short = 'f')]
        file: String,
    },
}

/// Queries over users.
#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// Search users by free-text query.
    Search {
        /// Text to search for.
        #[arg(long, short = 'q')]
        query: String,
    },

    /// Print one user's record.
    Info {
        /// Identifier of the user.
        #[arg(long)]
        user_id: String,
    },

    /// List one user's tracks.
    Tracks {
        /// Identifier of the user.
        #[arg(long)]
        user_id: String,
    },
}

/// Queries over campuses.
#[derive(Subcommand, Debug)]
pub enum CampusesCommand {
    /// List campuses.
    List,

    /// Print one campus's record.
    Info {
        /// Identifier of the campus.
        #[arg(long)]
        campus_id: String,
    },
}
