//! Trackmap - browse your tracks!

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod api;
mod cli;
mod config;

use anyhow::Context;
use api::client::ApiClient;
use api::schema::{Campus, TrackData, TrackPoint};
use clap::Parser;
use cli::{CampusesCommand, Cli, Command, TracksCommand, UsersCommand};
use futures::{stream, StreamExt};
use log::{debug, error};
use std::path::Path;
use tokio::runtime::Runtime;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let Cli {
        api_config,
        parallel_requests,
        command,
    } = Cli::parse();

    let client = ApiClient::new(&api_config).context("Failed to initialize API client")?;

    let rt = Runtime::new()?;
    rt.block_on(run(&client, &command, parallel_requests as usize))
}

/// Dispatches the parsed command to the API client and prints the results.
async fn run(client: &ApiClient, command: &Command, parallel_requests: usize) -> anyhow::Result<()> {
    match command {
        Command::Tracks(tracks_command) => {
            run_tracks(client, tracks_command, parallel_requests).await
        }
        Command::Users(users_command) => run_users(client, users_command).await,
        Command::Campuses(campuses_command) => run_campuses(client, campuses_command).await,
        Command::Health => {
            let envelope = client.health().await.context("Failed to reach the backend")?;
            println!(
                "Backend replied: code={} message={}",
                envelope.code,
                envelope.message.as_deref().unwrap_or("-")
            );
            Ok(())
        }
    }
}

/// Runs a query over tracks.
async fn run_tracks(
    client: &ApiClient,
    command: &TracksCommand,
    parallel_requests: usize,
) -> anyhow::Result<()> {
    match command {
        TracksCommand::List => {
            let envelope = client
                .get_track_list()
                .await
                .context("Failed to list tracks")?;
            debug!("Response = {envelope:#?}");
            for track in &envelope.data {
                print_track(track);
            }
        }
        TracksCommand::All => {
            let envelope = client
                .get_all_tracks()
                .await
                .context("Failed to list all tracks")?;
            debug!("Response = {envelope:#?}");
            for track in &envelope.data {
                print_track(track);
            }
        }
        TracksCommand::Points { track_id } => {
            let envelope = client
                .get_track_points(track_id)
                .await
                .with_context(|| format!("Failed to load points of track {track_id}"))?;
            debug!("Response = {envelope:#?}");
            for point in &envelope.data {
                print_point(point);
            }
        }
        TracksCommand::Fetch => {
            fetch_all_track_points(client, parallel_requests).await?;
        }
        TracksCommand::Upload { file } => {
            let bytes = tokio::fs::read(file)
                .await
                .with_context(|| format!("Failed to read file {file}"))?;
            let file_name = Path::new(file)
                .file_name()
                .and_then(|f| f.to_str())
                .unwrap_or("upload.bin");
            let envelope = client
                .upload_track_data(file_name, bytes)
                .await
                .context("Failed to upload track data")?;
            println!(
                "Uploaded {file_name}: code={} message={} track={}",
                envelope.code,
                envelope.message.as_deref().unwrap_or("-"),
                envelope.data.as_deref().unwrap_or("-")
            );
        }
    }
    Ok(())
}

/// Lists the tracks, then fetches every track's points, with up to
/// `parallel_requests` requests in flight.
async fn fetch_all_track_points(
    client: &ApiClient,
    parallel_requests: usize,
) -> anyhow::Result<()> {
    let envelope = client
        .get_track_list()
        .await
        .context("Failed to list tracks")?;

    stream::iter(envelope.data)
        .map(|track| async move {
            let points = client.get_track_points(&track.id).await;
            (track, points)
        })
        .buffer_unordered(parallel_requests)
        .for_each(|(track, points)| async move {
            match points {
                Ok(envelope) => {
                    println!("{} ({}): {} points", track.name, track.id, envelope.data.len());
                }
                Err(e) => error!("Couldn't load points of track {}: {e}", track.id),
            }
        })
        .await;

    Ok(())
}

/// Runs a query over users.
async fn run_users(client: &ApiClient, command: &UsersCommand) -> anyhow::Result<()> {
    match command {
        UsersCommand::Search { query } => {
            let envelope = client
                .search_users(query)
                .await
                .with_context(|| format!("Failed to search users matching {query:?}"))?;
            debug!("Response = {envelope:#?}");
            for user in &envelope.data {
                println!(
                    "{} ({}) campus={}",
                    user.name,
                    user.id,
                    user.campus_id.as_deref().unwrap_or("-")
                );
            }
        }
        UsersCommand::Info { user_id } => {
            let envelope = client
                .get_user_info(user_id)
                .await
                .with_context(|| format!("Failed to get user {user_id}"))?;
            let user = &envelope.data;
            println!(
                "{} ({}) campus={}",
                user.name,
                user.id,
                user.campus_id.as_deref().unwrap_or("-")
            );
        }
        UsersCommand::Tracks { user_id } => {
            let envelope = client
                .get_user_tracks(user_id)
                .await
                .with_context(|| format!("Failed to get tracks of user {user_id}"))?;
            debug!("Response = {envelope:#?}");
            for track in &envelope.data {
                print_track(track);
            }
        }
    }
    Ok(())
}

/// Runs a query over campuses.
async fn run_campuses(client: &ApiClient, command: &CampusesCommand) -> anyhow::Result<()> {
    match command {
        CampusesCommand::List => {
            let envelope = client
                .get_campus_list()
                .await
                .context("Failed to list campuses")?;
            debug!("Response = {envelope:#?}");
            for campus in &envelope.data {
                print_campus(campus);
            }
        }
        CampusesCommand::Info { campus_id } => {
            let envelope = client
                .get_campus_info(campus_id)
                .await
                .with_context(|| format!("Failed to get campus {campus_id}"))?;
            print_campus(&envelope.data);
        }
    }
    Ok(())
}

/// Prints a one-line summary of a track.
fn print_track(track: &TrackData) {
    println!(
        "{} ({}) account={} points={} from={} to={}",
        track.name, track.id, track.account_id, track.total_points, track.start_time, track.end_time
    );
}

/// Prints a one-line summary of a track point.
fn print_point(point: &TrackPoint) {
    println!(
        "{}: ({}, {}) accuracy={:?} speed={:?}",
        point.timestamp, point.latitude, point.longitude, point.accuracy, point.speed
    );
}

/// Prints a one-line summary of a campus.
fn print_campus(campus: &Campus) {
    match (campus.latitude, campus.longitude) {
        (Some(latitude), Some(longitude)) => {
            println!("{} ({}) at ({latitude}, {longitude})", campus.name, campus.id)
        }
        _ => println!("{} ({})", campus.name, campus.id),
    }
}
