use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;

use spotify_catalog::controller::{
    CatalogController, FetchOutcome, PaginatedCollection, SearchState, SearchView,
};
use spotify_catalog::model::{Album, Playlist};
use spotify_catalog::{BearerToken, CatalogApiClient, CatalogConfig, logging};

#[derive(Parser, Debug)]
#[command(author, version, about = "Browse the Spotify catalog from the terminal", long_about = None)]
struct Cli {
    /// OAuth access token
    #[arg(short, long, env = "SPOTIFY_ACCESS_TOKEN", hide_env_values = true)]
    token: String,

    /// Override the API base URL
    #[arg(long)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search tracks, artists and albums
    Search { query: String },

    /// List your playlists
    Playlists {
        /// Number of pages to fetch
        #[arg(short, long, default_value = "1")]
        pages: u32,
    },

    /// List new album releases
    NewReleases {
        #[arg(short, long, default_value = "1")]
        pages: u32,
    },

    /// Show your profile
    Profile,

    /// Type queries line by line; results follow as you type
    Interactive,
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = logging::init_logging() {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== Spotify Catalog Starting ===");

    let cli = Cli::parse();
    let mut config = CatalogConfig::from_env().context("invalid CATALOG_* configuration")?;
    if let Some(api_url) = cli.api_url {
        config = config.with_api_url(api_url);
    }

    let client = CatalogApiClient::new(&config, Arc::new(BearerToken::new(cli.token)))?;
    let catalog = CatalogController::new(client, &config);

    match cli.command {
        Command::Search { query } => {
            catalog.search.submit(query).await;
            print_search(&catalog.search.state());
        }
        Command::Playlists { pages } => {
            load_pages(catalog.playlists.as_ref(), pages).await;
            let state = catalog.playlists.state();
            for playlist in &state.items {
                print_playlist(playlist);
            }
            print_footer(state.items.len(), state.total, state.error.as_ref());
        }
        Command::NewReleases { pages } => {
            load_pages(catalog.new_releases.as_ref(), pages).await;
            let state = catalog.new_releases.state();
            for album in &state.items {
                print_album(album);
            }
            print_footer(state.items.len(), state.total, state.error.as_ref());
        }
        Command::Profile => {
            catalog.profile.load().await;
            let state = catalog.profile.state();
            match (state.value, state.error) {
                (_, Some(e)) => println!("{}", e.user_message()),
                (Some(profile), None) => {
                    println!("{} ({})", profile.display_name.as_deref().unwrap_or(&profile.id), profile.id);
                    if let Some(country) = &profile.country {
                        println!("Country:   {}", country);
                    }
                    if let Some(product) = &profile.product {
                        println!("Plan:      {}", product);
                    }
                    println!("Followers: {}", profile.follower_count());
                }
                (None, None) => println!("No profile loaded"),
            }
        }
        Command::Interactive => run_interactive(&catalog).await?,
    }

    tracing::info!("=== Spotify Catalog Exiting ===");
    Ok(())
}

async fn load_pages<T: Clone + Send + Sync + 'static>(collection: &PaginatedCollection<T>, pages: u32) {
    if !matches!(collection.load().await, FetchOutcome::Applied { .. }) {
        return;
    }
    for _ in 1..pages {
        if !matches!(collection.load_more().await, FetchOutcome::Applied { .. }) {
            break;
        }
    }
}

async fn run_interactive(catalog: &CatalogController) -> Result<()> {
    println!("Type to search. Empty line clears, Ctrl-D quits.");

    let mut updates = catalog.search.subscribe();
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let printer = tokio::spawn(async move {
        let mut last_shown = {
            let initial = updates.borrow_and_update();
            Some((initial.sequence, initial.view()))
        };
        loop {
            let stopping = tokio::select! {
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    false
                }
                _ = &mut stop_rx => true,
            };

            let state = updates.borrow_and_update().clone();
            let key = (state.sequence, state.view());
            if !state.loading && last_shown != Some(key) {
                last_shown = Some(key);
                print_search(&state);
            }
            if stopping {
                break;
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        catalog.search.set_query(line).await;
    }

    // Input closed; search the last line if it is still inside the debounce window.
    catalog.search.flush().await;
    let _ = stop_tx.send(());
    printer.await?;
    Ok(())
}

fn print_search(state: &SearchState) {
    match state.view() {
        SearchView::Initial => println!("(cleared)"),
        SearchView::Searching => println!("Searching..."),
        SearchView::NoResults => println!("No results for \"{}\"", state.query.trim()),
        SearchView::Failed => {
            if let Some(e) = &state.error {
                println!("{}", e.user_message());
            }
        }
        SearchView::Results => {
            println!("Tracks ({}):", state.tracks.total);
            for track in &state.tracks.items {
                println!("  {} - {}", track.name, track.artist_names());
            }
            println!("Artists ({}):", state.artists.total);
            for artist in &state.artists.items {
                println!("  {}", artist.name);
            }
            println!("Albums ({}):", state.albums.total);
            for album in &state.albums.items {
                print_album(album);
            }
        }
    }
}

fn print_playlist(playlist: &Playlist) {
    println!(
        "  {} by {} ({} tracks)",
        playlist.name,
        playlist.owner_name(),
        playlist.track_total()
    );
}

fn print_album(album: &Album) {
    match album.release_year() {
        Some(year) => println!("  {} - {} ({})", album.name, album.artist_names(), year),
        None => println!("  {} - {}", album.name, album.artist_names()),
    }
}

fn print_footer(shown: usize, total: u32, error: Option<&spotify_catalog::CatalogError>) {
    println!("{} of {}", shown, total);
    if let Some(e) = error {
        println!("{}", e.user_message());
    }
}
