//! track-new - Create a track review from a Bandcamp URL
//!
//! Scrapes the track page, saves the artwork and markdown, offers YouTube
//! and Spotify matches, records the review typed on stdin, and optionally
//! cross-posts the result.

use anyhow::{bail, Context, Result};
use clap::Parser;
use libtrackcast::compose::split_hashtag_input;
use libtrackcast::creator::{attach_links, attach_review, collect_review, TrackCreator};
use libtrackcast::logging::LoggingConfig;
use libtrackcast::lookup::spotify::SpotifySearch;
use libtrackcast::lookup::youtube::YouTubeSearch;
use libtrackcast::lookup::{search_query, Candidate, Selection};
use libtrackcast::poster::{create_platforms, resolve_destinations};
use libtrackcast::{Config, CrossPoster, FrontmatterParser, MoreInfo, TrackRecord};
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "track-new")]
#[command(version)]
#[command(about = "Create a track review from a Bandcamp URL and optionally cross-post it")]
#[command(long_about = "\
track-new - Create a track review from a Bandcamp URL

DESCRIPTION:
    Scrapes the Bandcamp track page, downloads the artwork and writes a
    markdown document with the review placeholder. Then:

      1. offers YouTube and Spotify search results to link
      2. reads the review from stdin (finish with two empty lines)
      3. asks, per platform, whether to cross-post

    YouTube and Spotify are skipped when their credentials are missing.

CONFIGURATION:
    Configuration file: ~/.config/trackcast/config.toml
    Override with TRACKCAST_CONFIG. Run track-setup to create one.
")]
struct Cli {
    /// Bandcamp track URL (prompted for when omitted)
    url: Option<String>,

    /// Platforms offered for cross-posting, comma-separated
    #[arg(short, long, value_delimiter = ',')]
    platform: Vec<String>,

    /// Hashtag to add; repeat for more
    #[arg(short, long = "tag")]
    tags: Vec<String>,

    /// Skip the YouTube and Spotify searches
    #[arg(long)]
    no_search: bool,

    /// Write the document but never cross-post
    #[arg(long)]
    no_post: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env("warn", cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    let url = match &cli.url {
        Some(url) => url.trim().to_string(),
        None => prompt_line("Bandcamp track URL")?,
    };
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        bail!("'{}' is not an http(s) URL", url);
    }

    let creator = TrackCreator::new(&config)?;
    let created = creator
        .create(&url)
        .await
        .with_context(|| format!("Failed to create a document for {}", url))?;
    let path = created.markdown_path.as_path();
    println!("✓ Created {}", path.display());

    if !cli.no_search {
        link_search_results(&config, &created.record, path).await?;
    }

    println!("\nEnter the review (finish with two empty lines):");
    let review = collect_review(io::stdin().lock().lines().map_while(|line| line.ok()));
    if review.is_empty() {
        println!("No review entered; the placeholder stays in {}", path.display());
    } else {
        attach_review(path, &review)?;
        println!("✓ Review saved");
    }

    if cli.no_post {
        return Ok(());
    }

    let record = FrontmatterParser::from_config(&config)?
        .parse_file(path)
        .with_context(|| format!("Failed to re-read {}", path.display()))?;
    if record.review.is_empty() {
        println!("Not cross-posting without a review.");
        return Ok(());
    }

    cross_post(&config, &record, &cli.platform, &cli.tags).await
}

async fn link_search_results(config: &Config, record: &TrackRecord, path: &Path) -> Result<()> {
    let query = search_query(&record.title, &record.artist);

    let youtube = match YouTubeSearch::from_config(config)? {
        Some(search) => match search.search(&query).await {
            Ok(candidates) => choose("YouTube", &candidates)?,
            Err(e) => {
                warn!("YouTube search failed: {}", e);
                None
            }
        },
        None => {
            println!("YouTube search skipped: no API key configured");
            None
        }
    };

    let spotify = match SpotifySearch::from_config(config)? {
        Some(search) => match search.search(&query).await {
            Ok(candidates) => choose("Spotify", &candidates)?,
            Err(e) => {
                warn!("Spotify search failed: {}", e);
                None
            }
        },
        None => {
            println!("Spotify search skipped: no client credentials configured");
            None
        }
    };

    if youtube.is_some() || spotify.is_some() {
        attach_links(path, youtube.as_deref(), spotify.as_deref())?;
        println!("✓ Links saved");
    }

    Ok(())
}

/// List candidates and read a selection until it parses
fn choose(service: &str, candidates: &[Candidate]) -> Result<Option<String>> {
    if candidates.is_empty() {
        println!("\nNo {} results", service);
        return Ok(None);
    }

    println!("\n{} results:", service);
    for (i, candidate) in candidates.iter().enumerate() {
        println!("  {}. {}", i + 1, candidate);
    }

    loop {
        let input = prompt_line(&format!("Select 1-{} (s to skip)", candidates.len()))?;
        match input.parse::<Selection>() {
            Ok(Selection::Skip) => return Ok(None),
            Ok(selection) => match selection.pick(candidates) {
                Some(candidate) => return Ok(Some(candidate.url.clone())),
                None => println!("Out of range"),
            },
            Err(e) => println!("{}", e),
        }
    }
}

async fn cross_post(
    config: &Config,
    record: &TrackRecord,
    requested: &[String],
    tags: &[String],
) -> Result<()> {
    let mut selected = Vec::new();
    for destination in resolve_destinations(config, requested)? {
        if !config.is_platform_enabled(destination.name()) {
            continue;
        }
        if prompt_yes_no(&format!("Post to {}?", destination), false)? {
            selected.push(destination);
        }
    }

    if selected.is_empty() {
        println!("Nothing posted.");
        return Ok(());
    }

    let mut tags = tags.to_vec();
    if tags.is_empty() {
        tags = split_hashtag_input(&prompt_line(
            "Hashtags (e.g. electronicmusic, techno; empty for none)",
        )?);
    }

    let platforms = create_platforms(config, &selected).await?;
    let mut poster = CrossPoster::new(platforms, MoreInfo::from_site(&config.site));
    let results = poster.publish(record, &tags).await?;

    for result in &results {
        match (&result.platform_post_id, &result.error) {
            (Some(id), _) if result.success => println!("✓ {}: posted {}", result.platform, id),
            (_, Some(error)) => println!("✗ {}: {}", result.platform, error),
            _ => println!("✗ {}: failed", result.platform),
        }
    }

    if results.iter().any(|r| !r.success) {
        bail!("Posting failed on at least one platform");
    }
    Ok(())
}

fn prompt_line(prompt: &str) -> Result<String> {
    print!("{}: ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn prompt_yes_no(prompt: &str, default: bool) -> Result<bool> {
    let default_str = if default { "Y/n" } else { "y/N" };
    print!("{} [{}]: ", prompt, default_str);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(match input.trim().to_lowercase().as_str() {
        "y" | "yes" => true,
        "n" | "no" => false,
        _ => default,
    })
}
