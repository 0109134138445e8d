//! track-post - Cross-post a track review to social platforms

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use libtrackcast::compose::split_hashtag_input;
use libtrackcast::error::PlatformError;
use libtrackcast::logging::LoggingConfig;
use libtrackcast::poster::{create_platforms, preview_destinations, resolve_destinations, Preview};
use libtrackcast::{Config, CrossPoster, FrontmatterParser, MoreInfo, PostResult, Result, TrackcastError};

#[derive(Parser, Debug)]
#[command(name = "track-post")]
#[command(version)]
#[command(about = "Cross-post a track review to Instagram, Mastodon and Bluesky")]
#[command(long_about = "\
track-post - Cross-post a track review to social platforms

DESCRIPTION:
    track-post reads a track review document (YAML-style frontmatter plus
    the review text), composes a post for each selected platform and
    publishes it together with the track artwork.

    Each platform gets its own layout: an Instagram caption, a Mastodon
    status with prose links, and a Bluesky post shortened to 300
    characters when needed.

USAGE EXAMPLES:
    # Preview every default platform without posting
    track-post tracks/night_drive.md --dry-run

    # Post to Bluesky and Mastodon with two hashtags
    track-post tracks/night_drive.md -p bluesky,mastodon -t techno -t newmusic

    # Machine-readable results
    track-post tracks/night_drive.md --format json

CONFIGURATION:
    Configuration file: ~/.config/trackcast/config.toml
    Override with TRACKCAST_CONFIG. Run track-setup to create one.

EXIT CODES:
    0 - Posted to every selected platform
    1 - Posting failed on at least one platform
    2 - Authentication error
    3 - Invalid input (malformed document, unknown platform)
")]
struct Cli {
    /// Track review document to post
    file: PathBuf,

    /// Target platform(s), comma-separated (default: [defaults].platforms)
    #[arg(short, long, value_delimiter = ',')]
    platform: Vec<String>,

    /// Hashtag to add; repeat for more (with or without a leading #)
    #[arg(short, long = "tag")]
    tags: Vec<String>,

    /// Show the composed posts without posting
    #[arg(long)]
    dry_run: bool,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Never prompt for hashtags, even on a terminal
    #[arg(long)]
    no_prompt: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env("warn", cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let parser = FrontmatterParser::from_config(&config)?;
    let record = parser.parse_file(&cli.file)?;
    let destinations = resolve_destinations(&config, &cli.platform)?;
    let more_info = MoreInfo::from_site(&config.site);

    let mut tags = cli.tags.clone();
    if tags.is_empty() && !cli.no_prompt && !cli.dry_run && atty::is(atty::Stream::Stdin) {
        tags = prompt_hashtags()?;
    }

    if cli.dry_run {
        let previews = preview_destinations(&destinations, &record, &tags, &more_info);
        return print_previews(&previews, &cli.format);
    }

    let platforms = create_platforms(&config, &destinations).await?;
    let mut poster = CrossPoster::new(platforms, more_info);
    let results = poster.publish(&record, &tags).await?;

    print_results(&results, &cli.format)?;

    let failed = results.iter().filter(|r| !r.success).count();
    if failed > 0 {
        return Err(PlatformError::Posting(format!(
            "{} of {} platform(s) failed",
            failed,
            results.len()
        ))
        .into());
    }

    Ok(())
}

/// Space- or comma-separated hashtags from one line of stdin
fn prompt_hashtags() -> Result<Vec<String>> {
    eprint!("Hashtags (e.g. electronicmusic, techno; empty for none): ");
    std::io::stderr().flush().map_err(io_error)?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line).map_err(io_error)?;

    Ok(split_hashtag_input(&line))
}

fn io_error(e: std::io::Error) -> TrackcastError {
    TrackcastError::InvalidInput(format!("Failed to read input: {}", e))
}

fn print_previews(previews: &[Preview], format: &str) -> Result<()> {
    if format == "json" {
        println!("{}", to_json(previews)?);
        return Ok(());
    }

    for preview in previews {
        let limit = preview
            .character_limit
            .map(|l| format!("/{}", l))
            .unwrap_or_default();
        let mut flags = Vec::new();
        if preview.post.shortened {
            flags.push("shortened");
        }
        if !preview.within_limit {
            flags.push("OVER LIMIT");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(", {}", flags.join(", "))
        };

        println!(
            "=== {} ({}{} chars{}) ===",
            preview.platform, preview.post.length, limit, flags
        );
        println!("{}", preview.post.text);
        println!();
    }

    Ok(())
}

fn print_results(results: &[PostResult], format: &str) -> Result<()> {
    if format == "json" {
        println!("{}", to_json(results)?);
        return Ok(());
    }

    for result in results {
        match (&result.platform_post_id, &result.error) {
            (Some(id), _) if result.success => println!("{}: posted {}", result.platform, id),
            (_, Some(error)) => println!("{}: failed: {}", result.platform, error),
            _ => println!("{}: failed", result.platform),
        }
    }

    Ok(())
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| TrackcastError::InvalidInput(format!("Failed to serialize output: {}", e)))
}
