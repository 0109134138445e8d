//! track-setup - Create the Trackcast configuration

use anyhow::{Context, Result};
use clap::Parser;
use libtrackcast::config::{
    resolve_config_path, BlueskyConfig, Config, InstagramConfig, MastodonConfig, SpotifyConfig,
    YouTubeConfig, DEFAULT_GRAPH_API_VERSION, DEFAULT_VISIBILITY,
};
use libtrackcast::logging::LoggingConfig;
use libtrackcast::lookup::{spotify, youtube};
use libtrackcast::platforms::{
    bluesky::{self, BlueskyClient},
    instagram::{self, InstagramClient},
    mastodon::{self, MastodonClient},
    Platform,
};
use secrecy::SecretString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "track-setup")]
#[command(version)]
#[command(about = "Create the Trackcast configuration and show how to add credentials")]
struct Cli {
    /// Write the configuration without prompting
    #[arg(long)]
    non_interactive: bool,

    /// Start from defaults even when a configuration already exists
    #[arg(long)]
    force: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env("warn", cli.verbose).init();

    if let Err(e) = run_setup(&cli).await {
        eprintln!("\nSetup failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_setup(cli: &Cli) -> Result<()> {
    let path = resolve_config_path().context("Could not determine the config file location")?;

    println!("\nTrackcast setup\n");

    let mut config = if path.exists() && !cli.force {
        println!("✓ Found existing configuration at {}\n", path.display());
        Config::load_from_path(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    } else {
        println!("Creating new configuration at {}\n", path.display());
        Config::default()
    };

    create_output_dirs(&config)?;

    let secrets_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    if cli.non_interactive {
        println!("Skipping platform configuration in non-interactive mode.\n");
    } else {
        configure_platforms(&mut config, &secrets_dir).await?;
    }

    config
        .save_to_path(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Configuration written to {}", path.display());
    println!("✓ Configuration saved to {}\n", path.display());

    print_credential_instructions(&config, &secrets_dir);

    Ok(())
}

fn create_output_dirs(config: &Config) -> Result<()> {
    for dir in [config.markdown_dir()?, config.image_dir()?] {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        println!("✓ Output directory {}", dir.display());
    }
    println!();
    Ok(())
}

async fn configure_platforms(config: &mut Config, secrets_dir: &Path) -> Result<()> {
    if prompt_yes_no("Configure Mastodon?", true)? {
        configure_mastodon(config, secrets_dir).await?;
    }
    if prompt_yes_no("\nConfigure Bluesky?", true)? {
        configure_bluesky(config, secrets_dir).await?;
    }
    if prompt_yes_no("\nConfigure Instagram?", false)? {
        configure_instagram(config, secrets_dir).await?;
    }
    if prompt_yes_no("\nConfigure YouTube search?", true)? {
        configure_youtube(config, secrets_dir)?;
    }
    if prompt_yes_no("\nConfigure Spotify search?", true)? {
        configure_spotify(config, secrets_dir)?;
    }
    println!();
    Ok(())
}

async fn configure_mastodon(config: &mut Config, secrets_dir: &Path) -> Result<()> {
    println!("\nMastodon");
    println!("  Settings → Development → New Application, with 'write:statuses'");
    println!("  and 'write:media' scopes, then copy the access token.\n");

    let current = config.mastodon.as_ref().map(|m| m.instance.clone());
    let instance = prompt_line("Instance URL", current.as_deref())?;
    if instance.is_empty() {
        println!("Skipped: no instance URL provided");
        return Ok(());
    }

    let token = rpassword::prompt_password("Access token: ")?;
    let token = token.trim();
    let token_file = if token.is_empty() {
        config.mastodon.as_ref().and_then(|m| m.token_file.clone())
    } else {
        Some(write_secret(secrets_dir, "mastodon.token", token)?)
    };

    let visibility = config
        .mastodon
        .as_ref()
        .map(|m| m.visibility.clone())
        .unwrap_or_else(|| DEFAULT_VISIBILITY.to_string());

    if !token.is_empty() {
        println!("Testing Mastodon authentication...");
        let result = test_mastodon_auth(&instance, token, &visibility).await;
        report_auth("Mastodon", result);
    }

    config.mastodon = Some(MastodonConfig {
        enabled: true,
        instance,
        token_file,
        visibility,
    });
    Ok(())
}

async fn configure_bluesky(config: &mut Config, secrets_dir: &Path) -> Result<()> {
    println!("\nBluesky");
    println!("  Settings → App Passwords → Add App Password. Use an app password,");
    println!("  not your main password.\n");

    let current = config.bluesky.as_ref().map(|b| b.handle.clone());
    let handle = prompt_line("Handle (e.g. user.bsky.social)", current.as_deref())?;
    if handle.is_empty() {
        println!("Skipped: no handle provided");
        return Ok(());
    }

    let password = rpassword::prompt_password("App password: ")?;
    let password = password.trim();
    let password_file = if password.is_empty() {
        config.bluesky.as_ref().and_then(|b| b.password_file.clone())
    } else {
        Some(write_secret(secrets_dir, "bluesky.password", password)?)
    };

    if !password.is_empty() {
        println!("Testing Bluesky authentication...");
        let result = test_bluesky_auth(&handle, password).await;
        report_auth("Bluesky", result);
    }

    config.bluesky = Some(BlueskyConfig {
        enabled: true,
        handle,
        password_file,
    });
    Ok(())
}

async fn configure_instagram(config: &mut Config, secrets_dir: &Path) -> Result<()> {
    println!("\nInstagram");
    println!("  Needs a professional account linked to a Facebook page, its");
    println!("  Instagram user id and a long-lived Graph API access token with");
    println!("  instagram_content_publish.\n");

    let current = config.instagram.as_ref().map(|i| i.user_id.clone());
    let user_id = prompt_line("Instagram user id", current.as_deref())?;
    if user_id.is_empty() {
        println!("Skipped: no user id provided");
        return Ok(());
    }

    let token = rpassword::prompt_password("Access token: ")?;
    let token = token.trim();
    let token_file = if token.is_empty() {
        config.instagram.as_ref().and_then(|i| i.token_file.clone())
    } else {
        Some(write_secret(secrets_dir, "instagram.token", token)?)
    };

    let api_version = config
        .instagram
        .as_ref()
        .map(|i| i.api_version.clone())
        .unwrap_or_else(|| DEFAULT_GRAPH_API_VERSION.to_string());

    if !token.is_empty() {
        println!("Testing Instagram authentication...");
        let mut client = InstagramClient::new(
            user_id.clone(),
            SecretString::from(token.to_string()),
            &api_version,
        );
        report_auth("Instagram", client.authenticate().await);
    }

    config.instagram = Some(InstagramConfig {
        enabled: true,
        user_id,
        token_file,
        api_version,
    });
    Ok(())
}

fn configure_youtube(config: &mut Config, secrets_dir: &Path) -> Result<()> {
    println!("\nYouTube");
    println!("  Google Cloud console → APIs & Services → Credentials → API key,");
    println!("  with the YouTube Data API v3 enabled.\n");

    let key = rpassword::prompt_password("API key: ")?;
    let key = key.trim();
    if key.is_empty() {
        println!("Skipped: no API key provided");
        return Ok(());
    }

    config.youtube = Some(YouTubeConfig {
        api_key_file: Some(write_secret(secrets_dir, "youtube.key", key)?),
    });
    Ok(())
}

fn configure_spotify(config: &mut Config, secrets_dir: &Path) -> Result<()> {
    println!("\nSpotify");
    println!("  developer.spotify.com → Dashboard → Create app, then copy the");
    println!("  client id and client secret.\n");

    let current = config.spotify.as_ref().map(|s| s.client_id.clone());
    let client_id = prompt_line("Client id", current.as_deref())?;
    if client_id.is_empty() {
        println!("Skipped: no client id provided");
        return Ok(());
    }

    let secret = rpassword::prompt_password("Client secret: ")?;
    let secret = secret.trim();
    let client_secret_file = if secret.is_empty() {
        config.spotify.as_ref().and_then(|s| s.client_secret_file.clone())
    } else {
        Some(write_secret(secrets_dir, "spotify.secret", secret)?)
    };

    config.spotify = Some(SpotifyConfig {
        client_id,
        client_secret_file,
    });
    Ok(())
}

async fn test_mastodon_auth(
    instance: &str,
    token: &str,
    visibility: &str,
) -> libtrackcast::Result<()> {
    let mut client =
        MastodonClient::new(instance.to_string(), token.to_string(), visibility.to_string())?;
    client.authenticate().await
}

async fn test_bluesky_auth(handle: &str, password: &str) -> libtrackcast::Result<()> {
    let mut client =
        BlueskyClient::new(handle.to_string(), SecretString::from(password.to_string())).await?;
    client.authenticate().await
}

fn report_auth(platform: &str, result: libtrackcast::Result<()>) {
    match result {
        Ok(()) => println!("✓ {} authentication successful", platform),
        Err(e) => {
            println!("Authentication test failed: {}", e);
            println!("  The settings were kept; fix the credentials and run track-setup again");
        }
    }
}

/// Write a secret next to the config file, readable only by the owner
fn write_secret(dir: &Path, name: &str, value: &str) -> Result<String> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(name);
    std::fs::write(&path, format!("{}\n", value))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to restrict {}", path.display()))?;
    }

    println!("✓ Stored in {}", path.display());
    Ok(path.to_string_lossy().into_owned())
}

fn prompt_line(prompt: &str, default: Option<&str>) -> Result<String> {
    match default.filter(|d| !d.is_empty()) {
        Some(default) => print!("{} [{}]: ", prompt, default),
        None => print!("{}: ", prompt),
    }
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();

    Ok(if input.is_empty() {
        default.unwrap_or_default().to_string()
    } else {
        input.to_string()
    })
}

fn prompt_yes_no(prompt: &str, default: bool) -> Result<bool> {
    let default_str = if default { "Y/n" } else { "y/N" };
    print!("{} [{}]: ", prompt, default_str);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim().to_lowercase();

    Ok(match input.as_str() {
        "y" | "yes" => true,
        "n" | "no" => false,
        _ => default,
    })
}

fn print_credential_instructions(config: &Config, secrets_dir: &Path) {
    println!("Credentials");
    println!("───────────\n");
    println!("Each secret is read from an environment variable first, then from");
    println!("the file named in the config section. Files live in {}.\n", secrets_dir.display());

    let status = |configured: bool| if configured { "configured" } else { "not configured" };

    println!("  Instagram  [{}]", status(config.instagram.is_some()));
    println!("    [instagram] user_id, token_file   or  INSTAGRAM_USER_ID, {}", instagram::TOKEN_ENV);
    println!("  Mastodon   [{}]", status(config.mastodon.is_some()));
    println!("    [mastodon] instance, token_file   or  MASTODON_URL, {}", mastodon::TOKEN_ENV);
    println!("  Bluesky    [{}]", status(config.bluesky.is_some()));
    println!("    [bluesky] handle, password_file   or  BLUESKY_HANDLE, {}", bluesky::PASSWORD_ENV);
    println!("  YouTube    [{}]", status(config.youtube.is_some()));
    println!("    [youtube] api_key_file            or  {}", youtube::API_KEY_ENV);
    println!("  Spotify    [{}]", status(config.spotify.is_some()));
    println!(
        "    [spotify] client_id, client_secret_file  or  SPOTIPY_CLIENT_ID, {}",
        spotify::CLIENT_SECRET_ENV
    );

    println!("\nNext steps:\n");
    println!("  1. Create a review from a Bandcamp track:");
    println!("     track-new\n");
    println!("  2. Preview the posts for an existing review:");
    println!("     track-post <file.md> --dry-run\n");
}
