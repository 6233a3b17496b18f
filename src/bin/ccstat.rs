use chrono::Utc;
use colored::{ColoredString, Colorize};
use std::io;
use std::path::Path;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

// Import from organized modules
use ccstat::Result;
use ccstat::config::LOG_ENV;
use ccstat::error::StatusError;
use ccstat::formatting::{format_token_count, render_tools};
use ccstat::types::{ContextTokens, CumulativeCache, StatuslineHookJson};
use ccstat::utils::get_git_branch;
use ccstat::{CacheManager, Settings, UsageResolver, parse_cumulative_cache, parse_tools};

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();

    // Configure rayon thread pool for the cumulative transcript scan
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_cpus::get())
        .thread_name(|i| format!("ccstat-worker-{}", i))
        .build_global()
        .map_err(StatusError::ThreadPoolInit)?;

    // Force colored output even when not in a TTY
    colored::control::set_override(true);

    // Read input JSON directly from stdin using stream processing
    let hook_data: StatuslineHookJson = serde_json::from_reader(io::stdin())?;

    let settings = Settings::from_env();
    let mut cache = CacheManager::with_ttl(settings.cache_file(), settings.cache_ttl);
    cache.evict_expired();
    let mut resolver = UsageResolver::new(cache);

    let transcript = hook_data.transcript_path();

    let (resolution, git_branch, tools, cache_totals) = tokio::join!(
        resolver.resolve(&hook_data),
        get_git_branch(Path::new(&hook_data.cwd)),
        async {
            match transcript {
                Some(path) => parse_tools(path).await,
                None => Vec::new(),
            }
        },
        async {
            match transcript {
                Some(path) => parse_cumulative_cache(path).await,
                None => None,
            }
        }
    );

    // Build and print status line
    println!(
        "{reset_color}{current_dir}{branch} 👤 {model}{reset_color}{context}{cache}{tools}",
        reset_color = "\x1b[0m",
        current_dir = get_current_dir(&hook_data.cwd),
        branch = if let Some(branch) = git_branch {
            format!(" {}", branch.cyan())
        } else {
            String::new()
        },
        model = model_name(hook_data.model_name()),
        context = if let Some(usage) = resolution.usage {
            format!(
                " ⚖️ {}",
                ContextTokens::from_usage(&usage).display_for(hook_data.context_window.as_ref())
            )
        } else {
            String::new()
        },
        cache = cache_info(cache_totals),
        tools = {
            let rendered = render_tools(&tools, Utc::now());
            if rendered.is_empty() {
                rendered
            } else {
                format!(" 🔧 {}", rendered)
            }
        },
    );

    Ok(())
}

fn setup_logging() {
    // stdout carries the status line, so logs go to stderr
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("ccstat=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();
}

#[inline]
fn model_name(model: &str) -> ColoredString {
    let is_opus = model.to_lowercase().contains("opus");
    if is_opus {
        model.white()
    } else {
        model.yellow().bold()
    }
}

#[inline]
fn get_current_dir(cwd: &str) -> ColoredString {
    Path::new(cwd)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(cwd)
        .green()
}

// Format session-wide cache reads and writes
fn cache_info(totals: Option<CumulativeCache>) -> String {
    match totals {
        Some(totals) if !totals.is_empty() => format!(
            " ♻️ {} read, {} written",
            format_token_count(totals.cache_read).cyan(),
            format_token_count(totals.cache_creation).cyan()
        ),
        _ => String::new(),
    }
}
