//! Cache management commands

use anyhow::{Result, anyhow};
use chrono::Utc;
use std::io::{self, Write};

use tunesense_cache::{AnalysisCache, LoadOutcome, SaveOutcome};

use crate::cli::args::CacheAction;
use crate::config::TunesenseConfig;
use crate::runtime::{build_cache, env_secrets};

fn open_cache(config: &TunesenseConfig) -> Result<AnalysisCache> {
    let cache = build_cache(config, env_secrets());
    match cache.load() {
        LoadOutcome::Disabled => Err(anyhow!(
            "The cache is disabled in the configuration ([cache] enabled = false)"
        )),
        LoadOutcome::Discarded(e) => {
            println!("   ⚠️  Existing cache file could not be read: {}", e);
            Ok(cache)
        }
        _ => Ok(cache),
    }
}

fn persist(cache: &AnalysisCache) -> Result<()> {
    match cache.save() {
        SaveOutcome::Failed(e) => Err(anyhow!("Failed to save cache: {}", e)),
        _ => Ok(()),
    }
}

fn format_age(age: chrono::Duration) -> String {
    if age.num_days() > 0 {
        format!("{}d {}h", age.num_days(), age.num_hours() % 24)
    } else if age.num_hours() > 0 {
        format!("{}h {}m", age.num_hours(), age.num_minutes() % 60)
    } else {
        format!("{}m", age.num_minutes().max(0))
    }
}

/// Execute cache command
pub async fn handle_cache_command(action: &CacheAction, config: &TunesenseConfig) -> Result<()> {
    let cache_path = &config.cache.path;

    match action {
        CacheAction::Stats => {
            println!("📊 Cache statistics");
            println!("   File: {}", cache_path.display());

            let cache = open_cache(config)?;
            let stats = cache.stats();
            let now = Utc::now();

            println!("\nContents:");
            println!("   Total entries: {}", stats.total_entries);
            if let Some(oldest) = stats.oldest {
                println!("   Oldest entry: {} ({} ago)", oldest, format_age(now - oldest));
            }
            if let Some(newest) = stats.newest {
                println!("   Newest entry: {} ({} ago)", newest, format_age(now - newest));
            }
            match stats.file_size_bytes {
                Some(bytes) => println!("   File size: {} bytes", bytes),
                None => println!("   File size: (no file)"),
            }

            println!("\nConfiguration:");
            println!("   Max age: {} hours", config.cache.max_age_hours);
            println!("   Cipher: {}", config.cache.cipher);
            println!("   Secret: {}", config.cache.secret_name);
            println!(
                "   Admission: older than {} days, at least {} comments",
                config.admission.freshness_days, config.admission.activity_threshold
            );

            if stats.total_entries == 0 {
                println!("\n💡 Cache is empty");
            }
        }

        CacheAction::Purge { max_age_hours } => {
            println!("🧹 Cache purge");
            println!("   File: {}", cache_path.display());

            let mut policy = config.cache.to_cleanup_policy();
            if let Some(hours) = max_age_hours {
                policy.max_age_hours = *hours;
            }
            println!("   Max age: {} hours", policy.max_age_hours);

            let cache = open_cache(config)?;
            let stats = cache.purge_expired(policy.max_age());
            persist(&cache)?;

            println!("\n✅ Purge complete");
            println!("   Removed {} expired entries", stats.removed_count);
            println!("   {} entries remain", stats.remaining_count);
        }

        CacheAction::Clear { yes } => {
            println!("🗑️  Clear all cache");
            println!("   File: {}", cache_path.display());

            let cache = open_cache(config)?;
            println!(
                "\n⚠️  Warning: This will delete ALL {} cache entries",
                cache.len()
            );

            if !yes {
                print!("   Continue? [y/N]: ");
                io::stdout().flush()?;

                let mut input = String::new();
                io::stdin().read_line(&mut input)?;

                if !input.trim().eq_ignore_ascii_case("y") {
                    println!("   Aborted");
                    return Ok(());
                }
            }

            let removed = cache.clear();
            persist(&cache)?;
            println!("\n✅ Removed {} entries", removed);
        }

        CacheAction::List => {
            let cache = open_cache(config)?;
            let keys = cache.keys();
            if keys.is_empty() {
                println!("💡 Cache is empty");
                return Ok(());
            }

            let now = Utc::now();
            for (key, stored_at) in keys {
                let title = cache
                    .retrieve(key.as_str())
                    .map(|entry| entry.result.metadata.title.clone())
                    .unwrap_or_default();
                println!("{}  {:>8}  {}", key, format_age(now - stored_at), title);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(chrono::Duration::minutes(5)), "5m");
        assert_eq!(format_age(chrono::Duration::minutes(125)), "2h 5m");
        assert_eq!(format_age(chrono::Duration::hours(50)), "2d 2h");
        assert_eq!(format_age(chrono::Duration::seconds(-3)), "0m");
    }
}
