// src/commands/rebuild.rs
//! Rebuild pending packages

use super::Context;
use anyhow::{Context as _, Result};
use repkg::{FrontendConfig, PackageBackend, RebuildResolver};
use tracing::info;

/// Rebuild everything pending, returning the frontend's exit code
pub fn cmd_rebuild(ctx: &Context, backend: &dyn PackageBackend) -> Result<i32> {
    let Some(mut conn) = ctx.open_existing_db()? else {
        println!("No packages need to be rebuilt");
        return Ok(0);
    };

    let waves = RebuildResolver::new(&mut conn, backend, ctx.privilege)
        .compute_waves()
        .context("Cannot determine the rebuild order")?;

    if waves.is_empty() {
        println!("No packages need to be rebuilt");
        return Ok(0);
    }

    for (i, wave) in waves.iter().enumerate() {
        let names: Vec<&str> = wave.iter().map(String::as_str).collect();
        info!("Wave {}: {}", i + 1, names.join(" "));
    }

    let frontend = FrontendConfig::load(&conn)?;
    let total: usize = waves.iter().map(|w| w.len()).sum();
    info!("Rebuilding {} packages with {}", total, frontend);

    let code = frontend
        .run_rebuild(&waves)
        .with_context(|| format!("Failed to run frontend '{}'", frontend.program()))?;
    Ok(code)
}
