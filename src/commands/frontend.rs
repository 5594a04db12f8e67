// src/commands/frontend.rs
//! Frontend configuration command

use super::Context;
use anyhow::{Context as _, Result};
use repkg::FrontendConfig;

/// Show, set or reset the rebuild frontend
pub fn cmd_frontend(ctx: &Context, set: bool, waved: bool, reset: bool, tool: &[String]) -> Result<()> {
    if reset {
        ctx.privilege.require_root("frontend --reset")?;
        let conn = ctx.open_db()?;
        if !FrontendConfig::reset(&conn, ctx.privilege)? {
            println!("No frontend configured, already using the default");
        }
        return Ok(());
    }

    if set || waved {
        ctx.privilege.require_root("frontend --set")?;
        let conn = ctx.open_db()?;
        let config = if set {
            FrontendConfig::new(tool.to_vec(), waved)?
        } else {
            FrontendConfig {
                waved: true,
                ..FrontendConfig::load(&conn)?
            }
        };
        config
            .save(&conn, ctx.privilege)
            .context("Failed to store frontend")?;
        return Ok(());
    }

    let config = match ctx.open_existing_db()? {
        Some(conn) => FrontendConfig::load(&conn)?,
        None => FrontendConfig::detect(),
    };
    println!("{}", config);
    Ok(())
}
