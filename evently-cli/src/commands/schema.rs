//! Schema command - create tables and indexes if missing

use anyhow::{Context, Result};
use evently_store::db::schema;
use evently_store::Models;

pub async fn run_schema(models: &Models) -> Result<()> {
    schema::ensure(models.database())
        .await
        .context("failed to create event and booking tables")?;
    eprintln!("schema ready");
    Ok(())
}
