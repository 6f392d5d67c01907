//! One-off tool that creates the public image bucket.
//!
//! Usage: `cargo run --bin setup-storage`
//!
//! Needs `backend.service_role_key` (or `WHOLENESS_BACKEND_SERVICE_ROLE_KEY`).
//! Running it again is harmless: an existing bucket counts as success.

use anyhow::{Context, Result};
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wholeness::backend::storage::{BucketOutcome, BucketSpec, SupabaseStorage};
use wholeness::backend::BackendClient;
use wholeness::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wholeness=info,setup_storage=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load_with_env(Path::new("config.yml"))?;
    config.validate()?;
    let service_key = config
        .backend
        .service_role_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .context("backend.service_role_key is required to create storage buckets")?;

    let client = BackendClient::new(&config.backend)?;
    let storage = SupabaseStorage::new(client, config.storage.bucket.clone());
    let spec = BucketSpec::public_images(&config.storage);

    match storage
        .create_bucket(&spec, service_key)
        .await
        .with_context(|| format!("Failed to create bucket '{}'", spec.id))?
    {
        BucketOutcome::Created => tracing::info!(bucket = %spec.id, "storage bucket created"),
        BucketOutcome::AlreadyExists => tracing::info!(bucket = %spec.id, "storage bucket already exists"),
    }
    tracing::info!(example = %storage.public_url("<object>"), "public object URL format");

    Ok(())
}
