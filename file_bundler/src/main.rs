// /////////////////////////////////////////////////////////////////////////////
// File Bundler
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # File Bundler Binary
//!
//! The composition root: parses the CLI, installs logging, loads
//! configuration, wires the infrastructure implementations into the
//! application services, and runs the HTTP server under the shutdown
//! coordinator. All construction happens here, once - the services
//! themselves never reach for globals.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use file_bundler::application::services::{
    BundleService, BundleServiceSettings, OutputNamer, SnapshotService,
};
use file_bundler::infrastructure::adapters::{
    S3FileSystem, SchemeRegistry, StreamingHasher,
};
use file_bundler::infrastructure::config::BundlerConfig;
use file_bundler::infrastructure::logging::{init_tracing, LogFormat};
use file_bundler::infrastructure::repositories::{schema, SqliteJobRepository};
use file_bundler::infrastructure::services::RequestArchiver;
use file_bundler::presentation::BundleServer;
use file_bundler_bootstrap::{result_to_exit_code, shutdown, ShutdownCoordinator};
use file_bundler_domain::services::{ArchivePlanner, EntryPathNormalizer, RatioEstimator};
use file_bundler_domain::{BundlerError, FileSystem, JobId};

#[derive(Parser)]
#[command(name = "file_bundler")]
#[command(about = "Bundles file sets into bounded-size archives with digests")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bundle server
    Serve {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the configured HTTP port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the configured database URL
        #[arg(long)]
        database: Option<String>,
    },

    /// Print the snapshot of a job
    State {
        /// Job id (32 hex characters)
        job_id: String,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Override the configured database URL
        #[arg(long)]
        database: Option<String>,
    },
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    if let Err(e) = init_tracing(format, cli.verbose) {
        eprintln!("failed to install tracing subscriber: {}", e);
    }

    let result = match cli.command {
        Commands::Serve {
            config,
            port,
            database,
        } => serve(config, port, database).await,
        Commands::State {
            job_id,
            config,
            database,
        } => show_state(job_id, config, database).await,
    };

    result_to_exit_code(result)
}

async fn load_config(
    path: Option<PathBuf>,
    database_override: Option<String>,
) -> Result<BundlerConfig, BundlerError> {
    let mut config = BundlerConfig::load(path.as_deref()).await?;
    if let Some(database) = database_override {
        config.database.url = database;
    }
    Ok(config)
}

async fn serve(
    config_path: Option<PathBuf>,
    port_override: Option<u16>,
    database_override: Option<String>,
) -> Result<(), BundlerError> {
    let mut config = load_config(config_path, database_override).await?;
    if let Some(port) = port_override {
        config.server.port = port;
    }

    let pool = schema::initialize_database(&config.database.url)
        .await
        .map_err(|e| BundlerError::DatabaseError(format!("initializing database: {}", e)))?;
    let repository = Arc::new(SqliteJobRepository::new(pool));

    // Providers are registered exactly once, before the registry is shared.
    let mut registry = SchemeRegistry::with_local();
    if config.s3.is_configured() {
        let s3 = S3FileSystem::new(config.s3.clone(), tokio::runtime::Handle::current())?;
        registry.register("s3", Arc::new(s3));
    }
    info!(schemes = ?registry.schemes(), "filesystem providers registered");
    let file_system: Arc<dyn FileSystem> = Arc::new(registry);

    let hasher = Arc::new(StreamingHasher::new(file_system.clone()));
    let estimator = Arc::new(RatioEstimator::new(
        config.archive.average_compression_percentage,
    )?);
    let planner = Arc::new(ArchivePlanner::new(estimator));
    let normalizer = Arc::new(EntryPathNormalizer::new(
        config.entry_paths.exclusions.clone(),
    ));
    let namer = OutputNamer::new(&config.staging.directory, &config.staging.base_url)?;
    let host_name = std::env::var("HOSTNAME").unwrap_or_else(|_| "unavailable".to_string());

    let bundle_service = Arc::new(BundleService::new(
        repository.clone(),
        file_system,
        hasher,
        planner,
        normalizer,
        namer,
        BundleServiceSettings {
            min_size_mb: config.archive.min_size_mb,
            max_size_mb: config.archive.max_size_mb,
            default_size_mb: config.archive.default_size_mb,
            hash_algorithm: config.hash_algorithm()?,
            host_name,
        },
    ));
    let snapshot_service = Arc::new(SnapshotService::new(repository));
    let request_archiver = Arc::new(RequestArchiver::new(&config.debug.request_directory));

    let coordinator = ShutdownCoordinator::default();
    let server = Arc::new(BundleServer::new(
        bundle_service,
        snapshot_service,
        request_archiver,
    ));

    let mut server_task = tokio::spawn({
        let token = coordinator.token();
        let bind = config.server.bind.clone();
        let port = config.server.port;
        async move { server.start(&bind, port, token).await }
    });

    tokio::select! {
        _ = shutdown::wait_for_signal() => {
            coordinator.initiate_shutdown().await;
            let _ = server_task.await;
            info!("bundle server stopped");
            Ok(())
        }
        finished = &mut server_task => {
            // The server only returns on its own for a startup failure.
            match finished {
                Ok(result) => result,
                Err(e) => Err(BundlerError::InternalError(format!("server task failed: {}", e))),
            }
        }
    }
}

async fn show_state(
    job_id: String,
    config_path: Option<PathBuf>,
    database_override: Option<String>,
) -> Result<(), BundlerError> {
    let config = load_config(config_path, database_override).await?;
    let job_id = JobId::parse(&job_id)?;

    let pool = schema::initialize_database(&config.database.url)
        .await
        .map_err(|e| BundlerError::DatabaseError(format!("initializing database: {}", e)))?;
    let repository = Arc::new(SqliteJobRepository::new(pool));
    let snapshot = SnapshotService::new(repository).snapshot(&job_id).await?;

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
