//! FileTree self-check.
//!
//! Seeds a small tree in the configured store, verifies duplicate
//! rejection and folder size aggregation, and prints a JSON report.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

use filetree_core::config::{AppConfig, StoreBackend};
use filetree_core::error::ErrorKind;
use filetree_core::logging::init_tracing;
use filetree_entity::item::{ItemKind, ItemView};
use filetree_service::{ExplorerService, RequestContext};

const EXPECTED_DOCS_SIZE: u64 = 1500;

/// Seed a sample tree and verify the tree engine against it.
#[derive(Debug, Parser)]
#[command(name = "filetree-selfcheck", version, about, long_about = None)]
struct Cli {
    /// Configuration environment (loads `config/{env}.toml` over the defaults)
    #[arg(short, long, env = "FILETREE_ENV", default_value = "development")]
    env: String,

    /// Delete every root-level item before seeding
    #[arg(long)]
    reset: bool,
}

#[derive(Debug, Serialize)]
struct CheckOutcome {
    passed: bool,
    detail: String,
}

#[derive(Debug, Serialize)]
struct Report {
    backend: StoreBackend,
    reset: Option<u64>,
    duplicate_check: CheckOutcome,
    size_check: CheckOutcome,
    root: Vec<ItemView>,
}

impl Report {
    fn passed(&self) -> bool {
        self.duplicate_check.passed && self.size_check.passed
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.env) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.logging);

    match run(&cli, &config).await {
        Ok(report) => {
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Failed to render report: {e}");
                    return ExitCode::FAILURE;
                }
            }
            if report.passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Self-check aborted");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, config: &AppConfig) -> anyhow::Result<Report> {
    info!(env = %cli.env, backend = ?config.store.backend, "Starting FileTree self-check");

    let store = filetree_database::open_store(&config.store, &config.tree)
        .await
        .context("opening item store")?;
    let explorer = ExplorerService::new(store, &config.tree);
    let ctx = RequestContext::new("filetree-selfcheck");

    let reset = if cli.reset {
        let mut removed = 0;
        for item in explorer.list_items(None, None).await? {
            removed += explorer.delete_item(&ctx, item.id).await?;
        }
        info!(removed, "Store root cleared");
        Some(removed)
    } else {
        None
    };

    let docs = explorer
        .create_item(&ctx, "Docs", ItemKind::Folder, None, None)
        .await
        .context("creating Docs (pass --reset if the store was already seeded)")?;
    explorer
        .create_item(&ctx, "Relatorio.pdf", ItemKind::File, Some(docs.id), Some(1000))
        .await
        .context("creating Relatorio.pdf")?;
    explorer
        .create_item(&ctx, "Foto.png", ItemKind::File, Some(docs.id), Some(500))
        .await
        .context("creating Foto.png")?;

    let duplicate_check = match explorer
        .create_item(&ctx, "Foto.png", ItemKind::File, Some(docs.id), Some(500))
        .await
    {
        Err(e) if e.kind == ErrorKind::DuplicateName => CheckOutcome {
            passed: true,
            detail: e.user_message().to_string(),
        },
        Err(e) => CheckOutcome {
            passed: false,
            detail: format!("unexpected error: {e}"),
        },
        Ok(item) => {
            warn!(item_id = %item.id, "Duplicate Foto.png was accepted");
            CheckOutcome {
                passed: false,
                detail: "second Foto.png was created".to_string(),
            }
        }
    };

    let root = explorer.list_items(None, None).await?;
    let size_check = match root.iter().find(|view| view.id == docs.id) {
        Some(view) if view.size == EXPECTED_DOCS_SIZE => CheckOutcome {
            passed: true,
            detail: format!("Docs is {} bytes", view.size),
        },
        Some(view) => CheckOutcome {
            passed: false,
            detail: format!("Docs is {} bytes, expected {EXPECTED_DOCS_SIZE}", view.size),
        },
        None => CheckOutcome {
            passed: false,
            detail: "Docs is missing from the root listing".to_string(),
        },
    };

    info!(
        duplicate_check = duplicate_check.passed,
        size_check = size_check.passed,
        "Self-check finished"
    );

    Ok(Report {
        backend: config.store.backend,
        reset,
        duplicate_check,
        size_check,
        root,
    })
}
