//! `cumeets list`: render the directory for one role.

use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result, bail};
use cumeets_business::{
    Directory, DirectoryView, DocumentStore, FirebaseConfig, FirestoreStore, Role,
};
use tracing::{debug, info, instrument};

use crate::cli::OutputFormat;
use crate::demo;
use crate::output::Output;

#[derive(Debug, Clone)]
pub struct ListOptions {
    pub role: Role,
    pub query: String,
    pub watch: bool,
    pub demo: bool,
    pub format: OutputFormat,
    pub timeout: Duration,
}

fn open_directory(demo: bool) -> Result<Directory> {
    if demo {
        info!("Using demo directory");
        let store: Arc<dyn DocumentStore> = Arc::new(demo::store());
        return Ok(Directory::new(store));
    }

    let config = FirebaseConfig::init().context("Firebase is not configured")?;
    let store = FirestoreStore::new(config.clone()).context("Failed to start Firestore store")?;
    Ok(Directory::from_config(Arc::new(store), &config))
}

/// Wait until the first snapshot (or error) for the live role has been applied.
#[instrument(skip_all, name = "first_snapshot")]
async fn await_first_snapshot(directory: &mut Directory, timeout: Duration) -> Result<()> {
    directory.sync();
    let waited = tokio::time::timeout(timeout, async {
        while directory.is_loading() {
            if !directory.wait_for_update().await {
                break;
            }
        }
    })
    .await;

    if waited.is_err() {
        bail!(
            "Timed out after {}s waiting for the {} directory",
            timeout.as_secs(),
            directory.role()
        );
    }
    Ok(())
}

/// Returns whether the final view was free of errors.
#[instrument(skip_all, name = "list", fields(role = %options.role, watch = options.watch))]
pub async fn run_list(options: ListOptions) -> Result<bool> {
    let out = Output::new();

    let mut directory = open_directory(options.demo)?;
    directory.set_query(options.query.as_str());
    directory.set_role(options.role);

    await_first_snapshot(&mut directory, options.timeout).await?;
    render(&out, &directory, options.format, options.watch);

    if options.watch {
        let mut ctrl_c = pin!(tokio::signal::ctrl_c());
        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    debug!("Interrupted, closing directory");
                    break;
                }
                updated = directory.wait_for_update() => {
                    if !updated {
                        break;
                    }
                    render(&out, &directory, options.format, true);
                }
            }
        }
    }

    let ok = !directory.view().is_error();
    directory.unmount();
    Ok(ok)
}

fn render(out: &Output, directory: &Directory, format: OutputFormat, watch: bool) {
    let view = directory.view();
    if watch && format == OutputFormat::Table {
        let updated = directory
            .state()
            .last_snapshot()
            .map(|at| at.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_owned());
        out.header(format!("{} (updated {updated})", directory.role()));
    }
    if matches!(view, DirectoryView::Idle) {
        out.dim("Directory is not mounted.");
        return;
    }
    out.view(&view, format);
}
