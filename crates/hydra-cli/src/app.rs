use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use hydra_core::dispatch::{Dispatcher, TracingReporter};
use hydra_core::{RunSummary, gitmodules};

use crate::args::Args;

/// Directory the submodule paths in `file` are relative to.
fn repo_root(file: &Path) -> PathBuf {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Discover submodules, then run the command in each of them.
///
/// Everything that can go wrong before the first worker starts is returned
/// as an error; per-submodule failures only show up in the summary.
pub async fn run(args: &Args) -> Result<RunSummary> {
    let submodules = gitmodules::load_submodules(&args.file)?;
    let items = gitmodules::work_items(&submodules, args.item_key());
    let config = args.settings().resolve(items.len())?;
    let root = repo_root(&args.file);

    info!(
        file = %args.file.display(),
        submodules = items.len(),
        "Submodules discovered"
    );

    let dispatcher = Dispatcher::new(config, root, Arc::new(TracingReporter));
    dispatcher
        .run(&items)
        .await
        .with_context(|| format!("failed to run {:?} across submodules", args.command))
}
