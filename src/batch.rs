//! Batch processing of a documentation tree.
//!
//! Copies `src_dir` into a fresh `dst_dir` and rewrites every Markdown file
//! in the copy with the blank-line transformer. Markdown files are handled
//! concurrently; the transformer is shared read-only between tasks.

use crate::markdown::{BlankLineSettings, BlankRunTransformer};
use anyhow::{Context, Result};
use async_walkdir::WalkDir;
use futures::StreamExt;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::task::JoinSet;

#[derive(Debug, Clone, PartialEq)]
pub struct BatchOptions {
    pub src_dir: PathBuf,
    pub dst_dir: PathBuf,
    /// Extensions (without dot) treated as Markdown, compared case-insensitively.
    pub extensions: Vec<String>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            src_dir: PathBuf::from("docs"),
            dst_dir: PathBuf::from("docs_temp"),
            extensions: vec!["md".to_string()],
        }
    }
}

impl BatchOptions {
    fn is_markdown(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .any(|candidate| candidate.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    /// Every file written to the destination, Markdown included.
    pub files_copied: usize,
    pub markdown_files: usize,
    pub files_changed: usize,
    pub spacers_inserted: usize,
}

pub async fn process_tree(options: &BatchOptions, settings: BlankLineSettings) -> Result<BatchReport> {
    let src = options.src_dir.as_path();
    let dst = options.dst_dir.as_path();

    let src_meta = fs::metadata(src)
        .await
        .with_context(|| format!("Source directory not found: {:?}", src))?;
    if !src_meta.is_dir() {
        anyhow::bail!("Source is not a directory: {:?}", src);
    }

    ensure_disjoint(src, dst).await?;

    if fs::try_exists(dst).await.unwrap_or(false) {
        tracing::info!("Removing existing destination: {:?}", dst);
        fs::remove_dir_all(dst)
            .await
            .with_context(|| format!("Failed to remove destination: {:?}", dst))?;
    }
    fs::create_dir_all(dst)
        .await
        .with_context(|| format!("Failed to create destination: {:?}", dst))?;

    let transformer = Arc::new(BlankRunTransformer::new(settings));
    let mut tasks = JoinSet::new();
    let mut report = BatchReport::default();

    let mut walker = WalkDir::new(src);
    while let Some(entry) = walker.next().await {
        let entry = entry.map_err(|e| anyhow::anyhow!("Failed to walk {:?}: {}", src, e))?;
        let path = entry.path();
        let relative = path
            .strip_prefix(src)
            .with_context(|| format!("Unexpected path outside source: {:?}", path))?;
        let target = dst.join(relative);

        let file_type = entry
            .file_type()
            .await
            .with_context(|| format!("Failed to stat {:?}", path))?;

        if file_type.is_dir() {
            fs::create_dir_all(&target)
                .await
                .with_context(|| format!("Failed to create directory: {:?}", target))?;
            continue;
        }

        if file_type.is_symlink() && fs::metadata(&path).await.is_ok_and(|m| m.is_dir()) {
            tracing::warn!("Skipping symlinked directory: {:?}", path);
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        if options.is_markdown(&path) {
            let transformer = Arc::clone(&transformer);
            tasks.spawn(async move { process_file(&path, &target, &transformer).await });
        } else {
            fs::copy(&path, &target)
                .await
                .with_context(|| format!("Failed to copy {:?} to {:?}", path, target))?;
            report.files_copied += 1;
        }
    }

    while let Some(joined) = tasks.join_next().await {
        let spacers = joined.context("Markdown task failed")??;
        report.files_copied += 1;
        report.markdown_files += 1;
        if spacers > 0 {
            report.files_changed += 1;
            report.spacers_inserted += spacers;
        }
    }

    tracing::info!(
        "Processed {} Markdown files ({} changed, {} spacers), {} files total",
        report.markdown_files,
        report.files_changed,
        report.spacers_inserted,
        report.files_copied
    );

    Ok(report)
}

async fn process_file(src: &Path, dst: &Path, transformer: &BlankRunTransformer) -> Result<usize> {
    let bytes = fs::read(src)
        .await
        .with_context(|| format!("Failed to read {:?}", src))?;

    let (output, spacers) = match String::from_utf8(bytes) {
        Ok(content) => {
            let (result, spacers) = transformer.transform_counted(&content);
            (result.into_owned().into_bytes(), spacers)
        }
        Err(e) => {
            tracing::warn!("{:?} is not valid UTF-8, copying unchanged", src);
            (e.into_bytes(), 0)
        }
    };

    fs::write(dst, output)
        .await
        .with_context(|| format!("Failed to write {:?}", dst))?;

    if spacers > 0 {
        tracing::debug!("{:?}: inserted {} spacers", dst, spacers);
    }

    Ok(spacers)
}

async fn ensure_disjoint(src: &Path, dst: &Path) -> Result<()> {
    let src_abs = fs::canonicalize(src)
        .await
        .with_context(|| format!("Failed to resolve {:?}", src))?;
    let dst_abs = resolve(dst).await?;

    if src_abs.starts_with(&dst_abs) || dst_abs.starts_with(&src_abs) {
        anyhow::bail!(
            "Source {:?} and destination {:?} must not contain each other",
            src,
            dst
        );
    }

    Ok(())
}

// Canonical form of a path that may not exist yet
async fn resolve(path: &Path) -> Result<PathBuf> {
    if let Ok(resolved) = fs::canonicalize(path).await {
        return Ok(resolved);
    }

    let absolute = std::path::absolute(path)
        .with_context(|| format!("Failed to resolve {:?}", path))?;

    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => match fs::canonicalize(parent).await {
            Ok(parent) => Ok(parent.join(name)),
            Err(_) => Ok(absolute),
        },
        _ => Ok(absolute),
    }
}
