// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema compilation and accessor generation.
//!
//! Driven by a YAML manifest naming the schema and the (template, output)
//! pairs. The schema is compiled once; every target renders from the same
//! tagged result, so all generated consumers agree on tags by construction.
//! Outputs are written to a temporary sibling and renamed into place, so a
//! failed run never leaves a half-written generated file behind.

use crate::context;
use anyhow::{Context, Result};
use serde::Deserialize;
use shm::{assign_tags, Schema, TaggedSchema};
use std::fs;
use std::path::{Path, PathBuf};
use tera::Tera;

/// Generation manifest: one schema, many targets.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub schema: PathBuf,
    pub targets: Vec<Target>,
}

/// One (template, output) pair. Paths are relative to the manifest file.
#[derive(Debug, Clone, Deserialize)]
pub struct Target {
    pub template: PathBuf,
    pub output: PathBuf,
}

/// Generator state: manifest, compiled schema, loaded templates.
#[derive(Debug)]
pub struct ShmGenerator {
    manifest: Manifest,
    base_dir: PathBuf,
    schema_path: PathBuf,
    tagged: TaggedSchema,
    tera: Tera,
}

impl ShmGenerator {
    /// Load the manifest, compile the schema, register every template.
    pub fn new(manifest_path: &Path) -> Result<Self> {
        tracing::info!("Loading manifest from {}", manifest_path.display());
        let manifest_text = fs::read_to_string(manifest_path)
            .with_context(|| format!("Failed to read manifest {}", manifest_path.display()))?;
        let manifest: Manifest = serde_yaml::from_str(&manifest_text)
            .with_context(|| format!("Failed to parse manifest {}", manifest_path.display()))?;

        let base_dir = manifest_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let schema_path = base_dir.join(&manifest.schema);
        let tagged = compile_schema(&schema_path)?;

        let mut tera = Tera::default();
        for target in &manifest.targets {
            let template_path = base_dir.join(&target.template);
            let template_text = fs::read_to_string(&template_path).with_context(|| {
                format!("Failed to read template {}", template_path.display())
            })?;
            tera.add_raw_template(&template_name(target), &template_text)
                .with_context(|| {
                    format!("Failed to parse template {}", target.template.display())
                })?;
        }

        Ok(Self {
            manifest,
            base_dir,
            schema_path,
            tagged,
            tera,
        })
    }

    /// The compiled schema all targets render from.
    pub fn tagged(&self) -> &TaggedSchema {
        &self.tagged
    }

    /// Render every target and write it atomically.
    ///
    /// Fatal on the first failure: the failing (template, output) pair is
    /// named in the error and nothing further is written.
    pub fn generate(&self) -> Result<GenerationReport> {
        let ctx = context::build(&self.schema_path.display().to_string(), &self.tagged);

        let mut report = GenerationReport::new();
        report.variables = self.tagged.len();

        for target in &self.manifest.targets {
            let rendered = self
                .tera
                .render(&template_name(target), &ctx)
                .with_context(|| {
                    format!(
                        "Failed to render {} -> {}",
                        target.template.display(),
                        target.output.display()
                    )
                })?;

            let output_path = self.base_dir.join(&target.output);
            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create output directory {}", parent.display())
                })?;
            }
            write_atomic(&output_path, &rendered).with_context(|| {
                format!(
                    "Failed to write {} (from {})",
                    target.output.display(),
                    target.template.display()
                )
            })?;

            tracing::info!(
                "[OK] {} -> {} ({} bytes)",
                target.template.display(),
                target.output.display(),
                rendered.len()
            );
            report
                .files_generated
                .push(target.output.display().to_string());
        }

        Ok(report)
    }
}

fn compile_schema(schema_path: &Path) -> Result<TaggedSchema> {
    tracing::info!("Loading schema from {}", schema_path.display());
    let schema_text = fs::read_to_string(schema_path)
        .with_context(|| format!("Failed to read schema {}", schema_path.display()))?;
    let schema: Schema = serde_yaml::from_str(&schema_text)
        .with_context(|| format!("Failed to parse schema {}", schema_path.display()))?;
    let tagged = assign_tags(&schema)
        .with_context(|| format!("Failed to compile schema {}", schema_path.display()))?;
    tracing::info!(
        "Compiled {} variables across {} groups",
        tagged.len(),
        tagged.groups().count()
    );
    Ok(tagged)
}

/// Tera registration key for a target. The template path keeps names unique
/// across targets sharing a directory.
fn template_name(target: &Target) -> String {
    target.template.display().to_string()
}

/// Write-to-temp then rename, so a consumer never observes a partial file.
fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!("{}.tmp", file_name));

    fs::write(&tmp, contents)?;
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    Ok(())
}

/// Generation report.
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub variables: usize,
    pub files_generated: Vec<String>,
}

impl GenerationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) {
        println!("\n{}", "=".repeat(60));
        println!("  shm Generation Report");
        println!("{}", "=".repeat(60));
        println!();
        println!("  [OK] Variables tagged: {}", self.variables);
        println!("  [OK] Files generated:  {}", self.files_generated.len());
        for file in &self.files_generated {
            println!("    - {}", file);
        }
        println!();
        println!("{}", "=".repeat(60));
    }
}

/// Validate a schema and print its tag table: the out-of-band knowledge an
/// external client needs to address the store.
pub fn print_tag_table(schema_path: &Path) -> Result<()> {
    let tagged = compile_schema(schema_path)?;

    println!("{:>5}  {:<6}  {:<32}  {}", "tag", "type", "variable", "default");
    for (group, var) in tagged.vars() {
        println!(
            "{:>5}  {:<6}  {:<32}  {}",
            var.tag,
            var.type_tag.name(),
            format!("{}.{}", group, var.name),
            var.default
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_atomic_replaces_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let path = dir.path().join("out.rs");

        write_atomic(&path, "first").expect("write should succeed");
        write_atomic(&path, "second").expect("write should succeed");

        assert_eq!(fs::read_to_string(&path).expect("read"), "second");
        assert!(!path.with_file_name("out.rs.tmp").exists());
    }
}
