// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! End-to-end generation over the repository's own schema and templates.

use shm_gen::generator::ShmGenerator;
use std::fs;
use std::path::{Path, PathBuf};

fn repo_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// Write a manifest into `dir` pointing at the repository's schema and
/// templates, with outputs under `dir`.
fn repo_manifest(dir: &Path) -> PathBuf {
    let root = repo_root();
    let manifest = format!(
        "schema: {root}/schema/shm.yaml\n\
         targets:\n\
         \x20 - template: {root}/templates/shm.rs.tera\n\
         \x20   output: generated/shm.rs\n\
         \x20 - template: {root}/templates/shm.h.tera\n\
         \x20   output: generated/shm.h\n\
         \x20 - template: {root}/templates/shmdef.go.tera\n\
         \x20   output: generated/shmdef.go\n",
        root = root.display()
    );
    let path = dir.join("targets.yaml");
    fs::write(&path, manifest).expect("manifest should be written");
    path
}

#[test]
fn test_generate_repo_targets() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let manifest = repo_manifest(dir.path());

    let generator = ShmGenerator::new(&manifest).expect("generator should initialize");
    let report = generator.generate().expect("generation should succeed");

    assert_eq!(report.files_generated.len(), 3);
    assert_eq!(report.variables, generator.tagged().len());

    let rust = fs::read_to_string(dir.path().join("generated/shm.rs")).expect("read shm.rs");
    let header = fs::read_to_string(dir.path().join("generated/shm.h")).expect("read shm.h");
    let godef =
        fs::read_to_string(dir.path().join("generated/shmdef.go")).expect("read shmdef.go");

    // Every target carries the same tag value for the same variable.
    let soft_kill = generator
        .tagged()
        .var_by_path("switches.softKill")
        .expect("switches.softKill should exist")
        .tag;
    assert!(rust.contains(&format!("pub const SWITCHES_SOFT_KILL: u16 = {};", soft_kill)));
    assert!(header.contains(&format!(
        "constexpr uint16_t SWITCHES_SOFT_KILL = {};",
        soft_kill
    )));
    assert!(godef.contains(&format!("\"softKill\": {{ true, {} }}", soft_kill)));

    // Typed accessor pairs appear per variable.
    assert!(rust.contains("pub fn get_switches_soft_kill(store: &shm::Store) -> bool"));
    assert!(rust.contains("pub fn set_deadman_max_tilt(store: &mut shm::Store, value: f32)"));
    assert!(header.contains("int32_t get_led_brightness();"));
}

#[test]
fn test_generation_is_deterministic() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let manifest = repo_manifest(dir.path());

    ShmGenerator::new(&manifest)
        .expect("generator should initialize")
        .generate()
        .expect("generation should succeed");
    let first = fs::read(dir.path().join("generated/shm.rs")).expect("read shm.rs");

    ShmGenerator::new(&manifest)
        .expect("generator should initialize")
        .generate()
        .expect("generation should succeed");
    let second = fs::read(dir.path().join("generated/shm.rs")).expect("read shm.rs");

    assert_eq!(first, second);
}

#[test]
fn test_render_failure_leaves_no_partial_output() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let root = repo_root();

    fs::write(
        dir.path().join("broken.tera"),
        "{% for v in vars %}{{ v.no_such_field }}{% endfor %}\n",
    )
    .expect("template should be written");
    let manifest_path = dir.path().join("targets.yaml");
    fs::write(
        &manifest_path,
        format!(
            "schema: {root}/schema/shm.yaml\n\
             targets:\n\
             \x20 - template: broken.tera\n\
             \x20   output: generated/broken.txt\n",
            root = root.display()
        ),
    )
    .expect("manifest should be written");

    let generator = ShmGenerator::new(&manifest_path).expect("generator should initialize");
    let err = generator.generate().unwrap_err();
    assert!(format!("{:#}", err).contains("broken.tera"));

    // No output and no temporary left behind.
    assert!(!dir.path().join("generated/broken.txt").exists());
    assert!(!dir.path().join("generated/broken.txt.tmp").exists());
}

#[test]
fn test_invalid_schema_fails_before_any_output() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let root = repo_root();

    fs::write(dir.path().join("empty.yaml"), "{}\n").expect("schema should be written");
    let manifest_path = dir.path().join("targets.yaml");
    fs::write(
        &manifest_path,
        format!(
            "schema: empty.yaml\n\
             targets:\n\
             \x20 - template: {root}/templates/shm.rs.tera\n\
             \x20   output: generated/shm.rs\n",
            root = root.display()
        ),
    )
    .expect("manifest should be written");

    let err = ShmGenerator::new(&manifest_path).unwrap_err();
    assert!(format!("{:#}", err).contains("no groups"));
    assert!(!dir.path().join("generated/shm.rs").exists());
}
