// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use shm_gen::generator::{print_tag_table, ShmGenerator};
use std::env;
use std::path::Path;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        return;
    }

    match args[1].as_str() {
        "generate" => {
            let manifest = args.get(2).map(String::as_str).unwrap_or("schema/targets.yaml");
            if let Err(e) = generate(Path::new(manifest)) {
                eprintln!("[ERROR] {:#}", e);
                std::process::exit(1);
            }
        }
        "check" => {
            let Some(schema) = args.get(2) else {
                eprintln!("Usage: shm-gen check <schema.yaml>");
                std::process::exit(1);
            };
            if let Err(e) = print_tag_table(Path::new(schema)) {
                eprintln!("[ERROR] {:#}", e);
                std::process::exit(1);
            }
        }
        "--help" | "-h" | "help" => {
            print_help();
        }
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            print_help();
            std::process::exit(1);
        }
    }
}

fn generate(manifest: &Path) -> anyhow::Result<()> {
    tracing::info!("Initializing shm generator");
    let generator = ShmGenerator::new(manifest)?;

    tracing::info!("Starting generation");
    let report = generator.generate()?;

    report.summary();

    Ok(())
}

fn print_help() {
    println!("shm-gen v0.4");
    println!();
    println!("USAGE:");
    println!("    shm-gen <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    generate [manifest]  Compile the schema and render every target");
    println!("                         (default manifest: schema/targets.yaml)");
    println!("    check <schema>       Validate a schema and print its tag table");
    println!("    help                 Print this help message");
    println!();
    println!("EXAMPLES:");
    println!("    shm-gen generate schema/targets.yaml");
    println!("    shm-gen check schema/shm.yaml");
    println!();
}
