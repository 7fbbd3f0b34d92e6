//! Writes `manifest.json` for a model directory.
//!
//! The manifest holds SHA-256 digests of `encoder.json` and `model.json`;
//! the application verifies them before loading anything.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin hash_artifacts -- <model_dir>
//! ```

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

use holomed::adapters::artifacts::ArtifactManifest;

fn usage() -> String {
    "Usage: hash_artifacts <model_dir>".to_string()
}

fn parse_args() -> Result<PathBuf> {
    let mut model_dir: Option<PathBuf> = None;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "-h" | "--help" => return Err(anyhow!(usage())),
            _ => {
                if model_dir.is_none() {
                    model_dir = Some(PathBuf::from(arg));
                } else {
                    return Err(anyhow!(usage()));
                }
            }
        }
    }

    model_dir.ok_or_else(|| anyhow!(usage()))
}

fn main() -> Result<()> {
    let model_dir = parse_args()?;

    let model_dir = if model_dir.is_file() {
        model_dir
            .parent()
            .ok_or_else(|| anyhow!("Model path has no parent directory"))?
            .to_path_buf()
    } else {
        model_dir
    };

    let manifest = ArtifactManifest::for_dir(&model_dir)?;
    let path = manifest.write(&model_dir)?;

    println!("Wrote {}", path.display());
    for (name, digest) in &manifest.files {
        println!("  {name}: sha256:{digest}");
    }
    Ok(())
}
