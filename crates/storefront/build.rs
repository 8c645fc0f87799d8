//! Build script for the storefront crate.
//!
//! Fingerprints `static/css/main.css` so the stylesheet can be served from an
//! immutable, content-addressed path.

use std::env;
use std::fs;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

fn main() -> io::Result<()> {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").map_err(io::Error::other)?;
    fingerprint_css(Path::new(&manifest_dir))
}

/// Copy main.css to `static/css/derived/main.<hash>.css`.
///
/// Exposes the hash as `CSS_HASH` for `env!("CSS_HASH")`. An empty hash makes
/// templates fall back to the unhashed file.
fn fingerprint_css(manifest_dir: &Path) -> io::Result<()> {
    let css_path = manifest_dir.join("static/css/main.css");
    println!("cargo:rerun-if-changed={}", css_path.display());

    let Ok(content) = fs::read(&css_path) else {
        println!("cargo:warning=main.css not found, serving unhashed stylesheet");
        println!("cargo:rustc-env=CSS_HASH=");
        return Ok(());
    };

    let digest = format!("{:x}", Sha256::digest(&content));
    let short_hash = &digest[..8];
    println!("cargo:rustc-env=CSS_HASH={short_hash}");

    let derived_dir = manifest_dir.join("static/css/derived");
    fs::create_dir_all(&derived_dir)?;
    fs::copy(&css_path, derived_dir.join(format!("main.{short_hash}.css")))?;
    Ok(())
}
