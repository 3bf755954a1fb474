use anyhow::Result;
use fs_extra::{copy_items, dir::CopyOptions};
use std::{env, path::PathBuf};

/// Keeps a copy of the sample model and panorama in `OUT_DIR` for packaging.
/// At runtime `ViewerConfig::asset_root` is resolved against the working
/// directory, so `cargo run` from the crate root finds `assets/` in place.
fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets = manifest_dir.join("assets");
    if !assets.exists() {
        return Ok(());
    }

    let out_dir = env::var("OUT_DIR")?;
    let options = CopyOptions {
        overwrite: true,
        ..CopyOptions::new()
    };
    copy_items(&[assets], out_dir, &options)?;
    Ok(())
}
