//! Entry point for Zorya3D model inspection.
//! M4: logging + model store CLI flags.

use anyhow::Result;
use asset::texture::TextureData;
use modelstore::{DiskSource, ModelKey, ModelStore};

fn parse_models_dir_arg() -> String {
    // Accept: --models-dir=PATH, default data/models
    let mut dir = String::from("data/models");
    for arg in std::env::args() {
        if let Some(val) = arg.strip_prefix("--models-dir=") {
            dir = val.to_string();
        }
    }
    dir
}

fn parse_checkerboard_arg() -> bool {
    // --checkerboard: decode nothing, just exercise the procedural texture.
    std::env::args().any(|arg| arg == "--checkerboard")
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if parse_checkerboard_arg() {
        let tex = TextureData::checkerboard(64);
        log::info!(
            "Checkerboard self-test: {}x{}, valid={}",
            tex.width,
            tex.height,
            tex.is_valid()
        );
        return Ok(());
    }

    let models_dir = parse_models_dir_arg();
    log::info!("Starting Zorya3D inspect. models_dir={models_dir}");

    let store = ModelStore::new(DiskSource::new(&models_dir));
    for key in ModelKey::ALL {
        let model = store.get(key)?;
        log::info!(
            "Model '{}': {} triangles ({} vertices), texture {}x{}",
            key.name(),
            model.mesh.triangle_count(),
            model.mesh.vertices.len(),
            model.texture.width,
            model.texture.height
        );
    }

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}
