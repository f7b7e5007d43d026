//! Asset loading/parsers (meshes, textures).
//! M1: two-pass OBJ loader producing flat render-ready vertex data.
//! M2: texture decoding (RGBA8) from in-memory JPEG/PNG.

pub mod mesh;
pub mod obj;
pub mod texture;
