//! Lazily-populated model slots: read, parse and decode on first request,
//! hand out shared references afterwards.

use std::path::PathBuf;
use std::sync::OnceLock;

use asset::mesh::MeshData;
use asset::obj::{self, ObjError};
use asset::texture::{TextureData, TextureError};
use parking_lot::Mutex;
use thiserror::Error;

use crate::source::{AssetSource, SourceError};

/// The closed set of models the project ships. Adding a model means adding
/// a variant here and its `<name>.obj` / `<name>.jpg` pair to the models
/// directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModelKey {
    Monkey,
}

impl ModelKey {
    /// Every key, in slot order.
    pub const ALL: [ModelKey; 1] = [ModelKey::Monkey];

    /// On-disk file stem for this key.
    pub fn name(self) -> &'static str {
        match self {
            ModelKey::Monkey => "monkey",
        }
    }

    fn slot_index(self) -> usize {
        self as usize
    }

    fn obj_path(self) -> PathBuf {
        PathBuf::from(format!("{}.obj", self.name()))
    }

    fn tex_path(self) -> PathBuf {
        PathBuf::from(format!("{}.jpg", self.name()))
    }
}

/// A fully loaded model: flattened mesh plus its companion texture.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    pub mesh: MeshData,
    pub texture: TextureData,
}

/// Load failure for one key. The store adds the key's name and nothing
/// else; the underlying errors pass through unchanged.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("model '{name}': {source}")]
    Source {
        name: &'static str,
        #[source]
        source: SourceError,
    },
    #[error("model '{name}': obj text is not valid utf-8")]
    NotUtf8 { name: &'static str },
    #[error("model '{name}': {source}")]
    Parse {
        name: &'static str,
        #[source]
        source: ObjError,
    },
    #[error("model '{name}': {source}")]
    Texture {
        name: &'static str,
        #[source]
        source: TextureError,
    },
}

/// One slot per key. `gate` serializes population so at most one caller
/// parses; `cell` is the publish point. A failed load leaves the cell
/// empty, so the next `get` retries from scratch.
#[derive(Default)]
struct Slot {
    gate: Mutex<()>,
    cell: OnceLock<Model>,
}

/// Lazy model cache with one slot per [`ModelKey`].
///
/// Construct it at startup, share it by reference, drop it at shutdown;
/// published models live exactly as long as the store.
pub struct ModelStore<S> {
    source: S,
    slots: [Slot; ModelKey::ALL.len()],
}

impl<S: AssetSource> ModelStore<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            slots: std::array::from_fn(|_| Slot::default()),
        }
    }

    /// Fetch a model, loading it on first request.
    ///
    /// Later calls for the same key return the published reference without
    /// touching the source or the parser.
    pub fn get(&self, key: ModelKey) -> Result<&Model, StoreError> {
        let slot = &self.slots[key.slot_index()];
        if let Some(model) = slot.cell.get() {
            return Ok(model);
        }

        let _guard = slot.gate.lock();
        // A caller that held the gate may have published while we waited.
        if let Some(model) = slot.cell.get() {
            return Ok(model);
        }

        let model = self.load(key)?;
        Ok(slot.cell.get_or_init(|| model))
    }

    fn load(&self, key: ModelKey) -> Result<Model, StoreError> {
        let name = key.name();
        log::info!("Loading model '{name}'");

        let obj_bytes = self
            .source
            .read(&key.obj_path())
            .map_err(|source| StoreError::Source { name, source })?;
        let text =
            String::from_utf8(obj_bytes).map_err(|_| StoreError::NotUtf8 { name })?;
        let geometry =
            obj::parse_obj(&text).map_err(|source| StoreError::Parse { name, source })?;

        let tex_bytes = self
            .source
            .read(&key.tex_path())
            .map_err(|source| StoreError::Source { name, source })?;
        let texture = TextureData::decode(&tex_bytes)
            .map_err(|source| StoreError::Texture { name, source })?;

        let mesh = geometry.into_mesh();
        log::info!(
            "Model '{name}': {} triangles, texture {}x{}",
            mesh.triangle_count(),
            texture.width,
            texture.height
        );
        Ok(Model { mesh, texture })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{AssetSource, SourceError};
    use image::ImageEncoder;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    const TRIANGLE_OBJ: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0
vt 0 1
vn 0 0 1
f 1/1/1 2/2/1 3/3/1
";

    #[derive(Default)]
    struct StubInner {
        files: Mutex<HashMap<PathBuf, Vec<u8>>>,
        reads: Mutex<Vec<PathBuf>>,
    }

    /// In-memory source that records every read.
    #[derive(Clone, Default)]
    struct StubSource {
        inner: Arc<StubInner>,
    }

    impl StubSource {
        fn insert(&self, path: &str, bytes: Vec<u8>) {
            self.inner.files.lock().insert(PathBuf::from(path), bytes);
        }

        fn remove(&self, path: &str) {
            self.inner.files.lock().remove(Path::new(path));
        }

        fn reads_of(&self, path: &str) -> usize {
            self.inner
                .reads
                .lock()
                .iter()
                .filter(|p| *p == Path::new(path))
                .count()
        }
    }

    impl AssetSource for StubSource {
        fn read(&self, path: &Path) -> Result<Vec<u8>, SourceError> {
            self.inner.reads.lock().push(path.to_path_buf());
            self.inner
                .files
                .lock()
                .get(path)
                .cloned()
                .ok_or_else(|| SourceError::NotFound {
                    path: path.to_path_buf(),
                })
        }
    }

    fn png_bytes(size: u32) -> Vec<u8> {
        let tex = TextureData::checkerboard(size);
        let mut encoded = Vec::new();
        image::codecs::png::PngEncoder::new(&mut encoded)
            .write_image(&tex.data, tex.width, tex.height, image::ExtendedColorType::Rgba8)
            .expect("encode fixture png");
        encoded
    }

    fn monkey_source() -> StubSource {
        let source = StubSource::default();
        source.insert("monkey.obj", TRIANGLE_OBJ.as_bytes().to_vec());
        source.insert("monkey.jpg", png_bytes(16));
        source
    }

    #[test]
    fn key_paths_are_fixed() {
        assert_eq!(ModelKey::Monkey.obj_path(), Path::new("monkey.obj"));
        assert_eq!(ModelKey::Monkey.tex_path(), Path::new("monkey.jpg"));
    }

    #[test]
    fn first_get_loads_and_parses() {
        let store = ModelStore::new(monkey_source());
        let model = store.get(ModelKey::Monkey).expect("load monkey");
        assert_eq!(model.mesh.triangle_count(), 1);
        assert_eq!(model.mesh.vertices.len(), 3);
        assert_eq!(model.texture.width, 16);
    }

    #[test]
    fn second_get_is_a_cache_hit() {
        let source = monkey_source();
        let store = ModelStore::new(source.clone());

        let first = store.get(ModelKey::Monkey).expect("first load");
        let second = store.get(ModelKey::Monkey).expect("second load");

        assert!(std::ptr::eq(first, second));
        assert_eq!(source.reads_of("monkey.obj"), 1);
        assert_eq!(source.reads_of("monkey.jpg"), 1);
    }

    #[test]
    fn missing_obj_propagates_source_error() {
        let source = monkey_source();
        source.remove("monkey.obj");
        let store = ModelStore::new(source);

        let err = store.get(ModelKey::Monkey).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Source {
                name: "monkey",
                source: SourceError::NotFound { .. },
            }
        ));
    }

    #[test]
    fn parse_error_keeps_line_number() {
        let source = monkey_source();
        source.insert("monkey.obj", b"v 0 0 0\nv 0 x 0\n".to_vec());
        let store = ModelStore::new(source);

        let err = store.get(ModelKey::Monkey).unwrap_err();
        match err {
            StoreError::Parse { name, source } => {
                assert_eq!(name, "monkey");
                assert_eq!(source, ObjError::BadFloat { line: 2 });
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn failed_load_is_retried_on_next_get() {
        let source = StubSource::default();
        source.insert("monkey.jpg", png_bytes(16));
        let store = ModelStore::new(source.clone());

        // First attempt: obj missing.
        assert!(store.get(ModelKey::Monkey).is_err());
        // Fix the asset between calls; the slot was left empty.
        source.insert("monkey.obj", TRIANGLE_OBJ.as_bytes().to_vec());
        let model = store.get(ModelKey::Monkey).expect("retry succeeds");

        assert_eq!(model.mesh.vertices.len(), 3);
        assert_eq!(source.reads_of("monkey.obj"), 2);
    }

    #[test]
    fn bad_texture_propagates_decode_error() {
        let source = monkey_source();
        source.insert("monkey.jpg", b"not an image".to_vec());
        let store = ModelStore::new(source);

        let err = store.get(ModelKey::Monkey).unwrap_err();
        assert!(matches!(err, StoreError::Texture { name: "monkey", .. }));
    }

    #[test]
    fn non_utf8_obj_rejected() {
        let source = monkey_source();
        source.insert("monkey.obj", vec![0xff, 0xfe, 0x00]);
        let store = ModelStore::new(source);

        let err = store.get(ModelKey::Monkey).unwrap_err();
        assert!(matches!(err, StoreError::NotUtf8 { name: "monkey" }));
    }
}
