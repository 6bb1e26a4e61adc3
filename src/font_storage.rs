use std::{collections::HashMap, path::Path, sync::Arc};

use crate::error::FontError;

/// Manages font loading and retrieval using `fontdb` and `fontdue`.
///
/// Faces are registered in a `fontdb` database and parsed into `fontdue`
/// fonts on first use. The parsed font is what the glyph cache rasterizes
/// from, so a face is parsed at most once per storage.
pub struct FontStorage {
    /// Faces known to fontdb.
    font_db: fontdb::Database,
    /// Faces that have been parsed by fontdue.
    /// Not all faces in fontdb are necessarily loaded here.
    loaded_font: HashMap<fontdb::ID, Arc<fontdue::Font>, fxhash::FxBuildHasher>,
}

impl Default for FontStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl FontStorage {
    /// Creates a new empty font storage.
    pub fn new() -> Self {
        Self {
            font_db: fontdb::Database::new(),
            loaded_font: HashMap::with_hasher(fxhash::FxBuildHasher::default()),
        }
    }
}

/// Registering faces.
impl FontStorage {
    /// Loads a font from binary data and returns the id of its first face.
    pub fn load_font_binary(&mut self, data: impl Into<Vec<u8>>) -> Result<fontdb::ID, FontError> {
        let data: Vec<u8> = data.into();
        let ids = self
            .font_db
            .load_font_source(fontdb::Source::Binary(Arc::new(data)));

        let id = ids.first().copied().ok_or(FontError::NoFaces)?;
        log::debug!("registered {} face(s) from binary data", ids.len());
        Ok(id)
    }

    /// Loads a font file and returns the id of its first face.
    ///
    /// The file is read eagerly so a missing or unreadable path is reported
    /// here instead of surfacing later as an empty glyph cache.
    pub fn load_font_file(&mut self, path: impl AsRef<Path>) -> Result<fontdb::ID, FontError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        log::info!("loading font {}", path.display());
        self.load_font_binary(data)
    }

    /// Loads the system fonts.
    pub fn load_system_fonts(&mut self) {
        self.font_db.load_system_fonts();
    }

    /// Removes a face by ID.
    pub fn remove_face(&mut self, id: fontdb::ID) {
        self.font_db.remove_face(id);
        self.loaded_font.remove(&id);
    }

    /// Checks if the storage is empty.
    pub fn is_empty(&self) -> bool {
        self.font_db.is_empty()
    }

    /// Returns the number of registered faces.
    pub fn len(&self) -> usize {
        self.font_db.len()
    }
}

/// Get `Font`
impl FontStorage {
    /// Queries for a face matching the description and parses it.
    pub fn query(
        &mut self,
        query: &fontdb::Query,
    ) -> Result<(fontdb::ID, Arc<fontdue::Font>), FontError> {
        let id = self.font_db.query(query).ok_or(FontError::NoMatchingFace)?;
        self.font(id).map(|font| (id, font))
    }

    /// Retrieves a parsed font by ID, parsing it if necessary.
    pub fn font(&mut self, id: fontdb::ID) -> Result<Arc<fontdue::Font>, FontError> {
        use std::collections::hash_map::Entry;

        match self.loaded_font.entry(id) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let font_result = self
                    .font_db
                    .with_face_data(id, |data, index| {
                        fontdue::Font::from_bytes(
                            data,
                            fontdue::FontSettings {
                                collection_index: index,
                                ..Default::default()
                            },
                        )
                    })
                    .ok_or(FontError::UnknownFace(id))?;

                match font_result {
                    Ok(font) => {
                        let r: &mut Arc<fontdue::Font> = entry.insert(Arc::new(font));
                        Ok(Arc::clone(r))
                    }
                    Err(message) => {
                        log::error!("Failed to load font (id: {:?}): {}", id, message);
                        Err(FontError::Parse {
                            id,
                            message: message.to_string(),
                        })
                    }
                }
            }
        }
    }

    /// Returns an iterator over all registered faces.
    pub fn faces(&self) -> impl Iterator<Item = &fontdb::FaceInfo> {
        self.font_db.faces()
    }

    /// Returns face info for an ID.
    pub fn face(&self, id: fontdb::ID) -> Option<&fontdb::FaceInfo> {
        self.font_db.face(id)
    }
}
