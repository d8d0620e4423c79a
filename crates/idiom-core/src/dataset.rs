//! Reference dataset of idioms.

use crate::error::{DatasetError, DatasetResult};
use crate::models::{Idiom, IdiomId};
use std::collections::HashMap;
use std::path::Path;

/// Dataset compiled into the binary.
pub const BUNDLED_DATASET: &str = include_str!("../data/idioms.json");

/// Immutable, ordered idiom collection.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    idioms: Vec<Idiom>,
    index: HashMap<IdiomId, usize>,
}

impl Dataset {
    /// Build from records, rejecting duplicate ids.
    pub fn from_idioms(idioms: Vec<Idiom>) -> DatasetResult<Self> {
        let mut index = HashMap::with_capacity(idioms.len());
        for (pos, idiom) in idioms.iter().enumerate() {
            if index.insert(idiom.id, pos).is_some() {
                return Err(DatasetError::DuplicateId(idiom.id));
            }
        }
        Ok(Self { idioms, index })
    }

    /// Parse a JSON array of idioms.
    pub fn from_json(json: &str) -> DatasetResult<Self> {
        let idioms: Vec<Idiom> = serde_json::from_str(json)?;
        Self::from_idioms(idioms)
    }

    /// Load a JSON dataset from disk.
    pub fn load(path: &Path) -> DatasetResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset = Self::from_json(&json)?;
        tracing::info!(path = %path.display(), count = dataset.len(), "loaded dataset");
        Ok(dataset)
    }

    /// The dataset shipped with the application.
    pub fn bundled() -> DatasetResult<Self> {
        Self::from_json(BUNDLED_DATASET)
    }

    pub fn idioms(&self) -> &[Idiom] {
        &self.idioms
    }

    pub fn get(&self, id: IdiomId) -> Option<&Idiom> {
        self.index.get(&id).map(|&pos| &self.idioms[pos])
    }

    pub fn len(&self) -> usize {
        self.idioms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idioms.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Idiom> {
        self.idioms.iter()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Idiom;
    type IntoIter = std::slice::Iter<'a, Idiom>;

    fn into_iter(self) -> Self::IntoIter {
        self.idioms.iter()
    }
}
