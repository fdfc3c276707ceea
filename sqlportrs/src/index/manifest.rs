use std::fs;
use std::path::{Path, PathBuf};

use glob::glob;
use serde::Deserialize;

use crate::error::{Result, SqlportError};

use super::JsonIndex;

/// JSON index definitions loaded from `*.yml`/`*.yaml` files.
#[derive(Debug, Default, Clone)]
pub struct JsonIndexManifest {
    pub indexes: Vec<JsonIndex>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestFile {
    #[serde(default)]
    indexes: Vec<JsonIndex>,
}

impl JsonIndexManifest {
    pub fn load_from_dir<P: AsRef<Path>>(root: P) -> Result<Self> {
        let dir = root.as_ref();
        if !dir.exists() {
            return Err(SqlportError::Config(format!(
                "index manifest directory not found: {}",
                dir.display()
            )));
        }
        let mut files: Vec<PathBuf> = Vec::new();
        for pattern in ["*.yml", "*.yaml"] {
            for entry in glob(&format!("{}/{pattern}", dir.display()))
                .map_err(|e| SqlportError::Other(e.into()))?
                .flatten()
            {
                files.push(entry);
            }
        }
        files.sort();

        let mut manifest = JsonIndexManifest::default();
        for path in &files {
            manifest.load_file(path)?;
        }
        tracing::debug!(
            files = files.len(),
            indexes = manifest.indexes.len(),
            "loaded json index manifest"
        );
        Ok(manifest)
    }

    fn load_file(&mut self, path: &Path) -> Result<()> {
        let contents = fs::read_to_string(path)?;
        let file: ManifestFile = serde_yaml::from_str(&contents)?;
        self.indexes.extend(file.indexes);
        Ok(())
    }
}
