use std::fs;
use std::path::Path;

use tracing::log::*;

const THEME_EXTENSION: &str = "vim";

/// Color schemes available to the renderer: the `*.vim` files of one directory, read once.
#[derive(Debug, Clone, Default)]
pub struct ThemeCatalog {
    names: Vec<String>,
}

impl ThemeCatalog {
    /// Reads the scheme names in `dir`. An unreadable directory has no schemes.
    pub fn load(dir: &Path) -> ThemeCatalog {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("cannot list themes in {}: {}", dir.display(), e);
                return ThemeCatalog::default();
            }
        };

        let mut names = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().map_or(false, |ext| ext == THEME_EXTENSION))
            .filter_map(|path| Some(path.file_stem()?.to_str()?.to_owned()))
            .collect::<Vec<_>>();

        names.sort();
        debug!("found {} color schemes in {}", names.len(), dir.display());

        ThemeCatalog { names }
    }

    /// Scheme names, sorted.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}
