use std::path::{Component, Path, PathBuf};

/// Default directory searched for color schemes.
pub const DEFAULT_COLOR_DIR: &str = "/usr/share/vim/vim73/colors/";

/// Configuration for the server.
///
/// Built once at startup and shared immutably between requests.
#[derive(Debug, Clone)]
pub struct Config {
    /// The directory that code is served from. Every search root is relative to this path.
    pub base_path: PathBuf,

    /// Ordered search roots, relative to `base_path`. The first root that contains a requested
    /// file wins. Always starts with `"."`.
    pub search_roots: Vec<PathBuf>,

    /// Directory containing `*.vim` color schemes offered in the view-options form.
    pub theme_dir: PathBuf,
}

impl Config {
    /// Create a configuration serving `base_path` with no additional search roots.
    pub fn new(base_path: impl AsRef<Path>) -> Config {
        Config {
            base_path: normalize(base_path.as_ref()),
            search_roots: vec![PathBuf::from(".")],
            theme_dir: PathBuf::from(DEFAULT_COLOR_DIR),
        }
    }

    /// Append additional search roots. They are consulted after the base path itself, in the
    /// order given.
    pub fn with_search_roots<I, P>(mut self, roots: I) -> Config
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_roots.extend(roots.into_iter().map(Into::into));
        self
    }

    /// Set the directory that color schemes are enumerated from.
    pub fn with_theme_dir(mut self, theme_dir: impl Into<PathBuf>) -> Config {
        self.theme_dir = theme_dir.into();
        self
    }

    /// The absolute-or-relative directory each search root points at, normalized.
    pub(crate) fn root_dirs(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.search_roots
            .iter()
            .map(move |root| normalize(&self.base_path.join(root)))
    }
}

/// Lexically normalizes a path: collapses `.` and `..` segments and redundant separators
/// without touching the filesystem.
///
/// A `..` that would climb above the start of a relative path is kept, so `../x` stays `../x`.
/// The empty path normalizes to `.`.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = vec![];

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            _ => parts.push(component),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }

    parts.iter().collect()
}
