//! Mapping request URLs and include names onto files under the search roots.

use std::path::{Component, Path, PathBuf};

use tracing::log::*;

use crate::config::{normalize, Config};

/// A URL that was located on the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Where the file or directory lives.
    pub path: PathBuf,

    /// Path fragment, relative to the served root and without a leading slash, that links to
    /// this target.
    pub link: String,
}

/// Resolves URLs against the ordered search roots of a [`Config`].
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    config: &'a Config,
}

impl<'a> Resolver<'a> {
    /// A resolver over the roots of `config`.
    pub fn new(config: &'a Config) -> Resolver<'a> {
        Resolver { config }
    }

    /// Resolves a top-level request URL. The empty URL names the base directory.
    pub fn resolve(&self, url: &str) -> Option<Resolved> {
        self.resolve_from(url, None)
    }

    /// Resolves `url`, falling back to the directory of `current` when no search root contains
    /// it.
    ///
    /// `current` is the filesystem path of the file the URL was found in, as returned by an
    /// earlier resolution, so it already carries the base path.
    pub fn resolve_from(&self, url: &str, current: Option<&Path>) -> Option<Resolved> {
        let url = if url.is_empty() { "." } else { url };
        let relative = url.trim_start_matches('/');

        for root in self.config.root_dirs() {
            let candidate = normalize(&root.join(relative));
            if !is_within(&candidate, &root) {
                debug!("{:?} escapes search root {:?}", url, root);
                continue;
            }

            if candidate.exists() {
                return Some(Resolved {
                    path: candidate,
                    link: url.to_owned(),
                });
            }
        }

        let current = current?;
        let dir = current.parent().unwrap_or_else(|| Path::new(""));
        let candidate = normalize(&dir.join(relative));

        let served_from = match self.served_from(&candidate) {
            Some(dir) => dir,
            None => {
                debug!("{:?} relative to {:?} escapes the served roots", url, current);
                return None;
            }
        };

        if !candidate.exists() {
            debug!("{:?} not found relative to {:?}", url, current);
            return None;
        }

        let link = strip_common_prefix(&candidate, &served_from);

        Some(Resolved {
            path: candidate,
            link,
        })
    }

    /// The base path, or failing that the first search root, that contains `path`.
    fn served_from(&self, path: &Path) -> Option<PathBuf> {
        if is_within(path, &self.config.base_path) {
            return Some(self.config.base_path.clone());
        }
        self.config.root_dirs().find(|root| is_within(path, root))
    }
}

/// Whether the normalized `path` lies inside the normalized directory `root`.
fn is_within(path: &Path, root: &Path) -> bool {
    if root == Path::new(".") {
        return path.is_relative() && !path.starts_with("..");
    }
    path.starts_with(root)
}

/// Drops the leading components `path` shares with `base` and renders the rest as a URL
/// fragment.
fn strip_common_prefix(path: &Path, base: &Path) -> String {
    let mut rest = path.components().peekable();
    let base = base.components().filter(|c| *c != Component::CurDir);

    for component in base {
        if rest.peek() == Some(&component) {
            rest.next();
        } else {
            break;
        }
    }

    rest.filter_map(|component| match component {
        Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
        Component::ParentDir => Some(String::from("..")),
        _ => None,
    })
    .collect::<Vec<_>>()
    .join("/")
}
