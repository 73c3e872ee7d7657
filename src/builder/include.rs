//! Include path computation for declared entities.

use std::{collections::HashMap, path::Path};

use crate::typesystem::TypeEntry;

/// Maps header file names to the include path generators should emit.
///
/// The longest configured header directory containing the file is stripped; files outside
/// every directory are included by their bare file name. Results are cached per file name.
#[derive(Debug, Default)]
pub(crate) struct IncludeResolver {
    header_paths: Vec<String>,
    global_header: Option<String>,
    cache: HashMap<String, Option<String>>,
}

impl IncludeResolver {
    pub(crate) fn new(header_paths: &[impl AsRef<Path>], global_header: Option<&Path>) -> Self {
        IncludeResolver {
            header_paths: header_paths
                .iter()
                .map(|path| {
                    path.as_ref()
                        .to_string_lossy()
                        .trim_end_matches('/')
                        .to_string()
                })
                .collect(),
            global_header: global_header
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy().into_owned()),
            cache: HashMap::new(),
        }
    }

    /// The include for `file_name`; `None` for the umbrella header.
    pub(crate) fn include_for(&mut self, file_name: &str) -> Option<String> {
        if let Some(cached) = self.cache.get(file_name) {
            return cached.clone();
        }

        let bare_name = Path::new(file_name)
            .file_name()
            .map_or_else(|| file_name.to_string(), |n| n.to_string_lossy().into_owned());

        let include = if self.global_header.as_deref() == Some(bare_name.as_str()) {
            None
        } else {
            let best = self
                .header_paths
                .iter()
                .filter(|dir| is_in_directory(file_name, dir))
                .max_by_key(|dir| dir.len());
            match best {
                Some(dir) => Some(file_name[dir.len() + 1..].to_string()),
                None => Some(bare_name),
            }
        };

        self.cache.insert(file_name.to_string(), include.clone());
        include
    }

    /// Set the include of `entry` from the header it is declared in. Entries that already
    /// carry an include keep it.
    pub(crate) fn apply(&mut self, entry: &TypeEntry, file_name: Option<&str>) {
        let Some(file_name) = file_name.filter(|name| !name.is_empty()) else {
            return;
        };
        if entry.include().is_some() {
            return;
        }
        if let Some(include) = self.include_for(file_name) {
            entry.set_include(&include);
        }
    }
}

fn is_in_directory(file_name: &str, directory: &str) -> bool {
    !directory.is_empty()
        && file_name.len() > directory.len() + 1
        && file_name.starts_with(directory)
        && file_name.as_bytes()[directory.len()] == b'/'
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_longest_directory_wins() {
        let paths = vec![PathBuf::from("/usr/include"), PathBuf::from("/usr/include/qt/")];
        let mut resolver = IncludeResolver::new(&paths, None);
        assert_eq!(
            resolver.include_for("/usr/include/qt/QtCore/qstring.h").as_deref(),
            Some("QtCore/qstring.h")
        );
        assert_eq!(
            resolver.include_for("/usr/include/stdio.h").as_deref(),
            Some("stdio.h")
        );
        assert_eq!(
            resolver.include_for("/opt/local/widget.h").as_deref(),
            Some("widget.h")
        );
        assert_eq!(
            resolver.include_for("/usr/includes/other.h").as_deref(),
            Some("other.h")
        );
    }

    #[test]
    fn test_global_header_skipped() {
        let paths: Vec<PathBuf> = Vec::new();
        let mut resolver = IncludeResolver::new(&paths, Some(Path::new("/src/global.h")));
        assert_eq!(resolver.include_for("/somewhere/global.h"), None);
        assert_eq!(resolver.include_for("/somewhere/global.h"), None);
        assert_eq!(resolver.include_for("local.h").as_deref(), Some("local.h"));
    }
}
