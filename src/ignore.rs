use crate::adapter::AdapterRegistry;
use ignore::WalkBuilder;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};

pub struct IgnoreFilter {
    inner: Gitignore,
}

impl IgnoreFilter {
    pub fn new(root: &Path, extra_excludes: Option<&[String]>) -> Self {
        let mut builder = GitignoreBuilder::new(root);

        // 1. Load from .gitignore and .ignore
        builder.add(root.join(".gitignore"));
        builder.add(root.join(".ignore"));

        // 2. Add defaults (global)
        let defaults = [
            // Noise directories
            "node_modules/", "bower_components/", "jspm_packages/", "vendor/",
            "dist/", "build/", "coverage/", ".next/", ".nuxt/", ".cache/",
            ".git/", ".exportgraph/", ".vscode/", ".idea/",

            // Generated bundles
            "*.min.js", "*.bundle.js", "*.map",
        ];

        for pattern in defaults {
            // Static patterns; a failure here only drops that pattern
            builder.add_line(None, pattern).ok();
        }

        // 3. Add user config excludes
        if let Some(excludes) = extra_excludes {
            for pattern in excludes {
                if let Err(e) = builder.add_line(None, pattern) {
                    tracing::warn!("Ignoring invalid exclude pattern {:?}: {}", pattern, e);
                }
            }
        }

        Self {
            inner: builder.build().unwrap_or_else(|_| Gitignore::empty()),
        }
    }

    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        self.inner.matched_path_or_any_parents(path, is_dir).is_ignore()
    }
}

/// Files under `root` that some adapter can parse, sorted.
///
/// A file given directly is returned as-is when an adapter accepts it.
pub fn collect_sources(
    root: &Path,
    registry: &AdapterRegistry,
    extra_excludes: Option<&[String]>,
) -> Vec<PathBuf> {
    if root.is_file() {
        return match registry.find_adapter(root) {
            Some(_) => vec![root.to_path_buf()],
            None => Vec::new(),
        };
    }

    let filter = IgnoreFilter::new(root, extra_excludes);
    let mut files: Vec<PathBuf> = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| !filter.is_ignored(path, false))
        .filter(|path| registry.find_adapter(path).is_some())
        .collect();

    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::default_registry;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_noise_directories() {
        let dir = tempdir().unwrap();
        let filter = IgnoreFilter::new(dir.path(), None);

        assert!(filter.is_ignored(&dir.path().join("node_modules/lodash/index.js"), false));
        assert!(filter.is_ignored(&dir.path().join("app.min.js"), false));
        assert!(!filter.is_ignored(&dir.path().join("src/index.js"), false));
    }

    #[test]
    fn test_collect_sources_respects_excludes() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/dep")).unwrap();
        fs::create_dir_all(root.join("fixtures")).unwrap();
        fs::write(root.join("src/a.js"), "module.exports = 1;").unwrap();
        fs::write(root.join("src/b.mjs"), "export const b = 1;").unwrap();
        fs::write(root.join("src/readme.md"), "# docs").unwrap();
        fs::write(root.join("node_modules/dep/index.js"), "").unwrap();
        fs::write(root.join("fixtures/skip.js"), "").unwrap();
        fs::write(root.join("tree.estree.json"), "{}").unwrap();
        fs::write(root.join("package.json"), "{}").unwrap();

        let registry = default_registry();
        let excludes = vec!["fixtures/".to_string()];
        let files = collect_sources(root, &registry, Some(excludes.as_slice()));

        let relative: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(relative, vec!["src/a.js", "src/b.mjs", "tree.estree.json"]);
    }

    #[test]
    fn test_collect_single_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("one.cjs");
        fs::write(&file, "").unwrap();

        let registry = default_registry();
        assert_eq!(collect_sources(&file, &registry, None), vec![file.clone()]);
        assert!(collect_sources(&dir.path().join("missing.txt"), &registry, None).is_empty());
    }
}
