// src/paths/mapping.rs

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::paths::resolver::PathResolver;
use crate::stages::FileSet;

/// One output file and the ordered sources that produce it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMapping {
    pub sources: Vec<PathBuf>,
    pub dest: PathBuf,
}

/// Resolve a [`FileSet`] against `root` into concrete mappings.
///
/// An empty match set yields an empty plan rather than an error, so stages
/// over optional inputs (vendor libs, fonts) are no-ops on a bare tree.
pub fn plan_file_set(resolver: &PathResolver, set: &FileSet, root: &Path) -> Result<Vec<FileMapping>> {
    let dest_root = root.join(&set.dest);

    let Some(cwd) = &set.cwd else {
        let sources = resolver.expand_files(&set.src, root)?;
        if sources.is_empty() {
            return Ok(Vec::new());
        }
        return Ok(vec![FileMapping {
            sources,
            dest: dest_root,
        }]);
    };

    let cwd_path = root.join(cwd);
    let files = resolver.expand_files(&set.src, &cwd_path)?;

    let mut plan = Vec::with_capacity(files.len());
    for file in files {
        let rel = file
            .strip_prefix(&cwd_path)
            .with_context(|| format!("{:?} is outside {:?}", file, cwd_path))?;

        let mut dest_rel = if set.flatten {
            PathBuf::from(rel.file_name().unwrap_or(rel.as_os_str()))
        } else {
            rel.to_path_buf()
        };
        if let Some(ext) = &set.ext {
            dest_rel = replace_extension(&dest_rel, ext);
        }

        plan.push(FileMapping {
            sources: vec![file.clone()],
            dest: dest_root.join(dest_rel),
        });
    }

    Ok(plan)
}

/// Replace everything from the first dot of the file name (ignoring a
/// leading dot) with `ext`: `app.coffee` + `.coffee.js` → `app.coffee.js`.
fn replace_extension(path: &Path, ext: &str) -> PathBuf {
    let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return path.to_path_buf();
    };
    let first_dot = name
        .char_indices()
        .skip(1)
        .find(|&(_, c)| c == '.')
        .map(|(idx, _)| idx);
    let stem = match first_dot {
        Some(idx) => &name[..idx],
        None => name.as_str(),
    };
    path.with_file_name(format!("{stem}{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::fs::mock::MockFileSystem;

    fn resolver() -> PathResolver {
        let fs = MockFileSystem::new();
        fs.add_file("./src/assets/coffee/app.coffee", "x = 1");
        fs.add_file("./src/assets/coffee/modules/nav.coffee", "y = 2");
        fs.add_file("./src/assets/fonts/a/b.woff", "font");
        PathResolver::new(Arc::new(fs))
    }

    #[test]
    fn expand_mode_flattens_and_renames() {
        let set = FileSet::expand("src/assets/coffee", ["**/*.coffee"], "build/assets/js")
            .flattened()
            .with_ext(".coffee.js");
        let plan = plan_file_set(&resolver(), &set, Path::new(".")).unwrap();

        let dests: Vec<_> = plan.iter().map(|m| m.dest.clone()).collect();
        assert_eq!(
            dests,
            vec![
                PathBuf::from("./build/assets/js/app.coffee.js"),
                PathBuf::from("./build/assets/js/nav.coffee.js"),
            ]
        );
    }

    #[test]
    fn expand_mode_keeps_relative_structure() {
        let set = FileSet::expand("src/assets/fonts", ["**"], "build/assets/fonts");
        let plan = plan_file_set(&resolver(), &set, Path::new(".")).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].dest, PathBuf::from("./build/assets/fonts/a/b.woff"));
    }

    #[test]
    fn combine_mode_collects_all_sources_into_one_dest() {
        let set = FileSet::combine(["src/assets/coffee/**/*.coffee"], "build/all.coffee");
        let plan = plan_file_set(&resolver(), &set, Path::new(".")).unwrap();
        assert_eq!(
            plan,
            vec![FileMapping {
                sources: vec![
                    PathBuf::from("./src/assets/coffee/app.coffee"),
                    PathBuf::from("./src/assets/coffee/modules/nav.coffee"),
                ],
                dest: PathBuf::from("./build/all.coffee"),
            }]
        );
    }

    #[test]
    fn combine_mode_without_matches_is_empty() {
        let set = FileSet::combine(["src/app.html"], "build/index.html");
        assert!(plan_file_set(&resolver(), &set, Path::new(".")).unwrap().is_empty());
    }

    #[test]
    fn extension_replacement_uses_first_dot() {
        assert_eq!(
            replace_extension(Path::new("views/home.jade"), ".html"),
            PathBuf::from("views/home.html")
        );
        assert_eq!(
            replace_extension(Path::new("lib.min.js"), ".coffee.js"),
            PathBuf::from("lib.coffee.js")
        );
        assert_eq!(
            replace_extension(Path::new(".hidden"), ".txt"),
            PathBuf::from(".hidden.txt")
        );
        assert_eq!(
            replace_extension(Path::new("views/é.jade"), ".html"),
            PathBuf::from("views/é.html")
        );
    }
}
