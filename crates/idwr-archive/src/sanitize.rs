use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::options::ExtractOptions;

/// Result of sanitizing an archive entry path.
#[derive(Clone, Debug)]
pub struct SanitizedPath {
    pub original: PathBuf,
    pub resolved: PathBuf,
}

/// Resolve an archive member name under `base`.
///
/// Rejects absolute names and any `..` that would climb out of `base`, then
/// applies component stripping.
pub fn sanitize_path_with_options<P: AsRef<Path>, B: AsRef<Path>>(
    entry_path: P,
    base: B,
    options: &ExtractOptions,
) -> Result<SanitizedPath> {
    let entry_path = entry_path.as_ref();
    let base = base.as_ref();

    if entry_path.to_string_lossy().contains('\0') {
        return Err(Error::InvalidPath);
    }

    // archives written on Windows may use backslashes
    let unified = PathBuf::from(entry_path.to_string_lossy().replace('\\', "/"));
    let relative = normalize_relative(&unified).ok_or_else(|| Error::ZipSlip {
        entry: entry_path.to_path_buf(),
    })?;

    let processed = if options.strip_components > 0 {
        strip_components(&relative, options.strip_components)?
    } else {
        relative
    };

    Ok(SanitizedPath {
        original: entry_path.to_path_buf(),
        resolved: base.join(processed),
    })
}

/// Normalize to a relative path, or `None` if it is absolute or escapes.
fn normalize_relative(path: &Path) -> Option<PathBuf> {
    let mut result = PathBuf::new();
    let mut depth = 0usize;

    for component in path.components() {
        match component {
            Component::Normal(part) => {
                result.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                result.pop();
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    Some(result)
}

fn strip_components(path: &Path, count: usize) -> Result<PathBuf> {
    let components: Vec<_> = path.components().collect();
    if components.len() <= count {
        return Err(Error::NoComponentsRemaining {
            original: path.to_path_buf(),
            count,
        });
    }
    Ok(components[count..].iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> &'static Path { Path::new("/cache/data/v1") }

    #[test]
    fn basic_path_sanitization() {
        let result = sanitize_path_with_options("bullet.parquet", base(), &ExtractOptions::default()).unwrap();
        assert_eq!(result.original, Path::new("bullet.parquet"));
        assert_eq!(result.resolved, base().join("bullet.parquet"));
    }

    #[test]
    fn inner_parent_dirs_are_resolved() {
        let result = sanitize_path_with_options("a/../b/./c.parquet", base(), &ExtractOptions::default()).unwrap();
        assert_eq!(result.resolved, base().join("b/c.parquet"));
    }

    #[test]
    fn zip_slip_protection() {
        let options = ExtractOptions::default();
        for name in ["../evil", "a/../../evil", "/etc/passwd", "..\\evil"] {
            let result = sanitize_path_with_options(name, base(), &options);
            assert!(matches!(result, Err(Error::ZipSlip { .. })), "{name}: {result:?}");
        }
    }

    #[test]
    fn path_with_component_stripping() {
        let options = ExtractOptions::default().strip_components(1);
        let result = sanitize_path_with_options("release/unified.parquet", base(), &options).unwrap();
        assert_eq!(result.resolved, base().join("unified.parquet"));

        let err = sanitize_path_with_options("unified.parquet", base(), &options).unwrap_err();
        assert!(matches!(err, Error::NoComponentsRemaining { count: 1, .. }));
    }
}
