//! Home directory resolution and `~/` expansion.

use std::path::{Path, PathBuf};

/// Resolves the current user's home directory.
///
/// Classification and destination validation take a resolver explicitly so that tests can pin the
/// home directory without touching the process environment. Any `Fn() -> Option<PathBuf>` is a
/// resolver.
pub trait HomeDir: Send + Sync {
    /// The home directory, or `None` if it cannot be determined.
    fn home_dir(&self) -> Option<PathBuf>;
}

/// Looks up the home directory of the user running the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHome;

impl HomeDir for SystemHome {
    fn home_dir(&self) -> Option<PathBuf> {
        directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
    }
}

/// Always resolves to the same directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedHome(pub PathBuf);

impl FixedHome {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self(path.as_ref().to_path_buf())
    }
}

impl HomeDir for FixedHome {
    fn home_dir(&self) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}

impl<F> HomeDir for F
where
    F: Fn() -> Option<PathBuf> + Send + Sync,
{
    fn home_dir(&self) -> Option<PathBuf> {
        self()
    }
}

/// Expand a leading `~/` to the home directory given by `home`. Any other input, including a bare
/// `~` or `~user/...`, is returned unchanged, as is the input when the home directory cannot be
/// resolved.
pub fn expand_tilde<H: HomeDir + ?Sized>(path: &str, home: &H) -> PathBuf {
    let Some(rest) = path.strip_prefix("~/") else {
        return PathBuf::from(path);
    };
    match home.home_dir() {
        Some(dir) if rest.is_empty() => dir,
        Some(dir) => dir.join(rest),
        None => {
            log::warn!("could not resolve home directory, leaving '{path}' unexpanded");
            PathBuf::from(path)
        }
    }
}

#[cfg(test)]
mod test_expand_tilde {
    use super::*;

    fn no_home() -> Option<PathBuf> {
        None
    }

    #[test]
    fn expands_leading_tilde() {
        let home = FixedHome::new("/home/alice");
        assert_eq!(
            expand_tilde("~/src/repo", &home),
            PathBuf::from("/home/alice/src/repo")
        );
    }

    #[test]
    fn tilde_slash_alone_is_home() {
        let home = FixedHome::new("/home/alice");
        assert_eq!(expand_tilde("~/", &home), PathBuf::from("/home/alice"));
    }

    #[test]
    fn leaves_other_paths_alone() {
        let home = FixedHome::new("/home/alice");
        for path in ["./a", "/abs/path", "~", "~bob/x", "a/~/b", ""] {
            assert_eq!(expand_tilde(path, &home), PathBuf::from(path));
        }
    }

    #[test]
    fn unresolvable_home_is_not_an_error() {
        assert_eq!(expand_tilde("~/x", &no_home), PathBuf::from("~/x"));
    }

    #[test]
    fn closures_are_resolvers() {
        let resolver = || Some(PathBuf::from("/srv"));
        assert_eq!(expand_tilde("~/data", &resolver), PathBuf::from("/srv/data"));
    }
}
