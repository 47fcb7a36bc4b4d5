//! Classify a source string by the transport it denotes.
//!
//! The rules are applied in a fixed order and the first one that matches decides:
//!
//! 1. A forcing prefix (`git::`, `file::`, `http::`) decides outright.
//! 2. A scheme-less `github.com...` or `gitlab.com...` is a git remote.
//! 3. Anything shaped like a local path (`./`, `../`, `/`, `C:\`, `~/`, `file://`) is a file, unless
//!    it ends in `.git` once `~/` is expanded, in which case it is a local repository.
//! 4. SSH remotes, `git://` URLs, `.git`-suffixed HTTP(S) URLs, repository URLs on the known forges,
//!    `host/owner/repo//subdir` and bare `owner/repo` shorthands are git remotes.
//! 5. An `http://` or `https://` URL with a dotted host which also parses as a URL is HTTP.
//! 6. Any other parseable scheme is rejected.
//! 7. A dotted string without a scheme is rejected, since it most likely names a host.
//! 8. Everything else is [`UriType::Unknown`].

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ClassifyError;
use crate::home::{HomeDir, SystemHome, expand_tilde};

/// The transport a source string denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum UriType {
    #[serde(rename = "GitURI")]
    Git,
    #[serde(rename = "HTTPURI")]
    Http,
    #[serde(rename = "FileURI")]
    File,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl UriType {
    /// Every category that can be served by a gatherer.
    pub const GATHERABLE: &[UriType] = &[UriType::Git, UriType::Http, UriType::File];

    /// The canonical name of this category. Gatherers are registered under this key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Git => "GitURI",
            Self::Http => "HTTPURI",
            Self::File => "FileURI",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for UriType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const GIT_PREFIX: &str = "git::";
const FILE_PREFIX: &str = "file::";
const HTTP_PREFIX: &str = "http::";

const GIT_HOSTS: &[&str] = &["github.com", "gitlab.com"];

static GIT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:",
        r"git@[[:word:].\-]+:[[:word:].\-]+/[[:word:].\-]+",
        r"|https?://[[:word:].\-]+/[[:word:].\-]+/[[:word:].\-]+\.git",
        r"|https?://(?:www\.)?(?:github\.com|gitlab\.com)/[[:word:].\-]+/[[:word:].\-]+",
        r"|git://[[:word:].\-]+/[[:word:].\-]+/[[:word:].\-]+",
        r"|[[:word:].\-]+/[[:word:].\-]+/[[:word:].\-]+//.*",
        r"|[[:word:]\-]+/[[:word:].\-]+",
        r")$"
    ))
    .unwrap_or_else(|e| panic!("invalid git pattern: {e}"))
});

static HTTP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[[:word:]\-]+(?:\.[[:word:]\-]+)+.*$")
        .unwrap_or_else(|e| panic!("invalid http pattern: {e}"))
});

static FILE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\./|\.\./|/|[a-zA-Z]:\\|~/|file://)")
        .unwrap_or_else(|e| panic!("invalid file pattern: {e}"))
});

/// Classify `input`, expanding `~/` with the current user's home directory.
pub fn classify(input: &str) -> Result<UriType, ClassifyError> {
    classify_with(input, &SystemHome)
}

/// Classify `input`, expanding `~/` with the given resolver. An `Err` always means the category is
/// [`UriType::Unknown`].
pub fn classify_with<H: HomeDir + ?Sized>(input: &str, home: &H) -> Result<UriType, ClassifyError> {
    let uri_type = classify_impl(input, home)?;
    log::debug!("classified '{input}' as {uri_type}");
    Ok(uri_type)
}

fn classify_impl<H: HomeDir + ?Sized>(input: &str, home: &H) -> Result<UriType, ClassifyError> {
    if input.starts_with(GIT_PREFIX) {
        return Ok(UriType::Git);
    }
    if input.starts_with(FILE_PREFIX) {
        return Ok(UriType::File);
    }
    if input.starts_with(HTTP_PREFIX) {
        return Ok(UriType::Http);
    }

    if GIT_HOSTS.iter().any(|host| input.starts_with(host)) {
        return Ok(UriType::Git);
    }

    if FILE_PATTERN.is_match(input) {
        let expanded = expand_tilde(input, home);
        if expanded.to_string_lossy().ends_with(".git") {
            return Ok(UriType::Git);
        }
        return Ok(UriType::File);
    }

    if GIT_PATTERN.is_match(input) {
        return Ok(UriType::Git);
    }

    let parsed = url::Url::parse(input);

    if HTTP_PATTERN.is_match(input)
        && let Ok(url) = &parsed
        && matches!(url.scheme(), "http" | "https")
    {
        return Ok(UriType::Http);
    }

    if let Ok(url) = &parsed
        && !matches!(url.scheme(), "" | "http" | "https")
    {
        return Err(ClassifyError::UnsupportedProtocol {
            scheme: url.scheme().to_string(),
        });
    }

    if input.contains('.') {
        return Err(ClassifyError::MissingScheme {
            input: input.to_string(),
        });
    }

    Ok(UriType::Unknown)
}

#[cfg(test)]
use UriType::*;

#[cfg(test)]
fn classify_fixed(input: &str) -> Result<UriType, ClassifyError> {
    classify_with(input, &crate::home::FixedHome::new("/home/tester"))
}

#[cfg(test)]
mod test_forcing_prefixes {
    use super::*;

    #[test]
    fn prefix_wins_over_everything_else() {
        let cases = [
            ("git::https://example.com/page", Git),
            ("git::./local", Git),
            ("git::ftp://nope", Git),
            ("file::https://github.com/foo/bar.git", File),
            ("file::repo.git", File),
            ("http::git@github.com:foo/bar.git", Http),
            ("http::example.com/no-scheme", Http),
        ];
        for (input, expected) in cases {
            assert_eq!(classify_fixed(input), Ok(expected), "input: {input}");
        }
    }

    #[test]
    fn prefix_with_nothing_after_it() {
        assert_eq!(classify_fixed("git::"), Ok(Git));
        assert_eq!(classify_fixed("file::"), Ok(File));
        assert_eq!(classify_fixed("http::"), Ok(Http));
    }
}

#[cfg(test)]
mod test_known_hosts {
    use super::*;

    #[test]
    fn github_and_gitlab_shorthand() {
        for input in [
            "github.com/foo/bar",
            "github.com/foo/bar.git",
            "gitlab.com/group/project//sub/dir",
            "github.com",
        ] {
            assert_eq!(classify_fixed(input), Ok(Git), "input: {input}");
        }
    }

    #[test]
    fn forge_urls_are_git_without_suffix() {
        assert_eq!(classify_fixed("https://github.com/foo/bar"), Ok(Git));
        assert_eq!(classify_fixed("https://gitlab.com/foo/bar"), Ok(Git));
    }

    #[test]
    fn forge_urls_with_deeper_paths_are_http() {
        assert_eq!(
            classify_fixed("https://github.com/foo/bar/archive/refs/tags/v1.tar.gz"),
            Ok(Http)
        );
    }
}



#[cfg(test)]
mod test_http {
    use super::*;

    #[test]
    fn plain_web_resources() {
        for input in [
            "https://host.example/some/page",
            "http://example.com",
            "https://example.com/data.tar.gz?version=2",
            "https://sub.domain.example.org/owner/repo/extra",
        ] {
            assert_eq!(classify_fixed(input), Ok(Http), "input: {input}");
        }
    }

    #[test]
    fn undotted_hosts_are_not_http() {
        assert_eq!(classify_fixed("https://localhost/page"), Ok(Unknown));
    }

    #[test]
    fn malformed_urls_are_rejected_by_parsing() {
        assert_eq!(
            classify_fixed("http://example.com:99999/page"),
            Err(ClassifyError::MissingScheme {
                input: "http://example.com:99999/page".to_string()
            })
        );
    }
}


#[cfg(test)]
mod test_unknown {
    use super::*;

    #[test]
    fn empty_and_shapeless_inputs() {
        for input in ["", "plain", "no_dots_here", "a b c"] {
            assert_eq!(classify_fixed(input), Ok(Unknown), "input: {input:?}");
        }
    }

    #[test]
    fn word_characters_are_ascii_only() {
        for input in ["owner/répo", "ówner/repo", "git@hôst:owner/repo"] {
            assert_eq!(classify_fixed(input), Ok(Unknown), "input: {input:?}");
        }
    }

    #[test]
    fn classification_is_repeatable() {
        for input in [
            "owner/repo",
            "~/repo.git",
            "https://host.example/some/page",
            "ftp://host/resource",
            "",
        ] {
            assert_eq!(classify_fixed(input), classify_fixed(input));
        }
    }
}

#[cfg(test)]
mod test_uri_type {
    use super::*;

    #[test]
    fn canonical_names() {
        assert_eq!(Git.as_str(), "GitURI");
        assert_eq!(Http.as_str(), "HTTPURI");
        assert_eq!(File.as_str(), "FileURI");
        assert_eq!(Unknown.to_string(), "Unknown");
    }

    #[test]
    fn gatherable_excludes_unknown() {
        assert!(!UriType::GATHERABLE.contains(&Unknown));
        assert_eq!(UriType::GATHERABLE.len(), 3);
    }
}
