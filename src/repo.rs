use std::sync::LazyLock;

use regex::Regex;

static REPO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"github\.com/([^/]+)/([^/]+)").unwrap());

/// Normalized repository identity. Original case is preserved for display;
/// equality is case-insensitive because the hosting service treats
/// `Foo/Bar` and `foo/bar` as the same repository.
#[derive(Debug, Clone)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl PartialEq for RepoRef {
    fn eq(&self, other: &Self) -> bool {
        self.owner.eq_ignore_ascii_case(&other.owner)
            && self.repo.eq_ignore_ascii_case(&other.repo)
    }
}

impl Eq for RepoRef {}

impl RepoRef {
    /// Extract (owner, repo) from a GitHub URL, discarding anything that
    /// does not identify the repository itself: a trailing `.git`, anchors,
    /// query strings, and `/tree/…` / `/blob/…` sub-paths.
    ///
    /// Returns None when the URL does not decompose; callers skip the entry
    /// and count the drop separately from successes.
    pub fn parse(url: &str) -> Option<RepoRef> {
        let caps = REPO_RE.captures(url)?;
        let owner = caps[1].to_string();
        let mut repo = caps[2].to_string();

        if let Some(cut) = repo.find(['#', '?']) {
            repo.truncate(cut);
        }
        repo = repo
            .trim_end_matches('/')
            .trim_end_matches(".git")
            .to_string();
        if owner.is_empty() || repo.is_empty() {
            return None;
        }
        Some(RepoRef { owner, repo })
    }
}

/// Strip `/tree/…` and `/blob/…` suffixes before segment extraction so the
/// second path segment is the repository, not a ref or file.
fn strip_subpath(url: &str) -> &str {
    let cut = url
        .find("/tree/")
        .into_iter()
        .chain(url.find("/blob/"))
        .min();
    match cut {
        Some(i) => &url[..i],
        None => url,
    }
}

/// Normalize a hosting URL to a RepoRef, sub-paths included.
pub fn normalize(url: &str) -> Option<RepoRef> {
    RepoRef::parse(strip_subpath(url))
}
