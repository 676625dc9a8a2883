//! Repository and issue identifiers.
//!
//! A repository is addressed either structurally (`RepoId::new("owner",
//! "repo")`) or with a string `[platform:]owner/repo[.git]`. GitLab owners may
//! be nested groups, so everything before the last `/` is the owner.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::Platform;

/// Why a repository or issue identifier could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoIdError {
    #[error("repository identifier is empty")]
    Empty,

    #[error("unknown platform prefix {0:?}")]
    UnknownPlatform(String),

    #[error("expected owner/repo, got {0:?}")]
    MissingOwner(String),

    #[error("invalid path segment {segment:?} in {input:?}")]
    InvalidSegment { input: String, segment: String },

    #[error("expected owner/repo#number, got {0:?}")]
    InvalidIssueRef(String),
}

/// Identifies a repository, optionally pinned to a platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub platform: Option<Platform>,
    pub owner: String,
    pub name: String,
}

fn valid_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl RepoId {
    /// Structured constructor; performs no validation.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            platform: None,
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Pin this identifier to `platform`.
    #[must_use]
    pub fn on(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Parse `[platform:]owner/repo[.git]`.
    pub fn parse(input: &str) -> Result<Self, RepoIdError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(RepoIdError::Empty);
        }

        let (platform, path) = match trimmed.split_once(':') {
            Some((prefix, rest)) => {
                let platform = Platform::from_name(prefix)
                    .ok_or_else(|| RepoIdError::UnknownPlatform(prefix.to_string()))?;
                (Some(platform), rest)
            }
            None => (None, trimmed),
        };

        let path = path.strip_suffix(".git").unwrap_or(path);
        let (owner, name) = path
            .rsplit_once('/')
            .ok_or_else(|| RepoIdError::MissingOwner(input.to_string()))?;

        for segment in owner.split('/').chain(std::iter::once(name)) {
            if !valid_segment(segment) {
                return Err(RepoIdError::InvalidSegment {
                    input: input.to_string(),
                    segment: segment.to_string(),
                });
            }
        }

        Ok(Self {
            platform,
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    /// `owner/name`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Check that both parts are well-formed path segments.
    pub fn validate(&self) -> Result<(), RepoIdError> {
        for segment in self.owner.split('/').chain(std::iter::once(self.name.as_str())) {
            if !valid_segment(segment) {
                return Err(RepoIdError::InvalidSegment {
                    input: self.full_name(),
                    segment: segment.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoId {
    type Err = RepoIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Identifies an issue or pull/merge request by repository and number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueRef {
    pub repo: RepoId,
    pub number: u64,
}

impl IssueRef {
    pub fn new(repo: RepoId, number: u64) -> Self {
        Self { repo, number }
    }
}

impl fmt::Display for IssueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.repo, self.number)
    }
}

impl FromStr for IssueRef {
    type Err = RepoIdError;

    /// Parse `[platform:]owner/repo#number`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (repo, number) = s
            .trim()
            .rsplit_once('#')
            .ok_or_else(|| RepoIdError::InvalidIssueRef(s.to_string()))?;
        let number = number
            .parse::<u64>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| RepoIdError::InvalidIssueRef(s.to_string()))?;
        Ok(Self {
            repo: RepoId::parse(repo)?,
            number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_owner_repo() {
        let id: RepoId = "rust-lang/rust".parse().expect("valid");
        assert_eq!(id, RepoId::new("rust-lang", "rust"));
        assert_eq!(id.full_name(), "rust-lang/rust");
        assert_eq!(id.to_string(), "rust-lang/rust");
    }

    #[test]
    fn parses_platform_prefix_and_git_suffix() {
        let id = RepoId::parse("gitlab:gitlab-org/gitlab.git").expect("valid");
        assert_eq!(id.platform, Some(Platform::GitLab));
        assert_eq!(id.owner, "gitlab-org");
        assert_eq!(id.name, "gitlab");
    }

    #[test]
    fn nested_groups_keep_full_owner_path() {
        let id = RepoId::parse("gitlab:group/sub/project").expect("valid");
        assert_eq!(id.owner, "group/sub");
        assert_eq!(id.name, "project");
    }

    #[test]
    fn dots_in_names_are_allowed() {
        let id = RepoId::parse("github:owner/my.repo").expect("valid");
        assert_eq!(id.name, "my.repo");
    }

    #[test]
    fn rejects_malformed_identifiers() {
        assert_eq!(RepoId::parse("   "), Err(RepoIdError::Empty));
        assert!(matches!(
            RepoId::parse("justaname"),
            Err(RepoIdError::MissingOwner(_))
        ));
        assert!(matches!(
            RepoId::parse("bitbucket:o/r"),
            Err(RepoIdError::UnknownPlatform(p)) if p == "bitbucket"
        ));
        assert!(matches!(
            RepoId::parse("https://github.com/o/r"),
            Err(RepoIdError::UnknownPlatform(_))
        ));
        assert!(matches!(
            RepoId::parse("owner/"),
            Err(RepoIdError::InvalidSegment { .. })
        ));
        assert!(matches!(
            RepoId::parse("own er/repo"),
            Err(RepoIdError::InvalidSegment { .. })
        ));
        assert!(matches!(
            RepoId::parse("owner/.git"),
            Err(RepoIdError::InvalidSegment { .. })
        ));
        assert!(matches!(
            RepoId::parse("../repo"),
            Err(RepoIdError::InvalidSegment { .. })
        ));
    }

    #[test]
    fn structured_ids_can_be_validated() {
        assert!(RepoId::new("o", "r").validate().is_ok());
        assert!(RepoId::new("", "r").validate().is_err());
        assert!(RepoId::new("o", "r/x").validate().is_err());
    }

    #[test]
    fn parses_issue_refs() {
        let issue: IssueRef = "github:octo/hello#42".parse().expect("valid");
        assert_eq!(issue.number, 42);
        assert_eq!(issue.repo.platform, Some(Platform::GitHub));
        assert_eq!(issue.to_string(), "octo/hello#42");

        assert!("octo/hello".parse::<IssueRef>().is_err());
        assert!("octo/hello#0".parse::<IssueRef>().is_err());
        assert!("octo/hello#x".parse::<IssueRef>().is_err());
    }
}
