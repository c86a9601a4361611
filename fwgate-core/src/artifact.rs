//! Artifact naming rules.
//!
//! Update identifiers look like `<hardware-prefix>_<version>.swu`. The prefix is
//! compared case-insensitively against the target's hardware type, the `.swu`
//! suffix is matched exactly.

use thiserror::Error;

pub const ARTIFACT_SEPARATOR: char = '_';
pub const ARTIFACT_SUFFIX: &str = ".swu";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArtifactError {
    #[error("missing '_' separator")]
    MissingSeparator,

    #[error("prefix '{found}' does not match hardware type '{expected}'")]
    PrefixMismatch { expected: String, found: String },

    #[error("suffix must be '.swu'")]
    BadSuffix,

    #[error("empty version")]
    EmptyVersion,
}

/// A validated artifact identifier split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactName<'a> {
    pub prefix: &'a str,
    pub version: &'a str,
}

/// Checks separator, prefix and suffix without requiring a non-empty version.
///
/// Returns the text between the separator and the `.swu` suffix.
pub fn check_target<'a>(
    artifact: &'a str,
    expected_prefix: &str,
) -> std::result::Result<ArtifactName<'a>, ArtifactError> {
    let (prefix, rest) = artifact
        .split_once(ARTIFACT_SEPARATOR)
        .ok_or(ArtifactError::MissingSeparator)?;

    if !prefix.eq_ignore_ascii_case(expected_prefix) {
        return Err(ArtifactError::PrefixMismatch {
            expected: expected_prefix.to_string(),
            found: prefix.to_string(),
        });
    }

    let version = rest
        .strip_suffix(ARTIFACT_SUFFIX)
        .ok_or(ArtifactError::BadSuffix)?;

    Ok(ArtifactName { prefix, version })
}

/// Full validation: target check plus a non-empty version.
pub fn parse<'a>(
    artifact: &'a str,
    expected_prefix: &str,
) -> std::result::Result<ArtifactName<'a>, ArtifactError> {
    let name = check_target(artifact, expected_prefix)?;
    if name.version.is_empty() {
        return Err(ArtifactError::EmptyVersion);
    }
    Ok(name)
}

/// Returns the version encoded in `artifact` for a target with `expected_prefix`.
pub fn validate(artifact: &str, expected_prefix: &str) -> std::result::Result<String, ArtifactError> {
    parse(artifact, expected_prefix).map(|name| name.version.to_string())
}

/// Whether `artifact` is addressed at hardware `expected_prefix` (prefix and suffix only).
pub fn targets(artifact: &str, expected_prefix: &str) -> bool {
    check_target(artifact, expected_prefix).is_ok()
}
