//! Parsing of requested feature tokens.

use crate::error::{ReleaseError, Result};

/// Token that selects every feature applicable to the host.
pub const WILDCARD: &str = "ALL";

/// What the user asked for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FeatureRequest {
    /// Every applicable catalog entry
    Wildcard,
    /// Nothing requested
    #[default]
    None,
    /// Explicit names, in request order
    List(Vec<String>),
}

impl FeatureRequest {
    /// Validate raw tokens.
    ///
    /// A lone wildcard becomes [`FeatureRequest::Wildcard`]; a wildcard inside
    /// a longer list is kept in place and short-circuits at resolution time.
    pub fn parse<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        for token in tokens {
            let token = token.as_ref();
            if !is_valid_token(token) {
                return Err(ReleaseError::invalid_config(format!(
                    "unsupported feature token {:?}",
                    token
                )));
            }
        }

        Ok(match tokens {
            [] => FeatureRequest::None,
            [only] if is_wildcard(only.as_ref()) => FeatureRequest::Wildcard,
            _ => FeatureRequest::List(tokens.iter().map(|t| t.as_ref().to_string()).collect()),
        })
    }

    /// Append toggle-requested names to this request.
    pub fn with_toggles(self, toggles: &[&str]) -> Self {
        if toggles.is_empty() {
            return self;
        }
        match self {
            FeatureRequest::Wildcard => FeatureRequest::Wildcard,
            FeatureRequest::None => {
                FeatureRequest::List(toggles.iter().map(|t| t.to_string()).collect())
            }
            FeatureRequest::List(mut names) => {
                names.extend(toggles.iter().map(|t| t.to_string()));
                FeatureRequest::List(names)
            }
        }
    }
}

pub(crate) fn is_wildcard(token: &str) -> bool {
    token.eq_ignore_ascii_case(WILDCARD)
}

fn is_valid_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shapes() {
        assert_eq!(FeatureRequest::parse::<&str>(&[]).unwrap(), FeatureRequest::None);
        assert_eq!(FeatureRequest::parse(&["all"]).unwrap(), FeatureRequest::Wildcard);
        assert_eq!(
            FeatureRequest::parse(&["hwcodec", "ALL"]).unwrap(),
            FeatureRequest::List(vec!["hwcodec".into(), "ALL".into()])
        );
    }

    #[test]
    fn malformed_tokens_are_configuration_errors() {
        for bad in ["", "a b", "x,y", "../etc"] {
            let err = FeatureRequest::parse(&[bad]).unwrap_err();
            assert!(
                matches!(err, ReleaseError::InvalidConfiguration { .. }),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn toggles_extend_lists_but_not_wildcards() {
        let req = FeatureRequest::None.with_toggles(&["hwcodec"]);
        assert_eq!(req, FeatureRequest::List(vec!["hwcodec".into()]));
        assert_eq!(
            FeatureRequest::Wildcard.with_toggles(&["vram"]),
            FeatureRequest::Wildcard
        );
    }
}
