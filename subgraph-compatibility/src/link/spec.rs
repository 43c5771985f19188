//! Representation of Apollo `@link` specification urls.
use std::fmt;
use std::str;

use apollo_compiler::Name;
use apollo_compiler::name;
use thiserror::Error;

pub const APOLLO_SPEC_DOMAIN: &str = "https://specs.apollo.dev";

#[derive(Error, Debug, PartialEq)]
pub enum SpecError {
    #[error("Parse error: {0}")]
    ParseError(String),
}

/// The identity of a `@link` specification, independent of its version.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Identity {
    /// The "domain" the specification is part of, for instance `"https://specs.apollo.dev"`.
    pub domain: String,

    /// The name of the specification, for instance `federation`.
    pub name: Name,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.domain, self.name)
    }
}

impl Identity {
    pub fn link_identity() -> Identity {
        Identity {
            domain: APOLLO_SPEC_DOMAIN.to_string(),
            name: name!("link"),
        }
    }

    pub fn federation_identity() -> Identity {
        Identity {
            domain: APOLLO_SPEC_DOMAIN.to_string(),
            name: name!("federation"),
        }
    }
}

/// The version of a `@link` specification, as major and minor numbers.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl str::FromStr for Version {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s.split_once('.').ok_or(SpecError::ParseError(
            "version number is missing a dot (.)".to_string(),
        ))?;

        let major = major.parse::<u32>().map_err(|_| {
            SpecError::ParseError(format!("invalid major version number '{major}'"))
        })?;
        let minor = minor.parse::<u32>().map_err(|_| {
            SpecError::ParseError(format!("invalid minor version number '{minor}'"))
        })?;

        Ok(Version { major, minor })
    }
}

impl Version {
    /// Whether this version satisfies the provided `required` version.
    pub fn satisfies(&self, required: &Version) -> bool {
        if self.major == 0 {
            self == required
        } else {
            self.major == required.major && self.minor >= required.minor
        }
    }
}

/// A `@link` specification url, which identifies a specific version of a specification.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Url {
    pub identity: Identity,
    pub version: Version,
}

impl fmt::Display for Url {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/v{}", self.identity, self.version)
    }
}

impl str::FromStr for Url {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = url::Url::parse(s)
            .map_err(|e| SpecError::ParseError(format!("invalid specification url: {e}")))?;
        let mut segments = url.path_segments().ok_or(SpecError::ParseError(
            "invalid `@link` specification url".to_string(),
        ))?;
        let version = segments.next_back().ok_or(SpecError::ParseError(
            "invalid `@link` specification url: missing specification version".to_string(),
        ))?;
        let Some(version) = version.strip_prefix('v') else {
            return Err(SpecError::ParseError(
                "invalid `@link` specification url: the last element of the path should be the version starting with a 'v'".to_string(),
            ));
        };
        let version = version.parse::<Version>()?;
        // Spec names with dashes exist in the wild; they can only be imported from, never
        // referenced through a namespaced name, so the name is not checked.
        let name = segments
            .next_back()
            .map(Name::new_unchecked)
            .ok_or(SpecError::ParseError(
                "invalid `@link` specification url: missing specification name".to_string(),
            ))?;
        let scheme = url.scheme();
        if !scheme.starts_with("http") {
            return Err(SpecError::ParseError(
                "invalid `@link` specification url: only http(s) urls are supported currently"
                    .to_string(),
            ));
        }
        let url_domain = url.domain().ok_or(SpecError::ParseError(
            "invalid `@link` specification url".to_string(),
        ))?;
        let path_remainder = segments.collect::<Vec<&str>>();
        let domain = if path_remainder.is_empty() {
            format!("{scheme}://{url_domain}")
        } else {
            format!("{scheme}://{url_domain}/{}", path_remainder.join("/"))
        };
        Ok(Url {
            identity: Identity { domain, name },
            version,
        })
    }
}

#[cfg(test)]
mod tests {
    use apollo_compiler::name;

    use super::*;

    #[test]
    fn versions_compare_by_major_then_minor() {
        assert!(Version { major: 1, minor: 4 } < Version { major: 2, minor: 0 });
        assert!(Version { major: 2, minor: 3 } < Version { major: 2, minor: 10 });
        assert!(Version { major: 2, minor: 5 }.satisfies(&Version { major: 2, minor: 3 }));
        assert!(!Version { major: 1, minor: 5 }.satisfies(&Version { major: 2, minor: 0 }));
        assert!(!Version { major: 0, minor: 2 }.satisfies(&Version { major: 0, minor: 1 }));
    }

    #[test]
    fn invalid_versions_return_meaningful_errors() {
        assert_eq!(
            "foo".parse::<Version>(),
            Err(SpecError::ParseError(
                "version number is missing a dot (.)".to_string()
            ))
        );
        assert_eq!(
            "2.x".parse::<Version>(),
            Err(SpecError::ParseError(
                "invalid minor version number 'x'".to_string()
            ))
        );
    }

    #[test]
    fn federation_urls_are_parsed() {
        assert_eq!(
            "https://specs.apollo.dev/federation/v2.3"
                .parse::<Url>()
                .unwrap(),
            Url {
                identity: Identity::federation_identity(),
                version: Version { major: 2, minor: 3 }
            }
        );

        let custom = "http://something.com/more/path/my_spec/v0.1?k=2"
            .parse::<Url>()
            .unwrap();
        assert_eq!(custom.identity.domain, "http://something.com/more/path");
        assert_eq!(custom.identity.name, name!("my_spec"));
        assert_eq!(custom.to_string(), "http://something.com/more/path/my_spec/v0.1");
    }

    #[test]
    fn urls_without_version_are_rejected() {
        assert!("https://specs.apollo.dev/federation".parse::<Url>().is_err());
        assert!("ftp://specs.apollo.dev/federation/v2.0".parse::<Url>().is_err());
    }
}
