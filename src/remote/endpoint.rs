use std::str::FromStr;

use derive_more::Display;
use snafu::{Snafu, ensure};

/// A remote host in `user@host[:basedir]` form. The optional basedir
/// substitutes for the local root path on the remote side and is only
/// meaningful when comparing a single root.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("{user_host}")]
pub struct RemoteEndpoint {
    pub user_host: String,
    pub basedir: Option<String>,
}

impl FromStr for RemoteEndpoint {
    type Err = EndpointParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (user_host, basedir) = match s.split_once(':') {
            Some((host, dir)) => (host, Some(dir)),
            None => (s, None),
        };

        ensure!(!user_host.is_empty(), EmptyHostSnafu { input: s });
        if let Some(dir) = basedir {
            ensure!(!dir.is_empty(), EmptyBasedirSnafu { input: s });
        }

        Ok(Self {
            user_host: user_host.to_string(),
            basedir: basedir.map(String::from),
        })
    }
}

#[derive(Debug, Snafu)]
pub enum EndpointParseError {
    #[snafu(display("Remote endpoint '{}' has an empty host part", input))]
    EmptyHost { input: String },
    #[snafu(display("Remote endpoint '{}' has an empty basedir after ':'", input))]
    EmptyBasedir { input: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    #[rstest]
    #[case("me@box", "me@box", None)]
    #[case("me@box:/srv/data", "me@box", Some("/srv/data"))]
    #[case("box:relative/dir", "box", Some("relative/dir"))]
    fn parses_host_and_optional_basedir(
        #[case] input: &str,
        #[case] user_host: &str,
        #[case] basedir: Option<&str>,
    ) {
        let endpoint: RemoteEndpoint = input.parse().unwrap();
        assert_eq!(endpoint.user_host, user_host);
        assert_eq!(endpoint.basedir.as_deref(), basedir);
    }

    #[test]
    fn empty_host_is_rejected() {
        assert!(matches!(
            ":dir".parse::<RemoteEndpoint>(),
            Err(EndpointParseError::EmptyHost { .. })
        ));
    }

    #[test]
    fn trailing_colon_is_rejected() {
        assert!(matches!(
            "me@box:".parse::<RemoteEndpoint>(),
            Err(EndpointParseError::EmptyBasedir { .. })
        ));
    }

    #[test]
    fn displays_as_the_host_part() {
        let endpoint: RemoteEndpoint = "me@box:/srv".parse().unwrap();
        assert_eq!(endpoint.to_string(), "me@box");
    }
}
