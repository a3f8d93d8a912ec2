//! Base URL resolution and the percent-encoding of URL components.

use std::fmt;
use std::str::FromStr;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use thiserror::Error;
use url::{ParseError, Position, Url};

/// The absolute URL every relative method URL is resolved against. Always ends in `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl {
    url: Url,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BaseUrlError {
    #[error("invalid base URL {url:?}: {reason}")]
    Malformed { url: String, reason: String },
    #[error("base URL {url:?} must be absolute")]
    NotAbsolute { url: String },
    #[error("base URL {url:?} must end in /")]
    MissingTrailingSlash { url: String },
    #[error("base URL {url:?} must not have a query")]
    HasQuery { url: String },
}

impl BaseUrl {
    pub fn parse(url: &str) -> Result<Self, BaseUrlError> {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(ParseError::RelativeUrlWithoutBase) => return Err(BaseUrlError::NotAbsolute { url: url.to_string() }),
            Err(e) => return Err(BaseUrlError::Malformed { url: url.to_string(), reason: e.to_string() }),
        };
        if parsed.cannot_be_a_base() || !parsed.has_host() {
            return Err(BaseUrlError::NotAbsolute { url: url.to_string() });
        }
        if parsed.query().is_some() {
            return Err(BaseUrlError::HasQuery { url: url.to_string() });
        }
        // `http://host` parses with an implicit "/" path, which is the one case allowed without a slash
        if !parsed.path().ends_with('/') {
            return Err(BaseUrlError::MissingTrailingSlash { url: url.to_string() });
        }

        Ok(Self { url: parsed })
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Userinfo, host and port.
    pub fn authority(&self) -> &str {
        &self.url[Position::BeforeUsername..Position::AfterPort]
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn as_url(&self) -> &Url {
        &self.url
    }

    /// Resolves a method URL as a relative reference: absolute URLs win, `//host/..` keeps the
    /// scheme, `/path` keeps the authority and anything else is merged with the base path, with
    /// `.` and `..` segments removed.
    pub(crate) fn resolve(&self, url: &str) -> Result<Url, ParseError> {
        self.url.join(url)
    }
}

impl FromStr for BaseUrl {
    type Err = BaseUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BaseUrl::parse(s)
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Characters percent-encoded in path segments even when the value is declared encoded.
const PATH_SEGMENT: &AsciiSet =
    &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>').add(b'^').add(b'`').add(b'{').add(b'}').add(b'|').add(b'\\').add(b'?').add(b'#');

/// Path values not declared encoded must also stay inside one segment.
const PATH_SEGMENT_STRICT: &AsciiSet = &PATH_SEGMENT.add(b'/').add(b'%');

/// Characters percent-encoded in already-encoded query and form values.
const COMPONENT: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'\'').add(b'<').add(b'>').add(b'#').add(b'&').add(b'=');

/// Percent-encodes a path value. Unless `encoded`, `/` and `%` are encoded too.
pub(crate) fn encode_path_segment(value: &str, encoded: bool) -> String {
    let set = if encoded { PATH_SEGMENT } else { PATH_SEGMENT_STRICT };
    utf8_percent_encode(value, set).to_string()
}

/// Re-encodes the characters an already-encoded query or form value must not carry raw.
pub(crate) fn reencode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

#[cfg(test)]
mod tests {
    use super::{BaseUrl, BaseUrlError, encode_path_segment, reencode_component};

    #[test]
    fn base_url_rules() {
        let base = BaseUrl::parse("https://api.example.test/v1/").unwrap();
        assert_eq!(base.scheme(), "https");
        assert_eq!(base.authority(), "api.example.test");
        assert_eq!(base.path(), "/v1/");
        assert_eq!(base.to_string(), "https://api.example.test/v1/");

        let bare = BaseUrl::parse("http://localhost:8080").unwrap();
        assert_eq!(bare.authority(), "localhost:8080");
        assert_eq!(bare.path(), "/");

        assert!(matches!(BaseUrl::parse("https://api.example.test/v1"), Err(BaseUrlError::MissingTrailingSlash { .. })));
        assert!(matches!(BaseUrl::parse("/v1/"), Err(BaseUrlError::NotAbsolute { .. })));
        assert!(matches!(BaseUrl::parse("mailto:ann@example.test"), Err(BaseUrlError::NotAbsolute { .. })));
        assert!(matches!(BaseUrl::parse("https://api.example.test/?a=b"), Err(BaseUrlError::HasQuery { .. })));
        assert!(matches!("http://[::1".parse::<BaseUrl>(), Err(BaseUrlError::Malformed { .. })));
    }

    #[test]
    fn resolve() {
        let base = BaseUrl::parse("https://api.example.test/v1/").unwrap();
        let resolve = |url: &str| base.resolve(url).unwrap().to_string();

        assert_eq!(resolve("users/42"), "https://api.example.test/v1/users/42");
        assert_eq!(resolve("/users/42"), "https://api.example.test/users/42");
        assert_eq!(resolve("//cdn.example.test/a.png"), "https://cdn.example.test/a.png");
        assert_eq!(resolve("http://other.test/x?y=1"), "http://other.test/x?y=1");
        assert_eq!(resolve("users?sort=name"), "https://api.example.test/v1/users?sort=name");
    }

    #[test]
    fn resolve_removes_dot_segments() {
        let base = BaseUrl::parse("https://api.example.test/v1/").unwrap();
        assert_eq!(base.resolve("../v2/users").unwrap().as_str(), "https://api.example.test/v2/users");
        assert_eq!(base.resolve("./users/../groups").unwrap().as_str(), "https://api.example.test/v1/groups");
        assert_eq!(base.resolve("../../../root").unwrap().as_str(), "https://api.example.test/root");
    }

    #[test]
    fn path_segments() {
        assert_eq!(encode_path_segment("42", false), "42");
        assert_eq!(encode_path_segment("a b/c%d", false), "a%20b%2Fc%25d");
        assert_eq!(encode_path_segment("a b/c%2F", true), "a%20b/c%2F");
        assert_eq!(encode_path_segment("é?#", false), "%C3%A9%3F%23");
    }

    #[test]
    fn reencoded_components() {
        assert_eq!(reencode_component("a%20b=c&d"), "a%20b%3Dc%26d");
        assert_eq!(reencode_component("tab\there"), "tab%09here");
    }
}
