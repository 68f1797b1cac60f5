//! Case-encoding of module paths and versions for use in URLs.
//!
//! Upper-case letters are written as `!` followed by the lower-case letter so
//! paths stay distinct on case-insensitive file systems and servers.

use crate::SumdbError;

fn escape(kind: &str, s: &str) -> Result<String, SumdbError> {
    if s.is_empty() {
        return Err(SumdbError::InvalidPath(format!("empty {kind}")));
    }
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '!' || !c.is_ascii() || c.is_ascii_whitespace() || c.is_ascii_control() {
            return Err(SumdbError::InvalidPath(format!(
                "invalid char {c:?} in {kind} {s:?}"
            )));
        }
        if c.is_ascii_uppercase() {
            out.push('!');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

fn unescape(kind: &str, s: &str) -> Result<String, SumdbError> {
    let bad = || SumdbError::InvalidPath(format!("invalid escaped {kind} {s:?}"));
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '!' => match chars.next() {
                Some(l) if l.is_ascii_lowercase() => out.push(l.to_ascii_uppercase()),
                _ => return Err(bad()),
            },
            c if c.is_ascii_uppercase() => return Err(bad()),
            c => out.push(c),
        }
    }
    if out.is_empty() {
        return Err(bad());
    }
    Ok(out)
}

/// Escape a module path.
pub fn escape_path(path: &str) -> Result<String, SumdbError> {
    escape("module path", path)
}

/// Escape a module version. Versions never contain `/`.
pub fn escape_version(version: &str) -> Result<String, SumdbError> {
    if version.contains('/') {
        return Err(SumdbError::InvalidPath(format!(
            "invalid char '/' in version {version:?}"
        )));
    }
    escape("version", version)
}

pub fn unescape_path(escaped: &str) -> Result<String, SumdbError> {
    unescape("module path", escaped)
}

pub fn unescape_version(escaped: &str) -> Result<String, SumdbError> {
    unescape("version", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_upper_case() {
        assert_eq!(
            escape_path("github.com/Azure/azure-sdk-for-go").unwrap(),
            "github.com/!azure/azure-sdk-for-go"
        );
        assert_eq!(escape_path("golang.org/x/mod").unwrap(), "golang.org/x/mod");
        assert_eq!(escape_version("v1.0.0-RC1").unwrap(), "v1.0.0-!r!c1");
    }

    #[test]
    fn rejects_bang_and_spaces() {
        assert!(escape_path("example.com/a!b").is_err());
        assert!(escape_path("example.com/a b").is_err());
        assert!(escape_path("").is_err());
        assert!(escape_version("v1.0.0/go.mod").is_err());
    }

    #[test]
    fn unescape_reverses_escape() {
        let path = "github.com/BurntSushi/TOML";
        assert_eq!(unescape_path(&escape_path(path).unwrap()).unwrap(), path);
    }

    #[test]
    fn unescape_rejects_bad_input() {
        assert!(unescape_path("github.com/Azure").is_err());
        assert!(unescape_path("github.com/!").is_err());
        assert!(unescape_path("github.com/!1").is_err());
    }
}
