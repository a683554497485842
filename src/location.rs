use crate::{Error, Result};

/// Parsed document URL. Only the authority form matters here; the
/// page lives on an origin and navigation targets are same-origin
/// absolute paths (`/history`) or full URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationParts {
    scheme: String,
    hostname: String,
    port: String,
    pathname: String,
    search: String,
    hash: String,
}

impl LocationParts {
    pub fn protocol(&self) -> String {
        format!("{}:", self.scheme)
    }

    pub fn host(&self) -> String {
        if self.port.is_empty() {
            self.hostname.clone()
        } else {
            format!("{}:{}", self.hostname, self.port)
        }
    }

    pub fn origin(&self) -> String {
        format!("{}//{}", self.protocol(), self.host())
    }

    pub fn pathname(&self) -> &str {
        &self.pathname
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn href(&self) -> String {
        let path = if self.pathname.is_empty() {
            "/".to_string()
        } else {
            self.pathname.clone()
        };
        format!("{}{}{}{}", self.origin(), path, self.search, self.hash)
    }

    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let scheme_end = trimmed
            .find(':')
            .ok_or_else(|| Error::Dom(format!("invalid document url: {input}")))?;
        let scheme = trimmed[..scheme_end].to_ascii_lowercase();
        if !is_valid_url_scheme(&scheme) {
            return Err(Error::Dom(format!("invalid document url: {input}")));
        }
        let rest = trimmed[scheme_end + 1..]
            .strip_prefix("//")
            .ok_or_else(|| Error::Dom(format!("invalid document url: {input}")))?;

        let authority_end = rest
            .find(|ch| ['/', '?', '#'].contains(&ch))
            .unwrap_or(rest.len());
        let authority = &rest[..authority_end];
        let tail = &rest[authority_end..];
        let (hostname, port) = split_hostname_and_port(authority);
        if hostname.is_empty() {
            return Err(Error::Dom(format!("invalid document url: {input}")));
        }
        let (pathname, search, hash) = split_path_search_hash(tail);
        let pathname = if pathname.is_empty() {
            "/".to_string()
        } else {
            normalize_pathname(&pathname)
        };
        Ok(Self {
            scheme,
            hostname,
            port,
            pathname,
            search,
            hash,
        })
    }

    /// Resolves a navigation target against this location: full URLs
    /// replace it, absolute paths keep the origin, relative paths are
    /// joined to the current directory.
    pub fn resolve(&self, target: &str) -> Result<Self> {
        let target = target.trim();
        if target.contains("://") {
            return Self::parse(target);
        }

        let (raw_path, search, hash) = split_path_search_hash(target);
        let pathname = if raw_path.starts_with('/') {
            normalize_pathname(&raw_path)
        } else if raw_path.is_empty() {
            self.pathname.clone()
        } else {
            let base = match self.pathname.rfind('/') {
                Some(idx) => &self.pathname[..=idx],
                None => "/",
            };
            normalize_pathname(&format!("{base}{raw_path}"))
        };

        Ok(Self {
            scheme: self.scheme.clone(),
            hostname: self.hostname.clone(),
            port: self.port.clone(),
            pathname,
            search,
            hash,
        })
    }
}

fn is_valid_url_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_alphabetic() {
        return false;
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.'))
}

fn split_hostname_and_port(authority: &str) -> (String, String) {
    if authority.is_empty() {
        return (String::new(), String::new());
    }

    if let Some(idx) = authority.rfind(':') {
        let hostname = &authority[..idx];
        let port = &authority[idx + 1..];
        if !hostname.contains(':') {
            return (hostname.to_string(), port.to_string());
        }
    }
    (authority.to_string(), String::new())
}

fn split_path_search_hash(tail: &str) -> (String, String, String) {
    let mut pathname = tail;
    let mut search = "";
    let mut hash = "";

    if let Some(hash_pos) = tail.find('#') {
        pathname = &tail[..hash_pos];
        hash = &tail[hash_pos..];
    }

    if let Some(search_pos) = pathname.find('?') {
        search = &pathname[search_pos..];
        pathname = &pathname[..search_pos];
    }

    (pathname.to_string(), search.to_string(), hash.to_string())
}

fn normalize_pathname(pathname: &str) -> String {
    let starts_with_slash = pathname.starts_with('/');
    let ends_with_slash = pathname.ends_with('/') && pathname.len() > 1;
    let mut parts = Vec::new();
    for segment in pathname.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." {
            parts.pop();
            continue;
        }
        parts.push(segment);
    }
    let mut out = if starts_with_slash {
        format!("/{}", parts.join("/"))
    } else {
        parts.join("/")
    };
    if out.is_empty() {
        out.push('/');
    }
    if ends_with_slash && !out.ends_with('/') {
        out.push('/');
    }
    out
}
