use std::fmt;
use std::sync::Arc;

use crate::params::RiveFileParams;

/// The key under which a Rive file is cached.
///
/// Keys have the form `src:<url>` for files loaded by URL or path, and `buffer:<id>` for
/// in-memory files, where `<id>` is the [`RiveBuffer`](crate::RiveBuffer) identity tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(Arc<str>);

impl CacheKey {
    pub fn from_params(params: &RiveFileParams) -> Self {
        let key = match params {
            RiveFileParams::Src(src) => format!("src:{src}"),
            RiveFileParams::Buffer(buffer) => format!("buffer:{}", buffer.id()),
        };
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&RiveFileParams> for CacheKey {
    fn from(params: &RiveFileParams) -> Self {
        Self::from_params(params)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::RiveBuffer;

    #[test]
    fn test_src_key() {
        let key = CacheKey::from_params(&RiveFileParams::src("https://cdn.example.com/a.riv"));
        assert_eq!(key.as_str(), "src:https://cdn.example.com/a.riv");
        assert_eq!(
            key,
            CacheKey::from_params(&"https://cdn.example.com/a.riv".into())
        );
    }

    #[test]
    fn test_buffer_key() {
        let buffer = RiveBuffer::new(vec![0u8; 16]);
        let key = CacheKey::from_params(&buffer.clone().into());
        assert_eq!(key.to_string(), format!("buffer:{}", buffer.id()));

        // Same content, different object.
        let other = RiveBuffer::new(vec![0u8; 16]);
        assert_ne!(key, CacheKey::from_params(&other.into()));
        assert_eq!(key, CacheKey::from_params(&buffer.into()));
    }

    #[test]
    fn test_src_and_buffer_never_collide() {
        let buffer = RiveBuffer::new(Vec::new());
        let src = RiveFileParams::src(buffer.id().to_string());
        assert_ne!(
            CacheKey::from_params(&src),
            CacheKey::from_params(&buffer.into())
        );
    }
}
