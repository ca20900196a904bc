/// Normalizes object path components for the network.
///
/// Different processes may decorate the names of the same logical object with
/// session-local prefixes. Every path is passed through the remapper before it
/// is stored or looked up, so the same logical path always produces the same
/// `GlobalRef`.
pub trait PathRemapper: Send + Sync {
    fn remap(&self, path: &str) -> String;
}

/// Strips any of a configured set of session prefixes from the start of each
/// `/`-separated segment of a path.
#[derive(Clone, Debug, Default)]
pub struct SessionPrefixRemapper {
    prefixes: Vec<String>,
}

impl SessionPrefixRemapper {
    pub fn new(prefixes: Vec<String>) -> Self {
        Self { prefixes }
    }
}

impl PathRemapper for SessionPrefixRemapper {
    fn remap(&self, path: &str) -> String {
        if self.prefixes.is_empty() {
            return path.to_string();
        }
        path.split('/')
            .map(|segment| {
                for prefix in &self.prefixes {
                    if let Some(stripped) = segment.strip_prefix(prefix.as_str()) {
                        return stripped;
                    }
                }
                segment
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}
