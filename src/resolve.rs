//! Team-identity resolution seam.
//!
//! Rating sources and game feeds rarely agree on team spelling. Statistical
//! code never does string cleanup itself; it routes every name through a
//! [`TeamResolver`] so matching policy stays swappable and out of the math.

use std::collections::HashMap;

/// Maps a raw team name from any upstream source to its canonical form.
pub trait TeamResolver {
    fn resolve(&self, raw: &str) -> String;
}

/// Trims whitespace and nothing else. The default when the caller's sources
/// already share a naming convention.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver;

impl TeamResolver for IdentityResolver {
    fn resolve(&self, raw: &str) -> String {
        raw.trim().to_string()
    }
}

/// Alias-table resolver. Unknown names pass through trimmed, so a missing
/// alias degrades to identity rather than dropping the team.
#[derive(Debug, Clone, Default)]
pub struct AliasResolver {
    aliases: HashMap<String, String>,
}

impl AliasResolver {
    pub fn new(aliases: HashMap<String, String>) -> Self {
        Self { aliases }
    }

    pub fn insert(&mut self, raw: impl Into<String>, canonical: impl Into<String>) {
        self.aliases.insert(raw.into(), canonical.into());
    }
}

impl TeamResolver for AliasResolver {
    fn resolve(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        self.aliases
            .get(trimmed)
            .cloned()
            .unwrap_or_else(|| trimmed.to_string())
    }
}
