//! Build-time configuration.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Total pattern length up to which [`Backing::Auto`] picks dense tables.
///
/// A dense state costs 1KiB, so this caps an automatic dense build at
/// roughly 4MiB of transitions.
pub const DENSE_AUTO_LIMIT: usize = 4096;

/// How each state stores its outgoing transitions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backing {
    /// Dense for small pattern sets, sparse otherwise.
    #[default]
    Auto,
    /// One slot per byte value.
    Dense,
    /// Sorted list of the transitions that exist.
    Sparse,
}

impl Backing {
    /// Resolve `Auto` against the total byte length of the patterns.
    pub(crate) fn resolve(self, total_pattern_len: usize) -> Backing {
        match self {
            Backing::Auto if total_pattern_len <= DENSE_AUTO_LIMIT => Backing::Dense,
            Backing::Auto => Backing::Sparse,
            other => other,
        }
    }
}

/// Options fixed when the automaton is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// When false, ASCII letters are folded to lowercase in both patterns
    /// and text. Other bytes are compared as-is.
    pub case_sensitive: bool,
    pub backing: Backing,
}

impl Default for Config {
    fn default() -> Self {
        Self { case_sensitive: true, backing: Backing::Auto }
    }
}

impl Config {
    /// Parse a config from TOML text. Missing keys take their defaults.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// The byte map applied to every pattern byte and every text byte.
    pub(crate) fn byte_map(&self) -> [u8; 256] {
        let mut map = [0u8; 256];
        for (byte, slot) in (0..=u8::MAX).zip(map.iter_mut()) {
            *slot = if self.case_sensitive { byte } else { byte.to_ascii_lowercase() };
        }
        map
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(config.case_sensitive);
        assert_eq!(config.backing, Backing::Auto);
        assert_eq!(Config::from_toml("").unwrap(), config);
    }

    #[test]
    fn from_toml_reads_kebab_case_keys() {
        let config = Config::from_toml("case-sensitive = false\nbacking = \"sparse\"\n").unwrap();
        assert!(!config.case_sensitive);
        assert_eq!(config.backing, Backing::Sparse);
    }

    #[test]
    fn from_toml_rejects_unknown_keys() {
        assert!(Config::from_toml("case_sensitive = false").is_err());
        assert!(Config::from_toml("backing = \"trie\"").is_err());
    }

    #[test]
    fn auto_resolves_by_size() {
        assert_eq!(Backing::Auto.resolve(0), Backing::Dense);
        assert_eq!(Backing::Auto.resolve(DENSE_AUTO_LIMIT), Backing::Dense);
        assert_eq!(Backing::Auto.resolve(DENSE_AUTO_LIMIT + 1), Backing::Sparse);
        assert_eq!(Backing::Dense.resolve(usize::MAX), Backing::Dense);
        assert_eq!(Backing::Sparse.resolve(0), Backing::Sparse);
    }

    #[test]
    fn byte_map_folds_ascii_only() {
        let folded = Config { case_sensitive: false, ..Config::default() }.byte_map();
        assert_eq!(folded[b'A' as usize], b'a');
        assert_eq!(folded[b'z' as usize], b'z');
        assert_eq!(folded[b'@' as usize], b'@');
        assert_eq!(folded[0xC3], 0xC3);

        let exact = Config::default().byte_map();
        assert_eq!(exact[b'A' as usize], b'A');
    }

    #[test]
    fn backing_names_agree_between_cli_and_toml() {
        for backing in Backing::value_variants() {
            let name = backing.to_possible_value().unwrap().get_name().to_owned();
            assert_eq!(Backing::from_str(&name, false), Ok(*backing));
            let config = Config::from_toml(&format!("backing = \"{name}\"")).unwrap();
            assert_eq!(config.backing, *backing);
        }
        assert!(Backing::from_str("DENSE", false).is_err());
        assert_eq!(Backing::from_str("DENSE", true), Ok(Backing::Dense));
    }
}
