//! Emergency and voicemail number recognition

use crate::CacheConfig;
use crate::number;
use std::collections::HashSet;

/// Recognizes numbers that never go to a provider
pub trait NumberClassifier: Send + Sync {
    fn is_emergency(&self, number: &str, country_iso: &str) -> bool;

    fn is_voicemail(&self, number: &str) -> bool;
}

/// Classifier backed by the number lists of [`CacheConfig`]
///
/// Numbers are compared with separators stripped, so `9-1-1` is still an
/// emergency number.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredClassifier {
    emergency: HashSet<String>,
    voicemail: HashSet<String>,
}

impl ConfiguredClassifier {
    pub fn new<E, V>(emergency: E, voicemail: V) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        V: IntoIterator,
        V::Item: AsRef<str>,
    {
        let normalize = |s: &str| number::strip_separators(s);
        Self {
            emergency: emergency.into_iter().map(|s| normalize(s.as_ref())).collect(),
            voicemail: voicemail.into_iter().map(|s| normalize(s.as_ref())).collect(),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(&config.emergency_numbers, &config.voicemail_numbers)
    }
}

impl NumberClassifier for ConfiguredClassifier {
    fn is_emergency(&self, number: &str, _country_iso: &str) -> bool {
        !number::is_uri_number(number)
            && self.emergency.contains(&number::strip_separators(number))
    }

    fn is_voicemail(&self, number: &str) -> bool {
        !number::is_uri_number(number)
            && self.voicemail.contains(&number::strip_separators(number))
    }
}
