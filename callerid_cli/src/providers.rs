//! File-backed identity providers
//!
//! The harness reads every provider from one TOML contact book:
//!
//! ```toml
//! [[contacts]]
//! number = "+1 415 555 1212"
//! name = "Alice"
//! label = "Mobile"
//! photo_uri = "file:///home/me/alice.png"
//!
//! [[directories]]
//! id = 1
//! name = "Corp"
//! [[directories.contacts]]
//! number = "4155550100"
//! name = "Front desk"
//!
//! [[network]]
//! number = "8005550199"
//! name = "ACME Corp"
//! is_business = true
//!
//! [geocode]
//! "1415" = "San Francisco, CA"
//! ```

use async_trait::async_trait;
use callerid_core::number::{same_number, strip_separators};
use callerid_core::{
    ContactMatch, DirectoryHandle, DirectoryIdentityProvider, DirectoryList, GeocodeService,
    LocalIdentityProvider, NetworkNumberLookupService,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContactBookError {
    #[error("Failed to read contact book {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse contact book {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Directory id {id} is listed more than once")]
    DuplicateDirectory { id: u64 },
}

/// One number and the identity behind it
#[derive(Debug, Clone, Deserialize)]
pub struct BookEntry {
    pub number: String,
    #[serde(flatten)]
    pub contact: ContactMatch,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookDirectory {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub contacts: Vec<BookEntry>,
}

/// Contacts, directories, network answers and region prefixes in one file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactBook {
    pub contacts: Vec<BookEntry>,
    pub directories: Vec<BookDirectory>,
    pub network: Vec<BookEntry>,
    pub geocode: BTreeMap<String, String>,
}

impl ContactBook {
    /// Read and parse a contact book from disk
    pub fn load(path: &Path) -> Result<Self, ContactBookError> {
        let content = std::fs::read_to_string(path).map_err(|source| ContactBookError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|err| match err {
            ContactBookError::Parse { source, .. } => ContactBookError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self, ContactBookError> {
        let book: Self = toml::from_str(content).map_err(|source| ContactBookError::Parse {
            path: PathBuf::new(),
            source,
        })?;

        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = book.directories.iter().find(|d| !seen.insert(d.id)) {
            return Err(ContactBookError::DuplicateDirectory { id: dup.id });
        }
        Ok(book)
    }

    fn find(entries: &[BookEntry], number: &str) -> Option<ContactMatch> {
        entries
            .iter()
            .find(|entry| same_number(&entry.number, number))
            .map(|entry| {
                let mut contact = entry.contact.clone();
                contact.number.get_or_insert_with(|| entry.number.clone());
                contact
            })
    }
}

#[async_trait]
impl LocalIdentityProvider for ContactBook {
    async fn lookup(
        &self,
        number: &str,
        _country_iso: &str,
    ) -> callerid_core::Result<Option<ContactMatch>> {
        Ok(Self::find(&self.contacts, number))
    }
}

#[async_trait]
impl DirectoryList for ContactBook {
    async fn enumerate(&self) -> callerid_core::Result<Vec<DirectoryHandle>> {
        Ok(self
            .directories
            .iter()
            .map(|d| DirectoryHandle::new(d.id, d.name.clone()))
            .collect())
    }
}

#[async_trait]
impl DirectoryIdentityProvider for ContactBook {
    async fn lookup(
        &self,
        number: &str,
        directory: &DirectoryHandle,
    ) -> callerid_core::Result<Option<ContactMatch>> {
        Ok(self
            .directories
            .iter()
            .find(|d| d.id == directory.id)
            .and_then(|d| Self::find(&d.contacts, number)))
    }
}

#[async_trait]
impl NetworkNumberLookupService for ContactBook {
    async fn lookup(&self, number: &str) -> callerid_core::Result<Option<ContactMatch>> {
        Ok(Self::find(&self.network, number))
    }
}

impl GeocodeService for ContactBook {
    /// Longest matching prefix of the digits, ignoring a leading `+`
    fn describe(&self, number: &str, _country_iso: &str) -> Option<String> {
        let digits = strip_separators(number);
        let digits = digits.trim_start_matches('+');
        self.geocode
            .iter()
            .filter(|(prefix, _)| digits.starts_with(prefix.trim_start_matches('+')))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, region)| region.clone())
    }
}
