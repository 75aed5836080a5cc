//! The query dispatcher: one end-to-end resolution attempt per token

use crate::CacheConfig;
use crate::cache::LookupSource;
use crate::dispatch::entries::{
    emergency_entry, entry_from_match, network_overlay, not_found_entry, presentation_entry,
    unknown_entry, voicemail_entry,
};
use crate::dispatch::fanout::first_match;
use crate::dispatch::stage::{DispatchState, StageEmitter, StageUpdate};
use crate::dispatch::Dispatcher;
use crate::identity::{
    ConfiguredClassifier, ContactMatch, DirectoryIdentityProvider, DirectoryList,
    GeocodeService, LocalIdentityProvider, NetworkNumberLookupService, NoDirectories,
    NumberClassifier, PhotoFetcher,
};
use crate::number;
use crate::photo::PhotoLoader;
use crate::query::{PreparedNumber, Presentation, RawQuery};
use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;

/// Runs the lookup pipeline for one query
///
/// Stages, in order: presentation and malformed-number shortcuts, emergency
/// and voicemail shortcuts, local lookup, directory fan-out, geocoding,
/// network enrichment, photo fetch. Every path ends with exactly one final
/// stage. Provider errors count as "no match".
pub struct QueryDispatcher {
    local: Arc<dyn LocalIdentityProvider>,
    directory_list: Arc<dyn DirectoryList>,
    directories: Arc<dyn DirectoryIdentityProvider>,
    network: Option<Arc<dyn NetworkNumberLookupService>>,
    photos: Option<PhotoLoader>,
    geocoder: Option<Arc<dyn GeocodeService>>,
    classifier: Arc<dyn NumberClassifier>,
    config: CacheConfig,
}

/// Builder for [`QueryDispatcher`]
pub struct DispatcherBuilder {
    local: Arc<dyn LocalIdentityProvider>,
    directory_list: Arc<dyn DirectoryList>,
    directories: Arc<dyn DirectoryIdentityProvider>,
    network: Option<Arc<dyn NetworkNumberLookupService>>,
    photos: Option<Arc<dyn PhotoFetcher>>,
    geocoder: Option<Arc<dyn GeocodeService>>,
    classifier: Option<Arc<dyn NumberClassifier>>,
    config: CacheConfig,
}

impl DispatcherBuilder {
    /// Secondary directories: the list to enumerate and the provider to query
    pub fn directories(
        mut self,
        list: Arc<dyn DirectoryList>,
        provider: Arc<dyn DirectoryIdentityProvider>,
    ) -> Self {
        self.directory_list = list;
        self.directories = provider;
        self
    }

    pub fn network(mut self, service: Arc<dyn NetworkNumberLookupService>) -> Self {
        self.network = Some(service);
        self
    }

    pub fn photos(mut self, fetcher: Arc<dyn PhotoFetcher>) -> Self {
        self.photos = Some(fetcher);
        self
    }

    pub fn geocoder(mut self, geocoder: Arc<dyn GeocodeService>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    /// Override the emergency/voicemail classifier built from the config
    pub fn classifier(mut self, classifier: Arc<dyn NumberClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn config(mut self, config: &CacheConfig) -> Self {
        self.config = config.clone();
        self
    }

    pub fn build(self) -> QueryDispatcher {
        let classifier = self
            .classifier
            .unwrap_or_else(|| Arc::new(ConfiguredClassifier::from_config(&self.config)));
        QueryDispatcher {
            local: self.local,
            directory_list: self.directory_list,
            directories: self.directories,
            network: self.network,
            photos: self.photos.map(PhotoLoader::new),
            geocoder: self.geocoder,
            classifier,
            config: self.config,
        }
    }
}

impl QueryDispatcher {
    /// Start building a dispatcher around the local directory
    pub fn builder(local: Arc<dyn LocalIdentityProvider>) -> DispatcherBuilder {
        DispatcherBuilder {
            local,
            directory_list: Arc::new(NoDirectories),
            directories: Arc::new(NoDirectories),
            network: None,
            photos: None,
            geocoder: None,
            classifier: None,
            config: CacheConfig::default(),
        }
    }

    async fn lookup_local(
        &self,
        prepared: &PreparedNumber,
        country_iso: &str,
    ) -> Option<ContactMatch> {
        if let Some(found) = self.local_once(&prepared.lookup, country_iso).await {
            return Some(found);
        }
        // A SIP address whose user part is a phone number gets one more try
        let username = prepared.numeric_username()?;
        debug!(
            "Retrying SIP lookup with user part {}",
            number::log_safe(username)
        );
        self.local_once(username, country_iso).await
    }

    async fn local_once(&self, lookup: &str, country_iso: &str) -> Option<ContactMatch> {
        match self.local.lookup(lookup, country_iso).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Local lookup failed: {e}");
                None
            }
        }
    }

    async fn lookup_directories(&self, lookup: &str) -> Option<(u64, ContactMatch)> {
        let directories = match self.directory_list.enumerate().await {
            Ok(directories) => directories,
            Err(e) => {
                warn!("Could not enumerate directories: {e}");
                return None;
            }
        };
        debug!("Fanning out to {} directories", directories.len());
        first_match(Arc::clone(&self.directories), directories, lookup)
            .await
            .map(|(directory, found)| (directory.id, found))
    }

    async fn lookup_network(&self, lookup: &str) -> Option<ContactMatch> {
        let network = self.network.as_ref()?;
        match network.lookup(lookup).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Network lookup failed: {e}");
                None
            }
        }
    }

    fn geocode(&self, prepared: &PreparedNumber, country_iso: &str) -> Option<String> {
        if !self.config.geocode_unknown_numbers || prepared.is_sip {
            return None;
        }
        self.geocoder
            .as_ref()?
            .describe(&prepared.lookup, country_iso)
            .filter(|description| !description.trim().is_empty())
    }

    /// Classify the number; returns a terminal entry when no lookup is needed
    fn shortcut(&self, query: &RawQuery) -> Result<PreparedNumber, StageUpdate> {
        let labels = &self.config.labels;
        let presentation = query.effective_presentation();
        if presentation != Presentation::Allowed {
            return Err(StageUpdate::Replace(presentation_entry(
                query,
                presentation,
                labels,
            )));
        }

        let prepared = PreparedNumber::parse(&query.phone_number).map_err(|e| {
            debug!("Not looking up {}: {e}", query.key);
            StageUpdate::Replace(unknown_entry(query, labels))
        })?;

        if !prepared.is_sip {
            if self
                .classifier
                .is_emergency(&prepared.lookup, &query.country_iso)
            {
                return Err(StageUpdate::Replace(emergency_entry(query, &prepared, labels)));
            }
            if self.classifier.is_voicemail(&prepared.lookup) {
                return Err(StageUpdate::Replace(voicemail_entry(query, &prepared, labels)));
            }
        }
        Ok(prepared)
    }
}

#[async_trait]
impl Dispatcher for QueryDispatcher {
    async fn dispatch(&self, query: RawQuery, mut emitter: StageEmitter) {
        let prepared = match self.shortcut(&query) {
            Ok(prepared) => prepared,
            Err(terminal) => {
                emitter.emit(terminal, true);
                return;
            }
        };

        emitter.advance(DispatchState::LocalLookup);
        let mut entry = match self.lookup_local(&prepared, &query.country_iso).await {
            Some(found) => entry_from_match(&query, &prepared, found, LookupSource::Local),
            None => {
                emitter.advance(DispatchState::DirectoryFanout);
                match self.lookup_directories(&prepared.lookup).await {
                    Some((id, found)) => {
                        entry_from_match(&query, &prepared, found, LookupSource::Directory { id })
                    }
                    None => not_found_entry(&query),
                }
            }
        };

        if !entry.has_name() && entry.location.is_none() {
            entry.location = self.geocode(&prepared, &query.country_iso);
        }

        let mut photo_uri = entry.photo_uri.clone();
        let matched = entry.lookup_source != LookupSource::NotFound;
        emitter.emit(StageUpdate::Replace(entry), false);

        if !matched && self.network.is_some() {
            emitter.advance(DispatchState::NetworkEnrichment);
            if let Some(found) = self.lookup_network(&prepared.lookup).await {
                let overlay = network_overlay(found);
                photo_uri = overlay.photo_uri.clone().or(photo_uri);
                let has_photo = photo_uri.is_some() && self.photos.is_some();
                emitter.emit(StageUpdate::Overlay(overlay), !has_photo);
                if !has_photo {
                    return;
                }
            }
        }

        match (photo_uri, &self.photos) {
            (Some(uri), Some(loader)) => {
                emitter.advance(DispatchState::PhotoFetch);
                match loader.load(&uri).await {
                    Some(bytes) => {
                        emitter.emit(StageUpdate::Photo(bytes), true);
                    }
                    None => {
                        emitter.finish();
                    }
                }
            }
            _ => {
                emitter.finish();
            }
        }
    }
}
