//! End-to-end tests for the query dispatcher behind a contact cache
//!
//! Providers are mocks with configurable answers and delays; timing-sensitive
//! tests run on tokio's paused clock.

use callerid_core::dispatch::QueryDispatcher;
use callerid_core::{
    CacheConfig, CacheKey, ChannelCallback, ContactCache, ContactEvent, LookupSource, PhotoKind,
    Presentation, RawQuery, ResolvedEntry,
};
use callerid_test_utils::{
    MockDirectories, MockDirectory, MockGeocoder, MockLocalProvider, MockNetworkService,
    MockPhotoFetcher, RecordingCallback, TestMatchBuilder,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const KEY: &str = "call-1";
const NUMBER: &str = "4155551212";

fn cache_for(dispatcher: QueryDispatcher) -> ContactCache {
    ContactCache::new(Arc::new(dispatcher), &CacheConfig::test()).unwrap()
}

async fn resolve_and_wait(cache: &ContactCache, query: RawQuery) -> Arc<RecordingCallback> {
    let callback = RecordingCallback::new();
    cache.resolve(query, callback.clone());
    cache.wait_idle().await;
    callback
}

fn stored(cache: &ContactCache) -> ResolvedEntry {
    cache.get(&CacheKey::from(KEY)).unwrap()
}

#[cfg(test)]
mod lookup_tests {
    use super::*;

    #[tokio::test]
    async fn test_local_match_is_emitted_and_completed() {
        let local = MockLocalProvider::new().with_contact(
            NUMBER,
            TestMatchBuilder::new("Alice")
                .location("San Francisco, CA")
                .lookup_key("lookup/1")
                .build(),
        );
        let network = MockNetworkService::new();
        let directories = MockDirectories::new();
        let dispatcher = QueryDispatcher::builder(Arc::new(local.clone()))
            .directories(Arc::new(directories.clone()), Arc::new(directories.clone()))
            .network(Arc::new(network.clone()))
            .config(&CacheConfig::test())
            .build();
        let cache = cache_for(dispatcher);

        let callback = resolve_and_wait(&cache, RawQuery::new(KEY, "(415) 555-1212")).await;

        let entry = stored(&cache);
        assert_eq!(entry.display_name.as_deref(), Some("Alice"));
        assert_eq!(entry.display_number.as_deref(), Some("(415) 555-1212"));
        assert_eq!(entry.label.as_deref(), Some("Mobile"));
        assert_eq!(entry.lookup_key.as_deref(), Some("lookup/1"));
        assert!(entry.is_local_match);
        assert!(!entry.has_pending_enrichment);
        assert_eq!(local.calls(), vec![NUMBER.to_string()]);
        assert_eq!(directories.enumeration_count(), 0);
        assert_eq!(network.call_count(), 0);
        assert_eq!(callback.info_count(), 1);
    }

    #[tokio::test]
    async fn test_forwarding_number_is_split_off() {
        let local = MockLocalProvider::new()
            .with_contact("14155551212", TestMatchBuilder::new("Alice").build());
        let cache = cache_for(QueryDispatcher::builder(Arc::new(local.clone())).build());

        resolve_and_wait(&cache, RawQuery::new(KEY, "14155551212&14155550000")).await;

        assert_eq!(local.calls(), vec!["14155551212".to_string()]);
        let entry = stored(&cache);
        assert_eq!(entry.forwarding_number.as_deref(), Some("14155550000"));
        assert_eq!(entry.display_name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn test_sip_address_retries_with_numeric_user() {
        let local = MockLocalProvider::new()
            .with_contact(NUMBER, TestMatchBuilder::new("Alice").build());
        let cache = cache_for(QueryDispatcher::builder(Arc::new(local.clone())).build());

        resolve_and_wait(&cache, RawQuery::new(KEY, "sip:4155551212@carrier.example")).await;

        assert_eq!(
            local.calls(),
            vec![
                "sip:4155551212@carrier.example".to_string(),
                NUMBER.to_string()
            ]
        );
        let entry = stored(&cache);
        assert!(entry.is_sip);
        assert_eq!(entry.display_name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn test_sip_address_with_name_is_looked_up_once() {
        let local = MockLocalProvider::new();
        let cache = cache_for(QueryDispatcher::builder(Arc::new(local.clone())).build());

        resolve_and_wait(&cache, RawQuery::new(KEY, "sip:alice@example.com")).await;

        assert_eq!(local.call_count(), 1);
        let entry = stored(&cache);
        assert_eq!(entry.display_number.as_deref(), Some("alice@example.com"));
        assert_eq!(entry.lookup_source, LookupSource::NotFound);
    }

    #[tokio::test]
    async fn test_provider_failure_yields_number_only_entry() {
        let local = MockLocalProvider::new();
        local.fail_with("database locked");
        let directories = MockDirectories::new()
            .with_directory(MockDirectory::new(1, "Corp").failing("offline"));
        let dispatcher = QueryDispatcher::builder(Arc::new(local))
            .directories(Arc::new(directories.clone()), Arc::new(directories))
            .build();
        let cache = cache_for(dispatcher);

        let callback = resolve_and_wait(&cache, RawQuery::new(KEY, NUMBER)).await;

        let entry = stored(&cache);
        assert_eq!(entry.display_number.as_deref(), Some(NUMBER));
        assert!(entry.display_name.is_none());
        assert!(!entry.is_local_match);
        assert_eq!(entry.lookup_source, LookupSource::NotFound);
        assert_eq!(callback.info_count(), 1);
    }

    #[tokio::test]
    async fn test_panicking_provider_still_completes_dispatch() {
        let local = MockLocalProvider::new();
        local.panic_on_lookup();
        let cache = cache_for(QueryDispatcher::builder(Arc::new(local)).build());

        let callback = resolve_and_wait(
            &cache,
            RawQuery::new(KEY, NUMBER).with_cnap_name("ACME CORP"),
        )
        .await;

        let entry = stored(&cache);
        assert_eq!(entry.display_name.as_deref(), Some("ACME CORP"));
        assert_eq!(entry.display_number.as_deref(), Some(NUMBER));
        assert_eq!(callback.info_count(), 1);
        assert_eq!(cache.stats().in_flight, 0);
    }

    #[tokio::test]
    async fn test_malformed_number_skips_providers() {
        let local = MockLocalProvider::new();
        let cache = cache_for(QueryDispatcher::builder(Arc::new(local.clone())).build());

        resolve_and_wait(&cache, RawQuery::new(KEY, "  ")).await;

        assert_eq!(local.call_count(), 0);
        let entry = stored(&cache);
        assert_eq!(entry.display_name.as_deref(), Some("Unknown"));
        assert!(entry.display_number.is_none());
    }
}

#[cfg(test)]
mod shortcut_tests {
    use super::*;

    fn counted() -> (MockLocalProvider, MockDirectories, ContactCache) {
        let local = MockLocalProvider::new();
        let directories = MockDirectories::new()
            .with_directory(MockDirectory::new(1, "Corp"));
        let dispatcher = QueryDispatcher::builder(Arc::new(local.clone()))
            .directories(Arc::new(directories.clone()), Arc::new(directories.clone()))
            .config(&CacheConfig::test())
            .build();
        (local, directories, cache_for(dispatcher))
    }

    #[tokio::test]
    async fn test_emergency_number_never_queries_providers() {
        let (local, directories, cache) = counted();

        let callback = resolve_and_wait(&cache, RawQuery::new(KEY, "911")).await;

        let entry = stored(&cache);
        assert!(entry.is_emergency_number);
        assert_eq!(entry.display_name.as_deref(), Some("Emergency number"));
        assert_eq!(entry.lookup_source, LookupSource::Emergency);
        assert_eq!(local.call_count(), 0);
        assert_eq!(directories.enumeration_count(), 0);
        assert_eq!(callback.info_count(), 1);
    }

    #[tokio::test]
    async fn test_voicemail_number_never_queries_providers() {
        let (local, directories, cache) = counted();

        resolve_and_wait(&cache, RawQuery::new(KEY, "*86")).await;

        let entry = stored(&cache);
        assert!(entry.is_voicemail_number);
        assert_eq!(entry.display_name.as_deref(), Some("Voicemail"));
        assert_eq!(local.call_count(), 0);
        assert_eq!(directories.enumeration_count(), 0);
    }

    #[tokio::test]
    async fn test_restricted_presentation_uses_private_label() {
        let (local, _, cache) = counted();

        resolve_and_wait(
            &cache,
            RawQuery::new(KEY, NUMBER).with_presentation(Presentation::Restricted),
        )
        .await;

        let entry = stored(&cache);
        assert_eq!(entry.display_name.as_deref(), Some("Private number"));
        assert_eq!(entry.lookup_source, LookupSource::Presentation);
        assert_eq!(local.call_count(), 0);
    }

    #[tokio::test]
    async fn test_special_cnap_number_string_is_a_presentation() {
        let (local, _, cache) = counted();

        resolve_and_wait(&cache, RawQuery::new(KEY, "UNAVAILABLE")).await;

        assert_eq!(stored(&cache).display_name.as_deref(), Some("Unknown"));
        assert_eq!(local.call_count(), 0);
    }
}

#[cfg(test)]
mod fanout_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_directory_match_wins_without_waiting_for_others() {
        let directories = MockDirectories::new()
            .with_directory(MockDirectory::new(1, "Sales").with_delay(Duration::from_millis(50)))
            .with_directory(
                MockDirectory::new(2, "Engineering")
                    .with_contact(NUMBER, TestMatchBuilder::new("Grace").label("Work").build())
                    .with_delay(Duration::from_millis(10)),
            )
            .with_directory(MockDirectory::new(3, "Support").with_delay(Duration::from_millis(50)));
        let dispatcher = QueryDispatcher::builder(Arc::new(MockLocalProvider::new()))
            .directories(Arc::new(directories.clone()), Arc::new(directories.clone()))
            .build();
        let cache = cache_for(dispatcher);
        let (callback, mut rx) = ChannelCallback::channel();

        let start = Instant::now();
        cache.resolve(RawQuery::new(KEY, NUMBER), callback);

        let event = rx.recv().await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(10));
        assert!(elapsed < Duration::from_millis(50), "emitted after {elapsed:?}");

        let ContactEvent::Info { entry, .. } = event else {
            panic!("expected contact info, got {event:?}");
        };
        assert_eq!(entry.display_name.as_deref(), Some("Grace"));
        assert_eq!(entry.lookup_source, LookupSource::Directory { id: 2 });
        assert!(!entry.is_local_match);

        // The losing directories still ran to completion
        cache.wait_idle().await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(directories.total_calls(), 3);
        assert_eq!(
            stored(&cache).lookup_source,
            LookupSource::Directory { id: 2 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_directories_missing_emits_no_match() {
        let directories = MockDirectories::new()
            .with_directory(MockDirectory::new(1, "Sales").with_delay(Duration::from_millis(20)))
            .with_directory(MockDirectory::new(2, "Support").with_delay(Duration::from_millis(40)));
        let dispatcher = QueryDispatcher::builder(Arc::new(MockLocalProvider::new()))
            .directories(Arc::new(directories.clone()), Arc::new(directories))
            .build();
        let cache = cache_for(dispatcher);

        let start = Instant::now();
        let callback = resolve_and_wait(&cache, RawQuery::new(KEY, NUMBER)).await;

        assert!(start.elapsed() >= Duration::from_millis(40));
        assert_eq!(stored(&cache).lookup_source, LookupSource::NotFound);
        assert_eq!(callback.info_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_directories_complete_immediately() {
        let directories = MockDirectories::new();
        let dispatcher = QueryDispatcher::builder(Arc::new(MockLocalProvider::new()))
            .directories(Arc::new(directories.clone()), Arc::new(directories.clone()))
            .build();
        let cache = cache_for(dispatcher);

        let start = Instant::now();
        resolve_and_wait(&cache, RawQuery::new(KEY, NUMBER)).await;

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(directories.enumeration_count(), 1);
        assert_eq!(stored(&cache).lookup_source, LookupSource::NotFound);
    }

    #[tokio::test]
    async fn test_enumeration_failure_counts_as_no_match() {
        let directories = MockDirectories::new();
        directories.fail_enumeration("directory service down");
        let dispatcher = QueryDispatcher::builder(Arc::new(MockLocalProvider::new()))
            .directories(Arc::new(directories.clone()), Arc::new(directories))
            .build();
        let cache = cache_for(dispatcher);

        resolve_and_wait(&cache, RawQuery::new(KEY, NUMBER)).await;

        assert_eq!(stored(&cache).display_number.as_deref(), Some(NUMBER));
    }
}

#[cfg(test)]
mod enrichment_tests {
    use super::*;

    #[tokio::test]
    async fn test_network_overlay_preserves_geocoded_location() {
        let network = MockNetworkService::new()
            .with_result(NUMBER, TestMatchBuilder::business("Pizza Palace").build());
        let geocoder = Arc::new(MockGeocoder::new("San Francisco, CA"));
        let dispatcher = QueryDispatcher::builder(Arc::new(MockLocalProvider::new()))
            .network(Arc::new(network.clone()))
            .geocoder(geocoder.clone())
            .build();
        let cache = cache_for(dispatcher);

        let callback = resolve_and_wait(&cache, RawQuery::new(KEY, NUMBER)).await;

        let events = callback.events();
        assert_eq!(events.len(), 2);
        let first_pass = events[0].entry();
        assert!(first_pass.display_name.is_none());
        assert_eq!(first_pass.location.as_deref(), Some("San Francisco, CA"));
        assert!(first_pass.has_pending_enrichment);

        let entry = stored(&cache);
        assert_eq!(entry.display_name.as_deref(), Some("Pizza Palace"));
        assert_eq!(entry.location.as_deref(), Some("San Francisco, CA"));
        assert!(entry.is_business);
        assert_eq!(entry.photo_kind, PhotoKind::Business);
        assert_eq!(entry.lookup_source, LookupSource::Network);
        assert!(!entry.has_pending_enrichment);
        assert_eq!(network.call_count(), 1);
        assert_eq!(geocoder.call_count(), 1);
    }

    #[tokio::test]
    async fn test_network_not_consulted_after_local_match() {
        let local = MockLocalProvider::new()
            .with_contact(NUMBER, TestMatchBuilder::new("Alice").build());
        let network = MockNetworkService::new();
        let geocoder = Arc::new(MockGeocoder::new("San Francisco, CA"));
        let dispatcher = QueryDispatcher::builder(Arc::new(local))
            .network(Arc::new(network.clone()))
            .geocoder(geocoder.clone())
            .build();
        let cache = cache_for(dispatcher);

        resolve_and_wait(&cache, RawQuery::new(KEY, NUMBER)).await;

        assert_eq!(network.call_count(), 0);
        assert_eq!(geocoder.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cnap_name_suppresses_geocoding() {
        let geocoder = Arc::new(MockGeocoder::new("San Francisco, CA"));
        let dispatcher = QueryDispatcher::builder(Arc::new(MockLocalProvider::new()))
            .geocoder(geocoder.clone())
            .build();
        let cache = cache_for(dispatcher);

        resolve_and_wait(&cache, RawQuery::new(KEY, NUMBER).with_cnap_name("ACME CORP")).await;

        let entry = stored(&cache);
        assert_eq!(entry.display_name.as_deref(), Some("ACME CORP"));
        assert!(entry.location.is_none());
        assert_eq!(geocoder.call_count(), 0);
    }

    #[tokio::test]
    async fn test_geocoding_respects_config() {
        let geocoder = Arc::new(MockGeocoder::new("San Francisco, CA"));
        let config = CacheConfig {
            geocode_unknown_numbers: false,
            ..CacheConfig::test()
        };
        let dispatcher = QueryDispatcher::builder(Arc::new(MockLocalProvider::new()))
            .geocoder(geocoder.clone())
            .config(&config)
            .build();
        let cache = cache_for(dispatcher);

        resolve_and_wait(&cache, RawQuery::new(KEY, NUMBER)).await;

        assert!(stored(&cache).location.is_none());
        assert_eq!(geocoder.call_count(), 0);
    }

    #[tokio::test]
    async fn test_network_failure_still_completes() {
        let network = MockNetworkService::new();
        network.fail_with("HTTP 503");
        let dispatcher = QueryDispatcher::builder(Arc::new(MockLocalProvider::new()))
            .network(Arc::new(network))
            .build();
        let cache = cache_for(dispatcher);

        let callback = resolve_and_wait(&cache, RawQuery::new(KEY, NUMBER)).await;

        assert_eq!(callback.info_count(), 1);
        assert!(!stored(&cache).has_pending_enrichment);
    }

    #[tokio::test]
    async fn test_photo_is_fetched_for_local_match() {
        let local = MockLocalProvider::new().with_contact(
            NUMBER,
            TestMatchBuilder::new("Alice").photo("content://photo/1").build(),
        );
        let photos = MockPhotoFetcher::new().with_photo("content://photo/1", b"\x89PNG");
        let dispatcher = QueryDispatcher::builder(Arc::new(local))
            .photos(Arc::new(photos.clone()))
            .build();
        let cache = cache_for(dispatcher);

        let callback = resolve_and_wait(&cache, RawQuery::new(KEY, NUMBER)).await;

        assert_eq!(callback.info_count(), 1);
        assert_eq!(callback.image_count(), 1);
        let entry = stored(&cache);
        assert_eq!(entry.photo.as_deref(), Some(&b"\x89PNG"[..]));
        assert_eq!(entry.photo_kind, PhotoKind::Contact);
        assert_eq!(photos.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_photo_fetch_completes_without_changes() {
        let local = MockLocalProvider::new().with_contact(
            NUMBER,
            TestMatchBuilder::new("Alice").photo("content://photo/missing").build(),
        );
        let dispatcher = QueryDispatcher::builder(Arc::new(local))
            .photos(Arc::new(MockPhotoFetcher::new()))
            .build();
        let cache = cache_for(dispatcher);

        let callback = resolve_and_wait(&cache, RawQuery::new(KEY, NUMBER)).await;

        assert_eq!(callback.info_count(), 1);
        assert_eq!(callback.image_count(), 0);
        let entry = stored(&cache);
        assert!(entry.photo.is_none());
        assert_eq!(entry.photo_uri.as_deref(), Some("content://photo/missing"));
        assert!(!entry.has_pending_enrichment);
    }

    #[tokio::test]
    async fn test_network_photo_is_fetched_after_overlay() {
        let network = MockNetworkService::new().with_result(
            NUMBER,
            TestMatchBuilder::business("Pizza Palace")
                .photo("https://example.com/logo.png")
                .build(),
        );
        let photos = MockPhotoFetcher::new().with_photo("https://example.com/logo.png", b"logo");
        let dispatcher = QueryDispatcher::builder(Arc::new(MockLocalProvider::new()))
            .network(Arc::new(network))
            .photos(Arc::new(photos))
            .build();
        let cache = cache_for(dispatcher);

        let callback = resolve_and_wait(&cache, RawQuery::new(KEY, NUMBER)).await;

        assert_eq!(callback.info_count(), 2);
        assert_eq!(callback.image_count(), 1);
        let entry = stored(&cache);
        assert_eq!(entry.photo.as_deref(), Some(&b"logo"[..]));
        assert_eq!(entry.photo_kind, PhotoKind::Contact);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_photo_does_not_delay_first_pass() {
        let local = MockLocalProvider::new().with_contact(
            NUMBER,
            TestMatchBuilder::new("Alice").photo("content://photo/1").build(),
        );
        let photos = MockPhotoFetcher::new().with_photo("content://photo/1", b"png");
        photos.set_delay(Duration::from_secs(2));
        let dispatcher = QueryDispatcher::builder(Arc::new(local))
            .photos(Arc::new(photos))
            .build();
        let cache = cache_for(dispatcher);
        let (callback, mut rx) = ChannelCallback::channel();

        let start = Instant::now();
        cache.resolve(RawQuery::new(KEY, NUMBER), callback);

        assert!(matches!(rx.recv().await, Some(ContactEvent::Info { .. })));
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(matches!(
            rx.recv().await,
            Some(ContactEvent::ImageLoaded { .. })
        ));
        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}
