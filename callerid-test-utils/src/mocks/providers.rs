//! Mock identity providers
//!
//! Every mock shares its behavior behind an `Arc<Mutex<..>>`, so a clone kept
//! by the test can reconfigure or inspect the instance handed to the
//! dispatcher.

use async_trait::async_trait;
use callerid_core::error::ProviderError;
use callerid_core::{
    ContactMatch, DirectoryHandle, DirectoryIdentityProvider, DirectoryList,
    LocalIdentityProvider, NetworkNumberLookupService, Result,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Answers shared by the single-source mocks
#[derive(Debug, Clone, Default)]
struct LookupBehavior {
    contacts: HashMap<String, ContactMatch>,
    delay: Duration,
    failure: Option<String>,
    panic: bool,
    calls: Vec<String>,
}

impl LookupBehavior {
    /// Record the call and decide the answer without holding the lock later
    fn plan(&mut self, number: &str) -> (Duration, bool, Option<String>, Option<ContactMatch>) {
        self.calls.push(number.to_string());
        (
            self.delay,
            self.panic,
            self.failure.clone(),
            self.contacts.get(number).cloned(),
        )
    }
}

async fn answer(
    provider: &str,
    plan: (Duration, bool, Option<String>, Option<ContactMatch>),
) -> Result<Option<ContactMatch>> {
    let (delay, panic, failure, found) = plan;
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    if panic {
        panic!("{provider} panicked");
    }
    if let Some(reason) = failure {
        return Err(ProviderError::unavailable(provider, &reason).into());
    }
    Ok(found)
}

/// Mock local directory
///
/// # Examples
///
/// ```rust,no_run
/// use callerid_test_utils::{MockLocalProvider, TestMatchBuilder};
///
/// let local = MockLocalProvider::new()
///     .with_contact("4155551212", TestMatchBuilder::new("Alice").build());
/// assert_eq!(local.call_count(), 0);
/// ```
#[derive(Clone, Default)]
pub struct MockLocalProvider {
    behavior: Arc<Mutex<LookupBehavior>>,
}

impl MockLocalProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `number` with `found`
    pub fn with_contact(self, number: &str, found: ContactMatch) -> Self {
        self.expect_contact(number, found);
        self
    }

    pub fn expect_contact(&self, number: &str, found: ContactMatch) {
        let mut behavior = self.behavior.lock().unwrap();
        behavior.contacts.insert(number.to_string(), found);
    }

    /// Set the delay before every answer
    pub fn set_delay(&self, delay: Duration) {
        self.behavior.lock().unwrap().delay = delay;
    }

    /// Fail every lookup with `reason`
    pub fn fail_with(&self, reason: &str) {
        self.behavior.lock().unwrap().failure = Some(reason.to_string());
    }

    /// Panic inside every lookup
    pub fn panic_on_lookup(&self) {
        self.behavior.lock().unwrap().panic = true;
    }

    pub fn call_count(&self) -> usize {
        self.behavior.lock().unwrap().calls.len()
    }

    /// Numbers looked up so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.behavior.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl LocalIdentityProvider for MockLocalProvider {
    async fn lookup(&self, number: &str, _country_iso: &str) -> Result<Option<ContactMatch>> {
        let plan = self.behavior.lock().unwrap().plan(number);
        answer("mock-local", plan).await
    }
}

/// Mock network-authoritative lookup service
#[derive(Clone, Default)]
pub struct MockNetworkService {
    behavior: Arc<Mutex<LookupBehavior>>,
}

impl MockNetworkService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result(self, number: &str, found: ContactMatch) -> Self {
        self.behavior
            .lock()
            .unwrap()
            .contacts
            .insert(number.to_string(), found);
        self
    }

    pub fn set_delay(&self, delay: Duration) {
        self.behavior.lock().unwrap().delay = delay;
    }

    pub fn fail_with(&self, reason: &str) {
        self.behavior.lock().unwrap().failure = Some(reason.to_string());
    }

    pub fn call_count(&self) -> usize {
        self.behavior.lock().unwrap().calls.len()
    }
}

#[async_trait]
impl NetworkNumberLookupService for MockNetworkService {
    async fn lookup(&self, number: &str) -> Result<Option<ContactMatch>> {
        let plan = self.behavior.lock().unwrap().plan(number);
        answer("mock-network", plan).await
    }
}

/// One mock secondary directory
#[derive(Debug, Clone)]
pub struct MockDirectory {
    handle: DirectoryHandle,
    behavior: LookupBehavior,
}

impl MockDirectory {
    pub fn new(id: u64, name: &str) -> Self {
        Self {
            handle: DirectoryHandle::new(id, name),
            behavior: LookupBehavior::default(),
        }
    }

    pub fn with_contact(mut self, number: &str, found: ContactMatch) -> Self {
        self.behavior.contacts.insert(number.to_string(), found);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.behavior.delay = delay;
        self
    }

    pub fn failing(mut self, reason: &str) -> Self {
        self.behavior.failure = Some(reason.to_string());
        self
    }
}

#[derive(Default)]
struct DirectoriesState {
    directories: Vec<MockDirectory>,
    enumerate_failure: Option<String>,
    enumerations: usize,
}

/// Mock directory list and per-directory provider
#[derive(Clone, Default)]
pub struct MockDirectories {
    state: Arc<Mutex<DirectoriesState>>,
}

impl MockDirectories {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_directory(self, directory: MockDirectory) -> Self {
        self.state.lock().unwrap().directories.push(directory);
        self
    }

    /// Fail enumeration itself
    pub fn fail_enumeration(&self, reason: &str) {
        self.state.lock().unwrap().enumerate_failure = Some(reason.to_string());
    }

    pub fn enumeration_count(&self) -> usize {
        self.state.lock().unwrap().enumerations
    }

    /// Lookups made against the directory with `id`
    pub fn call_count(&self, id: u64) -> usize {
        self.state
            .lock()
            .unwrap()
            .directories
            .iter()
            .find(|d| d.handle.id == id)
            .map_or(0, |d| d.behavior.calls.len())
    }

    /// Lookups made against every directory
    pub fn total_calls(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .directories
            .iter()
            .map(|d| d.behavior.calls.len())
            .sum()
    }
}

#[async_trait]
impl DirectoryList for MockDirectories {
    async fn enumerate(&self) -> Result<Vec<DirectoryHandle>> {
        let mut state = self.state.lock().unwrap();
        state.enumerations += 1;
        if let Some(reason) = &state.enumerate_failure {
            return Err(ProviderError::unavailable("mock-directories", reason).into());
        }
        Ok(state.directories.iter().map(|d| d.handle.clone()).collect())
    }
}

#[async_trait]
impl DirectoryIdentityProvider for MockDirectories {
    async fn lookup(
        &self,
        number: &str,
        directory: &DirectoryHandle,
    ) -> Result<Option<ContactMatch>> {
        let plan = {
            let mut state = self.state.lock().unwrap();
            match state
                .directories
                .iter_mut()
                .find(|d| d.handle.id == directory.id)
            {
                Some(d) => d.behavior.plan(number),
                None => return Ok(None),
            }
        };
        answer(&directory.name, plan).await
    }
}
