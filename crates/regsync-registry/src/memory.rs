//! In-memory registry
//!
//! A process-local [`IRegistryClient`] that behaves like the real registry
//! for the calls regsync makes: creates under a missing parent fail with
//! NotFound, duplicate creates fail with AlreadyExists, and listings honour
//! `-` wildcards in the parent and simple `{level}_id == 'x'` filters.
//!
//! Used by `--dry-run` and by tests, which can also inject failures and
//! read call counters.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use regsync_core::domain::{ResourceLevel, ResourceName};
use regsync_core::ports::{IRegistryClient, RegistryError, Resource, ResourceBody};
use tracing::debug;

#[derive(Debug, Default)]
struct State {
    resources: BTreeMap<String, Resource>,
    contents: HashMap<String, Vec<u8>>,
    /// Names in creation order
    created: Vec<String>,
    gets: usize,
    lists: usize,
    get_failures: HashMap<String, RegistryError>,
    create_failures: HashMap<String, RegistryError>,
    /// Names another client creates just before ours
    preempted: Vec<String>,
}

/// Registry kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    state: Mutex<State>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Inserts a resource as if it already existed remotely
    pub fn seed(&self, name: ResourceName) {
        let mut state = self.lock();
        state
            .resources
            .insert(name.to_string(), Resource::named(name));
    }

    /// Seeds `name` together with every ancestor below its project
    pub fn seed_with_ancestors(&self, name: &ResourceName) {
        let mut next = Some(name.clone());
        while let Some(current) = next {
            if current.level().is_none() {
                break;
            }
            next = current.parent();
            self.seed(current);
        }
    }

    /// Makes every get of `name` fail with `error`
    pub fn fail_get(&self, name: &str, error: RegistryError) {
        self.lock().get_failures.insert(name.to_string(), error);
    }

    /// Makes every create of `name` fail with `error`
    pub fn fail_create(&self, name: &str, error: RegistryError) {
        self.lock().create_failures.insert(name.to_string(), error);
    }

    /// Simulates a lost race: the next create of `name` finds it already
    /// created by someone else
    pub fn preempt_create(&self, name: &str) {
        self.lock().preempted.push(name.to_string());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().resources.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.lock().resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of get calls made
    pub fn get_count(&self) -> usize {
        self.lock().gets
    }

    /// Number of resources created through this client
    pub fn create_count(&self) -> usize {
        self.lock().created.len()
    }

    /// Number of list calls made
    pub fn list_count(&self) -> usize {
        self.lock().lists
    }

    /// Names created through this client, in order
    pub fn created_names(&self) -> Vec<String> {
        self.lock().created.clone()
    }

    /// Stored contents of a spec
    pub fn spec_contents(&self, name: &str) -> Option<Vec<u8>> {
        self.lock().contents.get(name).cloned()
    }
}

/// Whether `candidate` lies directly under `parent` in `level`, treating
/// `-` in `parent` as a wildcard
fn is_child_of(candidate: &ResourceName, parent: &ResourceName, level: ResourceLevel) -> bool {
    if candidate.level() != Some(level) {
        return false;
    }
    let Some(actual_parent) = candidate.parent() else {
        return false;
    };
    let expected: Vec<&str> = parent.as_str().split('/').collect();
    let actual: Vec<&str> = actual_parent.as_str().split('/').collect();
    expected.len() == actual.len()
        && expected
            .iter()
            .zip(&actual)
            .all(|(e, a)| *e == "-" || e == a)
}

/// Evaluates a filter made of `field == 'value'` clauses joined by `&&`.
///
/// Clauses on fields other than the level's id field are not understood
/// and match everything.
fn matches_filter(resource: &Resource, level: ResourceLevel, filter: Option<&str>) -> bool {
    let Some(filter) = filter else {
        return true;
    };
    filter.split("&&").all(|clause| {
        let Some((field, value)) = clause.split_once("==") else {
            return true;
        };
        if field.trim() != level.id_field() {
            return true;
        }
        let value = value.trim().trim_matches(|c| c == '\'' || c == '"');
        resource.name.id() == value
    })
}

#[async_trait::async_trait]
impl IRegistryClient for InMemoryRegistry {
    async fn get_resource(&self, name: &ResourceName) -> Result<Resource, RegistryError> {
        let mut state = self.lock();
        state.gets += 1;
        if let Some(error) = state.get_failures.get(name.as_str()) {
            return Err(error.clone());
        }
        state
            .resources
            .get(name.as_str())
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    async fn create_resource(
        &self,
        parent: &ResourceName,
        id: &str,
        body: ResourceBody,
    ) -> Result<Resource, RegistryError> {
        let name = parent
            .child(body.level(), id)
            .map_err(|e| RegistryError::Other(e.to_string()))?;
        let key = name.to_string();

        let mut state = self.lock();
        if let Some(error) = state.create_failures.get(&key) {
            return Err(error.clone());
        }
        if let Some(index) = state.preempted.iter().position(|n| *n == key) {
            state.preempted.remove(index);
            state.resources.insert(key.clone(), Resource::named(name));
            return Err(RegistryError::AlreadyExists(key));
        }
        if state.resources.contains_key(&key) {
            return Err(RegistryError::AlreadyExists(key));
        }
        if parent.level().is_some() && !state.resources.contains_key(parent.as_str()) {
            return Err(RegistryError::NotFound(parent.to_string()));
        }

        let mut resource = Resource::named(name);
        resource.create_time = Some(Utc::now());
        match body {
            ResourceBody::Api { display_name } | ResourceBody::Version { display_name } => {
                resource.display_name = Some(display_name);
            }
            ResourceBody::Spec {
                filename,
                style,
                contents,
            } => {
                resource.filename = Some(filename);
                resource.style = Some(style);
                resource.size_bytes = Some(contents.len() as u64);
                state.contents.insert(key.clone(), contents);
            }
        }

        debug!(name = %key, "Stored resource");
        state.resources.insert(key.clone(), resource.clone());
        state.created.push(key);
        Ok(resource)
    }

    async fn list_resources(
        &self,
        parent: &ResourceName,
        level: ResourceLevel,
        filter: Option<&str>,
    ) -> Result<Vec<Resource>, RegistryError> {
        let mut state = self.lock();
        state.lists += 1;
        Ok(state
            .resources
            .values()
            .filter(|r| is_child_of(&r.name, parent, level))
            .filter(|r| matches_filter(r, level, filter))
            .cloned()
            .collect())
    }
}
