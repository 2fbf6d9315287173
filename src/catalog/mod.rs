//! In-memory species catalog.
//!
//! [`PokemonCatalogCache`] memoizes the species list and each detail record
//! for the life of the process. At most one request per resource is ever in
//! flight: a second caller asking for the same list or id awaits the fetch
//! the first caller started. Failures are not cached, so the next call
//! retries.

mod search;
mod selection;

#[cfg(test)]
pub(crate) mod fixture;

pub use search::SearchMode;
pub use selection::SelectionSet;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::FetchError;
use crate::events::StateStream;
use crate::models::{SpeciesDetail, SpeciesSummary, StatScale};
use crate::traits::{CatalogConfig, CatalogSource};

type SharedFetch<T> = Shared<BoxFuture<'static, Result<T, FetchError>>>;

/// Load state of the species list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ListStatus {
    #[default]
    Empty,
    Loading,
    Loaded {
        count: usize,
    },
}

/// Snapshot published to [`PokemonCatalogCache::subscribe`] receivers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogStatus {
    pub list: ListStatus,
    pub loading_details: BTreeSet<u32>,
    pub loaded_details: usize,
    pub selection: Vec<u32>,
    /// Display message of the most recent failed fetch.
    pub last_error: Option<String>,
}

enum ListSlot {
    Empty,
    Loading {
        generation: u64,
        fetch: SharedFetch<Arc<[SpeciesSummary]>>,
    },
    Loaded(Arc<[SpeciesSummary]>),
}

enum DetailSlot {
    Loading {
        generation: u64,
        fetch: SharedFetch<Arc<SpeciesDetail>>,
    },
    Loaded(Arc<SpeciesDetail>),
}

struct CacheState {
    list: ListSlot,
    details: HashMap<u32, DetailSlot>,
    selection: SelectionSet,
    // Tags each fetch so a late completion cannot clobber a newer slot.
    next_generation: u64,
}

impl CacheState {
    fn bump_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}

struct Inner {
    source: Arc<dyn CatalogSource>,
    config: CatalogConfig,
    state: Mutex<CacheState>,
    status: StateStream<CatalogStatus>,
}

/// Shared handle to the catalog. Clones refer to the same cache.
#[derive(Clone)]
pub struct PokemonCatalogCache {
    inner: Arc<Inner>,
}

impl PokemonCatalogCache {
    pub fn new(source: Arc<dyn CatalogSource>, config: CatalogConfig) -> Self {
        let selection = SelectionSet::with_capacity(config.selection_capacity);
        let inner = Inner {
            source,
            config,
            state: Mutex::new(CacheState {
                list: ListSlot::Empty,
                details: HashMap::new(),
                selection,
                next_generation: 0,
            }),
            status: StateStream::default(),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.inner.config
    }

    pub fn stat_scale(&self) -> &StatScale {
        &self.inner.config.stat_scale
    }

    /// The species list, fetched once and then served from memory.
    pub async fn species_list(&self) -> Result<Arc<[SpeciesSummary]>, FetchError> {
        let fetch = {
            let mut guard = self.inner.lock();
            let state = &mut *guard;
            match &state.list {
                ListSlot::Loaded(list) => return Ok(Arc::clone(list)),
                ListSlot::Loading { fetch, .. } => fetch.clone(),
                ListSlot::Empty => {
                    let generation = state.bump_generation();
                    let fetch = Inner::spawn_list_fetch(&self.inner, generation);
                    state.list = ListSlot::Loading {
                        generation,
                        fetch: fetch.clone(),
                    };
                    debug!("Species list: Empty -> Loading");
                    self.inner.publish(state);
                    fetch
                }
            }
        };

        fetch.await
    }

    /// Re-attempts a list fetch after a failure. A loaded list is returned as is.
    pub async fn retry_species_list(&self) -> Result<Arc<[SpeciesSummary]>, FetchError> {
        self.species_list().await
    }

    /// The list if it has already been loaded.
    pub fn cached_list(&self) -> Option<Arc<[SpeciesSummary]>> {
        match &self.inner.lock().list {
            ListSlot::Loaded(list) => Some(Arc::clone(list)),
            _ => None,
        }
    }

    /// Detail record for `id`, fetched at most once per successful load.
    pub async fn species_detail(&self, id: u32) -> Result<Arc<SpeciesDetail>, FetchError> {
        let fetch = {
            let mut guard = self.inner.lock();
            let state = &mut *guard;
            match state.details.get(&id) {
                Some(DetailSlot::Loaded(detail)) => return Ok(Arc::clone(detail)),
                Some(DetailSlot::Loading { fetch, .. }) => fetch.clone(),
                None => {
                    let generation = state.bump_generation();
                    let fetch = Inner::spawn_detail_fetch(&self.inner, id, generation);
                    state.details.insert(
                        id,
                        DetailSlot::Loading {
                            generation,
                            fetch: fetch.clone(),
                        },
                    );
                    debug!("Species {}: NotRequested -> Loading", id);
                    self.inner.publish(state);
                    fetch
                }
            }
        };

        fetch.await
    }

    /// Looks `name` up in the species list (loading it if needed) and
    /// returns its detail record.
    pub async fn species_detail_by_name(&self, name: &str) -> Result<Arc<SpeciesDetail>, FetchError> {
        let list = self.species_list().await?;
        let wanted = name.trim().to_lowercase();

        let id = list
            .iter()
            .find(|summary| summary.name.to_lowercase() == wanted)
            .map(|summary| summary.id)
            .ok_or_else(|| FetchError::NotFound {
                resource: "species",
                key: name.to_string(),
            })?;

        self.species_detail(id).await
    }

    /// The detail record for `id` if it has already been loaded.
    pub fn cached_detail(&self, id: u32) -> Option<Arc<SpeciesDetail>> {
        match self.inner.lock().details.get(&id) {
            Some(DetailSlot::Loaded(detail)) => Some(Arc::clone(detail)),
            _ => None,
        }
    }

    /// Filters the loaded list with the configured [`SearchMode`].
    pub fn search(&self, query: &str) -> Vec<SpeciesSummary> {
        self.search_with(query, self.inner.config.search_mode)
    }

    /// Filters the loaded list. Empty until the list has been loaded.
    pub fn search_with(&self, query: &str, mode: SearchMode) -> Vec<SpeciesSummary> {
        match &self.inner.lock().list {
            ListSlot::Loaded(list) => mode.filter(list, query),
            _ => Vec::new(),
        }
    }

    pub fn toggle_selection(&self, id: u32) -> SelectionSet {
        let mut guard = self.inner.lock();
        if guard.selection.toggle(id) {
            self.inner.publish(&guard);
        } else {
            debug!(
                "Selection full ({}), ignoring species {}",
                guard.selection.capacity(),
                id
            );
        }
        guard.selection.clone()
    }

    pub fn clear_selection(&self) {
        let mut guard = self.inner.lock();
        guard.selection.clear();
        self.inner.publish(&guard);
    }

    /// Replaces the selection, e.g. when restoring a saved trainer's picks.
    pub fn set_selection(&self, ids: impl IntoIterator<Item = u32>) -> SelectionSet {
        let mut guard = self.inner.lock();
        guard.selection.replace(ids);
        self.inner.publish(&guard);
        guard.selection.clone()
    }

    pub fn selection(&self) -> SelectionSet {
        self.inner.lock().selection.clone()
    }

    /// Selected species whose details are loaded, in selection order.
    pub fn selected_details(&self) -> Vec<Arc<SpeciesDetail>> {
        let guard = self.inner.lock();
        guard
            .selection
            .ids()
            .iter()
            .filter_map(|id| match guard.details.get(id) {
                Some(DetailSlot::Loaded(detail)) => Some(Arc::clone(detail)),
                _ => None,
            })
            .collect()
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<CatalogStatus> {
        self.inner.status.subscribe()
    }

    pub fn status(&self) -> CatalogStatus {
        self.inner.status.current()
    }

    pub fn clear_error(&self) {
        self.inner.status.update(|status| status.last_error = None);
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // No code path panics while holding the lock.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &CacheState) {
        let list = match &state.list {
            ListSlot::Empty => ListStatus::Empty,
            ListSlot::Loading { .. } => ListStatus::Loading,
            ListSlot::Loaded(list) => ListStatus::Loaded { count: list.len() },
        };

        let mut loading_details = BTreeSet::new();
        let mut loaded_details = 0;
        for (id, slot) in &state.details {
            match slot {
                DetailSlot::Loading { .. } => {
                    loading_details.insert(*id);
                }
                DetailSlot::Loaded(_) => loaded_details += 1,
            }
        }

        let selection = state.selection.ids().to_vec();
        self.status.update(move |status| {
            status.list = list;
            status.loading_details = loading_details;
            status.loaded_details = loaded_details;
            status.selection = selection;
        });
    }

    fn record_error(&self, message: String) {
        self.status.update(|status| status.last_error = Some(message));
    }

    fn spawn_list_fetch(this: &Arc<Self>, generation: u64) -> SharedFetch<Arc<[SpeciesSummary]>> {
        let inner = Arc::clone(this);
        let handle = tokio::spawn(async move {
            let guard = FetchGuard::new(&inner, FetchTarget::List, generation);
            let result = inner.load_list().await;
            inner.finish_list(generation, &result);
            guard.disarm();
            result
        });
        share(handle)
    }

    fn spawn_detail_fetch(
        this: &Arc<Self>,
        id: u32,
        generation: u64,
    ) -> SharedFetch<Arc<SpeciesDetail>> {
        let inner = Arc::clone(this);
        let handle = tokio::spawn(async move {
            let guard = FetchGuard::new(&inner, FetchTarget::Detail(id), generation);
            let result = inner.load_detail(id).await;
            inner.finish_detail(id, generation, &result);
            guard.disarm();
            result
        });
        share(handle)
    }

    async fn load_list(&self) -> Result<Arc<[SpeciesSummary]>, FetchError> {
        let page = self
            .source
            .fetch_species_page(self.config.page_size, self.config.page_offset)
            .await?;
        debug!("Species page returned {} of {} entries", page.results.len(), page.count);

        let mut summaries = page.into_summaries()?;
        let mut seen = HashSet::new();
        summaries.retain(|summary| seen.insert(summary.id));

        Ok(Arc::from(summaries))
    }

    async fn load_detail(&self, id: u32) -> Result<Arc<SpeciesDetail>, FetchError> {
        let (pokemon, species) = tokio::join!(
            self.source.fetch_pokemon(id),
            self.source.fetch_species(id)
        );

        let species = match species {
            Ok(species) => Some(species),
            Err(e) => {
                warn!("No description for species {}: {}", id, e);
                None
            }
        };

        Ok(Arc::new(pokemon?.into_detail(species.as_ref())))
    }

    fn finish_list(&self, generation: u64, result: &Result<Arc<[SpeciesSummary]>, FetchError>) {
        let mut guard = self.lock();
        let current = matches!(
            &guard.list,
            ListSlot::Loading { generation: g, .. } if *g == generation
        );
        if !current {
            return;
        }

        match result {
            Ok(list) => {
                info!("Loaded {} species", list.len());
                guard.list = ListSlot::Loaded(Arc::clone(list));
            }
            Err(e) => {
                warn!("Species list fetch failed: {}", e);
                guard.list = ListSlot::Empty;
                self.record_error(format!("Failed to load species list: {e}"));
            }
        }
        self.publish(&guard);
    }

    fn finish_detail(
        &self,
        id: u32,
        generation: u64,
        result: &Result<Arc<SpeciesDetail>, FetchError>,
    ) {
        let mut guard = self.lock();
        let current = matches!(
            guard.details.get(&id),
            Some(DetailSlot::Loading { generation: g, .. }) if *g == generation
        );
        if !current {
            return;
        }

        match result {
            Ok(detail) => {
                info!("Loaded species {} ({})", id, detail.display_name);
                guard.details.insert(id, DetailSlot::Loaded(Arc::clone(detail)));
            }
            Err(e) => {
                warn!("Species {} fetch failed: {}", id, e);
                guard.details.remove(&id);
                self.record_error(format!("Failed to load species {id}: {e}"));
            }
        }
        self.publish(&guard);
    }
}

#[derive(Debug, Clone, Copy)]
enum FetchTarget {
    List,
    Detail(u32),
}

/// Releases a `Loading` slot when its fetch task unwinds or is dropped
/// before reporting back, so the next call starts a fresh request.
struct FetchGuard {
    inner: Arc<Inner>,
    target: FetchTarget,
    generation: u64,
    armed: bool,
}

impl FetchGuard {
    fn new(inner: &Arc<Inner>, target: FetchTarget, generation: u64) -> Self {
        Self {
            inner: Arc::clone(inner),
            target,
            generation,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for FetchGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        warn!("{:?} fetch task ended without a result", self.target);
        let err = FetchError::Network("fetch task aborted".to_string());
        match self.target {
            FetchTarget::List => self.inner.finish_list(self.generation, &Err(err)),
            FetchTarget::Detail(id) => self.inner.finish_detail(id, self.generation, &Err(err)),
        }
    }
}

/// Wraps a spawned fetch so any number of callers can await its outcome.
/// Dropping every caller leaves the task running to completion.
fn share<T>(handle: JoinHandle<Result<T, FetchError>>) -> SharedFetch<T>
where
    T: Clone + Send + Sync + 'static,
{
    async move {
        handle
            .await
            .unwrap_or_else(|e| Err(FetchError::Network(format!("fetch task failed: {e}"))))
    }
    .boxed()
    .shared()
}
