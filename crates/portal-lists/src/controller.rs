//! Entity list controller
//!
//! Owns the list state of one screen:
//! - Loading with last-request-wins ordering
//! - Client-side filtering and sorting
//! - Row selection
//! - Row actions followed by a reload or a redirect
//!
//! Every `load()` takes a new generation number. A response is applied
//! only if its generation is still the latest when it arrives, so a slow
//! early request can never overwrite a newer result. After [`dispose`],
//! responses are dropped entirely.
//!
//! [`dispose`]: EntityListController::dispose

use crate::action::{ActionOutcome, ActionTarget, RowAction, TargetKind};
use crate::entity::{Entity, EntitySource};
use crate::error::ListError;
use crate::query::{self, ListQuery};
use parking_lot::Mutex;
use portal_core::{Navigator, NotificationSink, RequestError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Observable list state
#[derive(Debug, Clone, PartialEq)]
pub struct EntityListState<E> {
    /// Last applied result, in backend order
    pub items: Vec<E>,
    /// A load is in flight; `items` may be stale
    pub loading: bool,
    /// Current filter text
    pub filter_text: String,
}

impl<E> Default for EntityListState<E> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            filter_text: String::new(),
        }
    }
}

/// Result of one `load()` call
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Items replaced; number of items
    Applied(usize),
    /// A newer load started before this one finished; result dropped
    Superseded,
    /// Fetch failed; error reported, items untouched
    Failed(RequestError),
    /// Controller disposed; result dropped
    Disposed,
}

#[derive(Debug)]
struct Inner<E> {
    state: EntityListState<E>,
    generation: u64,
    selected: Vec<String>,
}

/// Controller of one list screen
pub struct EntityListController<E: Entity> {
    source: Arc<dyn EntitySource<E>>,
    sink: Arc<dyn NotificationSink>,
    navigator: Option<Arc<dyn Navigator>>,
    actions: Vec<RowAction<E>>,
    inner: Mutex<Inner<E>>,
    disposed: AtomicBool,
}

impl<E: Entity + std::fmt::Debug> std::fmt::Debug for EntityListController<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityListController")
            .field("actions", &self.actions)
            .field("inner", &self.inner)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl<E: Entity> EntityListController<E> {
    /// Controller over `source`, reporting failures to `sink`
    #[must_use]
    pub fn new(source: Arc<dyn EntitySource<E>>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            source,
            sink,
            navigator: None,
            actions: Vec::new(),
            inner: Mutex::new(Inner {
                state: EntityListState::default(),
                generation: 0,
                selected: Vec::new(),
            }),
            disposed: AtomicBool::new(false),
        }
    }

    /// Navigator used by redirecting actions
    #[must_use]
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Offer `action` on every row
    #[must_use]
    pub fn with_action(mut self, action: RowAction<E>) -> Self {
        self.actions.push(action);
        self
    }

    /// Registered actions
    #[inline]
    #[must_use]
    pub fn actions(&self) -> &[RowAction<E>] {
        &self.actions
    }

    /// Fetch the list and apply it if still current
    pub async fn load(&self) -> LoadOutcome {
        if self.is_disposed() {
            return LoadOutcome::Disposed;
        }
        let generation = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            inner.state.loading = true;
            inner.generation
        };
        tracing::debug!(generation, "list load started");

        let result = self.source.fetch().await;

        if self.is_disposed() {
            tracing::debug!(generation, "list disposed, result dropped");
            return LoadOutcome::Disposed;
        }

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            tracing::debug!(
                generation,
                latest = inner.generation,
                "stale list result dropped"
            );
            return LoadOutcome::Superseded;
        }
        inner.state.loading = false;
        match result {
            Ok(items) => {
                let count = items.len();
                let ids: Vec<String> = items.iter().map(Entity::id).collect();
                inner.selected.retain(|id| ids.contains(id));
                inner.state.items = items;
                tracing::debug!(generation, count, "list applied");
                LoadOutcome::Applied(count)
            }
            Err(err) => {
                drop(inner);
                tracing::warn!(generation, error = %err, "list load failed");
                self.sink.report_error(&err);
                LoadOutcome::Failed(err)
            }
        }
    }

    /// Stop applying results; in-flight loads are discarded
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.inner.lock().state.loading = false;
    }

    /// Whether [`Self::dispose`] was called
    #[inline]
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Number of loads started so far
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Copy of the current state
    #[must_use]
    pub fn snapshot(&self) -> EntityListState<E> {
        self.inner.lock().state.clone()
    }

    /// Loaded items, unfiltered
    #[must_use]
    pub fn items(&self) -> Vec<E> {
        self.inner.lock().state.items.clone()
    }

    /// A load is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.lock().state.loading
    }

    /// Items whose display field contains `text`, ignoring case
    #[must_use]
    pub fn filter(&self, text: &str) -> Vec<E> {
        query::filter_items(&self.inner.lock().state.items, text)
    }

    /// Remember the filter text typed by the user
    pub fn set_filter(&self, text: impl Into<String>) {
        self.inner.lock().state.filter_text = text.into();
    }

    /// Items under the stored filter text
    #[must_use]
    pub fn visible(&self) -> Vec<E> {
        let inner = self.inner.lock();
        query::filter_items(&inner.state.items, &inner.state.filter_text)
    }

    /// Filtered, then stably sorted items
    #[must_use]
    pub fn view(&self, query: &ListQuery<E>) -> Vec<E> {
        query::apply(&self.inner.lock().state.items, query)
    }

    /// Flip selection of row `id`; returns whether it is now selected
    pub fn toggle_selection(&self, id: &str) -> bool {
        let mut inner = self.inner.lock();
        if let Some(pos) = inner.selected.iter().position(|s| s == id) {
            inner.selected.remove(pos);
            false
        } else {
            inner.selected.push(id.to_string());
            true
        }
    }

    /// Select every row of the current filtered view
    pub fn select_visible(&self) {
        let ids: Vec<String> = self.visible().iter().map(Entity::id).collect();
        self.inner.lock().selected = ids;
    }

    /// Selected row ids, in selection order
    #[must_use]
    pub fn selected(&self) -> Vec<String> {
        self.inner.lock().selected.clone()
    }

    /// Drop the selection
    pub fn clear_selection(&self) {
        self.inner.lock().selected.clear();
    }

    /// Run action `kind` on row `id`
    ///
    /// Items are never touched directly. On success the list reloads, or
    /// the navigator is sent to the action's redirect.
    ///
    /// # Errors
    /// - `ListError::Disposed` after [`Self::dispose`]
    /// - `ListError::UnknownAction` / `ListError::UnknownEntity`
    /// - `ListError::Request` when the handler fails; the error has been
    ///   reported to the sink
    pub async fn invoke_action(&self, kind: &str, id: &str) -> Result<ActionOutcome, ListError> {
        let action = self.action(kind)?;
        let target = match action.target() {
            TargetKind::Id => ActionTarget::Id(id.to_string()),
            TargetKind::Entity => {
                let entity = self
                    .inner
                    .lock()
                    .state
                    .items
                    .iter()
                    .find(|e| e.id() == id)
                    .cloned()
                    .ok_or_else(|| ListError::UnknownEntity(id.to_string()))?;
                ActionTarget::Entity(entity)
            }
        };
        self.run_action(&action, target).await
    }

    /// Run action `kind` on every selected row at once
    ///
    /// # Errors
    /// `ListError::EmptySelection` when nothing is selected, otherwise as
    /// [`Self::invoke_action`].
    pub async fn invoke_bulk(&self, kind: &str) -> Result<ActionOutcome, ListError> {
        let action = self.action(kind)?;
        let selected = self.selected();
        if selected.is_empty() {
            return Err(ListError::EmptySelection);
        }
        self.run_action(&action, ActionTarget::Ids(selected)).await
    }

    fn action(&self, kind: &str) -> Result<RowAction<E>, ListError> {
        if self.is_disposed() {
            return Err(ListError::Disposed);
        }
        self.actions
            .iter()
            .find(|a| a.kind() == kind)
            .cloned()
            .ok_or_else(|| ListError::UnknownAction(kind.to_string()))
    }

    async fn run_action(
        &self,
        action: &RowAction<E>,
        target: ActionTarget<E>,
    ) -> Result<ActionOutcome, ListError> {
        tracing::info!(kind = action.kind(), "running row action");
        if let Err(err) = action.run(target).await {
            tracing::warn!(kind = action.kind(), error = %err, "row action failed");
            self.sink.report_error(&err);
            return Err(ListError::Request(err));
        }

        self.clear_selection();
        if let Some(route) = action.redirect() {
            match &self.navigator {
                Some(navigator) => {
                    navigator.navigate(route);
                    return Ok(ActionOutcome::Redirected(route.to_string()));
                }
                None => tracing::warn!(%route, "no navigator, reloading instead"),
            }
        }
        Ok(ActionOutcome::Reloaded(self.load().await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::mock;
    use portal_test_utils::RecordingSink;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Name(String);

    impl Entity for Name {
        fn id(&self) -> String {
            self.0.clone()
        }

        fn display(&self) -> &str {
            &self.0
        }
    }

    mock! {
        Source {}
        #[async_trait]
        impl EntitySource<Name> for Source {
            async fn fetch(&self) -> Result<Vec<Name>, RequestError>;
        }
    }

    fn names(list: &[&str]) -> Vec<Name> {
        list.iter().map(|n| Name((*n).to_string())).collect()
    }

    fn controller_with(list: &'static [&'static str]) -> EntityListController<Name> {
        let mut source = MockSource::new();
        source.expect_fetch().returning(move || Ok(names(list)));
        EntityListController::new(Arc::new(source), Arc::new(RecordingSink::new()))
    }

    #[tokio::test]
    async fn load_applies_items() {
        let list = controller_with(&["alpha", "beta", "gamma"]);
        assert_eq!(list.load().await, LoadOutcome::Applied(3));
        let state = list.snapshot();
        assert!(!state.loading);
        assert_eq!(state.items, names(&["alpha", "beta", "gamma"]));
    }

    #[tokio::test]
    async fn filter_scenario() {
        let list = controller_with(&["alpha", "beta", "gamma"]);
        list.load().await;
        assert_eq!(list.filter("a"), names(&["alpha", "beta", "gamma"]));
        assert_eq!(list.filter("be"), names(&["beta"]));
        assert_eq!(list.filter("BE"), names(&["beta"]));
        assert_eq!(list.items().len(), 3);
    }

    #[tokio::test]
    async fn failure_keeps_items_and_reports() {
        let mut source = MockSource::new();
        let mut calls = 0;
        source.expect_fetch().times(2).returning(move || {
            calls += 1;
            if calls == 1 {
                Ok(names(&["alpha"]))
            } else {
                Err(RequestError::new("backend down").with_status(503))
            }
        });
        let sink = Arc::new(RecordingSink::new());
        let list = EntityListController::new(Arc::new(source), sink.clone());

        list.load().await;
        let outcome = list.load().await;
        assert!(matches!(outcome, LoadOutcome::Failed(ref e) if e.status == Some(503)));
        assert_eq!(list.items(), names(&["alpha"]));
        assert!(!list.is_loading());
        assert_eq!(sink.messages(), vec!["backend down"]);
    }

    #[tokio::test]
    async fn disposed_controller_ignores_loads() {
        let list = controller_with(&["alpha"]);
        list.dispose();
        assert_eq!(list.load().await, LoadOutcome::Disposed);
        assert!(list.items().is_empty());
        assert!(matches!(
            list.invoke_action("delete", "alpha").await,
            Err(ListError::Disposed)
        ));
    }

    #[tokio::test]
    async fn selection_toggles_and_survives_reload() {
        let list = controller_with(&["alpha", "beta"]);
        list.load().await;
        assert!(list.toggle_selection("alpha"));
        assert!(list.toggle_selection("ghost"));
        assert!(!list.toggle_selection("ghost"));
        list.load().await;
        assert_eq!(list.selected(), vec!["alpha"]);

        list.set_filter("BE");
        list.select_visible();
        assert_eq!(list.selected(), vec!["beta"]);
        list.clear_selection();
        assert!(list.selected().is_empty());
    }
}
