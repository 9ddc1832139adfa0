//! Row actions
//!
//! An action never edits the list itself. It calls out to the backend and,
//! on success, the controller reloads (or navigates away when the action
//! carries a redirect).

use crate::entity::Entity;
use futures::future::BoxFuture;
use portal_core::RequestError;
use std::fmt;
use std::sync::Arc;

/// What an action handler receives
#[derive(Debug, Clone, PartialEq)]
pub enum ActionTarget<E> {
    /// Row key only
    Id(String),
    /// The whole row
    Entity(E),
    /// Keys of the selected rows, for bulk actions
    Ids(Vec<String>),
}

/// How an action wants to be called
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// [`ActionTarget::Id`]
    Id,
    /// [`ActionTarget::Entity`]
    Entity,
}

type BoxedResult = BoxFuture<'static, Result<(), RequestError>>;

/// Async mutation run by an action
pub type ActionHandler<E> = Arc<dyn Fn(ActionTarget<E>) -> BoxedResult + Send + Sync>;

/// A named action offered on each row
pub struct RowAction<E> {
    kind: String,
    target: TargetKind,
    handler: ActionHandler<E>,
    redirect: Option<String>,
}

impl<E> Clone for RowAction<E> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            target: self.target,
            handler: Arc::clone(&self.handler),
            redirect: self.redirect.clone(),
        }
    }
}

impl<E> fmt::Debug for RowAction<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowAction")
            .field("kind", &self.kind)
            .field("target", &self.target)
            .field("redirect", &self.redirect)
            .finish_non_exhaustive()
    }
}

impl<E: Entity> RowAction<E> {
    /// Action receiving the row key
    ///
    /// A bulk call runs the handler once per key, in selection order, and
    /// stops at the first failure.
    pub fn on_id<F, Fut>(kind: impl Into<String>, handler: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), RequestError>> + Send + 'static,
    {
        let handler: ActionHandler<E> = Arc::new(move |target: ActionTarget<E>| -> BoxedResult {
            match target {
                ActionTarget::Id(id) => Box::pin(handler(id)),
                ActionTarget::Entity(entity) => Box::pin(handler(entity.id())),
                ActionTarget::Ids(ids) => {
                    let runs: Vec<Fut> = ids.into_iter().map(&handler).collect();
                    Box::pin(async move {
                        for run in runs {
                            run.await?;
                        }
                        Ok(())
                    })
                }
            }
        });
        Self::with_handler(kind, TargetKind::Id, handler)
    }

    /// Action receiving the whole row
    pub fn on_entity<F, Fut>(kind: impl Into<String>, handler: F) -> Self
    where
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), RequestError>> + Send + 'static,
    {
        let handler: ActionHandler<E> = Arc::new(move |target: ActionTarget<E>| -> BoxedResult {
            match target {
                ActionTarget::Entity(entity) => Box::pin(handler(entity)),
                other => Box::pin(futures::future::ready(Err(RequestError::new(format!(
                    "action expects a row, got {}",
                    target_name(&other)
                ))))),
            }
        });
        Self::with_handler(kind, TargetKind::Entity, handler)
    }

    /// Action with a raw handler
    #[must_use]
    pub fn with_handler(
        kind: impl Into<String>,
        target: TargetKind,
        handler: ActionHandler<E>,
    ) -> Self {
        Self {
            kind: kind.into(),
            target,
            handler,
            redirect: None,
        }
    }
}

impl<E> RowAction<E> {
    /// Navigate to `route` after success instead of reloading
    #[inline]
    #[must_use]
    pub fn with_redirect(mut self, route: impl Into<String>) -> Self {
        self.redirect = Some(route.into());
        self
    }

    /// Action name
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Expected target
    #[inline]
    #[must_use]
    pub fn target(&self) -> TargetKind {
        self.target
    }

    /// Route followed after success
    #[inline]
    #[must_use]
    pub fn redirect(&self) -> Option<&str> {
        self.redirect.as_deref()
    }

    /// Run the handler
    pub fn run(&self, target: ActionTarget<E>) -> BoxFuture<'static, Result<(), RequestError>> {
        (self.handler)(target)
    }
}

fn target_name<E>(target: &ActionTarget<E>) -> &'static str {
    match target {
        ActionTarget::Id(_) => "an id",
        ActionTarget::Entity(_) => "a row",
        ActionTarget::Ids(_) => "a selection",
    }
}

/// How a successful action finished
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// The list was reloaded
    Reloaded(crate::controller::LoadOutcome),
    /// Navigation was requested
    Redirected(String),
}
