//! Portal Lists - list screens without the screen
//!
//! Headless controller behind every console table:
//! - Fetching through an [`EntitySource`] with last-request-wins loading
//! - Case-insensitive filtering and stable sorting ([`ListQuery`])
//! - Row selection and row actions ([`RowAction`])
//! - The console's collections ([`resources`])
//!
//! # Example
//!
//! ```rust,ignore
//! use portal_lists::{resources::Bucket, ApiSource, EntityListController};
//!
//! let source = ApiSource::<Bucket>::for_resource(api);
//! let list = EntityListController::new(Arc::new(source), sink);
//! list.load().await;
//! for bucket in list.filter("logs") {
//!     println!("{}", bucket.name);
//! }
//! ```

#![warn(unreachable_pub)]

pub mod action;
pub mod controller;
pub mod entity;
pub mod error;
pub mod query;
pub mod resources;

pub use action::{ActionHandler, ActionOutcome, ActionTarget, RowAction, TargetKind};
pub use controller::{EntityListController, EntityListState, LoadOutcome};
pub use entity::{ApiSource, Entity, EntitySource, Resource};
pub use error::ListError;
pub use query::{ListQuery, SortOrder};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
