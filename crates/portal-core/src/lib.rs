//! Portal Core - shared seams of the console
//!
//! Everything the console screens consume but do not own:
//! - The backend request function ([`ApiClient`])
//! - The user-facing error sink ([`NotificationSink`])
//! - Localized strings ([`Translator`], [`Catalog`], [`Message`])
//! - Programmatic navigation ([`Navigator`])
//! - Configuration ([`PortalConfig`]) and the request error taxonomy
//!
//! # Example
//!
//! ```rust,ignore
//! use portal_core::{Catalog, Message, Translator};
//!
//! let catalog = Catalog::builtin();
//! let msg = Message::new("tenants:nameErr");
//! println!("{}", msg.localize(&catalog));
//! ```

#![warn(unreachable_pub)]

pub mod api;
pub mod config;
pub mod error;
pub mod format;
pub mod i18n;
pub mod nav;
pub mod notify;

pub use api::{ApiClient, Method};
pub use config::{ApiConfig, FormsConfig, LocaleConfig, PortalConfig, TraceConfig};
pub use error::{ConfigError, PortalError, RequestError};
pub use i18n::{Catalog, Message, Translator};
pub use nav::Navigator;
pub use notify::{LogSink, NotificationSink};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
