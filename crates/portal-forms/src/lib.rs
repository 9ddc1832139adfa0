//! Portal Forms - validation and multi-step wizards
//!
//! The form layer of the console:
//! - Declarative field rules evaluated into a [`ValidationResult`]
//! - A pure reducer over persistent wizard state ([`reduce`])
//! - A validity-gated step controller ([`Wizard`])
//! - The tenant-creation wizard with its namespace probe
//!
//! # Example
//!
//! ```rust,ignore
//! use portal_forms::{steps, TenantWizard};
//!
//! let mut wizard = TenantWizard::new();
//! wizard.update_field(steps::NAME_TENANT, "tenantName", "my-tenant");
//! assert!(!wizard.name_errors().contains("tenant-name"));
//! ```

#![warn(unreachable_pub)]

pub mod debounce;
pub mod error;
pub mod field;
pub mod namespace;
pub mod tenant;
pub mod validation;
pub mod wizard;

pub use debounce::Debouncer;
pub use error::WizardError;
pub use field::{FieldValue, SelectOption};
pub use namespace::{NamespaceProbe, NamespaceWatcher};
pub use tenant::{
    steps, CertGroup, CertSlot, Certificates, KeyPair, NamespaceStatus, TenantTemplate,
    TenantWizard,
};
pub use validation::{validate, ValidationResult, ValidationRule};
pub use wizard::{reduce, Fields, StepFields, Wizard, WizardAction, WizardState, WizardTemplate};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building forms
    pub use crate::{
        validate, FieldValue, ValidationResult, ValidationRule, Wizard, WizardAction,
        WizardState, WizardTemplate,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
