//! Tenant-creation wizard
//!
//! Step layout, default values and per-step validation rules of the
//! "create tenant" flow, plus the certificate key-pair lists edited on the
//! security step.

use crate::field::{FieldValue, SelectOption};
use crate::validation::{validate, ValidationResult, ValidationRule};
use crate::wizard::{step_fields, Fields, Wizard, WizardAction, WizardState, WizardTemplate};
use once_cell::sync::Lazy;
use portal_core::format::random_string;
use regex::Regex;

/// Step names, in display order
pub mod steps {
    /// Tenant name, namespace, storage class
    pub const NAME_TENANT: &str = "nameTenant";
    /// Images, registry, log search and prometheus
    pub const CONFIGURE: &str = "configure";
    /// Built-in users, OpenID or Active Directory
    pub const IDENTITY_PROVIDER: &str = "identityProvider";
    /// TLS and certificates
    pub const SECURITY: &str = "security";
    /// KMS settings
    pub const ENCRYPTION: &str = "encryption";
    /// Capacity and erasure coding
    pub const TENANT_SIZE: &str = "tenantSize";
    /// Pod placement
    pub const AFFINITY: &str = "affinity";

    /// All steps in order
    pub const ALL: [&str; 7] = [
        NAME_TENANT,
        CONFIGURE,
        IDENTITY_PROVIDER,
        SECURITY,
        ENCRYPTION,
        TENANT_SIZE,
        AFFINITY,
    ];

    /// Steps with no validation rules; valid from the start
    pub const WITHOUT_RULES: [&str; 5] =
        [IDENTITY_PROVIDER, SECURITY, ENCRYPTION, TENANT_SIZE, AFFINITY];
}

/// Option list holding the namespace's storage classes
pub const STORAGE_CLASSES: &str = "storageClasses";

static TENANT_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9-]{3,63}$").unwrap_or_else(|e| unreachable!("tenant name pattern: {e}"))
});

static IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^((.*?)/(.*?):(.+))$").unwrap_or_else(|e| unreachable!("image pattern: {e}"))
});

/// Default values of the tenant wizard
#[derive(Debug, Clone, Copy, Default)]
pub struct TenantTemplate;

impl WizardTemplate for TenantTemplate {
    fn steps(&self) -> Vec<String> {
        steps::ALL.iter().map(ToString::to_string).collect()
    }

    fn initial_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert(
            steps::NAME_TENANT.to_string(),
            step_fields([
                ("tenantName", ""),
                ("namespace", ""),
                ("selectedStorageClass", ""),
            ]),
        );

        let mut configure = step_fields([
            ("imageName", ""),
            ("imageRegistry", ""),
            ("imageRegistryUsername", ""),
            ("imageRegistryPassword", ""),
            ("logSearchVolumeSize", "5"),
            ("logSearchSizeFactor", "Gi"),
            ("logSearchImage", ""),
            ("kesImage", ""),
            ("logSearchPostgresImage", ""),
            ("logSearchPostgresInitImage", ""),
            ("prometheusVolumeSize", "5"),
            ("prometheusSizeFactor", "Gi"),
            ("logSearchSelectedStorageClass", ""),
            ("prometheusSelectedStorageClass", ""),
            ("prometheusImage", ""),
            ("prometheusSidecarImage", ""),
            ("prometheusInitImage", ""),
        ]);
        for (flag, on) in [
            ("customImage", false),
            ("customDockerhub", false),
            ("exposeMinIO", true),
            ("exposeConsole", true),
            ("logSearchCustom", false),
            ("prometheusCustom", false),
        ] {
            configure.insert(flag.to_string(), FieldValue::Bool(on));
        }
        fields.insert(steps::CONFIGURE.to_string(), configure);

        let mut idp = step_fields([
            ("idpSelection", "Built-in"),
            ("openIDURL", ""),
            ("openIDConfigurationURL", ""),
            ("openIDClientID", ""),
            ("openIDSecretID", ""),
            ("openIDCallbackURL", ""),
            ("openIDClaimName", ""),
            ("openIDScopes", ""),
            ("ADURL", ""),
            ("ADUserNameSearchFilter", ""),
            ("ADGroupSearchBaseDN", ""),
            ("ADGroupSearchFilter", ""),
            ("ADGroupNameAttribute", ""),
            ("ADUserNameFormat", ""),
            ("ADLookupBindDN", ""),
            ("ADLookupBindPassword", ""),
            ("ADUserDNSearchBaseDN", ""),
            ("ADUserDNSearchFilter", ""),
        ]);
        idp.insert(
            "accessKeys".to_string(),
            FieldValue::List(vec![random_string(16)]),
        );
        idp.insert(
            "secretKeys".to_string(),
            FieldValue::List(vec![random_string(32)]),
        );
        idp.insert("ADUserDNs".to_string(), FieldValue::List(vec![String::new()]));
        for flag in ["ADSkipTLS", "ADServerInsecure", "ADServerStartTLS"] {
            idp.insert(flag.to_string(), FieldValue::Bool(false));
        }
        fields.insert(steps::IDENTITY_PROVIDER.to_string(), idp);

        fields.insert(
            steps::SECURITY.to_string(),
            step_fields([
                ("enableAutoCert", true),
                ("enableCustomCerts", false),
                ("enableTLS", true),
            ]),
        );

        let mut encryption = step_fields([
            ("encryptionType", "vault"),
            ("gemaltoEndpoint", ""),
            ("gemaltoToken", ""),
            ("gemaltoDomain", ""),
            ("gemaltoRetry", "0"),
            ("awsEndpoint", ""),
            ("awsRegion", ""),
            ("awsKMSKey", ""),
            ("awsAccessKey", ""),
            ("awsSecretKey", ""),
            ("awsToken", ""),
            ("vaultEndpoint", ""),
            ("vaultEngine", ""),
            ("vaultNamespace", ""),
            ("vaultPrefix", ""),
            ("vaultAppRoleEngine", ""),
            ("vaultId", ""),
            ("vaultSecret", ""),
            ("vaultRetry", "0"),
            ("vaultPing", "0"),
            ("gcpProjectID", ""),
            ("gcpEndpoint", ""),
            ("gcpClientEmail", ""),
            ("gcpClientID", ""),
            ("gcpPrivateKeyID", ""),
            ("gcpPrivateKey", ""),
        ]);
        encryption.insert("enableEncryption".to_string(), FieldValue::Bool(false));
        encryption.insert("enableCustomCertsForKES".to_string(), FieldValue::Bool(false));
        fields.insert(steps::ENCRYPTION.to_string(), encryption);

        fields.insert(
            steps::TENANT_SIZE.to_string(),
            step_fields([
                ("volumeSize", "100"),
                ("sizeFactor", "Gi"),
                ("drivesPerServer", "1"),
                ("nodes", "4"),
                ("memoryNode", "2"),
                ("ecParity", ""),
            ]),
        );

        let mut affinity = step_fields([("nodeSelectorLabels", ""), ("podAffinity", "default")]);
        affinity.insert("withPodAntiAffinity".to_string(), FieldValue::Bool(true));
        fields.insert(steps::AFFINITY.to_string(), affinity);

        fields
    }
}

/// What the backend reported about the typed namespace
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NamespaceStatus {
    /// Nothing typed yet, or a probe is pending
    #[default]
    Loading,
    /// Namespace already hosts a tenant
    Occupied,
    /// Namespace is free; storage classes from its quota
    Available(Vec<String>),
    /// Namespace quota could not be read; it may need to be created
    Missing,
}

impl NamespaceStatus {
    /// Storage classes usable in this namespace
    #[must_use]
    pub fn storage_classes(&self) -> &[String] {
        match self {
            Self::Available(classes) => classes,
            _ => &[],
        }
    }
}

/// Rules of the name step
///
/// The namespace carries a custom error when it already hosts a tenant, or
/// when it is free but offers no storage class.
#[must_use]
pub fn name_tenant_rules(state: &WizardState, namespace: &NamespaceStatus) -> Vec<ValidationRule> {
    let step = steps::NAME_TENANT;
    let (namespace_error, namespace_message) = match namespace {
        NamespaceStatus::Occupied => (true, "tenants:oneTenantPerNamespaceErr"),
        NamespaceStatus::Available(classes) if classes.is_empty() => {
            (true, "tenants:invalidNamespaceErr")
        }
        NamespaceStatus::Missing => (true, "tenants:invalidNamespaceErr"),
        _ => (false, ""),
    };

    vec![
        ValidationRule::new("tenant-name", state.text(step, "tenantName"))
            .required()
            .pattern(&TENANT_NAME, "tenants:nameErr"),
        ValidationRule::new("namespace", state.text(step, "namespace"))
            .required()
            .custom(namespace_error, namespace_message),
    ]
}

/// Name step validity: no rule error and at least one storage class
#[must_use]
pub fn name_tenant_valid(result: &ValidationResult, namespace: &NamespaceStatus) -> bool {
    !result.contains("tenant-name")
        && !result.contains("namespace")
        && !namespace.storage_classes().is_empty()
}

fn positive_int(text: &str) -> bool {
    text.trim().parse::<i64>().is_ok_and(|n| n > 0)
}

/// Rules of the configure step; depend on which customizations are on
#[must_use]
pub fn configure_rules(state: &WizardState) -> Vec<ValidationRule> {
    let step = steps::CONFIGURE;
    let mut rules = Vec::new();

    if state.flag(step, "prometheusCustom") {
        let class = state.text(step, "prometheusSelectedStorageClass");
        let size = state.text(step, "prometheusVolumeSize");
        rules.push(
            ValidationRule::new("prometheus_storage_class", class.as_str())
                .required()
                .custom(class.is_empty(), "tenants:fieldCannotBeEmpty"),
        );
        rules.push(
            ValidationRule::new("prometheus_volume_size", size.as_str())
                .required()
                .custom(!positive_int(&size), "tenants:minVolumeSize"),
        );
    }

    if state.flag(step, "logSearchCustom") {
        let class = state.text(step, "logSearchSelectedStorageClass");
        let size = state.text(step, "logSearchVolumeSize");
        rules.push(
            ValidationRule::new("log_search_storage_class", class.as_str())
                .required()
                .custom(class.is_empty(), "tenants:fieldCannotBeEmpty"),
        );
        rules.push(
            ValidationRule::new("log_search_volume_size", size.as_str())
                .required()
                .custom(!positive_int(&size), "tenants:minVolumeSize"),
        );
    }

    if state.flag(step, "customImage") {
        for (key, field, message) in [
            ("image", "imageName", "tenants:formatPattern"),
            ("logSearchImage", "logSearchImage", "tenants:formatPatternLogSearch"),
            ("kesImage", "kesImage", "tenants:formatPatternKes"),
            (
                "logSearchPostgresImage",
                "logSearchPostgresImage",
                "tenants:formatPatternPostgres",
            ),
            (
                "logSearchPostgresInitImage",
                "logSearchPostgresInitImage",
                "tenants:formatPatternInit",
            ),
            ("prometheusImage", "prometheusImage", "tenants:formatPatternPrometheus"),
            (
                "prometheusSidecarImage",
                "prometheusSidecarImage",
                "tenants:formatPatternSidecar",
            ),
            ("prometheusInitImage", "prometheusInitImage", "tenants:formatPatternInit"),
        ] {
            rules.push(ValidationRule::new(key, state.text(step, field)).pattern(&IMAGE, message));
        }

        if state.flag(step, "customDockerhub") {
            for (key, field) in [
                ("registry", "imageRegistry"),
                ("registryUsername", "imageRegistryUsername"),
                ("registryPassword", "imageRegistryPassword"),
            ] {
                rules.push(ValidationRule::new(key, state.text(step, field)).required());
            }
        }
    }

    rules
}

/// Which certificate list a key pair belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertGroup {
    /// Server certificates
    Minio,
    /// Trusted CAs
    Ca,
    /// CAs trusted by the console pod
    ConsoleCa,
}

/// Slot of a key pair a file is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertSlot {
    /// Private key
    Key,
    /// Certificate
    Cert,
}

/// One uploaded key/certificate pair
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyPair {
    /// Row identifier
    pub id: String,
    /// Key file name
    pub key: String,
    /// Certificate file name
    pub cert: String,
    /// Base64 key content
    pub encoded_key: String,
    /// Base64 certificate content
    pub encoded_cert: String,
}

/// Certificate lists of the security step; each list keeps at least one row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificates {
    next_id: u64,
    minio: Vec<KeyPair>,
    ca: Vec<KeyPair>,
    console_ca: Vec<KeyPair>,
}

impl Default for Certificates {
    fn default() -> Self {
        let mut certs = Self {
            next_id: 0,
            minio: Vec::new(),
            ca: Vec::new(),
            console_ca: Vec::new(),
        };
        for group in [CertGroup::Minio, CertGroup::Ca, CertGroup::ConsoleCa] {
            certs.add(group);
        }
        certs
    }
}

impl Certificates {
    /// Rows of `group`
    #[must_use]
    pub fn list(&self, group: CertGroup) -> &[KeyPair] {
        match group {
            CertGroup::Minio => &self.minio,
            CertGroup::Ca => &self.ca,
            CertGroup::ConsoleCa => &self.console_ca,
        }
    }

    fn list_mut(&mut self, group: CertGroup) -> &mut Vec<KeyPair> {
        match group {
            CertGroup::Minio => &mut self.minio,
            CertGroup::Ca => &mut self.ca,
            CertGroup::ConsoleCa => &mut self.console_ca,
        }
    }

    /// Append an empty row; returns its id
    pub fn add(&mut self, group: CertGroup) -> String {
        self.next_id += 1;
        let id = self.next_id.to_string();
        self.list_mut(group).push(KeyPair {
            id: id.clone(),
            ..KeyPair::default()
        });
        id
    }

    /// Attach a file to one slot of row `id`; false if no such row
    pub fn attach(
        &mut self,
        group: CertGroup,
        id: &str,
        slot: CertSlot,
        file_name: impl Into<String>,
        encoded: impl Into<String>,
    ) -> bool {
        let Some(pair) = self.list_mut(group).iter_mut().find(|p| p.id == id) else {
            return false;
        };
        match slot {
            CertSlot::Key => {
                pair.key = file_name.into();
                pair.encoded_key = encoded.into();
            }
            CertSlot::Cert => {
                pair.cert = file_name.into();
                pair.encoded_cert = encoded.into();
            }
        }
        true
    }

    /// Remove row `id` unless it is the last one in its list
    pub fn remove(&mut self, group: CertGroup, id: &str) -> bool {
        let list = self.list_mut(group);
        if list.len() <= 1 {
            return false;
        }
        let before = list.len();
        list.retain(|p| p.id != id);
        list.len() != before
    }
}

/// The tenant wizard: generic wizard plus certificate lists and the last
/// namespace probe outcome
#[derive(Debug, Clone)]
pub struct TenantWizard {
    wizard: Wizard<TenantTemplate>,
    certificates: Certificates,
    namespace: NamespaceStatus,
    name_errors: ValidationResult,
    configure_errors: ValidationResult,
}

impl Default for TenantWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl TenantWizard {
    /// Fresh wizard on the name step
    #[must_use]
    pub fn new() -> Self {
        let mut tenant = Self {
            wizard: Wizard::new(TenantTemplate),
            certificates: Certificates::default(),
            namespace: NamespaceStatus::default(),
            name_errors: ValidationResult::default(),
            configure_errors: ValidationResult::default(),
        };
        tenant.mark_ruleless_steps_valid();
        tenant
    }

    /// Underlying controller
    #[inline]
    #[must_use]
    pub fn wizard(&self) -> &Wizard<TenantTemplate> {
        &self.wizard
    }

    /// Mutable controller, for navigation
    #[inline]
    pub fn wizard_mut(&mut self) -> &mut Wizard<TenantTemplate> {
        &mut self.wizard
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &WizardState {
        self.wizard.state()
    }

    /// Certificate lists
    #[inline]
    #[must_use]
    pub fn certificates(&self) -> &Certificates {
        &self.certificates
    }

    /// Mutable certificate lists
    #[inline]
    pub fn certificates_mut(&mut self) -> &mut Certificates {
        &mut self.certificates
    }

    /// Last namespace probe outcome
    #[inline]
    #[must_use]
    pub fn namespace_status(&self) -> &NamespaceStatus {
        &self.namespace
    }

    /// Errors shown on the name step
    #[inline]
    #[must_use]
    pub fn name_errors(&self) -> &ValidationResult {
        &self.name_errors
    }

    /// Errors shown on the configure step
    #[inline]
    #[must_use]
    pub fn configure_errors(&self) -> &ValidationResult {
        &self.configure_errors
    }

    /// Set a field and re-run the affected step's validation
    pub fn update_field(&mut self, step: &str, field: &str, value: impl Into<FieldValue>) {
        self.wizard.update_field(step, field, value);
        if step == steps::NAME_TENANT {
            if field == "namespace" {
                self.namespace = NamespaceStatus::Loading;
            }
            self.revalidate_name();
        } else if step == steps::CONFIGURE {
            self.revalidate_configure();
        }
    }

    /// Record a namespace probe outcome
    ///
    /// Publishes the storage classes, preselects the first one, and
    /// re-runs name and configure validation.
    pub fn apply_namespace_status(&mut self, status: NamespaceStatus) {
        let classes = status.storage_classes().to_vec();
        self.wizard.dispatch(&WizardAction::SetOptions {
            name: STORAGE_CLASSES.to_string(),
            options: classes.iter().cloned().map(SelectOption::same).collect(),
        });
        let first = classes.first().cloned().unwrap_or_default();
        self.wizard
            .update_field(steps::NAME_TENANT, "selectedStorageClass", first.as_str());
        self.namespace = status;
        self.sync_configure_storage_classes(&classes, &first);
        self.revalidate_name();
        self.revalidate_configure();
    }

    /// Log search and prometheus fall back to the tenant's storage class
    /// when their current selection is not offered by the namespace
    fn sync_configure_storage_classes(&mut self, classes: &[String], selected: &str) {
        if classes.is_empty() {
            return;
        }
        for field in ["prometheusSelectedStorageClass", "logSearchSelectedStorageClass"] {
            let current = self.state().text(steps::CONFIGURE, field);
            if !classes.contains(&current) {
                self.wizard.update_field(steps::CONFIGURE, field, selected);
            }
        }
    }

    /// Re-run name step rules and record its validity
    pub fn revalidate_name(&mut self) -> bool {
        let result = validate(&name_tenant_rules(self.state(), &self.namespace));
        let valid = name_tenant_valid(&result, &self.namespace);
        self.name_errors = result;
        self.wizard.set_step_valid(steps::NAME_TENANT, valid);
        valid
    }

    /// Re-run configure step rules and record its validity
    pub fn revalidate_configure(&mut self) -> bool {
        let result = validate(&configure_rules(self.state()));
        let valid = result.is_valid();
        self.configure_errors = result;
        self.wizard.set_step_valid(steps::CONFIGURE, valid);
        valid
    }

    /// Back to defaults: fresh credentials, one empty row per certificate
    /// list, only the steps without rules valid
    pub fn reset(&mut self) {
        self.wizard.reset();
        self.certificates = Certificates::default();
        self.namespace = NamespaceStatus::default();
        self.name_errors = ValidationResult::default();
        self.configure_errors = ValidationResult::default();
        self.mark_ruleless_steps_valid();
    }

    fn mark_ruleless_steps_valid(&mut self) {
        for step in steps::WITHOUT_RULES {
            self.wizard.set_step_valid(step, true);
        }
    }
}
