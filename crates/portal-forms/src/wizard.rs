//! Form field store and wizard controller
//!
//! The wizard state is an immutable value. [`reduce`] applies one
//! [`WizardAction`] and returns the next state; `im` persistent maps keep
//! every untouched step shared with the previous state, so a front-end can
//! skip re-rendering steps whose maps are pointer-equal.
//!
//! [`Wizard`] wraps the reducer with step navigation. It never advances on
//! its own: it only reports whether advancing is permitted and refuses
//! navigation past a step that has not passed validation.

use crate::error::WizardError;
use crate::field::{FieldValue, SelectOption};
use im::{OrdMap, OrdSet};

/// Fields of one step: field name → value
pub type StepFields = OrdMap<String, FieldValue>;
/// All fields: step name → step fields
pub type Fields = OrdMap<String, StepFields>;

/// Snapshot of a wizard in progress
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WizardState {
    /// Index of the displayed step
    pub current_step: usize,
    /// Steps whose last validation passed
    pub valid_steps: OrdSet<String>,
    /// Field values
    pub fields: Fields,
    /// Advanced mode exposes the optional steps
    pub advanced_mode: bool,
    /// Options supplied by collaborators for select inputs, by name
    pub options: OrdMap<String, Vec<SelectOption>>,
}

impl WizardState {
    /// Fresh state with the given default field values
    #[must_use]
    pub fn new(fields: Fields) -> Self {
        Self {
            fields,
            ..Self::default()
        }
    }

    /// Value of (step, field)
    #[inline]
    #[must_use]
    pub fn field(&self, step: &str, field: &str) -> Option<&FieldValue> {
        self.fields.get(step).and_then(|s| s.get(field))
    }

    /// Text of (step, field); missing or non-text reads as empty
    #[must_use]
    pub fn text(&self, step: &str, field: &str) -> String {
        self.field(step, field)
            .map(FieldValue::as_text)
            .unwrap_or_default()
    }

    /// Boolean of (step, field); missing reads as `false`
    #[inline]
    #[must_use]
    pub fn flag(&self, step: &str, field: &str) -> bool {
        self.field(step, field).is_some_and(FieldValue::as_bool)
    }

    /// Whether `step` passed validation
    #[inline]
    #[must_use]
    pub fn is_step_valid(&self, step: &str) -> bool {
        self.valid_steps.contains(step)
    }

    /// Options published under `name`
    #[must_use]
    pub fn options(&self, name: &str) -> &[SelectOption] {
        self.options.get(name).map_or(&[], Vec::as_slice)
    }
}

/// State transitions of the wizard
#[derive(Debug, Clone, PartialEq)]
pub enum WizardAction {
    /// Show step `index`
    SetCurrentStep(usize),
    /// Toggle advanced mode
    SetAdvancedMode(bool),
    /// Replace one field value
    UpdateField {
        /// Step name
        step: String,
        /// Field name
        field: String,
        /// New value
        value: FieldValue,
    },
    /// Record the outcome of a step's validation
    SetStepValid {
        /// Step name
        step: String,
        /// Validation outcome
        valid: bool,
    },
    /// Publish options for a select input
    SetOptions {
        /// Option list name, e.g. `storageClasses`
        name: String,
        /// Options
        options: Vec<SelectOption>,
    },
}

impl WizardAction {
    /// Shorthand for [`WizardAction::UpdateField`]
    #[must_use]
    pub fn update(step: &str, field: &str, value: impl Into<FieldValue>) -> Self {
        Self::UpdateField {
            step: step.to_string(),
            field: field.to_string(),
            value: value.into(),
        }
    }

    /// Shorthand for [`WizardAction::SetStepValid`]
    #[must_use]
    pub fn step_valid(step: &str, valid: bool) -> Self {
        Self::SetStepValid {
            step: step.to_string(),
            valid,
        }
    }
}

/// Apply `action` to `state`
///
/// Pure. Updating a (step, field) pair that does not exist leaves the state
/// unchanged, as does any action whose outcome is already reflected.
#[must_use]
pub fn reduce(state: &WizardState, action: &WizardAction) -> WizardState {
    match action {
        WizardAction::SetCurrentStep(index) => WizardState {
            current_step: *index,
            ..state.clone()
        },
        WizardAction::SetAdvancedMode(on) => WizardState {
            advanced_mode: *on,
            ..state.clone()
        },
        WizardAction::UpdateField { step, field, value } => {
            let Some(step_fields) = state.fields.get(step) else {
                tracing::debug!(%step, %field, "update for unknown step ignored");
                return state.clone();
            };
            match step_fields.get(field) {
                None => {
                    tracing::debug!(%step, %field, "update for unknown field ignored");
                    state.clone()
                }
                Some(current) if current == value => state.clone(),
                Some(_) => {
                    let mut step_fields = step_fields.clone();
                    step_fields.insert(field.clone(), value.clone());
                    let mut fields = state.fields.clone();
                    fields.insert(step.clone(), step_fields);
                    WizardState {
                        fields,
                        ..state.clone()
                    }
                }
            }
        }
        WizardAction::SetStepValid { step, valid } => {
            if state.valid_steps.contains(step) == *valid {
                return state.clone();
            }
            let mut valid_steps = state.valid_steps.clone();
            if *valid {
                valid_steps.insert(step.clone());
            } else {
                valid_steps.remove(step);
            }
            WizardState {
                valid_steps,
                ..state.clone()
            }
        }
        WizardAction::SetOptions { name, options } => {
            let mut all = state.options.clone();
            all.insert(name.clone(), options.clone());
            WizardState {
                options: all,
                ..state.clone()
            }
        }
    }
}

/// Shape of a concrete wizard: its ordered steps and default values
pub trait WizardTemplate {
    /// Step names, in display order
    fn steps(&self) -> Vec<String>;

    /// Default field values; called on creation and on every reset, so
    /// generated defaults (credentials) are regenerated each time
    fn initial_fields(&self) -> Fields;
}

/// Wizard controller: reducer state plus validity-gated navigation
#[derive(Debug, Clone)]
pub struct Wizard<T: WizardTemplate> {
    template: T,
    steps: Vec<String>,
    state: WizardState,
    gating: bool,
}

impl<T: WizardTemplate> Wizard<T> {
    /// Start a wizard with validity gating enabled
    #[must_use]
    pub fn new(template: T) -> Self {
        let steps = template.steps();
        let state = WizardState::new(template.initial_fields());
        Self {
            template,
            steps,
            state,
            gating: true,
        }
    }

    /// Allow navigation regardless of step validity
    #[inline]
    #[must_use]
    pub fn without_gating(mut self) -> Self {
        self.gating = false;
        self
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> &WizardState {
        &self.state
    }

    /// Template backing this wizard
    #[inline]
    #[must_use]
    pub fn template(&self) -> &T {
        &self.template
    }

    /// Ordered step names
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    /// Name of the displayed step
    #[must_use]
    pub fn current_step_name(&self) -> Option<&str> {
        self.steps.get(self.state.current_step).map(String::as_str)
    }

    /// Apply an action and return the new state
    pub fn dispatch(&mut self, action: &WizardAction) -> &WizardState {
        self.state = reduce(&self.state, action);
        &self.state
    }

    /// Replace one field value
    pub fn update_field(
        &mut self,
        step: &str,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> &WizardState {
        self.dispatch(&WizardAction::update(step, field, value))
    }

    /// Record a step's validation outcome
    pub fn set_step_valid(&mut self, step: &str, valid: bool) -> &WizardState {
        if self.state.is_step_valid(step) != valid {
            tracing::debug!(%step, valid, "step validity changed");
        }
        self.dispatch(&WizardAction::step_valid(step, valid))
    }

    /// Whether the user may move past `step`
    #[inline]
    #[must_use]
    pub fn can_advance(&self, step: &str) -> bool {
        !self.gating || self.state.is_step_valid(step)
    }

    /// All steps passed validation
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| self.state.is_step_valid(s))
    }

    /// Move to the next step
    ///
    /// # Errors
    /// - `WizardError::OutOfRange` on the last step
    /// - `WizardError::StepNotValid` if the current step has not passed
    pub fn advance(&mut self) -> Result<usize, WizardError> {
        let next = self.state.current_step + 1;
        self.go_to(next)
    }

    /// Move to the previous step; never gated
    ///
    /// # Errors
    /// `WizardError::OutOfRange` on the first step
    pub fn back(&mut self) -> Result<usize, WizardError> {
        let current = self.state.current_step;
        if current == 0 {
            return Err(WizardError::OutOfRange {
                index: 0,
                len: self.steps.len(),
            });
        }
        self.go_to(current - 1)
    }

    /// Jump to step `index`
    ///
    /// Moving backwards is always allowed. Moving forward requires every
    /// step before `index` to be valid when gating is on.
    ///
    /// # Errors
    /// - `WizardError::OutOfRange` if `index` is not a step
    /// - `WizardError::StepNotValid` naming the first blocking step
    pub fn go_to(&mut self, index: usize) -> Result<usize, WizardError> {
        if index >= self.steps.len() {
            return Err(WizardError::OutOfRange {
                index,
                len: self.steps.len(),
            });
        }
        if index > self.state.current_step {
            if let Some(blocking) = self.steps[..index]
                .iter()
                .find(|s| !self.can_advance(s))
            {
                return Err(WizardError::StepNotValid(blocking.clone()));
            }
        }
        self.dispatch(&WizardAction::SetCurrentStep(index));
        Ok(index)
    }

    /// Index of a named step
    ///
    /// # Errors
    /// `WizardError::UnknownStep`
    pub fn step_index(&self, step: &str) -> Result<usize, WizardError> {
        self.steps
            .iter()
            .position(|s| s == step)
            .ok_or_else(|| WizardError::UnknownStep(step.to_string()))
    }

    /// Discard all input and return to the template defaults
    pub fn reset(&mut self) {
        tracing::info!("wizard reset");
        self.state = WizardState::new(self.template.initial_fields());
    }
}

/// Build a [`StepFields`] map from `(name, value)` pairs
#[must_use]
pub fn step_fields<I, K, V>(pairs: I) -> StepFields
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<FieldValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
