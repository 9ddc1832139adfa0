//! Property tests for validation and the wizard reducer

use portal_forms::tenant::TenantTemplate;
use portal_forms::{reduce, validate, ValidationRule, WizardAction, WizardState, WizardTemplate};
use proptest::prelude::*;
use regex::Regex;

fn rule_strategy() -> impl Strategy<Value = (String, String, bool, bool)> {
    (
        prop::sample::select(vec!["name", "namespace", "image", "size"]),
        ".{0,12}",
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(key, value, required, custom)| (key.to_string(), value, required, custom))
}

fn build_rules(specs: &[(String, String, bool, bool)], pattern: &Regex) -> Vec<ValidationRule> {
    specs
        .iter()
        .map(|(key, value, required, custom)| {
            let mut rule = ValidationRule::new(key.as_str(), value.as_str())
                .pattern(pattern, "errors:invalidFormat")
                .custom(*custom, "tenants:fieldCannotBeEmpty");
            if *required {
                rule = rule.required();
            }
            rule
        })
        .collect()
}

fn field_keys(state: &WizardState) -> Vec<(String, String)> {
    state
        .fields
        .iter()
        .flat_map(|(step, fields)| fields.keys().map(move |f| (step.clone(), f.clone())))
        .collect()
}

proptest! {
    #[test]
    fn validate_is_idempotent(specs in prop::collection::vec(rule_strategy(), 0..8)) {
        let pattern = Regex::new(r"^[a-z0-9-]{3,63}$").unwrap();
        let rules = build_rules(&specs, &pattern);
        prop_assert_eq!(validate(&rules), validate(&rules));
    }

    #[test]
    fn validation_errors_only_name_rule_keys(specs in prop::collection::vec(rule_strategy(), 0..8)) {
        let pattern = Regex::new(r"^[a-z]+$").unwrap();
        let rules = build_rules(&specs, &pattern);
        let result = validate(&rules);
        for (key, _) in result.iter() {
            prop_assert!(specs.iter().any(|(k, ..)| k == key));
        }
    }

    #[test]
    fn set_step_valid_is_idempotent(step in "[a-zA-Z]{1,12}", valid in any::<bool>()) {
        let state = WizardState::new(TenantTemplate.initial_fields());
        let action = WizardAction::step_valid(&step, valid);
        let once = reduce(&state, &action);
        let twice = reduce(&once, &action);
        prop_assert_eq!(&once, &twice);
        prop_assert_eq!(once.is_step_valid(&step), valid);
    }

    #[test]
    fn update_touches_only_target(index in any::<prop::sample::Index>(), value in ".{0,16}") {
        let state = WizardState::new(TenantTemplate.initial_fields());
        let keys = field_keys(&state);
        let (step, field) = index.get(&keys).clone();
        let next = reduce(&state, &WizardAction::update(&step, &field, value.as_str()));

        prop_assert_eq!(next.text(&step, &field), value);
        for (s, f) in &keys {
            if (s, f) != (&step, &field) {
                prop_assert_eq!(next.field(s, f), state.field(s, f));
            }
        }
    }

    #[test]
    fn update_unknown_pair_is_noop(step in "[a-z]{1,8}", field in "[a-z]{1,8}") {
        let state = WizardState::new(TenantTemplate.initial_fields());
        prop_assume!(state.field(&step, &field).is_none());
        let next = reduce(&state, &WizardAction::update(&step, &field, "x"));
        prop_assert_eq!(next, state);
    }
}
