//! Form state controller: values, touched flags, errors and submission.
//!
//! # Design
//! `FormState` owns a `Validator` and the three maps it drives. Changing a
//! field revalidates only that field; submitting revalidates all of them and
//! replaces the error map wholesale. Submission is split into
//! `begin_submit` / `finish_submit` so a host that awaits the network in
//! between still sees the form as `Busy` and cannot submit twice.

use std::collections::BTreeMap;

use crate::validate::{FormValues, Validator};

/// Field name → error message. A missing key means the field is valid.
pub type FormErrors = BTreeMap<String, String>;

/// Result of a submit attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome<R> {
    /// At least one field failed validation; the callback did not run.
    Invalid,
    /// A previous submission has not settled yet.
    Busy,
    Submitted(R),
}

impl<R> SubmitOutcome<R> {
    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted(_))
    }

    fn skip<U>(self) -> SubmitOutcome<U> {
        match self {
            SubmitOutcome::Invalid => SubmitOutcome::Invalid,
            _ => SubmitOutcome::Busy,
        }
    }
}

/// Passed to the submit callback so it can ask for the form to be cleared
/// once it returns.
#[derive(Debug, Default)]
pub struct ResetHandle {
    requested: bool,
}

impl ResetHandle {
    pub fn reset(&mut self) {
        self.requested = true;
    }
}

/// A bound input: the field's name and current value, plus its change
/// handler.
#[derive(Debug)]
pub struct FieldBinding<'a> {
    form: &'a mut FormState,
    name: String,
}

impl FieldBinding<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        self.form.value(&self.name)
    }

    pub fn on_change(&mut self, value: impl Into<String>) {
        self.form.change(&self.name, value);
    }
}

#[derive(Debug, Clone)]
pub struct FormState {
    validator: Validator,
    initial: FormValues,
    values: FormValues,
    errors: FormErrors,
    touched: BTreeMap<String, bool>,
    attempted: bool,
    submitting: bool,
}

impl FormState {
    pub fn new(validator: Validator, initial: FormValues) -> Self {
        Self {
            validator,
            values: initial.clone(),
            initial,
            errors: FormErrors::new(),
            touched: BTreeMap::new(),
            attempted: false,
            submitting: false,
        }
    }

    /// Form whose initial values are empty strings for every validated field.
    pub fn blank(validator: Validator) -> Self {
        let initial = validator.blank_values();
        Self::new(validator, initial)
    }

    pub fn register(&mut self, field: &str) -> FieldBinding<'_> {
        FieldBinding {
            name: field.to_string(),
            form: self,
        }
    }

    /// Record a new value for `field`, mark it touched and revalidate it
    /// along with every field that must match it.
    pub fn change(&mut self, field: &str, value: impl Into<String>) {
        self.values.insert(field.to_string(), value.into());
        self.touched.insert(field.to_string(), true);
        let dependents: Vec<String> = self
            .validator
            .rules()
            .iter()
            .filter(|rule| rule.must_match.as_deref() == Some(field))
            .map(|rule| rule.name.clone())
            .collect();
        self.revalidate(field);
        for name in &dependents {
            self.revalidate(name);
        }
    }

    fn revalidate(&mut self, field: &str) {
        let message = self.validator.validate(field, &self.values);
        if message.is_empty() {
            self.errors.remove(field);
        } else {
            self.errors.insert(field.to_string(), message);
        }
    }

    /// Replace values without marking anything touched, e.g. to prefill an
    /// edit form from the server.
    pub fn set_values(&mut self, values: FormValues) {
        for (field, value) in values {
            self.errors.remove(&field);
            self.values.insert(field, value);
        }
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn value(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    /// The error for `field` if the user should see it: only once the field
    /// has been touched or a submit has been attempted.
    pub fn visible_error(&self, field: &str) -> Option<&str> {
        if self.attempted || self.is_touched(field) {
            self.error(field)
        } else {
            None
        }
    }

    pub fn is_touched(&self, field: &str) -> bool {
        self.touched.get(field).copied().unwrap_or(false)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn submit_attempted(&self) -> bool {
        self.attempted
    }

    /// Validate every field regardless of touched state.
    pub fn validate_all(&self) -> FormErrors {
        self.values
            .keys()
            .filter_map(|field| {
                let message = self.validator.validate(field, &self.values);
                (!message.is_empty()).then(|| (field.clone(), message))
            })
            .collect()
    }

    /// Validate everything and, if clean, enter the submitting state and hand
    /// back a snapshot of the values. Call `finish_submit` once the request
    /// has settled.
    pub fn begin_submit(&mut self) -> SubmitOutcome<FormValues> {
        if self.submitting {
            return SubmitOutcome::Busy;
        }
        self.attempted = true;
        self.errors = self.validate_all();
        if !self.errors.is_empty() {
            return SubmitOutcome::Invalid;
        }
        self.submitting = true;
        SubmitOutcome::Submitted(self.values.clone())
    }

    pub fn finish_submit(&mut self) {
        self.submitting = false;
    }

    /// Validate and, if there are no errors, run `on_submit` with the values
    /// and a reset handle.
    pub fn handle_submit<R>(
        &mut self,
        on_submit: impl FnOnce(&FormValues, &mut ResetHandle) -> R,
    ) -> SubmitOutcome<R> {
        let values = match self.begin_submit() {
            SubmitOutcome::Submitted(values) => values,
            other => return other.skip(),
        };
        let mut handle = ResetHandle::default();
        let result = on_submit(&values, &mut handle);
        self.finish_submit();
        if handle.requested {
            self.reset();
        }
        SubmitOutcome::Submitted(result)
    }

    /// Back to the initial values with no errors and nothing touched.
    pub fn reset(&mut self) {
        self.values = self.initial.clone();
        self.errors.clear();
        self.touched.clear();
        self.attempted = false;
        self.submitting = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::LengthBounds;

    fn book_form() -> FormState {
        FormState::blank(Validator::book(LengthBounds::default()))
    }

    fn fill_valid_book(form: &mut FormState) {
        form.change("title", "Dune");
        form.change("author", "Frank Herbert");
        form.change("genre", "Sci-fi");
        form.change("date", "1965-08-01");
        form.change("summary", "A desert planet and its spice.");
    }

    #[test]
    fn register_binds_name_and_value() {
        let mut form = book_form();
        let mut binding = form.register("title");
        assert_eq!(binding.name(), "title");
        assert_eq!(binding.value(), "");
        binding.on_change("Dune");
        assert_eq!(binding.value(), "Dune");
        assert!(form.is_touched("title"));
    }

    #[test]
    fn register_unknown_field_does_not_fail() {
        let mut form = book_form();
        assert_eq!(form.register("subtitle").value(), "");
        form.register("subtitle").on_change("x");
        assert_eq!(form.value("subtitle"), "x");
        assert!(form.error("subtitle").is_none());
    }

    #[test]
    fn change_tracks_error_but_hides_untouched() {
        let mut form = book_form();
        form.change("title", " ");
        assert_eq!(form.visible_error("title"), Some("Title is required."));
        assert_eq!(form.visible_error("author"), None);

        form.change("title", "Dune");
        assert_eq!(form.error("title"), None);
    }

    #[test]
    fn submit_with_errors_skips_callback_and_shows_all_errors() {
        let mut form = book_form();
        let mut called = false;
        let outcome = form.handle_submit(|_, _| called = true);

        assert_eq!(outcome, SubmitOutcome::Invalid);
        assert!(!called);
        assert!(form.submit_attempted());
        assert_eq!(form.visible_error("author"), Some("Author is required."));
        assert!(!form.errors().contains_key("imageUrl"));
    }

    #[test]
    fn submit_is_idempotent_without_changes() {
        let mut form = book_form();
        form.change("title", "Dune");
        form.handle_submit(|_, _| ());
        let first = form.errors().clone();
        form.handle_submit(|_, _| ());
        assert_eq!(form.errors(), &first);
    }

    #[test]
    fn submit_runs_callback_when_valid() {
        let mut form = book_form();
        fill_valid_book(&mut form);
        let outcome = form.handle_submit(|values, _| values["title"].clone());
        assert_eq!(outcome, SubmitOutcome::Submitted("Dune".to_string()));
        assert!(!form.is_submitting());
        assert_eq!(form.value("title"), "Dune");
    }

    #[test]
    fn reset_handle_clears_form_after_callback() {
        let mut form = book_form();
        fill_valid_book(&mut form);
        form.handle_submit(|_, reset| reset.reset());
        assert_eq!(form.value("title"), "");
        assert!(!form.is_touched("title"));
    }

    #[test]
    fn second_submit_while_in_flight_is_busy() {
        let mut form = book_form();
        fill_valid_book(&mut form);
        assert!(form.begin_submit().is_submitted());
        assert!(form.is_submitting());

        let mut called = false;
        assert_eq!(form.handle_submit(|_, _| called = true), SubmitOutcome::Busy);
        assert!(!called);

        form.finish_submit();
        assert!(form.handle_submit(|_, _| ()).is_submitted());
    }

    #[test]
    fn reset_restores_initial_state() {
        let initial: FormValues = [("comment".to_string(), "draft".to_string())].into();
        let mut form = FormState::new(Validator::comment(), initial.clone());
        form.change("comment", "");
        form.handle_submit(|_, _| ());
        form.reset();

        assert_eq!(form.values(), &initial);
        assert!(form.errors().is_empty());
        assert!(!form.is_touched("comment"));
        assert!(!form.submit_attempted());
        assert!(!form.is_submitting());
    }

    #[test]
    fn set_values_prefills_without_touching() {
        let mut form = book_form();
        form.handle_submit(|_, _| ());
        form.set_values([("title".to_string(), "Emma".to_string())].into());
        assert_eq!(form.value("title"), "Emma");
        assert!(!form.is_touched("title"));
        assert_eq!(form.error("title"), None);
    }

    #[test]
    fn confirm_mismatch_independent_of_change_order() {
        let mut form = FormState::blank(Validator::register());
        form.change("confirmPassword", "abc");
        form.change("password", "abd");
        let errors = form.validate_all();
        assert_eq!(errors.get("confirmPassword").map(String::as_str), Some("Passwords do not match."));
    }

    #[test]
    fn confirm_error_clears_when_password_catches_up() {
        let mut form = FormState::blank(Validator::register());
        form.change("confirmPassword", "abc");
        assert_eq!(form.visible_error("confirmPassword"), Some("Passwords do not match."));

        form.change("password", "abc");
        assert_eq!(form.visible_error("confirmPassword"), None);
    }

    #[test]
    fn confirm_error_appears_when_password_diverges() {
        let mut form = FormState::blank(Validator::register());
        form.change("password", "abc");
        form.change("confirmPassword", "abc");
        assert_eq!(form.visible_error("confirmPassword"), None);

        form.change("password", "abd");
        assert_eq!(form.visible_error("confirmPassword"), Some("Passwords do not match."));
        assert_eq!(form.visible_error("password"), None);
    }

    #[test]
    fn untouched_confirm_error_stays_hidden() {
        let mut form = FormState::blank(Validator::register());
        form.change("password", "abc");
        assert_eq!(form.visible_error("confirmPassword"), None);
        assert!(form.errors().contains_key("confirmPassword"));
    }
}
