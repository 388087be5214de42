use tracing::warn;

use crate::app::Library;
use crate::form::FormState;
use crate::http::Transport;
use crate::session::KeyValueStore;
use crate::validate::{FormValues, Validator};
use crate::views::{submit_outcome, Outcome, Route};

fn field<'a>(values: &'a FormValues, name: &str) -> &'a str {
    values.get(name).map(String::as_str).unwrap_or("")
}

#[derive(Debug)]
pub struct LoginView {
    pub form: FormState,
}

impl Default for LoginView {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginView {
    pub fn new() -> Self {
        Self {
            form: FormState::blank(Validator::login()),
        }
    }

    pub fn submit<T: Transport, S: KeyValueStore>(&mut self, lib: &mut Library<T, S>) -> Outcome {
        let outcome = self.form.handle_submit(|values, _| {
            lib.auth_mut()
                .login(field(values, "email"), field(values, "password"))
                .map(|_| ())
        });
        submit_outcome(outcome, Route::Home, Route::Login)
    }
}

#[derive(Debug)]
pub struct RegisterView {
    pub form: FormState,
}

impl Default for RegisterView {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterView {
    pub fn new() -> Self {
        Self {
            form: FormState::blank(Validator::register()),
        }
    }

    pub fn submit<T: Transport, S: KeyValueStore>(&mut self, lib: &mut Library<T, S>) -> Outcome {
        let outcome = self.form.handle_submit(|values, _| {
            lib.auth_mut()
                .register(
                    field(values, "username"),
                    field(values, "email"),
                    field(values, "password"),
                )
                .map(|_| ())
        });
        submit_outcome(outcome, Route::Home, Route::Register)
    }
}

/// Sign out and go home. A failed server notification is only logged: the
/// local session is gone either way.
pub fn logout<T: Transport, S: KeyValueStore>(lib: &mut Library<T, S>) -> Outcome {
    if let Err(e) = lib.auth_mut().logout() {
        warn!(error = %e, "logout completed locally only");
    }
    Outcome::Navigate(Route::Home)
}
