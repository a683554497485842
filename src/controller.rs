//! The page-interaction controller: the behavior the drink page wires
//! up at load time. Bindings intercept the drink form, route the reset
//! form through a confirm prompt, and keep Enter from implicitly
//! submitting; the operations below are what those bindings (and the
//! page's inline `onclick` buttons) invoke.

use crate::dom::NodeId;
use crate::page::{EventState, Page};
use crate::{Error, Result};

pub const RESET_CONFIRM_PROMPT: &str = "Möchten Sie wirklich alle Getränke zurücksetzen?";

const DRINK_FORM: &str = "#drink-form";
const SELECTED_DRINK: &str = "#selected-drink";
const RESET_FORM: &str = "#reset-form";
const MAIN_CONTENT: &str = "#main-content";
const LOADING_SPINNER: &str = "#loading-spinner";
const CUSTOM_DRINK: &str = "#custom-drink";
const ANY_INPUT: &str = "input";

/// Controller event bindings. These stand in for the page script's
/// listener callbacks; [`run_binding`] is the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Binding {
    /// Drink form `submit`: suppress the native submission and go
    /// through [`Page::select_drink`] with the current input value.
    InterceptDrinkForm,
    /// Reset form `submit`: route through [`Page::confirm_reset`].
    ConfirmReset,
    /// Input `keypress`: cancel the default for `"Enter"` only, so a
    /// stray Enter never submits a form implicitly.
    SuppressEnterKey,
}

pub(crate) fn run_binding(page: &mut Page, binding: Binding, event: &mut EventState) -> Result<()> {
    match binding {
        Binding::InterceptDrinkForm => {
            event.prevent_default();
            let drink = page.value(SELECTED_DRINK)?;
            page.select_drink(&drink)
        }
        Binding::ConfirmReset => page.confirm_reset(event),
        Binding::SuppressEnterKey => {
            if event.key() == Some("Enter") {
                event.prevent_default();
            }
            Ok(())
        }
    }
}

impl Page {
    /// Element lookup with the controller's precondition reporting: a
    /// missing element is a page configuration error, not a silent
    /// handler crash.
    fn require(&self, selector: &str) -> Result<NodeId> {
        self.select_one(selector).map_err(|_| Error::MissingPageElement {
            selector: selector.to_string(),
        })
    }

    /// Binds the controller to the page, the counterpart of the
    /// original script running at load. All elements the controller
    /// touches are checked up front.
    pub fn install_drink_controller(&mut self) -> Result<()> {
        let drink_form = self.require(DRINK_FORM)?;
        self.require(SELECTED_DRINK)?;
        let reset_form = self.require(RESET_FORM)?;
        self.require(MAIN_CONTENT)?;
        self.require(LOADING_SPINNER)?;
        self.require(CUSTOM_DRINK)?;
        let first_input = self.require(ANY_INPUT)?;

        self.add_listener(drink_form, "submit", Binding::InterceptDrinkForm);
        self.add_listener(reset_form, "submit", Binding::ConfirmReset);
        self.add_listener(first_input, "keypress", Binding::SuppressEnterKey);
        Ok(())
    }

    /// Writes the chosen drink into the hidden input and submits the
    /// drink form natively, without re-dispatching `submit` (matching
    /// JS `form.submit()`, which bypasses submit handlers).
    pub fn select_drink(&mut self, drink: &str) -> Result<()> {
        let input = self.require(SELECTED_DRINK)?;
        let form = self.require(DRINK_FORM)?;
        self.dom_mut().set_value(input, drink)?;
        self.submit_form_natively(form)
    }

    /// Hides the main content and shows the loading spinner.
    /// Idempotent: the post-state does not depend on the prior one.
    pub fn show_loading(&mut self) -> Result<()> {
        let main_content = self.require(MAIN_CONTENT)?;
        let spinner = self.require(LOADING_SPINNER)?;
        self.dom_mut().style_set(main_content, "display", "none")?;
        self.dom_mut().style_set(spinner, "display", "block")?;
        Ok(())
    }

    /// Asks the user whether to reset all drinks. Accepting shows the
    /// loading state and lets the reset submission proceed; declining
    /// cancels the submission and leaves the page untouched.
    pub fn confirm_reset(&mut self, event: &mut EventState) -> Result<()> {
        if self.confirm(RESET_CONFIRM_PROMPT) {
            self.show_loading()
        } else {
            event.prevent_default();
            Ok(())
        }
    }

    /// Full-page navigation to the history page.
    pub fn show_history(&mut self) -> Result<()> {
        self.navigate("/history")
    }

    /// Flips the custom-drink form between hidden and shown. The check
    /// reads the element's inline `display` declaration, as the
    /// original page did; a stylesheet-driven `display` would not be
    /// seen here.
    pub fn toggle_custom_form(&mut self) -> Result<()> {
        let custom = self.require(CUSTOM_DRINK)?;
        let current = self.dom().style_get(custom, "display")?;
        let next = if current == "none" { "block" } else { "none" };
        self.dom_mut().style_set(custom, "display", next)?;
        Ok(())
    }
}
