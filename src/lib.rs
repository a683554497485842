//! Deterministic headless harness for the drink-selection page.
//!
//! The crate models the page as an in-memory DOM tree, dispatches user
//! events through it synchronously, and runs the page-interaction
//! controller (drink submission, reset confirmation, custom-drink form
//! toggle, history navigation) as native Rust. Outward effects that a
//! real browser would perform — form submissions, full-page
//! navigations, modal confirm prompts — are recorded on the [`Page`]
//! instead, so tests can assert them deterministically.
//!
//! ```
//! use drink_page::{Page, Result};
//!
//! fn main() -> Result<()> {
//!     let mut page = Page::from_html(
//!         r#"
//!         <form id='drink-form' action='/add_drink' method='post'>
//!           <input id='selected-drink' name='drink' value=''>
//!         </form>
//!         <form id='reset-form' action='/history/reset'></form>
//!         <div id='main-content'></div>
//!         <div id='loading-spinner' style='display: none;'></div>
//!         <div id='custom-drink' style='display: none;'></div>
//!         "#,
//!     )?;
//!     page.install_drink_controller()?;
//!     page.select_drink("Weizenbier")?;
//!     page.assert_value("#selected-drink", "Weizenbier")?;
//!     assert_eq!(page.form_submissions().len(), 1);
//!     Ok(())
//! }
//! ```

use std::error::Error as StdError;
use std::fmt;

mod controller;
mod dom;
mod html;
mod location;
mod page;
mod selector;

pub use controller::RESET_CONFIRM_PROMPT;
pub use location::LocationParts;
pub use page::{EventState, FormSubmission, KeyName, Navigation, Page};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    SelectorNotFound(String),
    UnsupportedSelector(String),
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    /// A controller-required element is absent from the page. Raised
    /// up front by [`Page::install_drink_controller`] so a broken page
    /// surfaces as a configuration error instead of a dead handler.
    MissingPageElement {
        selector: String,
    },
    Dom(String),
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::TypeMismatch {
                selector,
                expected,
                actual,
            } => write!(
                f,
                "type mismatch for {selector}: expected {expected}, actual {actual}"
            ),
            Self::MissingPageElement { selector } => {
                write!(f, "page is missing required element: {selector}")
            }
            Self::Dom(msg) => write!(f, "dom error: {msg}"),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}"
            ),
        }
    }
}

impl StdError for Error {}
