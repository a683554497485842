use std::collections::{HashMap, VecDeque};

use crate::controller::Binding;
use crate::dom::{Dom, NodeId};
use crate::html::parse_html;
use crate::location::LocationParts;
use crate::selector::{select_all, select_one};
use crate::{Error, Result};

const DEFAULT_PAGE_URL: &str = "http://localhost/";

/// A key value as carried by keyboard events, matching the DOM
/// `KeyboardEvent.key` names (`"Enter"`, `"a"`, `"Tab"`, ...).
pub type KeyName = str;

/// Recorded outcome of a form submission the page allowed to proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSubmission {
    pub form_id: Option<String>,
    pub action: String,
    pub method: String,
    pub fields: Vec<(String, String)>,
}

/// Recorded full-page navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub from: String,
    pub to: String,
}

/// Synchronous event being dispatched through the page. Handlers may
/// cancel the default action, as in the DOM.
#[derive(Debug, Clone)]
pub struct EventState {
    event_type: String,
    pub(crate) target: NodeId,
    key: Option<String>,
    default_prevented: bool,
}

impl EventState {
    pub(crate) fn new(event_type: &str, target: NodeId) -> Self {
        Self {
            event_type: event_type.to_string(),
            target,
            key: None,
            default_prevented: false,
        }
    }

    pub(crate) fn with_key(event_type: &str, target: NodeId, key: &str) -> Self {
        let mut event = Self::new(event_type, target);
        event.key = Some(key.to_string());
        event
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

#[derive(Debug, Default, Clone)]
struct ListenerStore {
    map: HashMap<NodeId, HashMap<String, Vec<Binding>>>,
}

impl ListenerStore {
    fn add(&mut self, node_id: NodeId, event: &str, binding: Binding) {
        let listeners = self
            .map
            .entry(node_id)
            .or_default()
            .entry(event.to_string())
            .or_default();

        // Match browser semantics: re-registering the same handler for
        // the same event type is a no-op.
        if listeners.contains(&binding) {
            return;
        }

        listeners.push(binding);
    }

    fn get(&self, node_id: NodeId, event: &str) -> Vec<Binding> {
        self.map
            .get(&node_id)
            .and_then(|events| events.get(event))
            .cloned()
            .unwrap_or_default()
    }
}

/// Headless rendition of the drink-selection page: the parsed DOM, the
/// controller's event bindings, and recorded side effects that a real
/// browser would carry out (submissions, navigations, confirm prompts).
#[derive(Debug)]
pub struct Page {
    dom: Dom,
    listeners: ListenerStore,
    location: LocationParts,
    confirm_responses: VecDeque<bool>,
    default_confirm_response: bool,
    confirm_prompts: Vec<String>,
    navigations: Vec<Navigation>,
    form_submissions: Vec<FormSubmission>,
    trace: bool,
    trace_logs: VecDeque<String>,
    trace_log_limit: usize,
    trace_to_stderr: bool,
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        Self::from_html_with_url(DEFAULT_PAGE_URL, html)
    }

    pub fn from_html_with_url(url: &str, html: &str) -> Result<Self> {
        let dom = parse_html(html)?;
        let location = LocationParts::parse(url)?;
        Ok(Self {
            dom,
            listeners: ListenerStore::default(),
            location,
            confirm_responses: VecDeque::new(),
            default_confirm_response: false,
            confirm_prompts: Vec::new(),
            navigations: Vec::new(),
            form_submissions: Vec::new(),
            trace: false,
            trace_logs: VecDeque::new(),
            trace_log_limit: 10_000,
            trace_to_stderr: false,
        })
    }

    // ---- lookup ----------------------------------------------------

    pub(crate) fn select_one(&self, selector: &str) -> Result<NodeId> {
        select_one(&self.dom, selector)
    }

    pub(crate) fn dom(&self) -> &Dom {
        &self.dom
    }

    pub(crate) fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    pub fn exists(&self, selector: &str) -> bool {
        self.select_one(selector).is_ok()
    }

    pub fn count(&self, selector: &str) -> Result<usize> {
        Ok(select_all(&self.dom, selector)?.len())
    }

    pub fn value(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        self.dom.value(target)
    }

    pub fn text(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.text_content(target))
    }

    /// Inline style declaration value, empty when the property is not
    /// declared on the element's `style` attribute.
    pub fn style(&self, selector: &str, property: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        self.dom.style_get(target, property)
    }

    pub fn set_style(&mut self, selector: &str, property: &str, value: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.dom.style_set(target, property, value)
    }

    // ---- user actions ----------------------------------------------

    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }
        if self.dom.attr(target, "readonly").is_some() {
            return Ok(());
        }

        let tag = self
            .dom
            .tag_name(target)
            .ok_or_else(|| Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: "non-element".into(),
            })?
            .to_ascii_lowercase();

        if tag != "input" && tag != "textarea" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: tag,
            });
        }

        self.dom.set_value(target, text)?;
        self.dispatch_event(EventState::new("input", target))?;
        Ok(())
    }

    pub fn click(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }

        let click_outcome = self.dispatch_event(EventState::new("click", target))?;
        if click_outcome.default_prevented {
            return Ok(());
        }

        if self.is_submit_control(target) {
            if let Some(form) = self.dom.owning_form(target) {
                self.submit_node(form)?;
            }
        }

        Ok(())
    }

    /// Dispatches `submit` on the element's form and, unless a handler
    /// prevented it, performs the submission.
    pub fn submit(&mut self, selector: &str) -> Result<()> {
        let target = self.select_one(selector)?;

        let form = if self
            .dom
            .tag_name(target)
            .map(|t| t.eq_ignore_ascii_case("form"))
            .unwrap_or(false)
        {
            Some(target)
        } else {
            self.dom.owning_form(target)
        };

        if let Some(form) = form {
            self.submit_node(form)?;
        }

        Ok(())
    }

    /// Keyboard input on a field. An unprevented `"Enter"` keypress in
    /// an input triggers the browser's implicit form submission.
    pub fn press_key(&mut self, selector: &str, key: &KeyName) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }

        let outcome = self.dispatch_event(EventState::with_key("keypress", target, key))?;
        if outcome.default_prevented {
            return Ok(());
        }

        if key == "Enter"
            && self
                .dom
                .tag_name(target)
                .is_some_and(|tag| tag.eq_ignore_ascii_case("input"))
        {
            if let Some(form) = self.dom.owning_form(target) {
                self.submit_node(form)?;
            }
        }

        Ok(())
    }

    /// Dispatches a bare event with no default action.
    pub fn dispatch(&mut self, selector: &str, event: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.dispatch_event(EventState::new(event, target))?;
        Ok(())
    }

    fn submit_node(&mut self, form: NodeId) -> Result<()> {
        let outcome = self.dispatch_event(EventState::new("submit", form))?;
        if !outcome.default_prevented {
            self.perform_form_submission(form)?;
        }
        Ok(())
    }

    fn is_submit_control(&self, node: NodeId) -> bool {
        let Some(tag) = self.dom.tag_name(node) else {
            return false;
        };
        let kind = self
            .dom
            .attr(node, "type")
            .unwrap_or_default()
            .to_ascii_lowercase();
        match tag.to_ascii_lowercase().as_str() {
            "button" => kind.is_empty() || kind == "submit",
            "input" => kind == "submit",
            _ => false,
        }
    }

    // ---- browser defaults and platform mocks -----------------------

    /// Native submission, matching JS `form.submit()`: no `submit`
    /// event is fired, the submission just happens.
    pub(crate) fn submit_form_natively(&mut self, form: NodeId) -> Result<()> {
        self.perform_form_submission(form)
    }

    fn perform_form_submission(&mut self, form: NodeId) -> Result<()> {
        let form_id = self.dom.attr(form, "id");
        let action = match self.dom.attr(form, "action") {
            Some(action) if !action.is_empty() => action,
            // Per HTML, a form without an action submits to the
            // current URL.
            _ => self.location.href(),
        };
        let method = self
            .dom
            .attr(form, "method")
            .unwrap_or_default()
            .to_ascii_lowercase();
        let method = if method.is_empty() {
            "get".to_string()
        } else {
            method
        };
        let fields = self.dom.form_fields(form);

        self.trace_line(format!(
            "[form] submit id={} action={} method={} fields={}",
            form_id.as_deref().unwrap_or("-"),
            action,
            method,
            fields.len()
        ));
        self.form_submissions.push(FormSubmission {
            form_id,
            action,
            method,
            fields,
        });
        Ok(())
    }

    /// Full-page navigation, matching a `window.location.href`
    /// assignment. The target is resolved against the document URL.
    pub fn navigate(&mut self, target: &str) -> Result<()> {
        let from = self.location.href();
        let next = self.location.resolve(target)?;
        let to = next.href();
        self.trace_line(format!("[nav] {from} -> {to}"));
        self.navigations.push(Navigation { from, to });
        self.location = next;
        Ok(())
    }

    /// Modal confirm prompt. Responses come from the queued script of
    /// [`Page::enqueue_confirm_response`], falling back to the default.
    pub(crate) fn confirm(&mut self, message: &str) -> bool {
        self.confirm_prompts.push(message.to_string());
        let response = self
            .confirm_responses
            .pop_front()
            .unwrap_or(self.default_confirm_response);
        self.trace_line(format!("[confirm] {message:?} -> {response}"));
        response
    }

    pub fn enqueue_confirm_response(&mut self, accept: bool) {
        self.confirm_responses.push_back(accept);
    }

    pub fn set_default_confirm_response(&mut self, accept: bool) {
        self.default_confirm_response = accept;
    }

    // ---- recorded effects ------------------------------------------

    pub fn document_url(&self) -> String {
        self.location.href()
    }

    pub fn location(&self) -> &LocationParts {
        &self.location
    }

    pub fn form_submissions(&self) -> &[FormSubmission] {
        &self.form_submissions
    }

    pub fn navigations(&self) -> &[Navigation] {
        &self.navigations
    }

    pub fn confirm_prompts(&self) -> &[String] {
        &self.confirm_prompts
    }

    // ---- event plumbing --------------------------------------------

    pub(crate) fn add_listener(&mut self, node: NodeId, event: &str, binding: Binding) {
        self.listeners.add(node, event, binding);
    }

    /// Target phase, then bubbling to ancestors. The page's bindings
    /// neither capture nor stop propagation, so neither is modeled.
    pub(crate) fn dispatch_event(&mut self, mut event: EventState) -> Result<EventState> {
        let mut cursor = Some(event.target);
        while let Some(node) = cursor {
            self.invoke_listeners(node, &mut event)?;
            cursor = self.dom.parent(node);
        }

        self.trace_event_done(&event);
        Ok(event)
    }

    fn invoke_listeners(&mut self, node: NodeId, event: &mut EventState) -> Result<()> {
        for binding in self.listeners.get(node, event.event_type()) {
            crate::controller::run_binding(self, binding, event)?;
        }
        Ok(())
    }

    // ---- trace -----------------------------------------------------

    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace = enabled;
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace_to_stderr = enabled;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        self.trace_logs.drain(..).collect()
    }

    fn trace_event_done(&mut self, event: &EventState) {
        if !self.trace {
            return;
        }
        let line = format!(
            "[event] type={} prevented={}",
            event.event_type(),
            event.default_prevented()
        );
        self.trace_line(line);
    }

    pub(crate) fn trace_line(&mut self, line: String) {
        if !self.trace {
            return;
        }
        if self.trace_to_stderr {
            eprintln!("{line}");
        }
        self.trace_logs.push_back(line);
        while self.trace_logs.len() > self.trace_log_limit {
            self.trace_logs.pop_front();
        }
    }

    // ---- assertion helpers -----------------------------------------

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let actual = self.value(selector)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
            });
        }
        Ok(())
    }

    pub fn assert_text(&self, selector: &str, expected: &str) -> Result<()> {
        let actual = self.text(selector)?;
        if actual.trim() != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
            });
        }
        Ok(())
    }

    pub fn assert_style_display(&self, selector: &str, expected: &str) -> Result<()> {
        let actual = self.style(selector, "display")?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
            });
        }
        Ok(())
    }
}
