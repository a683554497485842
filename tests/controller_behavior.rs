use drink_page::{Page, RESET_CONFIRM_PROMPT, Result};

const DRINK_PAGE_HTML: &str = r#"
    <div id='main-content'>
      <form id='drink-form' action='/add_drink' method='post'>
        <input id='selected-drink' type='hidden' name='drink' value=''>
        <button id='drink-weizen' class='drink-button' type='submit'>Weizenbier 0,5l</button>
      </form>
      <form id='custom-drink' action='/add_custom_drink' method='post' style='display: none;'>
        <input id='custom-name' name='custom-drink-name'>
        <input name='custom-drink-volume' value='0.5'>
        <input name='custom-drink-alcohol' value='5.0'>
      </form>
      <form id='reset-form' action='/history/reset' method='post'></form>
    </div>
    <div id='loading-spinner' style='display: none;'></div>
    "#;

fn installed_page() -> Result<Page> {
    let mut page = Page::from_html(DRINK_PAGE_HTML)?;
    page.install_drink_controller()?;
    Ok(page)
}

#[test]
fn select_drink_sets_value_and_submits_exactly_once() -> Result<()> {
    let mut page = installed_page()?;
    page.select_drink("Weizenbier 0,5l")?;

    page.assert_value("#selected-drink", "Weizenbier 0,5l")?;
    assert_eq!(page.form_submissions().len(), 1);
    let submission = &page.form_submissions()[0];
    assert_eq!(submission.form_id.as_deref(), Some("drink-form"));
    assert_eq!(submission.action, "/add_drink");
    assert_eq!(submission.method, "post");
    assert_eq!(
        submission.fields,
        vec![("drink".to_string(), "Weizenbier 0,5l".to_string())]
    );
    Ok(())
}

#[test]
fn drink_form_submit_is_intercepted_and_resubmitted_natively() -> Result<()> {
    let mut page = installed_page()?;
    page.type_text("#selected-drink", "Radler")?;

    // The submit handler cancels the native submission and routes it
    // through select_drink, so exactly one submission is recorded.
    page.submit("#drink-form")?;
    assert_eq!(page.form_submissions().len(), 1);
    assert_eq!(
        page.form_submissions()[0].fields,
        vec![("drink".to_string(), "Radler".to_string())]
    );
    Ok(())
}

#[test]
fn clicking_a_drink_button_submits_through_the_interceptor() -> Result<()> {
    let mut page = installed_page()?;
    page.type_text("#selected-drink", "Helles")?;
    page.click("#drink-weizen")?;
    assert_eq!(page.form_submissions().len(), 1);
    assert_eq!(
        page.form_submissions()[0].fields,
        vec![("drink".to_string(), "Helles".to_string())]
    );
    Ok(())
}

#[test]
fn submit_dispatched_on_a_child_bubbles_to_the_form_interceptor() -> Result<()> {
    let mut page = installed_page()?;
    page.type_text("#selected-drink", "Pils")?;

    // The interceptor is bound on the form; an event raised on the
    // input reaches it by bubbling.
    page.dispatch("#selected-drink", "submit")?;
    assert_eq!(page.form_submissions().len(), 1);
    assert_eq!(
        page.form_submissions()[0].fields,
        vec![("drink".to_string(), "Pils".to_string())]
    );
    Ok(())
}

#[test]
fn drink_button_labels_are_readable_as_text() -> Result<()> {
    let page = installed_page()?;
    page.assert_text("#drink-weizen", "Weizenbier 0,5l")?;
    Ok(())
}

#[test]
fn show_loading_hides_content_and_shows_spinner_idempotently() -> Result<()> {
    let mut page = installed_page()?;

    page.show_loading()?;
    page.assert_style_display("#main-content", "none")?;
    page.assert_style_display("#loading-spinner", "block")?;

    page.show_loading()?;
    page.assert_style_display("#main-content", "none")?;
    page.assert_style_display("#loading-spinner", "block")?;
    Ok(())
}

#[test]
fn accepted_reset_shows_loading_and_lets_submission_proceed() -> Result<()> {
    let mut page = installed_page()?;
    page.enqueue_confirm_response(true);

    page.submit("#reset-form")?;

    assert_eq!(page.confirm_prompts(), &[RESET_CONFIRM_PROMPT.to_string()]);
    page.assert_style_display("#main-content", "none")?;
    page.assert_style_display("#loading-spinner", "block")?;
    assert_eq!(page.form_submissions().len(), 1);
    assert_eq!(page.form_submissions()[0].action, "/history/reset");
    Ok(())
}

#[test]
fn declined_reset_cancels_submission_and_keeps_page_state() -> Result<()> {
    let mut page = installed_page()?;
    page.enqueue_confirm_response(false);

    page.submit("#reset-form")?;

    assert_eq!(page.confirm_prompts(), &[RESET_CONFIRM_PROMPT.to_string()]);
    page.assert_style_display("#main-content", "")?;
    page.assert_style_display("#loading-spinner", "none")?;
    assert!(page.form_submissions().is_empty());
    Ok(())
}

#[test]
fn reset_prompt_is_the_fixed_german_text() {
    assert_eq!(
        RESET_CONFIRM_PROMPT,
        "Möchten Sie wirklich alle Getränke zurücksetzen?"
    );
}

#[test]
fn toggle_custom_form_round_trips_from_hidden() -> Result<()> {
    let mut page = installed_page()?;

    page.assert_style_display("#custom-drink", "none")?;
    page.toggle_custom_form()?;
    page.assert_style_display("#custom-drink", "block")?;
    page.toggle_custom_form()?;
    page.assert_style_display("#custom-drink", "none")?;
    Ok(())
}

#[test]
fn enter_on_the_bound_input_never_submits_implicitly() -> Result<()> {
    let mut page = installed_page()?;

    page.press_key("#selected-drink", "Enter")?;
    assert!(page.form_submissions().is_empty());

    // Other keys keep their default behavior, which for a letter is no
    // submission either way.
    page.press_key("#selected-drink", "a")?;
    assert!(page.form_submissions().is_empty());
    Ok(())
}

#[test]
fn enter_suppression_only_covers_the_first_input() -> Result<()> {
    let mut page = installed_page()?;

    // The original script binds keypress on the page's first input
    // only; Enter in the custom-drink fields still submits that form.
    page.press_key("#custom-name", "Enter")?;
    assert_eq!(page.form_submissions().len(), 1);
    assert_eq!(page.form_submissions()[0].action, "/add_custom_drink");
    Ok(())
}

#[test]
fn show_history_navigates_to_exactly_history() -> Result<()> {
    let mut page = installed_page()?;
    page.show_history()?;

    assert_eq!(page.navigations().len(), 1);
    assert_eq!(page.navigations()[0].to, "http://localhost/history");
    assert_eq!(page.location().pathname(), "/history");
    assert_eq!(page.location().search(), "");
    assert_eq!(page.location().hash(), "");
    Ok(())
}

#[test]
fn full_session_walkthrough() -> Result<()> {
    let mut page = installed_page()?;

    page.toggle_custom_form()?;
    page.type_text("#custom-name", "Spezi")?;
    page.toggle_custom_form()?;

    page.select_drink("Weizenbier 0,5l")?;
    page.select_drink("Radler")?;

    page.enqueue_confirm_response(false);
    page.submit("#reset-form")?;
    page.enqueue_confirm_response(true);
    page.submit("#reset-form")?;

    page.show_history()?;

    // Two drink submissions plus the accepted reset.
    assert_eq!(page.form_submissions().len(), 3);
    assert_eq!(page.confirm_prompts().len(), 2);
    page.assert_style_display("#custom-drink", "none")?;
    page.assert_style_display("#main-content", "none")?;
    page.assert_style_display("#loading-spinner", "block")?;
    assert_eq!(page.document_url(), "http://localhost/history");
    Ok(())
}
