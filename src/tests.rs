use super::*;

const LANDING_PAGE: &str = r##"
<header class="site-header">
  <a class="brand" href="#home">Acme Studio</a>
  <button class="nav-toggle" aria-expanded="false" aria-controls="site-nav">Menu</button>
  <nav id="site-nav" class="site-nav">
    <a href="#home">Home</a>
    <a href="#services">Services</a>
    <a href="#contact">Contact</a>
  </nav>
</header>
<main>
  <section id="home" data-animate><h1>We build websites</h1></section>
  <section id="services" data-animate><h2>Services</h2></section>
  <section id="contact">
    <form id="contactForm" novalidate>
      <input id="name" name="name">
      <span id="error-name" class="error"></span>
      <input id="email" name="email" type="email">
      <span id="error-email" class="error"></span>
      <textarea id="message" name="message"></textarea>
      <span id="error-message" class="error"></span>
      <button id="send" type="submit">Send</button>
      <p id="form-status" role="status"></p>
    </form>
  </section>
</main>
<footer>&copy; <span id="year"></span> Acme Studio</footer>
"##;

fn landing_page() -> Result<Page> {
    let config = PageConfig::new()
        .with_current_year(2025)
        .with_layout("#home", 0, 400)
        .with_layout("#services", 400, 500)
        .with_layout("#contact", 900, 700);
    Page::from_html_with_config(LANDING_PAGE, config)
}

fn fill_contact(page: &mut Page, name: &str, email: &str, message: &str) -> Result<()> {
    page.type_text("#name", name)?;
    page.type_text("#email", email)?;
    page.type_text("#message", message)
}

fn contact_timers(page: &Page) -> Vec<PendingTimer> {
    page.pending_timers()
        .into_iter()
        .filter(|timer| timer.kind == TaskKind::ContactSubmission)
        .collect()
}

#[test]
fn valid_submission_sends_then_thanks_and_resets() -> Result<()> {
    let mut page = landing_page()?;
    fill_contact(&mut page, "Al", "a@b.com", "Hello there, friend")?;
    page.click("#send")?;

    page.assert_text("#form-status", "Sending…")?;
    assert_eq!(page.contact_form_state(), ContactFormState::Submitting);
    assert_eq!(page.native_submissions(), 0);
    let timers = contact_timers(&page);
    assert_eq!(timers.len(), 1);
    assert_eq!(timers[0].due_at, 900);

    page.advance_time(899)?;
    page.assert_text("#form-status", "Sending…")?;
    page.advance_time(1)?;
    page.assert_text("#form-status", "Thank you! We will be in touch shortly.")?;
    page.assert_value("#name", "")?;
    page.assert_value("#email", "")?;
    page.assert_value("#message", "")?;
    assert_eq!(page.contact_form_state(), ContactFormState::Success);
    assert_eq!(page.submissions_in_flight(), 0);
    Ok(())
}

#[test]
fn invalid_submission_marks_every_field() -> Result<()> {
    let mut page = landing_page()?;
    fill_contact(&mut page, "", "not-an-email", "short")?;
    page.click("#send")?;

    page.assert_text("#error-name", "Please enter your full name.")?;
    page.assert_text("#error-email", "Please enter a valid email address.")?;
    page.assert_text("#error-message", "Message should be at least 10 characters.")?;
    page.assert_text("#form-status", "Please fix the highlighted fields.")?;
    assert!(contact_timers(&page).is_empty());
    assert_eq!(page.contact_form_state(), ContactFormState::Idle);
    let report = page
        .last_validation()
        .ok_or_else(|| Error::Runtime("no validation report".into()))?;
    assert_eq!(
        report.invalid_fields(),
        vec![ContactField::Name, ContactField::Email, ContactField::Message]
    );
    page.assert_value("#email", "not-an-email")?;
    Ok(())
}

#[test]
fn fixed_fields_clear_their_errors() -> Result<()> {
    let mut page = landing_page()?;
    fill_contact(&mut page, "A", "a@b.com", "too short")?;
    page.click("#send")?;
    page.assert_text("#error-name", "Please enter your full name.")?;
    page.assert_text("#error-email", "")?;

    page.type_text("#name", "Ada Lovelace")?;
    page.click("#send")?;
    page.assert_text("#error-name", "")?;
    page.assert_text("#error-message", "Message should be at least 10 characters.")?;

    page.type_text("#message", "Ten chars!")?;
    page.click("#send")?;
    page.assert_text("#error-message", "")?;
    page.assert_text("#form-status", "Sending…")?;
    Ok(())
}

#[test]
fn enter_key_submission_goes_through_the_validator() -> Result<()> {
    let mut page = landing_page()?;
    fill_contact(&mut page, "Grace", "grace@navy.mil", "Compilers are fun")?;
    page.submit("#email")?;
    page.assert_text("#form-status", "Sending…")?;
    assert_eq!(page.native_submissions(), 0);
    Ok(())
}

#[test]
fn overlapping_submissions_each_complete() -> Result<()> {
    let mut page = landing_page()?;
    fill_contact(&mut page, "Al", "a@b.com", "Hello there, friend")?;
    page.click("#send")?;
    page.advance_time(300)?;
    page.click("#send")?;
    assert_eq!(page.submissions_in_flight(), 2);
    assert_eq!(
        contact_timers(&page)
            .iter()
            .map(|timer| timer.due_at)
            .collect::<Vec<_>>(),
        vec![900, 1200]
    );

    page.advance_time_to(900)?;
    page.assert_text("#form-status", "Thank you! We will be in touch shortly.")?;
    assert_eq!(page.submissions_in_flight(), 1);
    page.flush()?;
    assert_eq!(page.submissions_in_flight(), 0);
    assert_eq!(page.contact_form_state(), ContactFormState::Success);
    Ok(())
}

#[test]
fn form_without_feedback_elements_still_validates() -> Result<()> {
    let mut page = Page::from_html(
        r#"<form id="contactForm">
             <input id="name"><input id="email"><textarea id="message"></textarea>
             <button id="send">Send</button>
           </form>"#,
    )?;
    page.click("#send")?;
    assert_eq!(page.native_submissions(), 0);
    assert_eq!(
        page.last_validation().map(ValidationReport::is_valid),
        Some(false)
    );

    fill_contact(&mut page, "Al", "a@b.com", "Hello there, friend")?;
    page.click("#send")?;
    page.flush()?;
    assert_eq!(page.contact_form_state(), ContactFormState::Success);
    page.assert_value("#message", "")?;
    Ok(())
}

#[test]
fn pages_without_a_contact_form_submit_natively() -> Result<()> {
    let mut page = Page::from_html(r#"<form id="newsletter"><button id="join">Join</button></form>"#)?;
    page.click("#join")?;
    assert_eq!(page.native_submissions(), 1);
    assert_eq!(page.bindings().contact, None);
    assert_eq!(page.contact_form_state(), ContactFormState::Idle);
    Ok(())
}

#[test]
fn scroll_spy_tracks_header_adjusted_position() -> Result<()> {
    let mut page = landing_page()?;
    assert_eq!(page.active_section(), "home");

    page.scroll_to(330)?;
    page.render_frame()?;
    assert_eq!(page.active_section(), "services");
    page.assert_attr(".site-nav a[href='#services']", "aria-current", "page")?;
    page.assert_attr(".site-nav a[href='#home']", "aria-current", "false")?;
    page.assert_attr(".site-nav a[href='#contact']", "aria-current", "false")?;

    page.scroll_to(779)?;
    page.render_frame()?;
    assert_eq!(page.active_section(), "services");
    page.scroll_to(780)?;
    page.render_frame()?;
    assert_eq!(page.active_section(), "contact");
    Ok(())
}

#[test]
fn initial_highlight_uses_seeded_layout() -> Result<()> {
    let page = landing_page()?;
    assert_eq!(page.spy_runs(), 1);
    assert_eq!(page.active_section(), "home");
    page.assert_attr(".site-nav a[href='#home']", "aria-current", "page")?;
    page.assert_attr(".site-nav a[href='#contact']", "aria-current", "false")?;
    Ok(())
}

#[test]
fn late_layout_corrects_the_highlight_next_frame() -> Result<()> {
    let mut page = Page::from_html_with_config(LANDING_PAGE, PageConfig::new().with_current_year(2025))?;
    // Every section still sits at offset 0, so the last one is current.
    assert_eq!(page.active_section(), "contact");

    page.set_layout("#home", 0, 400)?;
    page.set_layout("#services", 400, 500)?;
    page.set_layout("#contact", 900, 700)?;
    page.render_frame()?;
    assert_eq!(page.spy_runs(), 2);
    assert_eq!(page.active_section(), "home");
    page.assert_attr(".site-nav a[href='#home']", "aria-current", "page")?;
    page.assert_attr(".site-nav a[href='#contact']", "aria-current", "false")?;
    Ok(())
}

#[test]
fn missing_seeded_layout_target_fails_initialization() {
    let config = PageConfig::new().with_layout("#nowhere", 0, 10);
    let err = Page::from_html_with_config(LANDING_PAGE, config).expect_err("unknown selector");
    assert!(matches!(err, Error::SelectorNotFound(selector) if selector == "#nowhere"));
}

#[test]
fn scroll_spy_reads_layout_at_each_pass() -> Result<()> {
    let mut page = landing_page()?;
    page.set_layout("#services", 100, 500)?;
    page.scroll_to(1)?;
    page.render_frame()?;
    assert_eq!(page.active_section(), "services");
    Ok(())
}

#[test]
fn menu_link_scrolls_focuses_and_closes() -> Result<()> {
    let mut page = landing_page()?;
    page.click(".nav-toggle")?;
    assert!(page.nav_open());

    page.click(".site-nav a[href='#services']")?;
    assert!(!page.nav_open());
    page.assert_attr(".nav-toggle", "aria-expanded", "false")?;
    assert_eq!(page.scroll_y(), 400);
    assert_eq!(page.last_scroll_behavior(), ScrollBehavior::Smooth);
    assert_eq!(page.active_element_id().as_deref(), Some("services"));
    page.assert_attr("#services", "tabindex", "-1")?;
    assert_eq!(page.location_hash(), "");

    page.render_frame()?;
    assert_eq!(page.active_section(), "services");
    Ok(())
}

#[test]
fn reveal_follows_scrolling() -> Result<()> {
    let mut page = landing_page()?;
    page.set_viewport(1280, 400)?;
    page.render_frame()?;
    page.assert_class("#home", "in-view", true)?;
    page.assert_class("#services", "in-view", false)?;

    page.scroll_to(200)?;
    page.render_frame()?;
    page.assert_class("#services", "in-view", true)?;

    page.scroll_to(0)?;
    page.flush()?;
    assert_eq!(page.reveal_state("#services")?, Some(RevealState::Revealed));
    Ok(())
}

#[test]
fn footer_shows_configured_year() -> Result<()> {
    let page = landing_page()?;
    page.assert_text("#year", "2025")?;
    assert!(page.text("footer")?.contains("© 2025"));
    Ok(())
}

#[test]
fn custom_markup_binds_renamed_elements() -> Result<()> {
    let markup = MarkupSelectors {
        nav_toggle: "#menu-button".into(),
        nav_panel: "#menu".into(),
        nav_links: "#menu a".into(),
        sections: "article[id]".into(),
        ..MarkupSelectors::default()
    };
    let config = PageConfig::new()
        .with_markup(markup)
        .with_header_offset(0)
        .with_fallback_section("top");
    let mut page = Page::from_html_with_config(
        r##"<button id="menu-button">Menu</button>
            <nav id="menu"><a href="#one">One</a><a href="#two">Two</a></nav>
            <article id="one"></article><article id="two"></article>"##,
        config,
    )?;
    page.set_layout("#one", 50, 100)?;
    page.set_layout("#two", 150, 100)?;
    page.click("#menu-button")?;
    page.assert_attr("#menu-button", "aria-expanded", "true")?;

    page.scroll_to(160)?;
    page.render_frame()?;
    assert_eq!(page.active_section(), "two");
    page.assert_attr("#menu a[href='#two']", "aria-current", "page")?;
    Ok(())
}

#[test]
fn fallback_section_applies_without_sections() -> Result<()> {
    let page = Page::from_html(
        r##"<nav class="site-nav"><a href="#home">Home</a><a href="#blog">Blog</a></nav>"##,
    )?;
    assert_eq!(page.active_section(), "home");
    page.assert_attr(".site-nav a[href='#home']", "aria-current", "page")?;
    page.assert_attr(".site-nav a[href='#blog']", "aria-current", "false")?;
    Ok(())
}

#[test]
fn invalid_config_is_rejected_before_parsing() {
    let err = Page::from_html_with_config("<p>x</p>", PageConfig::new().with_submit_delay_ms(-5))
        .expect_err("negative delay");
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn custom_submit_delay_is_honored() -> Result<()> {
    let config = PageConfig::new().with_submit_delay_ms(50);
    let mut page = Page::from_html_with_config(LANDING_PAGE, config)?;
    fill_contact(&mut page, "Al", "a@b.com", "Hello there, friend")?;
    page.click("#send")?;
    page.advance_time(50)?;
    page.assert_text("#form-status", "Thank you! We will be in touch shortly.")?;
    Ok(())
}

#[test]
fn trace_logs_behaviors_with_prefixes() -> Result<()> {
    let mut page = landing_page()?;
    page.enable_trace(true);
    page.set_trace_stderr(false);
    page.set_trace_events(false);
    page.set_trace_timers(false);

    page.click(".nav-toggle")?;
    fill_contact(&mut page, "", "", "")?;
    page.click("#send")?;
    let logs = page.take_trace_logs();
    assert!(logs.iter().any(|line| line == "[nav] toggled open=true"));
    assert!(logs.iter().any(|line| line.starts_with("[form] rejected")));
    assert!(logs.iter().all(|line| !line.starts_with("[event]")));
    assert!(page.take_trace_logs().is_empty());
    Ok(())
}

#[test]
fn trace_log_limit_keeps_latest_lines() -> Result<()> {
    let mut page = landing_page()?;
    page.enable_trace(true);
    page.set_trace_stderr(false);
    page.set_trace_log_limit(2)?;
    for _ in 0..4 {
        page.click(".nav-toggle")?;
    }
    let logs = page.take_trace_logs();
    assert_eq!(logs.len(), 2);
    assert!(page.set_trace_log_limit(0).is_err());
    Ok(())
}

#[test]
fn failed_assertions_carry_a_snippet() -> Result<()> {
    let page = landing_page()?;
    let err = page
        .assert_text("#form-status", "Sending…")
        .expect_err("status starts empty");
    match err {
        Error::AssertionFailed { dom_snippet, .. } => {
            assert!(dom_snippet.starts_with("<p id=\"form-status\""));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(matches!(
        page.text("#nope"),
        Err(Error::SelectorNotFound(_))
    ));
    assert!(matches!(
        landing_page()?.type_text("#send", "x"),
        Err(Error::TypeMismatch { .. })
    ));
    Ok(())
}

#[test]
fn dump_dom_serializes_with_sorted_attributes() -> Result<()> {
    let page = Page::from_html(r#"<p title="t" id="p" class="c">a &amp; b</p>"#)?;
    assert_eq!(
        page.dump_dom("#p")?,
        r#"<p class="c" id="p" title="t">a &amp; b</p>"#
    );
    Ok(())
}
