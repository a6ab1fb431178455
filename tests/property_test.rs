use proptest::collection::vec;
use proptest::prelude::*;
use proptest::test_runner::{TestCaseError, TestCaseResult};
use site_interactions::{Page, RevealState, current_section};

const DEFAULT_PROPTEST_CASES: u32 = 64;

const MENU_HTML: &str = r##"
<button class="nav-toggle" aria-expanded="false">Menu</button>
<nav id="site-nav" class="site-nav">
  <a id="link-a" href="#a">A</a>
  <a id="link-gone" href="#gone">Gone</a>
  <span id="blank">-</span>
</nav>
<main>
  <section id="a" data-animate>A</section>
  <section id="b" data-animate>B</section>
  <section id="c" data-animate>C</section>
</main>
"##;

#[derive(Clone, Debug)]
enum MenuAction {
    Toggle,
    ClickLink,
    ClickMissingLink,
    ClickBlank,
    Scroll(i64),
    Advance(i64),
}

fn proptest_cases() -> u32 {
    std::env::var("SITE_INTERACTIONS_PROPTEST_CASES")
        .ok()
        .and_then(|raw| raw.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_PROPTEST_CASES)
}

fn menu_action_strategy() -> BoxedStrategy<MenuAction> {
    prop_oneof![
        4 => Just(MenuAction::Toggle),
        2 => Just(MenuAction::ClickLink),
        1 => Just(MenuAction::ClickMissingLink),
        1 => Just(MenuAction::ClickBlank),
        3 => (0i64..3_000).prop_map(MenuAction::Scroll),
        2 => (0i64..100).prop_map(MenuAction::Advance),
    ]
    .boxed()
}

fn fail(err: site_interactions::Error) -> TestCaseError {
    TestCaseError::fail(format!("{err:?}"))
}

fn run_action(page: &mut Page, action: &MenuAction) -> site_interactions::Result<()> {
    match action {
        MenuAction::Toggle => page.click(".nav-toggle"),
        MenuAction::ClickLink => page.click("#link-a"),
        MenuAction::ClickMissingLink => page.click("#link-gone"),
        MenuAction::ClickBlank => page.click("#blank"),
        MenuAction::Scroll(y) => page.scroll_to(*y),
        MenuAction::Advance(ms) => page.advance_time(*ms),
    }
}

fn assert_menu_invariants(actions: &[MenuAction]) -> TestCaseResult {
    let mut page = Page::from_html(MENU_HTML).map_err(fail)?;
    for (node, top) in [("#a", 0), ("#b", 1_200), ("#c", 2_600)] {
        page.set_layout(node, top, 600).map_err(fail)?;
    }
    let mut revealed = Vec::<&str>::new();

    for (step, action) in actions.iter().enumerate() {
        run_action(&mut page, action).map_err(fail)?;

        let expanded = page.attr(".nav-toggle", "aria-expanded").map_err(fail)?;
        let expected = page.nav_open().to_string();
        let toggled = actions[..=step]
            .iter()
            .any(|action| matches!(action, MenuAction::Toggle));
        if toggled {
            prop_assert_eq!(
                expanded.as_deref(),
                Some(expected.as_str()),
                "aria-expanded diverged at step {}: {:?}",
                step,
                action
            );
        } else {
            prop_assert_eq!(expanded.as_deref(), Some("false"));
        }

        for section in revealed.iter() {
            prop_assert_eq!(
                page.reveal_state(section).map_err(fail)?,
                Some(RevealState::Revealed),
                "{} un-revealed at step {}",
                section,
                step
            );
            prop_assert!(page.has_class(section, "in-view").map_err(fail)?);
        }
        for section in ["#a", "#b", "#c"] {
            if page.reveal_state(section).map_err(fail)? == Some(RevealState::Revealed)
                && !revealed.contains(&section)
            {
                revealed.push(section);
            }
        }

        if matches!(action, MenuAction::ClickMissingLink) {
            prop_assert_eq!(page.location_hash(), "#gone");
        }
    }
    Ok(())
}

fn sections_strategy() -> BoxedStrategy<Vec<(String, i64)>> {
    vec(("[a-z]{1,6}", 0i64..5_000), 0..8)
        .prop_map(|mut sections| {
            sections.sort_by_key(|(_, top)| *top);
            sections
        })
        .boxed()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: proptest_cases(),
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn menu_and_reveal_invariants_hold(actions in vec(menu_action_strategy(), 1..=24)) {
        assert_menu_invariants(&actions)?;
    }

    #[test]
    fn current_section_is_last_passed_or_first(
        sections in sections_strategy(),
        position in -500i64..6_000,
    ) {
        let current = current_section(&sections, position, "home");
        match sections.iter().rev().find(|(_, top)| *top <= position) {
            Some((id, _)) => prop_assert_eq!(current, id.clone()),
            None => {
                let first = sections.first().map(|(id, _)| id.clone());
                prop_assert_eq!(current, first.unwrap_or_else(|| "home".to_string()));
            }
        }
    }
}
