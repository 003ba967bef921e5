//! End-to-end harvest runs against a scripted portal.
//!
//! The site below mimics the sign-in flow, a dashboard with several courses,
//! module pages chained by "Next", a locked item, and a Drive-hosted lecture
//! video, all keyed by the selectors the workflow uses.

use canvas_harvest::portal::selectors;
use canvas_harvest::testing::{MockElement, MockEvent, MockPage, MockSite};
use canvas_harvest::{Credentials, HarvestConfig, HarvestError, PortalSession, TraversalEnd};
use std::time::Duration;

const BASE: &str = "https://canvas.example.edu";
const KMSI: &str = "https://login.microsoftonline.com/kmsi";
const DASHBOARD: &str = "https://canvas.example.edu/dashboard";

const ALGEBRA: &str = "https://canvas.example.edu/courses/101";
const HISTORY: &str = "https://canvas.example.edu/courses/202";
const OFFLINE: &str = "https://canvas.example.edu/courses/303";

fn config() -> HarvestConfig {
    HarvestConfig {
        base_url: Some(BASE.into()),
        wait_timeout: Duration::from_millis(30),
        poll_interval: Duration::from_millis(5),
        click_pause: Duration::ZERO,
        ..HarvestConfig::default()
    }
}

fn credentials() -> Credentials {
    Credentials {
        email: "student@example.edu".into(),
        password: "correct horse".into(),
    }
}

fn sign_in_pages(site: &MockSite, with_prompt: bool) {
    let after_sign_in = if with_prompt { KMSI } else { DASHBOARD };
    site.add_page(
        BASE,
        MockPage::new()
            .with(selectors::email_input(), MockElement::visible())
            .with(selectors::email_submit(), MockElement::visible())
            // The password step renders after the e-mail is submitted.
            .with(selectors::password_input(), MockElement::visible().appears_after(1))
            .with(
                selectors::sign_in_button(),
                MockElement::visible().navigates_to(after_sign_in),
            ),
    );
    site.add_page(
        KMSI,
        MockPage::new().with(
            selectors::stay_signed_in(),
            MockElement::visible().navigates_to(DASHBOARD),
        ),
    );
}

fn dashboard(site: &MockSite, courses: &[&str]) {
    let mut page = MockPage::new();
    for course in courses {
        page = page.with(selectors::dashboard_card(), MockElement::visible().attr("href", course));
    }
    site.add_page(DASHBOARD, page);
}

/// Three module pages; the third is locked.
fn algebra_course(site: &MockSite) {
    let p1 = format!("{ALGEBRA}/modules/items/1");
    let p2 = format!("{ALGEBRA}/modules/items/2");
    let p3 = format!("{ALGEBRA}/modules/items/3");

    site.add_page(
        &format!("{ALGEBRA}/modules"),
        MockPage::new()
            .with(selectors::first_module_item(), MockElement::visible().attr("href", &p1))
            .with(selectors::first_module_item(), MockElement::visible().attr("href", &p2)),
    );
    site.add_page(
        &p1,
        MockPage::new()
            .with(selectors::file_download(), MockElement::visible().downloads("syllabus.pdf"))
            .with(selectors::file_download(), MockElement::visible().downloads("week1.pdf"))
            .with(selectors::next_page(), MockElement::visible().navigates_to(&p2)),
    );
    site.add_page(
        &p2,
        MockPage::new()
            .with(
                selectors::embedded_video(),
                MockElement::visible().attr("src", "https://drive.google.com/file/d/1Lecture2/preview"),
            )
            .with(selectors::next_page(), MockElement::visible().navigates_to(&p3)),
    );
    site.add_page(
        "https://drive.google.com/uc?id=1Lecture2&export=download",
        MockPage::new().with(
            selectors::drive_download(),
            MockElement::visible().downloads("lecture2.mp4"),
        ),
    );
    site.add_page(
        &p3,
        MockPage::new()
            .with(selectors::file_download(), MockElement::visible().downloads("week3.pdf"))
            .with(selectors::lock_marker(), MockElement::visible())
            .with(selectors::next_page(), MockElement::visible().navigates_to(BASE)),
    );
}

/// A course whose modules page has no items.
fn history_course(site: &MockSite) {
    site.add_page(&format!("{HISTORY}/modules"), MockPage::new());
}

#[tokio::test]
async fn test_full_run() {
    let site = MockSite::new();
    sign_in_pages(&site, true);
    dashboard(&site, &[ALGEBRA, HISTORY, OFFLINE]);
    algebra_course(&site);
    history_course(&site);
    site.make_unreachable(&format!("{OFFLINE}/modules"));

    let mut session = PortalSession::new(site.context(), config());
    let report = session.run(&credentials()).await.unwrap();

    assert_eq!(session.courses(), &[ALGEBRA, HISTORY, OFFLINE]);
    assert_eq!(report.courses.len(), 3);

    let algebra = &report.courses[0];
    assert_eq!(algebra.url, ALGEBRA);
    assert_eq!(algebra.pages_visited, 3);
    assert_eq!(algebra.files_clicked, 3);
    assert_eq!(algebra.videos_requested, 1);
    assert_eq!(algebra.end, TraversalEnd::Locked);

    let history = &report.courses[1];
    assert_eq!(history.pages_visited, 0);
    assert_eq!(history.end, TraversalEnd::NoModules);

    let offline = &report.courses[2];
    assert!(matches!(&offline.end, TraversalEnd::Failed(reason) if reason.contains("ERR_CONNECTION_REFUSED")));

    assert_eq!(report.total_files(), 3);
    assert_eq!(report.failed(), 1);
    assert_eq!(
        site.downloads(),
        vec!["syllabus.pdf", "week1.pdf", "lecture2.mp4", "week3.pdf"]
    );

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_login_types_credentials_in_order() {
    let site = MockSite::new();
    sign_in_pages(&site, true);
    dashboard(&site, &[]);

    let mut session = PortalSession::new(site.context(), config());
    session.open_portal().await.unwrap();
    session.login(&credentials()).await.unwrap();

    let typed: Vec<MockEvent> = site
        .events()
        .into_iter()
        .filter(|e| matches!(e, MockEvent::Typed(..)))
        .collect();
    assert_eq!(
        typed,
        vec![
            MockEvent::Typed(selectors::email_input(), "student@example.edu".into()),
            MockEvent::Typed(selectors::password_input(), "correct horse".into()),
        ]
    );
    assert_eq!(site.current(), DASHBOARD);
}

#[tokio::test]
async fn test_login_without_stay_signed_in_prompt() {
    let site = MockSite::new();
    sign_in_pages(&site, false);
    dashboard(&site, &[ALGEBRA]);

    let mut session = PortalSession::new(site.context(), config());
    session.open_portal().await.unwrap();
    session.login(&credentials()).await.unwrap();

    assert_eq!(session.collect_course_links().await.unwrap(), 1);
}

#[tokio::test]
async fn test_login_fails_without_sign_in_form() {
    let site = MockSite::new();
    site.add_page(BASE, MockPage::new());

    let mut session = PortalSession::new(site.context(), config());
    let err = session.run(&credentials()).await.unwrap_err();

    assert!(matches!(err, HarvestError::WaitTimeout { .. }));
    assert!(session.courses().is_empty());
}

#[tokio::test]
async fn test_cards_without_links_are_skipped() {
    let site = MockSite::new();
    site.add_page(
        DASHBOARD,
        MockPage::new()
            .with(selectors::dashboard_card(), MockElement::visible().attr("href", ALGEBRA))
            .with(selectors::dashboard_card(), MockElement::visible())
            .with(selectors::dashboard_card(), MockElement::hidden().attr("href", HISTORY)),
    );
    let mut ctx = site.context();
    ctx.navigate(DASHBOARD, 1000).await.unwrap();

    let mut session = PortalSession::new(ctx, config());
    assert_eq!(session.collect_course_links().await.unwrap(), 2);
    assert_eq!(session.courses(), &[ALGEBRA, HISTORY]);
}

#[tokio::test]
async fn test_walk_ends_on_last_page() {
    let course = "https://canvas.example.edu/courses/9/";
    let only = "https://canvas.example.edu/courses/9/pages/only";
    let site = MockSite::new();
    dashboard(&site, &[course]);
    site.add_page(
        "https://canvas.example.edu/courses/9/modules",
        MockPage::new().with(selectors::first_module_item(), MockElement::visible().attr("href", only)),
    );
    site.add_page(
        only,
        MockPage::new()
            // Present but disabled: not a way forward.
            .with(selectors::next_page(), MockElement::visible().disabled()),
    );
    let mut ctx = site.context();
    ctx.navigate(DASHBOARD, 1000).await.unwrap();

    let mut session = PortalSession::new(ctx, config());
    session.collect_course_links().await.unwrap();
    let report = session.fetch_course_materials().await.unwrap();

    assert_eq!(report.courses[0].pages_visited, 1);
    assert_eq!(report.courses[0].end, TraversalEnd::LastPage);
    assert!(site
        .visited()
        .contains(&"https://canvas.example.edu/courses/9/modules".to_string()));
}

#[tokio::test]
async fn test_walk_stops_at_page_limit() {
    let course = "https://canvas.example.edu/courses/10";
    let ping = "https://canvas.example.edu/courses/10/pages/ping";
    let pong = "https://canvas.example.edu/courses/10/pages/pong";
    let site = MockSite::new();
    dashboard(&site, &[course]);
    site.add_page(
        "https://canvas.example.edu/courses/10/modules",
        MockPage::new().with(selectors::first_module_item(), MockElement::visible().attr("href", ping)),
    );
    // "Next" chains that loop back on themselves.
    site.add_page(
        ping,
        MockPage::new().with(selectors::next_page(), MockElement::visible().navigates_to(pong)),
    );
    site.add_page(
        pong,
        MockPage::new().with(selectors::next_page(), MockElement::visible().navigates_to(ping)),
    );
    let mut ctx = site.context();
    ctx.navigate(DASHBOARD, 1000).await.unwrap();

    let mut session = PortalSession::new(
        ctx,
        HarvestConfig {
            max_pages: 4,
            ..config()
        },
    );
    session.collect_course_links().await.unwrap();
    let report = session.fetch_course_materials().await.unwrap();

    assert_eq!(report.courses[0].pages_visited, 4);
    assert_eq!(report.courses[0].end, TraversalEnd::PageLimit);
    // The fourth page is the last one opened.
    assert_eq!(site.current(), pong);
}

#[tokio::test]
async fn test_late_lock_marker_is_still_seen() {
    let course = "https://canvas.example.edu/courses/11";
    let first = "https://canvas.example.edu/courses/11/pages/first";
    let site = MockSite::new();
    dashboard(&site, &[course]);
    site.add_page(
        "https://canvas.example.edu/courses/11/modules",
        MockPage::new().with(selectors::first_module_item(), MockElement::visible().attr("href", first)),
    );
    site.add_page(
        first,
        MockPage::new()
            .with(selectors::lock_marker(), MockElement::visible().appears_after(2))
            .with(selectors::next_page(), MockElement::visible().navigates_to(BASE)),
    );
    let mut ctx = site.context();
    ctx.navigate(DASHBOARD, 1000).await.unwrap();

    let mut session = PortalSession::new(ctx, config());
    session.collect_course_links().await.unwrap();
    let report = session.fetch_course_materials().await.unwrap();

    assert_eq!(report.courses[0].end, TraversalEnd::Locked);
    assert!(!site.visited().contains(&BASE.to_string()));
}
