//! DOM identifiers the workflow depends on.
//!
//! These belong to the Microsoft sign-in page, the Canvas dashboard and
//! module viewer, and the Google Drive download page. They change when those
//! sites change, and nowhere else.

use crate::locator::Locator;

pub fn email_input() -> Locator {
    Locator::id("i0116")
}

/// "Next" on the e-mail step of the sign-in form.
pub fn email_submit() -> Locator {
    Locator::id("idSIButton9")
}

pub fn password_input() -> Locator {
    Locator::id("i0118")
}

pub fn sign_in_button() -> Locator {
    Locator::css(r#"input[value="Sign in"]"#)
}

/// "Yes" on the stay-signed-in prompt.
pub fn stay_signed_in() -> Locator {
    Locator::css(r#"input[value="Yes"]"#)
}

pub fn dashboard_card() -> Locator {
    Locator::class("ic-DashboardCard__link")
}

pub fn first_module_item() -> Locator {
    Locator::css("div.module-item-title > span > a")
}

/// Shown in place of an item still gated behind prerequisites.
pub fn lock_marker() -> Locator {
    Locator::class("lock_explanation")
}

pub fn next_page() -> Locator {
    Locator::link_text("Next")
}

pub fn file_download() -> Locator {
    Locator::css(r#"a[download="true"], a.file_download_btn"#)
}

pub fn embedded_video() -> Locator {
    Locator::css(
        "#wiki_page_show > div.show-content.user_content.clearfix.enhanced > p > iframe",
    )
}

pub fn drive_download() -> Locator {
    Locator::id("uc-download-link")
}
