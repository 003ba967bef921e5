//! One signed-in walk through the portal.
//!
//! A `PortalSession` owns the single browser tab for the run and the ordered
//! list of course URLs read from the dashboard. Missing elements and expired
//! waits are expected while walking modules and only end the current step;
//! anything else ends the current course, and the walk moves on to the next.

use crate::config::{Credentials, HarvestConfig};
use crate::error::{benign, HarvestError, Result};
use crate::locator::Locator;
use crate::portal::{drive, selectors};
use crate::renderer::PageContext;
use crate::report::{CourseReport, HarvestReport, TraversalEnd};
use crate::wait::{Condition, Waiter};
use tracing::{debug, info, warn};

/// A browser tab driving the portal.
pub struct PortalSession {
    ctx: Box<dyn PageContext>,
    config: HarvestConfig,
    waiter: Waiter,
    courses: Vec<String>,
}

impl PortalSession {
    pub fn new(ctx: Box<dyn PageContext>, config: HarvestConfig) -> Self {
        let waiter = Waiter::new(config.wait_timeout, config.poll_interval);
        Self {
            ctx,
            config,
            waiter,
            courses: Vec::new(),
        }
    }

    /// Course URLs collected from the dashboard, in dashboard order.
    pub fn courses(&self) -> &[String] {
        &self.courses
    }

    /// Sign in, collect the courses and fetch every course's materials.
    pub async fn run(&mut self, credentials: &Credentials) -> Result<HarvestReport> {
        self.open_portal().await?;
        self.login(credentials).await?;
        self.collect_course_links().await?;
        self.fetch_course_materials().await
    }

    /// Load the portal entry page, which redirects to the sign-in form.
    pub async fn open_portal(&mut self) -> Result<()> {
        let url = self.config.base_url()?.to_string();
        let nav = self.ctx.navigate(&url, self.config.nav_timeout_ms).await?;
        info!(url = %nav.final_url, load_ms = nav.load_time_ms, "portal opened");
        Ok(())
    }

    /// Fill in the two-step sign-in form and accept the stay-signed-in prompt.
    ///
    /// Every step except the final prompt is required: without it the run
    /// cannot continue.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        self.type_into(&selectors::email_input(), &credentials.email)
            .await?;
        // The password step renders in place; waiting for its field is enough.
        self.click_when_ready(&selectors::email_submit()).await?;

        self.type_into(&selectors::password_input(), &credentials.password)
            .await?;
        if !self.follow(&selectors::sign_in_button()).await? {
            debug!("sign-in did not leave the password page");
        }

        // Some accounts never get the prompt.
        match benign(self.follow(&selectors::stay_signed_in()).await)? {
            Some(_) => debug!("accepted stay-signed-in prompt"),
            None => debug!("no stay-signed-in prompt"),
        }

        info!(email = %credentials.email, "signed in");
        Ok(())
    }

    /// Read the `href` of every dashboard course card into the session.
    /// Cards without a link are skipped. Returns the number collected.
    pub async fn collect_course_links(&mut self) -> Result<usize> {
        let card = selectors::dashboard_card();
        self.courses.clear();

        if benign(
            self.waiter
                .until(self.ctx.as_ref(), &Condition::Present(card.clone()))
                .await,
        )?
        .is_none()
        {
            warn!("no course cards on the dashboard");
            return Ok(0);
        }

        let count = self.ctx.probe(&card).await?.len();
        for index in 0..count {
            match benign(self.ctx.attribute(&card, index, "href").await)?.flatten() {
                Some(href) => self.courses.push(href),
                None => debug!(index, "course card without a link"),
            }
        }

        info!(count = self.courses.len(), "collected course links");
        Ok(self.courses.len())
    }

    /// Walk every collected course. One course failing does not stop the
    /// others; its report records why it ended.
    pub async fn fetch_course_materials(&mut self) -> Result<HarvestReport> {
        let mut report = HarvestReport::default();
        if self.courses.is_empty() {
            warn!("no course links collected, nothing to fetch");
            return Ok(report);
        }

        let courses = self.courses.clone();
        for (i, course) in courses.iter().enumerate() {
            info!(course = %course, "course {}/{}", i + 1, courses.len());
            let mut course_report = CourseReport::new(course);
            if let Err(e) = self.walk_course(course, &mut course_report).await {
                warn!(course = %course, "course aborted: {e}");
                course_report.end = TraversalEnd::Failed(e.to_string());
            }
            info!(
                course = %course,
                pages = course_report.pages_visited,
                files = course_report.files_clicked,
                videos = course_report.videos_requested,
                end = %course_report.end,
                "course done"
            );
            report.courses.push(course_report);
        }

        Ok(report)
    }

    /// Open the course's first module item and follow "Next" until a locked
    /// item, the last page, or the page cap. At least one page is visited.
    async fn walk_course(&mut self, course: &str, report: &mut CourseReport) -> Result<()> {
        let modules_url = format!("{}/modules", course.trim_end_matches('/'));
        self.ctx
            .navigate(&modules_url, self.config.nav_timeout_ms)
            .await?;

        let item = selectors::first_module_item();
        let first = match benign(
            self.waiter
                .until_first(self.ctx.as_ref(), &Condition::Present(item.clone()))
                .await,
        )? {
            Some(index) => benign(self.ctx.attribute(&item, index, "href").await)?.flatten(),
            None => None,
        };
        let Some(first) = first else {
            report.end = TraversalEnd::NoModules;
            return Ok(());
        };

        self.ctx.navigate(&first, self.config.nav_timeout_ms).await?;

        let lock = Condition::Present(selectors::lock_marker());
        let next = Condition::Clickable(selectors::next_page());
        loop {
            report.pages_visited += 1;
            debug!(page = report.pages_visited, "module page");

            report.files_clicked += self.download_files().await?;
            report.videos_requested += self.download_videos().await?;

            if benign(self.waiter.until(self.ctx.as_ref(), &lock).await)?.is_some() {
                report.end = TraversalEnd::Locked;
                return Ok(());
            }

            if report.pages_visited >= self.config.max_pages {
                warn!(limit = self.config.max_pages, "page limit reached");
                report.end = TraversalEnd::PageLimit;
                return Ok(());
            }

            let Some(index) = benign(self.waiter.until_first(self.ctx.as_ref(), &next).await)?
            else {
                report.end = TraversalEnd::LastPage;
                return Ok(());
            };
            let from = self.ctx.current_url().await?;
            if benign(self.ctx.click(next.locator(), index).await)?.is_none() {
                report.end = TraversalEnd::LastPage;
                return Ok(());
            }
            if !self.ctx.settle(&from, self.config.nav_timeout_ms).await? {
                warn!(url = %from, "\"Next\" did not open another page");
                report.end = TraversalEnd::LastPage;
                return Ok(());
            }
        }
    }

    /// Click every visible file download link on the current page, pausing
    /// between clicks. Returns the number clicked; a page without files is 0.
    pub async fn download_files(&mut self) -> Result<usize> {
        let files = selectors::file_download();
        let Some(hits) = benign(
            self.waiter
                .until(self.ctx.as_ref(), &Condition::AnyVisible(files.clone()))
                .await,
        )?
        else {
            return Ok(0);
        };

        let mut clicked = 0;
        for index in hits {
            match self.ctx.click(&files, index).await {
                Ok(()) => {
                    clicked += 1;
                    tokio::time::sleep(self.config.click_pause).await;
                }
                Err(e) => warn!(index, "file download click failed: {e}"),
            }
        }

        if clicked > 0 {
            info!(count = clicked, "file downloads started");
        }
        Ok(clicked)
    }

    /// Download the page's embedded Drive video through Drive's confirm
    /// page, then return to the module page. Returns 1 when the download was
    /// confirmed, 0 when the page has no usable video.
    pub async fn download_videos(&mut self) -> Result<usize> {
        let video = selectors::embedded_video();
        let src = match benign(
            self.waiter
                .until_first(self.ctx.as_ref(), &Condition::Present(video.clone()))
                .await,
        )? {
            Some(index) => benign(self.ctx.attribute(&video, index, "src").await)?.flatten(),
            None => None,
        };
        let Some(src) = src else {
            return Ok(0);
        };
        let Some(file_id) = drive::file_id_from_embed(&src) else {
            debug!(src = %src, "embedded video is not a Drive file");
            return Ok(0);
        };

        let origin = self.ctx.current_url().await?;
        let file_id = file_id.as_str();
        let url = drive::download_url(file_id);
        let confirmed = match self.ctx.navigate(&url, self.config.nav_timeout_ms).await {
            Ok(_) => match self.click_when_ready(&selectors::drive_download()).await {
                Ok(()) => true,
                Err(e) if e.is_benign() => {
                    debug!(file_id, "no Drive download button");
                    false
                }
                Err(e) => {
                    warn!(file_id, "Drive download click failed: {e}");
                    false
                }
            },
            Err(HarvestError::Navigation { reason, .. }) => {
                warn!(file_id, "could not open Drive download page: {reason}");
                false
            }
            Err(e) => return Err(e),
        };

        if self.ctx.current_url().await? != origin {
            self.ctx.go_back().await?;
        }

        if confirmed {
            info!(file_id, "video download started");
            Ok(1)
        } else {
            Ok(0)
        }
    }

    /// Release the browser tab.
    pub async fn close(self) -> Result<()> {
        self.ctx.close().await
    }

    async fn type_into(&mut self, locator: &Locator, text: &str) -> Result<()> {
        let index = self
            .waiter
            .until_first(self.ctx.as_ref(), &Condition::Present(locator.clone()))
            .await?;
        self.ctx.type_text(locator, index, text).await
    }

    async fn click_when_ready(&mut self, locator: &Locator) -> Result<()> {
        let index = self
            .waiter
            .until_first(self.ctx.as_ref(), &Condition::Clickable(locator.clone()))
            .await?;
        self.ctx.click(locator, index).await
    }

    /// Click `locator` once it is clickable and wait for the page it opens.
    /// Returns `false` when the click did not navigate.
    async fn follow(&mut self, locator: &Locator) -> Result<bool> {
        let index = self
            .waiter
            .until_first(self.ctx.as_ref(), &Condition::Clickable(locator.clone()))
            .await?;
        let from = self.ctx.current_url().await?;
        self.ctx.click(locator, index).await?;
        self.ctx.settle(&from, self.config.nav_timeout_ms).await
    }
}
