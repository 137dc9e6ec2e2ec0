use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::{error, info};

use crate::contract::PageRenderer;
use crate::error::FixtureError;

/// Screenshots pages with a headless Chrome launched for each call.
#[derive(Debug, Clone, Default)]
pub struct ChromeRenderer {
    browser: Option<PathBuf>,
}

impl ChromeRenderer {
    pub fn new(browser: Option<PathBuf>) -> Self {
        Self { browser }
    }
}

#[async_trait]
impl PageRenderer for ChromeRenderer {
    async fn screenshot(&self, page: &Path, destination: &Path) -> Result<(), FixtureError> {
        let started_at = Instant::now();
        let page = tokio::fs::canonicalize(page)
            .await
            .map_err(FixtureError::io(page))?;
        let url = format!("file://{}", page.display());
        let browser = self.browser.clone();

        info!(url = %url, destination = %destination.display(), "Rendering page headlessly");
        let png = tokio::task::spawn_blocking(move || capture_full_page(browser, &url))
            .await
            .map_err(|e| FixtureError::Render(format!("render task aborted: {e}")))?
            .inspect_err(|e| error!(error = %e, "Headless render failed"))?;

        tokio::fs::write(destination, &png)
            .await
            .map_err(FixtureError::io(destination))?;
        info!(
            destination = %destination.display(),
            bytes = png.len(),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            "Saved page screenshot"
        );
        Ok(())
    }
}

fn capture_full_page(browser: Option<PathBuf>, url: &str) -> Result<Vec<u8>, FixtureError> {
    let options = LaunchOptions::default_builder()
        .headless(true)
        .path(browser)
        .build()
        .map_err(render_error)?;
    let browser = Browser::new(options).map_err(render_error)?;
    let tab = browser.new_tab().map_err(render_error)?;
    tab.navigate_to(url)
        .map_err(render_error)?
        .wait_until_navigated()
        .map_err(render_error)?;

    let clip = Page::Viewport {
        x: 0.0,
        y: 0.0,
        width: dimension(&tab, "document.documentElement.scrollWidth")?,
        height: dimension(&tab, "document.documentElement.scrollHeight")?,
        scale: 1.0,
    };
    tab.capture_screenshot(
        Page::CaptureScreenshotFormatOption::Png,
        None,
        Some(clip),
        true,
    )
    .map_err(render_error)
}

fn dimension(tab: &Tab, expression: &str) -> Result<f64, FixtureError> {
    tab.evaluate(expression, false)
        .map_err(render_error)?
        .value
        .and_then(|value| value.as_f64())
        .ok_or_else(|| FixtureError::Render(format!("`{expression}` did not return a number")))
}

fn render_error(err: impl std::fmt::Display) -> FixtureError {
    FixtureError::Render(err.to_string())
}
