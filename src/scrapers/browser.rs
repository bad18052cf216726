use crate::config::BrowserSettings;
use crate::error::{Result, ScrapeError};
use crate::scrapers::extract::{DETAIL_BODY, LISTING_CARD};
use anyhow::Context;
use headless_chrome::protocol::cdp::Emulation;
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const READY_STATE_POLL: Duration = Duration::from_millis(100);

/// Which element signals that a page is usable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// At least one listing card has rendered
    Listing,
    /// The document body exists
    Detail,
}

impl Readiness {
    pub fn selector(self) -> &'static str {
        match self {
            Readiness::Listing => LISTING_CARD,
            Readiness::Detail => DETAIL_BODY,
        }
    }
}

/// One headless Chrome process with a single fingerprinted tab.
///
/// Dropping the session closes the tab and kills the browser process, so
/// every exit path (including `?` and panics) releases it.
pub struct BrowserSession {
    tab: Arc<Tab>,
    ready_timeout: Duration,
    // Declared last so the tab is released before the process goes away
    _browser: Browser,
}

impl BrowserSession {
    /// Launch headless Chrome with the configured fingerprint
    pub fn launch(settings: &BrowserSettings) -> Result<Self> {
        Self::try_launch(settings).map_err(|e| ScrapeError::Launch(format!("{:#}", e)))
    }

    fn try_launch(settings: &BrowserSettings) -> anyhow::Result<Self> {
        debug!("Launching headless Chrome...");

        let lang_arg = format!("--lang={}", settings.locale);
        let args = vec![
            OsStr::new("--disable-blink-features=AutomationControlled"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new(lang_arg.as_str()),
        ];

        let options = LaunchOptions::default_builder()
            .headless(settings.headless)
            .window_size(Some(settings.window_size))
            .ignore_certificate_errors(true)
            .args(args)
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;
        let tab = browser.new_tab().context("Failed to open tab")?;

        tab.set_user_agent(&settings.user_agent, Some(&settings.locale), None)
            .context("Failed to set user agent")?;
        tab.call_method(Emulation::SetTimezoneOverride {
            timezone_id: settings.timezone.clone(),
        })
        .context("Failed to override timezone")?;
        if let Err(e) = tab.call_method(Emulation::SetLocaleOverride {
            locale: Some(settings.locale.replace('-', "_")),
        }) {
            // Only Accept-Language and --lang apply then
            warn!("Locale override rejected: {}", e);
        }

        Ok(Self {
            tab,
            ready_timeout: settings.ready_timeout,
            _browser: browser,
        })
    }

    /// Navigate to `url`, wait until the DOM is parsed, then for the readiness
    /// selector. Any failure is a `NavigationTimeout`.
    ///
    /// `nav_timeout` bounds the `readyState` poll only. The `Page.navigate`
    /// call before it is bounded by headless_chrome's transport timeout.
    pub fn open(&self, url: &str, readiness: Readiness, nav_timeout: Duration) -> Result<()> {
        info!("Opening {}", url);

        self.tab
            .navigate_to(url)
            .map_err(|e| ScrapeError::navigation(url, e))?;
        self.wait_for_dom(url, nav_timeout)?;

        self.tab
            .wait_for_element_with_custom_timeout(readiness.selector(), self.ready_timeout)
            .map_err(|e| {
                ScrapeError::navigation(
                    url,
                    format!("'{}' did not appear: {}", readiness.selector(), e),
                )
            })?;

        debug!("Page ready: {}", url);
        Ok(())
    }

    /// Poll `document.readyState` until parsing is done; full resource load
    /// is not awaited.
    fn wait_for_dom(&self, url: &str, timeout: Duration) -> Result<()> {
        let started = Instant::now();
        loop {
            let state = self
                .tab
                .evaluate("document.readyState", false)
                .ok()
                .and_then(|obj| obj.value)
                .and_then(|v| v.as_str().map(str::to_string));

            match state.as_deref() {
                Some("interactive") | Some("complete") => return Ok(()),
                _ if started.elapsed() >= timeout => {
                    return Err(ScrapeError::navigation(
                        url,
                        format!("DOM not ready after {:?}", timeout),
                    ))
                }
                _ => thread::sleep(READY_STATE_POLL),
            }
        }
    }

    /// Snapshot of the rendered document
    pub fn page_html(&self) -> anyhow::Result<String> {
        let result = self
            .tab
            .evaluate("document.documentElement.outerHTML", false)
            .context("Failed to read page HTML")?;
        let html = result
            .value
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        if html.is_empty() {
            anyhow::bail!("Page HTML is empty");
        }
        debug!("Captured {} bytes of HTML", html.len());
        Ok(html)
    }

    /// Click the `index`-th element matching `button_selector`, then wait for
    /// `target_selector` and return its text.
    pub fn click_and_read(
        &self,
        button_selector: &str,
        index: usize,
        target_selector: &str,
        timeout: Duration,
    ) -> anyhow::Result<String> {
        let buttons = self
            .tab
            .find_elements(button_selector)
            .context("No reveal buttons found")?;
        let button = buttons.get(index).with_context(|| {
            format!("Expected at least {} reveal buttons, found {}", index + 1, buttons.len())
        })?;
        button.click().context("Failed to click reveal button")?;

        let target = self
            .tab
            .wait_for_element_with_custom_timeout(target_selector, timeout)
            .with_context(|| format!("'{}' did not appear", target_selector))?;
        target.get_inner_text().context("Failed to read revealed text")
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(false) {
            debug!("Tab close failed during teardown: {}", e);
        }
        debug!("Browser session closed");
    }
}
