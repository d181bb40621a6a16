use anyhow::{Context, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use scraper::Html;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::fetch::error::FetchError;

/// Quote a string as a JavaScript literal.
fn js_quote(raw: &str) -> String {
    serde_json::Value::String(raw.to_string()).to_string()
}

/// Session tuning knobs. Defaults match the cadence the sites tolerate:
/// a couple of seconds of settle time after each navigation side effect,
/// ten seconds before a missing element counts as absent.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub headless: bool,
    pub window_size: (u32, u32),
    /// Pause after navigations and scrolls so dynamic content can render.
    pub settle: Duration,
    /// Default budget for `wait_for`.
    pub wait_timeout: Duration,
    /// Polling interval inside `wait_for`.
    pub poll: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_size: (1920, 1080),
            settle: Duration::from_secs(2),
            wait_timeout: Duration::from_secs(10),
            poll: Duration::from_millis(250),
        }
    }
}

impl SessionConfig {
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }
}

/// One owned browser and one tab driving it.
///
/// The session is the single shared mutable resource of a run: it is passed
/// into the harvester and enricher by the caller and released when dropped,
/// so every exit path closes the browser. Pages are read by capturing the
/// rendered DOM as HTML and parsing it with `scraper`; element handles are
/// never cached across navigations.
pub struct BrowserSession {
    #[allow(dead_code)]
    browser: Browser,
    tab: Arc<Tab>,
    config: SessionConfig,
}

impl BrowserSession {
    pub fn open(config: SessionConfig) -> Result<Self> {
        info!("Launching headless Chrome...");

        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some(config.window_size))
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(options).context("Failed to launch Chrome browser")?;
        let tab = browser.new_tab().context("Failed to open tab")?;

        Ok(Self {
            browser,
            tab,
            config,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Navigate to `url`, wait for the navigation to finish, then give the
    /// page a settle pause for client-side rendering.
    pub fn load(&self, url: &str) -> Result<(), FetchError> {
        debug!("Loading {}", url);
        self.tab
            .navigate_to(url)
            .map_err(|e| FetchError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| FetchError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        thread::sleep(self.config.settle);
        Ok(())
    }

    /// Evaluate a script and return its JSON value, if any.
    pub fn eval(&self, js: &str) -> Result<Option<serde_json::Value>, FetchError> {
        let result = self
            .tab
            .evaluate(js, false)
            .map_err(|e| FetchError::Eval(e.to_string()))?;
        Ok(result.value)
    }

    /// Capture the rendered DOM and parse it.
    pub fn snapshot(&self) -> Result<Html, FetchError> {
        Ok(Html::parse_document(&self.snapshot_html()?))
    }

    /// Capture the rendered DOM as a string.
    pub fn snapshot_html(&self) -> Result<String, FetchError> {
        let value = self.eval("document.documentElement.outerHTML")?;
        match value.as_ref().and_then(|v| v.as_str()) {
            Some(html) => Ok(html.to_string()),
            None => Err(FetchError::Eval("page returned no HTML".to_string())),
        }
    }

    /// Poll until `selector` matches something, up to `timeout`.
    pub fn wait_for(&self, selector: &str, timeout: Duration) -> Result<(), FetchError> {
        let probe = format!("document.querySelector({}) !== null", js_quote(selector));
        let started = Instant::now();
        loop {
            if let Some(value) = self.eval(&probe)? {
                if value.as_bool() == Some(true) {
                    return Ok(());
                }
            }
            if started.elapsed() >= timeout {
                return Err(FetchError::WaitTimeout {
                    selector: selector.to_string(),
                    waited: timeout,
                });
            }
            thread::sleep(self.config.poll);
        }
    }

    /// Wait with the session's default budget.
    pub fn wait_for_default(&self, selector: &str) -> Result<(), FetchError> {
        self.wait_for(selector, self.config.wait_timeout)
    }

    /// Click the first match of `selector` from inside the page. Returns
    /// whether anything was there to click.
    pub fn click_js(&self, selector: &str) -> Result<bool, FetchError> {
        let js = format!(
            "(() => {{ const el = document.querySelector({}); if (el) {{ el.click(); return true; }} return false; }})()",
            js_quote(selector)
        );
        let clicked = self
            .eval(&js)?
            .as_ref()
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if clicked {
            thread::sleep(self.config.settle);
        }
        Ok(clicked)
    }

    /// Click the `index`-th match of `selector`, scrolling it into view
    /// first so lazy links activate.
    pub fn click_nth(&self, selector: &str, index: usize) -> Result<bool, FetchError> {
        let js = format!(
            "(() => {{ const els = document.querySelectorAll({q}); const el = els[{i}]; \
             if (el) {{ el.scrollIntoView({{block: 'center'}}); el.click(); return true; }} return false; }})()",
            q = js_quote(selector),
            i = index
        );
        let clicked = self
            .eval(&js)?
            .as_ref()
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if clicked {
            thread::sleep(self.config.settle);
        }
        Ok(clicked)
    }

    /// Click every match of `selector` (accordion headers and the like).
    /// Returns how many elements were clicked.
    pub fn click_all_js(&self, selector: &str) -> Result<u64, FetchError> {
        let js = format!(
            "(() => {{ const els = document.querySelectorAll({}); els.forEach(el => el.click()); return els.length; }})()",
            js_quote(selector)
        );
        let clicked = self
            .eval(&js)?
            .as_ref()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0) as u64;
        if clicked > 0 {
            thread::sleep(self.config.settle);
        }
        Ok(clicked)
    }

    /// Click the first button whose text contains `text`. CSS cannot match
    /// on text content, so this goes through the page's own DOM.
    pub fn click_button_with_text(&self, text: &str) -> Result<bool, FetchError> {
        let js = format!(
            "(() => {{ const el = [...document.querySelectorAll('button')].find(b => b.textContent.includes({})); \
             if (el) {{ el.click(); return true; }} return false; }})()",
            js_quote(text)
        );
        let clicked = self
            .eval(&js)?
            .as_ref()
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if clicked {
            thread::sleep(self.config.settle);
        }
        Ok(clicked)
    }

    pub fn scroll_to_bottom(&self) -> Result<(), FetchError> {
        self.eval("window.scrollTo(0, document.body.scrollHeight);")?;
        thread::sleep(self.config.settle);
        Ok(())
    }

    /// One step of an infinite-scroll gesture.
    pub fn scroll_viewport_step(&self) -> Result<(), FetchError> {
        self.eval("window.scrollBy(0, window.innerHeight * 0.8);")?;
        thread::sleep(self.config.settle);
        Ok(())
    }

    pub fn body_height(&self) -> Result<u64, FetchError> {
        let value = self.eval("document.body.scrollHeight")?;
        Ok(value.as_ref().and_then(|v| v.as_f64()).unwrap_or(0.0) as u64)
    }

    pub fn current_url(&self) -> String {
        self.tab.get_url()
    }

    /// Go back in history and let the previous page settle. Callers must
    /// re-wait for their container: the listing DOM re-renders on return.
    pub fn back(&self) -> Result<(), FetchError> {
        self.eval("history.back();")?;
        thread::sleep(self.config.settle);
        Ok(())
    }
}
