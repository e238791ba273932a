//! Chromium driver over the DevTools protocol.
//!
//! With the `browser` feature, [`ChromiumSessions`] launches one Chromium
//! process per session through chromiumoxide. Element reads evaluate the
//! locator's script in the page and serialize every match into an
//! [`ElementSnapshot`](crate::driver::ElementSnapshot). Pointer events go
//! through `Input.dispatchMouseEvent`, so the application sees a real drag.
//!
//! Without the feature, opening a session fails with
//! [`ProbeError::BrowserLaunch`](crate::result::ProbeError::BrowserLaunch).

use crate::locator::{js_string, Locator};

/// Script returning a snapshot object for every match of `locator`
#[must_use]
pub fn snapshot_script(locator: &Locator) -> String {
    format!(
        r"(() => {{
  const els = {els};
  return els.map(el => {{
    const r = el.getBoundingClientRect();
    const s = window.getComputedStyle(el);
    const visible = r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none';
    return {{
      visible,
      enabled: !el.disabled && el.getAttribute('aria-disabled') !== 'true',
      text: el.innerText ?? el.textContent ?? '',
      value: ('value' in el && typeof el.value === 'string') ? el.value : null,
      test_id: el.getAttribute('data-testid'),
      bounding_box: {{ x: r.x, y: r.y, width: r.width, height: r.height }},
    }};
  }});
}})()",
        els = locator.to_js()
    )
}

/// Script scrolling the first match into the middle of the viewport
#[must_use]
pub fn scroll_script(locator: &Locator) -> String {
    format!(
        "(() => {{ const el = {els}[0]; if (!el) return false; \
         el.scrollIntoView({{ block: 'center', inline: 'center' }}); return true; }})()",
        els = locator.to_js()
    )
}

/// Script setting an input's value the way a user edit does
#[must_use]
pub fn fill_script(locator: &Locator, text: &str) -> String {
    format!(
        "(() => {{ const el = {els}[0]; if (!el) return false; el.focus(); \
         const proto = el instanceof HTMLTextAreaElement ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype; \
         Object.getOwnPropertyDescriptor(proto, 'value').set.call(el, {text}); \
         el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
         el.dispatchEvent(new Event('change', {{ bubbles: true }})); return true; }})()",
        els = locator.to_js(),
        text = js_string(text)
    )
}

/// Script choosing a select option by value
#[must_use]
pub fn select_script(locator: &Locator, value: &str) -> String {
    format!(
        "(() => {{ const el = {els}[0]; if (!(el instanceof HTMLSelectElement)) return false; \
         if (!Array.from(el.options).some(o => o.value === {value})) return false; \
         el.value = {value}; \
         el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
         el.dispatchEvent(new Event('change', {{ bubbles: true }})); return true; }})()",
        els = locator.to_js(),
        value = js_string(value)
    )
}

#[cfg(feature = "browser")]
pub use cdp::{ChromiumDriver, ChromiumSessions};

#[cfg(not(feature = "browser"))]
pub use unavailable::ChromiumSessions;

#[cfg(feature = "browser")]
#[allow(clippy::missing_errors_doc, clippy::significant_drop_tightening)]
mod cdp {
    use super::{fill_script, scroll_script, select_script, snapshot_script};
    use crate::config::{BrowserSettings, HarnessConfig};
    use crate::driver::{BrowserDriver, ElementSnapshot, PointerEvent, SessionFactory};
    use crate::locator::{Locator, Point};
    use crate::result::{NotFoundReason, ProbeError, ProbeResult};
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::browser_protocol::input::{
        DispatchMouseEventParams, DispatchMouseEventType, MouseButton,
    };
    use chromiumoxide::handler::viewport::Viewport;
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tracing::{debug, info};

    fn driver_err(e: impl std::fmt::Display) -> ProbeError {
        ProbeError::driver(e.to_string())
    }

    /// One Chromium process with a single page
    #[derive(Debug)]
    pub struct ChromiumDriver {
        browser: Mutex<CdpBrowser>,
        page: CdpPage,
        handle: tokio::task::JoinHandle<()>,
        closed: AtomicBool,
    }

    impl ChromiumDriver {
        /// Launch Chromium and open a blank page
        pub async fn launch(settings: &BrowserSettings) -> ProbeResult<Self> {
            let mut builder = CdpConfig::builder()
                .window_size(settings.viewport_width, settings.viewport_height)
                .viewport(Viewport {
                    width: settings.viewport_width,
                    height: settings.viewport_height,
                    ..Viewport::default()
                });
            if !settings.headless {
                builder = builder.with_head();
            }
            if !settings.sandbox {
                builder = builder.no_sandbox();
            }
            if let Some(ref path) = settings.chromium_path {
                builder = builder.chrome_executable(path);
            }
            let cdp_config = builder
                .build()
                .map_err(|message| ProbeError::BrowserLaunch { message })?;

            let (browser, mut handler) =
                CdpBrowser::launch(cdp_config)
                    .await
                    .map_err(|e| ProbeError::BrowserLaunch {
                        message: e.to_string(),
                    })?;

            let handle = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| ProbeError::BrowserLaunch {
                    message: e.to_string(),
                })?;
            info!(
                headless = settings.headless,
                width = settings.viewport_width,
                height = settings.viewport_height,
                "chromium launched"
            );

            Ok(Self {
                browser: Mutex::new(browser),
                page,
                handle,
                closed: AtomicBool::new(false),
            })
        }

        fn ensure_open(&self) -> ProbeResult<()> {
            if self.closed.load(Ordering::SeqCst) {
                return Err(ProbeError::driver("session already closed"));
            }
            Ok(())
        }

        async fn eval<T: serde::de::DeserializeOwned>(&self, script: String) -> ProbeResult<T> {
            self.ensure_open()?;
            self.page
                .evaluate(script)
                .await
                .map_err(driver_err)?
                .into_value()
                .map_err(driver_err)
        }

        async fn first_center(&self, locator: &Locator) -> ProbeResult<Point> {
            let _: bool = self.eval(scroll_script(locator)).await?;
            let matches: Vec<ElementSnapshot> = self.eval(snapshot_script(locator)).await?;
            let first = matches.first().ok_or_else(|| ProbeError::ElementNotFound {
                what: "click target".to_string(),
                locator: locator.to_string(),
                reason: NotFoundReason::Missing,
            })?;
            first
                .bounding_box
                .filter(crate::locator::BoundingBox::is_measurable)
                .map(|b| b.center())
                .ok_or_else(|| ProbeError::GeometryUnavailable {
                    what: format!("click target {locator}"),
                })
        }

        async fn mouse(
            &self,
            kind: DispatchMouseEventType,
            at: Point,
            pressed: bool,
        ) -> ProbeResult<()> {
            self.ensure_open()?;
            let (button, buttons) = if pressed {
                (MouseButton::Left, 1)
            } else {
                (MouseButton::None, 0)
            };
            let mut params = DispatchMouseEventParams::builder()
                .r#type(kind.clone())
                .x(at.x)
                .y(at.y)
                .button(button)
                .buttons(buttons);
            if !matches!(kind, DispatchMouseEventType::MouseMoved) {
                params = params.click_count(1);
            }
            let params = params.build().map_err(ProbeError::driver)?;
            self.page.execute(params).await.map_err(driver_err)?;
            Ok(())
        }
    }

    #[async_trait]
    impl BrowserDriver for ChromiumDriver {
        async fn navigate(&self, url: &str) -> ProbeResult<()> {
            self.ensure_open()?;
            self.page
                .goto(url)
                .await
                .map_err(|e| ProbeError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
            Ok(())
        }

        async fn current_url(&self) -> ProbeResult<String> {
            self.ensure_open()?;
            Ok(self
                .page
                .url()
                .await
                .map_err(driver_err)?
                .unwrap_or_default())
        }

        async fn query(&self, locator: &Locator) -> ProbeResult<Vec<ElementSnapshot>> {
            let mut matches: Vec<ElementSnapshot> = self.eval(snapshot_script(locator)).await?;
            for snapshot in &mut matches {
                if !snapshot.visible {
                    snapshot.bounding_box = None;
                }
            }
            Ok(matches)
        }

        async fn click(&self, locator: &Locator) -> ProbeResult<()> {
            let at = self.first_center(locator).await?;
            debug!(%locator, x = at.x, y = at.y, "cdp click");
            self.mouse(DispatchMouseEventType::MouseMoved, at, false).await?;
            self.mouse(DispatchMouseEventType::MousePressed, at, true).await?;
            self.mouse(DispatchMouseEventType::MouseReleased, at, true).await
        }

        async fn fill(&self, locator: &Locator, text: &str) -> ProbeResult<()> {
            let filled: bool = self.eval(fill_script(locator, text)).await?;
            if filled {
                Ok(())
            } else {
                Err(ProbeError::driver(format!("cannot fill {locator}")))
            }
        }

        async fn select_option(&self, locator: &Locator, value: &str) -> ProbeResult<()> {
            let selected: bool = self.eval(select_script(locator, value)).await?;
            if selected {
                Ok(())
            } else {
                Err(ProbeError::driver(format!(
                    "{locator} has no option with value {value:?}"
                )))
            }
        }

        async fn dispatch_pointer(&self, event: PointerEvent) -> ProbeResult<()> {
            match event {
                PointerEvent::Down(at) => {
                    self.mouse(DispatchMouseEventType::MousePressed, at, true).await
                }
                PointerEvent::Move { at, held } => {
                    self.mouse(DispatchMouseEventType::MouseMoved, at, held).await
                }
                PointerEvent::Up(at) => {
                    self.mouse(DispatchMouseEventType::MouseReleased, at, true).await
                }
            }
        }

        async fn close(&self) -> ProbeResult<()> {
            if self.closed.swap(true, Ordering::SeqCst) {
                return Ok(());
            }
            let mut browser = self.browser.lock().await;
            let result = browser.close().await.map(|_| ()).map_err(driver_err);
            let _ = browser.wait().await;
            self.handle.abort();
            result
        }
    }

    /// Launches a fresh Chromium for every session
    #[derive(Debug, Default)]
    pub struct ChromiumSessions {
        launched: AtomicUsize,
    }

    impl ChromiumSessions {
        /// New factory
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Browsers launched so far
        #[must_use]
        pub fn launched(&self) -> usize {
            self.launched.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SessionFactory for ChromiumSessions {
        fn label(&self) -> &str {
            "chromium"
        }

        async fn open(&self, config: Arc<HarnessConfig>) -> ProbeResult<Box<dyn BrowserDriver>> {
            let driver = ChromiumDriver::launch(&config.browser).await?;
            let _ = self.launched.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(driver))
        }
    }
}

#[cfg(not(feature = "browser"))]
mod unavailable {
    use crate::config::HarnessConfig;
    use crate::driver::{BrowserDriver, SessionFactory};
    use crate::result::{ProbeError, ProbeResult};
    use async_trait::async_trait;
    use std::sync::Arc;

    /// Placeholder factory for builds without the `browser` feature
    #[derive(Debug, Default)]
    pub struct ChromiumSessions;

    impl ChromiumSessions {
        /// New factory
        #[must_use]
        pub fn new() -> Self {
            Self
        }

        /// Browsers launched so far
        #[must_use]
        pub const fn launched(&self) -> usize {
            0
        }
    }

    #[async_trait]
    impl SessionFactory for ChromiumSessions {
        fn label(&self) -> &str {
            "chromium"
        }

        async fn open(&self, _config: Arc<HarnessConfig>) -> ProbeResult<Box<dyn BrowserDriver>> {
            Err(ProbeError::BrowserLaunch {
                message: "talent-probe was built without the `browser` feature".to_string(),
            })
        }
    }
}
