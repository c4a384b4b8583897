//! Window-level facilities: injected wallet lookup, tabs, alerts, timers.

use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};
use gloo_timers::future::TimeoutFuture;
use lib_wallet::registry::InjectedDetection;
use lib_wallet::{BrowserEnv, Eip1193, Timer};

use super::ethereum::find_injected;

#[derive(Debug, Default)]
pub struct WebBrowser;

impl BrowserEnv for WebBrowser {
    fn injected(&self, detection: &InjectedDetection) -> Option<Rc<dyn Eip1193>> {
        find_injected(detection).map(|provider| Rc::new(provider) as Rc<dyn Eip1193>)
    }

    fn open_in_new_tab(&self, url: &str) {
        let opened = web_sys::window().map(|w| w.open_with_url_and_target(url, "_blank"));
        if !matches!(opened, Some(Ok(Some(_)))) {
            log::warn!("Could not open {} (popup blocked?)", url);
        }
    }

    fn alert(&self, message: &str) {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }
}

/// `setTimeout`-backed sleeps.
#[derive(Debug, Default)]
pub struct GlooTimer;

impl Timer for GlooTimer {
    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
        TimeoutFuture::new(ms).boxed_local()
    }
}
