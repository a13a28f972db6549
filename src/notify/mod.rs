//! Success and failure banners that hide themselves again.
//!
//! The page is abstracted behind [`BannerPage`] so the same logic drives a
//! real document binding or the in-memory page used in tests. Showing a
//! banner is synchronous; hiding it happens on a spawned tokio timer, so
//! the `show_*` calls must run inside a runtime.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::debug;

pub mod memory;

pub use memory::{MemoryBanner, MemoryPage};

pub const SUCCESS_CONTAINER: &str = "#success";
pub const SUCCESS_TEXT: &str = "#success-text";
pub const FAILURE_CONTAINER: &str = "#failed";
pub const FAILURE_TEXT: &str = "#failed-text";
pub const HIDDEN_CLASS: &str = "visually-hidden";

pub const DEFAULT_HIDE_AFTER: Duration = Duration::from_millis(2000);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotifyError {
    #[error("element {0} not found")]
    MissingElement(&'static str),
}

/// A single element on the page.
pub trait Banner: Send + Sync {
    fn set_text(&self, text: &str);
    fn add_class(&self, class: &str);
    fn remove_class(&self, class: &str);
    fn has_class(&self, class: &str) -> bool;
}

pub trait BannerPage: Send + Sync {
    fn find(&self, selector: &str) -> Option<Arc<dyn Banner>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BannerKind {
    Success,
    Failure,
}

impl BannerKind {
    fn selectors(self) -> (&'static str, &'static str) {
        match self {
            BannerKind::Success => (SUCCESS_CONTAINER, SUCCESS_TEXT),
            BannerKind::Failure => (FAILURE_CONTAINER, FAILURE_TEXT),
        }
    }
}

pub struct Notifier {
    page: Arc<dyn BannerPage>,
    hide_after: Duration,
}

impl Notifier {
    pub fn new(page: Arc<dyn BannerPage>) -> Self {
        Self {
            page,
            hide_after: DEFAULT_HIDE_AFTER,
        }
    }

    pub fn with_hide_after(mut self, hide_after: Duration) -> Self {
        self.hide_after = hide_after;
        self
    }

    pub fn show_success(&self, message: &str) -> Result<JoinHandle<()>, NotifyError> {
        self.show(BannerKind::Success, message)
    }

    pub fn show_failure(&self, message: &str) -> Result<JoinHandle<()>, NotifyError> {
        self.show(BannerKind::Failure, message)
    }

    fn show(&self, kind: BannerKind, message: &str) -> Result<JoinHandle<()>, NotifyError> {
        let (container_selector, text_selector) = kind.selectors();

        // resolve both elements before touching either
        let container = self
            .page
            .find(container_selector)
            .ok_or(NotifyError::MissingElement(container_selector))?;
        let text = self
            .page
            .find(text_selector)
            .ok_or(NotifyError::MissingElement(text_selector))?;

        text.set_text(message);
        container.remove_class(HIDDEN_CLASS);
        debug!(banner = container_selector, "Banner shown");

        let hide_after = self.hide_after;
        Ok(tokio::spawn(async move {
            tokio::time::sleep(hide_after).await;
            container.add_class(HIDDEN_CLASS);
            debug!(banner = container_selector, "Banner hidden");
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Arc<MemoryPage>, Notifier) {
        let page = Arc::new(MemoryPage::with_banners());
        let notifier = Notifier::new(page.clone());
        (page, notifier)
    }

    #[tokio::test(start_paused = true)]
    async fn success_banner_shows_then_hides_after_two_seconds() {
        let (page, notifier) = setup();
        let container = page.banner(SUCCESS_CONTAINER).unwrap();
        assert!(container.has_class(HIDDEN_CLASS));

        let timer = notifier.show_success("Saved").unwrap();
        assert_eq!(page.banner(SUCCESS_TEXT).unwrap().text(), "Saved");
        assert!(!container.has_class(HIDDEN_CLASS));

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert!(!container.has_class(HIDDEN_CLASS));

        tokio::time::sleep(Duration::from_millis(1)).await;
        timer.await.unwrap();
        assert!(container.has_class(HIDDEN_CLASS));
        assert_eq!(page.banner(SUCCESS_TEXT).unwrap().text(), "Saved");
    }

    #[tokio::test(start_paused = true)]
    async fn failure_banner_leaves_success_banner_alone() {
        let (page, notifier) = setup();

        let timer = notifier.show_failure("Upload failed").unwrap();
        assert_eq!(page.banner(FAILURE_TEXT).unwrap().text(), "Upload failed");
        assert!(!page.banner(FAILURE_CONTAINER).unwrap().has_class(HIDDEN_CLASS));
        timer.await.unwrap();

        let success = page.banner(SUCCESS_CONTAINER).unwrap();
        assert!(success.has_class(HIDDEN_CLASS));
        assert_eq!(page.banner(SUCCESS_TEXT).unwrap().text(), "");
        assert_eq!(success.mutations(), 0);
        assert_eq!(page.banner(SUCCESS_TEXT).unwrap().mutations(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn success_banner_leaves_failure_banner_alone() {
        let (page, notifier) = setup();

        let timer = notifier.show_success("Saved").unwrap();
        assert!(!page.banner(SUCCESS_CONTAINER).unwrap().has_class(HIDDEN_CLASS));
        timer.await.unwrap();

        let failure = page.banner(FAILURE_CONTAINER).unwrap();
        assert!(failure.has_class(HIDDEN_CLASS));
        assert_eq!(page.banner(FAILURE_TEXT).unwrap().text(), "");
        assert_eq!(failure.mutations(), 0);
        assert_eq!(page.banner(FAILURE_TEXT).unwrap().mutations(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn each_call_runs_its_own_timer() {
        let (page, notifier) = setup();
        let container = page.banner(SUCCESS_CONTAINER).unwrap();

        let first = notifier.show_success("one").unwrap();
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let second = notifier.show_success("two").unwrap();

        // the first timer still fires at its own deadline
        first.await.unwrap();
        assert!(container.has_class(HIDDEN_CLASS));
        assert_eq!(page.banner(SUCCESS_TEXT).unwrap().text(), "two");

        second.await.unwrap();
        assert!(container.has_class(HIDDEN_CLASS));
    }

    #[tokio::test(start_paused = true)]
    async fn custom_delay_is_honoured() {
        let (page, notifier) = setup();
        let notifier = notifier.with_hide_after(Duration::from_millis(50));
        let container = page.banner(FAILURE_CONTAINER).unwrap();

        let timer = notifier.show_failure("nope").unwrap();
        tokio::time::sleep(Duration::from_millis(49)).await;
        assert!(!container.has_class(HIDDEN_CLASS));
        timer.await.unwrap();
        assert!(container.has_class(HIDDEN_CLASS));
    }

    #[tokio::test]
    async fn missing_element_fails_without_mutating() {
        let page = Arc::new(MemoryPage::new());
        let container = page.insert(FAILURE_CONTAINER, MemoryBanner::hidden());
        let notifier = Notifier::new(page.clone());

        assert_eq!(
            notifier.show_failure("lost").unwrap_err(),
            NotifyError::MissingElement(FAILURE_TEXT)
        );
        assert!(container.has_class(HIDDEN_CLASS));
        assert_eq!(container.mutations(), 0);

        assert_eq!(
            notifier.show_success("lost").unwrap_err(),
            NotifyError::MissingElement(SUCCESS_CONTAINER)
        );
    }
}
