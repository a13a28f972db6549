use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use super::{Banner, BannerPage, HIDDEN_CLASS};
use super::{FAILURE_CONTAINER, FAILURE_TEXT, SUCCESS_CONTAINER, SUCCESS_TEXT};

#[derive(Default)]
struct BannerState {
    text: String,
    classes: BTreeSet<String>,
    mutations: usize,
}

/// An element held in memory. Counts every mutation so tests can assert an
/// element was never touched.
#[derive(Default)]
pub struct MemoryBanner {
    state: RwLock<BannerState>,
}

impl MemoryBanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// An element that starts with the hidden marker.
    pub fn hidden() -> Self {
        let banner = Self::default();
        banner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .classes
            .insert(HIDDEN_CLASS.to_string());
        banner
    }

    pub fn text(&self) -> String {
        self.state.read().unwrap_or_else(PoisonError::into_inner).text.clone()
    }

    pub fn mutations(&self) -> usize {
        self.state.read().unwrap_or_else(PoisonError::into_inner).mutations
    }

    fn mutate(&self, f: impl FnOnce(&mut BannerState)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state);
        state.mutations += 1;
    }
}

impl Banner for MemoryBanner {
    fn set_text(&self, text: &str) {
        self.mutate(|s| s.text = text.to_string());
    }

    fn add_class(&self, class: &str) {
        self.mutate(|s| {
            s.classes.insert(class.to_string());
        });
    }

    fn remove_class(&self, class: &str) {
        self.mutate(|s| {
            s.classes.remove(class);
        });
    }

    fn has_class(&self, class: &str) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .classes
            .contains(class)
    }
}

/// Selector-addressed set of [`MemoryBanner`]s.
#[derive(Default)]
pub struct MemoryPage {
    elements: RwLock<HashMap<String, Arc<MemoryBanner>>>,
}

impl MemoryPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Both banners present and hidden, with empty text.
    pub fn with_banners() -> Self {
        let page = Self::new();
        page.insert(SUCCESS_CONTAINER, MemoryBanner::hidden());
        page.insert(SUCCESS_TEXT, MemoryBanner::new());
        page.insert(FAILURE_CONTAINER, MemoryBanner::hidden());
        page.insert(FAILURE_TEXT, MemoryBanner::new());
        page
    }

    pub fn insert(&self, selector: &str, banner: MemoryBanner) -> Arc<MemoryBanner> {
        let banner = Arc::new(banner);
        self.elements
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(selector.to_string(), banner.clone());
        banner
    }

    pub fn banner(&self, selector: &str) -> Option<Arc<MemoryBanner>> {
        self.elements
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(selector)
            .cloned()
    }
}

impl BannerPage for MemoryPage {
    fn find(&self, selector: &str) -> Option<Arc<dyn Banner>> {
        self.banner(selector).map(|b| b as Arc<dyn Banner>)
    }
}
