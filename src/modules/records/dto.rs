use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

pub const DEFAULT_PER_PAGE: usize = 30;
pub const MAX_PER_PAGE: usize = 500;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

impl PageQuery {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> usize {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordPage {
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub items: Vec<Value>,
}

impl RecordPage {
    pub fn slice(all: Vec<Value>, query: &PageQuery) -> Self {
        let (page, per_page) = (query.page(), query.per_page());
        let total_items = all.len();
        let items = match (page - 1).checked_mul(per_page) {
            Some(offset) => all.into_iter().skip(offset).take(per_page).collect(),
            None => Vec::new(),
        };
        Self {
            page,
            per_page,
            total_items,
            total_pages: total_items.div_ceil(per_page),
            items,
        }
    }
}
