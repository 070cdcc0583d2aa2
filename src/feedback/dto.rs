use serde::{Deserialize, Serialize};

use crate::feedback::repo::Feedback;

pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct CreateFeedbackRequest {
    pub email: String,
    pub message: String,
    pub rating: i32,
}

impl CreateFeedbackRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.email.trim().is_empty() {
            return Err("email is required".into());
        }
        if self.message.trim().is_empty() {
            return Err("message is required".into());
        }
        if !(1..=5).contains(&self.rating) {
            return Err("rating must be between 1 and 5".into());
        }
        Ok(())
    }
}

/// Filters and paging of `GET /feedback`.
#[derive(Debug, Deserialize)]
pub struct FeedbackQuery {
    pub rating: Option<i32>,
    pub email: Option<String>,
    #[serde(default = "default_page_number")]
    pub page_number: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page_number() -> i64 {
    1
}

fn default_page_size() -> i64 {
    10
}

impl FeedbackQuery {
    /// Page number and size clamped to sane bounds.
    pub fn page(&self) -> (i64, i64) {
        (
            self.page_number.max(1),
            self.page_size.clamp(1, MAX_PAGE_SIZE),
        )
    }

    /// Rows to skip; saturates so far-out pages read as empty.
    pub fn offset(&self) -> i64 {
        let (number, size) = self.page();
        (number - 1).saturating_mul(size)
    }

    pub fn email_filter(&self) -> Option<&str> {
        self.email.as_deref().map(str::trim).filter(|e| !e.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct FeedbackPage {
    pub total_items: i64,
    pub total_pages: i64,
    pub page_number: i64,
    pub page_size: i64,
    pub feedbacks: Vec<Feedback>,
}

pub fn total_pages(total_items: i64, page_size: i64) -> i64 {
    if page_size <= 0 {
        return 0;
    }
    (total_items + page_size - 1) / page_size
}
