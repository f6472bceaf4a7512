use serde::{Deserialize, Serialize};

/// Counts shown on the admin dashboard. Every field is always present;
/// a count that could not be read is reported as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Active products
    pub products: i64,
    /// Published blog posts
    pub blog_posts: i64,
    /// Active FAQs
    pub faqs: i64,
    /// Active testimonials
    pub testimonials: i64,
    pub unread_messages: i64,
}
