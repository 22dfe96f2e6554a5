pub mod card;
pub mod format;
pub mod render;

pub use card::{BadgeStyle, CardAction, MarketCardView, StatusBadge};
pub use format::{format_ether, format_price, short_address, time_remaining};
pub use render::{render_card, render_page, render_submission, PageBody, PageView};
