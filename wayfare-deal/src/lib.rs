pub mod models;
pub mod parser;
pub mod generator;
pub mod formatter;

pub use models::{ContentParts, DealFields, GeneratedContent, TravelDeal};
pub use parser::{parse_deal_text, parse_travel_deal};
pub use generator::{ContentGenerator, ContentKind};
pub use formatter::{assemble, format_post, render_html, EmojiPick};
