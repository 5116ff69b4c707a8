use pulldown_cmark::{html, CowStr, Event, Tag};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{ContentParts, GeneratedContent, TravelDeal};

pub const TROPICAL_EMOJIS: &[&str] = &["🌴", "🏝️", "🌊", "☀️", "🍹", "🐚"];
pub const SUBTITLE_EMOJIS: &[&str] = &["✨", "🌟", "💫", "🔥", "😍"];

pub const CONTACT_BLOCK: &str = "📞 Call our travel team or send us a message to secure this deal.\n\
💬 Prices and availability are subject to change at the time of booking.";

/// Emojis for the title and subtitle lines. Picking them is the only random step of formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmojiPick {
    pub title: &'static str,
    pub subtitle: &'static str,
}

impl EmojiPick {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            title: TROPICAL_EMOJIS.choose(rng).copied().unwrap_or("🌴"),
            subtitle: SUBTITLE_EMOJIS.choose(rng).copied().unwrap_or("✨"),
        }
    }
}

impl Default for EmojiPick {
    fn default() -> Self {
        Self {
            title: TROPICAL_EMOJIS[0],
            subtitle: SUBTITLE_EMOJIS[0],
        }
    }
}

/// Render the plain-text social post. Deterministic for a given deal, content and emoji pick.
pub fn format_post(deal: &TravelDeal, parts: &ContentParts, emojis: EmojiPick) -> String {
    let mut sections: Vec<String> = Vec::new();

    sections.push(format!(
        "{} {}\n{} {}",
        emojis.title, deal.title, emojis.subtitle, parts.subtitle
    ));

    let mut details = Vec::new();
    if let Some(destination) = &deal.destination {
        details.push(format!("📍 {}", destination));
    }
    if let Some(date) = &deal.travel_date {
        details.push(format!("📅 {}", date));
    }
    if let Some(nights) = &deal.nights {
        details.push(format!("🌙 {}", nights_label(nights)));
    }
    if let Some(board) = &deal.board_basis {
        details.push(format!("🍽️ {}", board));
    }
    if let Some(airport) = &deal.departure_airport {
        details.push(format!("✈️ Flying from {}", airport));
    }
    if let Some(luggage) = &deal.luggage_transfers {
        details.push(format!("🧳 {}", luggage));
    }
    if let Some(price) = &deal.price {
        details.push(format!("💷 Total cost from £{}pp", price.trim().trim_start_matches('£')));
    }
    if !details.is_empty() {
        sections.push(details.join("\n"));
    }

    sections.push(parts.resort_summary.clone());
    sections.push(CONTACT_BLOCK.to_string());
    sections.push(parts.hashtags.clone());

    sections.join("\n\n")
}

/// Format the post and bundle it with the pieces it was built from.
pub fn assemble(deal: &TravelDeal, parts: ContentParts, emojis: EmojiPick) -> GeneratedContent {
    let post = format_post(deal, &parts, emojis);
    GeneratedContent {
        subtitle: parts.subtitle,
        resort_summary: parts.resort_summary,
        hashtags: parts.hashtags,
        post,
    }
}

fn nights_label(nights: &str) -> String {
    match nights.trim().parse::<u32>() {
        Ok(1) => "1 Night".to_string(),
        Ok(n) => format!("{} Nights", n),
        Err(_) => nights.trim().to_string(),
    }
}

/// HTML rendering of a plain-text post for richer previews: blank-line separated blocks become
/// paragraphs, single newlines become line breaks and the first line is bold.
pub fn render_html(post: &str) -> String {
    let mut events: Vec<Event> = Vec::new();

    let blocks = post
        .split("\n\n")
        .map(str::trim)
        .filter(|block| !block.is_empty());

    for (block_index, block) in blocks.enumerate() {
        events.push(Event::Start(Tag::Paragraph));
        for (line_index, line) in block.lines().enumerate() {
            if line_index > 0 {
                events.push(Event::HardBreak);
            }
            let text = Event::Text(CowStr::from(line.to_string()));
            if block_index == 0 && line_index == 0 {
                events.push(Event::Start(Tag::Strong));
                events.push(text);
                events.push(Event::End(Tag::Strong));
            } else {
                events.push(text);
            }
        }
        events.push(Event::End(Tag::Paragraph));
    }

    let mut out = String::new();
    html::push_html(&mut out, events.into_iter());
    out
}
