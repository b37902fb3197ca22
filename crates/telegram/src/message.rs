//! Markdown layout of the team alert.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use intake_core::{InputMethod, NotificationRequest};

/// Prompt preview length inside the alert; the full prompt lives in the
/// Notion entry.
const PROMPT_PREVIEW_CHARS: usize = 200;

/// The submission desk operates in Singapore time.
const SGT_OFFSET_SECS: i32 = 8 * 3600;

const DIVIDER: &str = "━━━━━━━━━━━━━━━━━━━━";

fn sgt() -> FixedOffset {
    FixedOffset::east_opt(SGT_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

fn preview(prompt: &str) -> String {
    if prompt.chars().count() <= PROMPT_PREVIEW_CHARS {
        return prompt.to_string();
    }
    let mut cut: String = prompt.chars().take(PROMPT_PREVIEW_CHARS).collect();
    cut.push_str("...");
    cut
}

/// Builds the full alert text for one submission.
pub fn build_alert_text(request: &NotificationRequest, now: DateTime<Utc>) -> String {
    let timestamp = now.with_timezone(&sgt()).format("%m/%d/%Y, %I:%M %p");

    let input_details = match request.input_method {
        InputMethod::Video => match request.video_url.as_deref() {
            Some(url) => format!("*Video URL:* {url}"),
            None => "*Video File:* Uploaded (check the Notion entry for details)".to_string(),
        },
        InputMethod::Text => {
            let prompt = request.text_prompt.as_deref().unwrap_or("No description provided");
            format!("*Description:* {}", preview(prompt))
        }
    };

    let entry_link = match request.entry_url.as_deref() {
        Some(url) => format!("🔗 [View in Notion]({url})"),
        None => "⚠️ *Notion entry pending - check the database manually*".to_string(),
    };

    format!(
        "🎯 *NEW QUOTE REQUEST* #{id}\n\
         \n\
         👤 *Contact*\n\
         {divider}\n\
         *Name:* {name}\n\
         *Email:* {email}\n\
         *Company:* {company}\n\
         \n\
         📊 *Output Columns* ({count})\n\
         {divider}\n\
         {columns}\n\
         \n\
         🎥 *Research Input*\n\
         {divider}\n\
         *Method:* {method}\n\
         {input_details}\n\
         \n\
         ⏰ *Submitted:* {timestamp} SGT\n\
         \n\
         {entry_link}\n\
         \n\
         {divider}\n\
         ⚡ *Action required:* review and send the quote within 2 hours",
        id = request.submission_id,
        divider = DIVIDER,
        name = request.name,
        email = request.email,
        company = request.company,
        count = request.column_count,
        columns = request.columns_formatted,
        method = request.input_method.label(),
    )
}
