//! Maps a submission onto Notion page properties.

use chrono::{DateTime, Utc};
use intake_core::EntryRequest;
use serde_json::{json, Map, Value};

/// Builds the `POST /v1/pages` body for one submission. The submission id
/// becomes the page title; optional video/text content only appears when
/// present.
pub fn build_page_payload(
    database_id: &str,
    request: &EntryRequest,
    submitted_at: DateTime<Utc>,
) -> Value {
    let mut properties = Map::new();

    properties.insert(
        "Submission ID".to_string(),
        json!({ "title": [{ "text": { "content": request.submission_id.as_str() } }] }),
    );
    properties.insert("Name".to_string(), rich_text(&request.name));
    properties.insert("Email".to_string(), json!({ "email": request.email }));
    properties.insert("Company".to_string(), rich_text(&request.company));
    properties.insert(
        "Input Method".to_string(),
        json!({ "select": { "name": request.input_method.label() } }),
    );
    properties.insert("Column Count".to_string(), json!({ "number": request.column_count }));
    properties.insert("Requested Columns".to_string(), rich_text(&request.columns_formatted));
    properties.insert("Status".to_string(), json!({ "select": { "name": "New" } }));
    properties.insert(
        "Submitted At".to_string(),
        json!({ "date": { "start": submitted_at.to_rfc3339() } }),
    );

    if let Some(video_url) = &request.video_url {
        properties.insert("Video URL".to_string(), json!({ "url": video_url }));
    }
    if let Some(text_prompt) = &request.text_prompt {
        properties.insert("Text Prompt".to_string(), rich_text(text_prompt));
    }

    json!({
        "parent": { "database_id": database_id },
        "properties": Value::Object(properties),
    })
}

fn rich_text(content: &str) -> Value {
    json!({ "rich_text": [{ "text": { "content": content } }] })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use intake_core::{EntryRequest, InputMethod, SubmissionId};

    use super::build_page_payload;

    fn entry_request() -> EntryRequest {
        EntryRequest {
            submission_id: SubmissionId("SUB-20240307-123456".to_string()),
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            company: "Analytical Engines".to_string(),
            input_method: InputMethod::Text,
            video_url: None,
            text_prompt: Some("Extract vendor pricing".to_string()),
            columns_formatted: "1. Vendor (text)\n2. Price (number)".to_string(),
            column_count: 2,
        }
    }

    #[test]
    fn payload_targets_the_configured_database() {
        let payload =
            build_page_payload("db-123", &entry_request(), Utc.timestamp_opt(1_700_000_000, 0).unwrap());

        assert_eq!(payload["parent"]["database_id"], "db-123");
    }

    #[test]
    fn submission_id_is_the_page_title() {
        let payload =
            build_page_payload("db-123", &entry_request(), Utc.timestamp_opt(1_700_000_000, 0).unwrap());

        assert_eq!(
            payload["properties"]["Submission ID"]["title"][0]["text"]["content"],
            "SUB-20240307-123456"
        );
    }

    #[test]
    fn optional_content_is_omitted_when_absent() {
        let payload =
            build_page_payload("db-123", &entry_request(), Utc.timestamp_opt(1_700_000_000, 0).unwrap());
        let properties = payload["properties"].as_object().unwrap();

        assert!(!properties.contains_key("Video URL"));
        assert_eq!(
            properties["Text Prompt"]["rich_text"][0]["text"]["content"],
            "Extract vendor pricing"
        );
    }

    #[test]
    fn video_submissions_carry_the_url_property() {
        let mut request = entry_request();
        request.input_method = InputMethod::Video;
        request.video_url = Some("https://example.com/walkthrough.mp4".to_string());
        request.text_prompt = None;

        let payload =
            build_page_payload("db-123", &request, Utc.timestamp_opt(1_700_000_000, 0).unwrap());
        let properties = payload["properties"].as_object().unwrap();

        assert_eq!(properties["Video URL"]["url"], "https://example.com/walkthrough.mp4");
        assert!(!properties.contains_key("Text Prompt"));
        assert_eq!(properties["Input Method"]["select"]["name"], "Video");
    }

    #[test]
    fn column_summary_properties_are_present() {
        let payload =
            build_page_payload("db-123", &entry_request(), Utc.timestamp_opt(1_700_000_000, 0).unwrap());
        let properties = payload["properties"].as_object().unwrap();

        assert_eq!(properties["Column Count"]["number"], 2);
        assert_eq!(
            properties["Requested Columns"]["rich_text"][0]["text"]["content"],
            "1. Vendor (text)\n2. Price (number)"
        );
        assert_eq!(properties["Status"]["select"]["name"], "New");
    }
}
