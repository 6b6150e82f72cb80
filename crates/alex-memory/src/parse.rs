//! Marker-based parsing of summarizer model responses (§4.4 step 3),
//! ported from `_parse_summary_response`.

/// Splits a model response into its summary body and topic/theme list.
/// Tries the `KEY_TOPICS:` marker first, then `KEY_THEMES:`; falls back to
/// treating the entire response as the summary if neither marker appears.
pub fn parse_summary_response(response: &str) -> (String, Vec<String>) {
    let marker = if response.contains("KEY_TOPICS:") {
        Some("KEY_TOPICS:")
    } else if response.contains("KEY_THEMES:") {
        Some("KEY_THEMES:")
    } else {
        None
    };

    let Some(marker) = marker else {
        let summary = strip_prefix_marker(response.trim(), "SUMMARY:");
        return (summary.to_string(), Vec::new());
    };

    let mut parts = response.splitn(2, marker);
    let summary_part = parts.next().unwrap_or_default();
    let topics_part = parts.next().unwrap_or_default().trim();

    let summary = strip_prefix_marker(summary_part.trim(), "SUMMARY:").to_string();

    let raw_topics: Vec<&str> = if topics_part.contains(',') {
        topics_part.split(',').collect()
    } else {
        topics_part.lines().collect()
    };

    let topics: Vec<String> = raw_topics
        .into_iter()
        .map(clean_topic_label)
        .filter(|t| t.len() > 1)
        .collect();

    (summary, topics)
}

fn strip_prefix_marker<'a>(s: &'a str, marker: &str) -> &'a str {
    match s.find(marker) {
        Some(idx) => s[idx + marker.len()..].trim(),
        None => s,
    }
}

fn clean_topic_label(raw: &str) -> String {
    raw.trim().trim_start_matches('-').trim().trim_matches(|c| c == '[' || c == ']').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_topics() {
        let response = "SUMMARY:\nWe discussed the new pipeline.\n\nKEY_TOPICS:\n[pipeline, rust, testing]";
        let (summary, topics) = parse_summary_response(response);
        assert_eq!(summary, "We discussed the new pipeline.");
        assert_eq!(topics, vec!["pipeline", "rust", "testing"]);
    }

    #[test]
    fn parses_newline_separated_themes() {
        let response = "SUMMARY:\nA strategic month.\n\nKEY_THEMES:\n- infrastructure\n- hiring\n";
        let (summary, themes) = parse_summary_response(response);
        assert_eq!(summary, "A strategic month.");
        assert_eq!(themes, vec!["infrastructure", "hiring"]);
    }

    #[test]
    fn falls_back_to_whole_response_without_markers() {
        let response = "just some free text";
        let (summary, topics) = parse_summary_response(response);
        assert_eq!(summary, "just some free text");
        assert!(topics.is_empty());
    }

    #[test]
    fn drops_empty_and_single_char_topics() {
        let response = "SUMMARY:\nx\n\nKEY_TOPICS:\na, , bb";
        let (_, topics) = parse_summary_response(response);
        assert_eq!(topics, vec!["bb"]);
    }
}
