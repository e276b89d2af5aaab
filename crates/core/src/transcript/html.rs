use std::fmt::Write;

use super::{CloseInfo, TranscriptMessage};

const STYLE: &str = "\
    body{font-family: system-ui, sans-serif; background: #111; color: #eee; padding:20px;}
    .msg{margin:6px 0;padding:8px;border-radius:6px;background:#1b1b1b;}
    .meta{color:#aaa;font-size:12px;margin-bottom:4px;}
    .content{white-space:pre-wrap;}
    .closing{margin-top:16px;border-left:3px solid #f66;}";

/// Render a self-contained HTML transcript.
///
/// Messages are emitted in the order given. All user-supplied text is
/// escaped.
pub fn render_transcript(
    channel_id: &str,
    messages: &[TranscriptMessage],
    close: Option<&CloseInfo>,
) -> String {
    let channel_id = escape_html(channel_id);
    let mut out = String::with_capacity(1024 + messages.len() * 160);

    // writing into a String cannot fail
    let _ = writeln!(out, "<!doctype html>");
    let _ = writeln!(out, "<html lang=\"en\">");
    let _ = writeln!(out, "  <meta charset=\"utf-8\" />");
    let _ = writeln!(out, "  <title>Transcript {}</title>", channel_id);
    let _ = writeln!(out, "  <style>\n{}\n  </style>", STYLE);
    let _ = writeln!(out, "  <body>");
    let _ = writeln!(out, "    <h1>Transcript of channel {}</h1>", channel_id);

    for message in messages {
        let _ = writeln!(
            out,
            "    <div class=\"msg\"><div class=\"meta\">{} ({}) &bull; {}</div><div class=\"content\">{}</div></div>",
            escape_html(&message.author_tag),
            escape_html(&message.author_id),
            message.created_at.to_rfc3339(),
            escape_html(&message.content),
        );
    }

    if let Some(close) = close.filter(|c| !c.is_empty()) {
        let mut lines = Vec::new();
        if let Some(stated) = &close.stated_closer {
            lines.push(format!("Closed by (stated): {}", escape_html(stated)));
        }
        if let Some(id) = &close.actual_closer_id {
            lines.push(format!(
                "Actually closed by: {} (ID: {})",
                escape_html(close.actual_closer_tag.as_deref().unwrap_or("")),
                escape_html(id)
            ));
        }
        let _ = writeln!(
            out,
            "    <div class=\"msg closing\"><div class=\"meta\">Ticket closed</div><div class=\"content\">{}</div></div>",
            lines.join("\n")
        );
    }

    let _ = writeln!(out, "  </body>");
    let _ = write!(out, "</html>");
    out
}

fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn message(id: &str, content: &str) -> TranscriptMessage {
        TranscriptMessage {
            id: id.to_string(),
            author_id: "42".to_string(),
            author_tag: "alice#0001".to_string(),
            content: content.to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"x" & y</b>"#),
            "&lt;b&gt;&quot;x&quot; &amp; y&lt;/b&gt;"
        );
    }

    #[test]
    fn test_render_keeps_order_and_escapes_content() {
        let html = render_transcript(
            "c1",
            &[message("1", "first"), message("2", "<script>alert(1)</script>")],
            None,
        );

        let first = html.find("first").unwrap();
        let second = html.find("&lt;script&gt;").unwrap();
        assert!(first < second);
        assert!(!html.contains("<script>"));
        assert!(html.contains("alice#0001 (42)"));
        assert!(!html.contains("Ticket closed"));
    }

    #[test]
    fn test_render_close_section_distinguishes_closers() {
        let close = CloseInfo {
            stated_closer: Some("Support team".to_string()),
            actual_closer_id: Some("99".to_string()),
            actual_closer_tag: Some("mod#9999".to_string()),
        };
        let html = render_transcript("c1", &[], Some(&close));

        assert!(html.contains("Closed by (stated): Support team"));
        assert!(html.contains("Actually closed by: mod#9999 (ID: 99)"));
    }

    #[test]
    fn test_empty_close_info_renders_no_section() {
        let html = render_transcript("c1", &[], Some(&CloseInfo::default()));
        assert!(!html.contains("Ticket closed"));
        assert!(html.ends_with("</html>"));
    }
}
