//! Announcement text assembly.
//!
//! One pure template over a schedule row and the two route descriptions.
//! Every distribution channel receives the identical body; [`Channel`] only
//! labels the output blocks.

use crate::schedule::ScheduleRow;

const BOOKING_URL: &str = "https://groups.runtogether.co.uk/RunTogetherRadcliffe/Runs";
const CANCEL_URL: &str = "https://groups.runtogether.co.uk/My/BookedRuns";

/// Where an announcement block is destined. Distribution itself is manual;
/// this only names the three copy-paste targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Email,
    Chat,
    Social,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Email, Channel::Chat, Channel::Social];

    pub fn heading(self) -> &'static str {
        match self {
            Channel::Email => "📧 Email Message",
            Channel::Chat => "📱 WhatsApp Message",
            Channel::Social => "📣 Facebook Message",
        }
    }
}

/// Builds the announcement for one run week.
///
/// A route's description only appears (indented, under its route line) when
/// it is non-empty, so un-enriched sessions still produce a complete message.
pub fn compose(row: &ScheduleRow, desc_8k: &str, desc_5k: &str) -> String {
    let lines = [
        "🌟 It’s nearly time to lace up! Here's what we’ve got planned:".to_string(),
        format!("📍 Meeting at: {}", row.meeting_point),
        "🕖 We set off at 7:00pm".to_string(),
        String::new(),
        "🛣️ This week we’ve got two route options to choose from:".to_string(),
        route_line("8k", &row.route_8k, row.link_8k.as_deref(), desc_8k),
        route_line("5k", &row.route_5k, row.link_5k.as_deref(), desc_5k),
        String::new(),
        format!("📲 Book now: {BOOKING_URL}"),
        format!("❌ Can’t make it? Cancel at least 1 hour before: {CANCEL_URL}"),
        String::new(),
        "Grab your shoes, bring your smiles – see you Thursday! 👟".to_string(),
    ];
    lines.join("\n")
}

fn route_line(label: &str, name: &str, link: Option<&str>, description: &str) -> String {
    let mut line = match link {
        Some(link) => format!("• {label} – {name}: {link}"),
        None => format!("• {label} – {name}"),
    };
    if !description.is_empty() {
        line.push_str("\n   ");
        line.push_str(description);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_row() -> ScheduleRow {
        ScheduleRow {
            week: "14".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 4, 4).unwrap(),
            meeting_point: "Town Hall steps".to_string(),
            route_8k: "Canal Loop".to_string(),
            link_8k: Some("https://www.strava.com/routes/1".to_string()),
            route_5k: "Riverside".to_string(),
            link_5k: Some("https://www.strava.com/routes/2".to_string()),
        }
    }

    #[test]
    fn test_compose_includes_fixed_lines() {
        let message = compose(&sample_row(), "", "");
        assert!(message.contains("📍 Meeting at: Town Hall steps"));
        assert!(message.contains("🕖 We set off at 7:00pm"));
        assert!(message.contains(BOOKING_URL));
        assert!(message.contains(CANCEL_URL));
    }

    #[test]
    fn test_compose_route_lines_carry_links() {
        let message = compose(&sample_row(), "", "");
        assert!(message.contains("• 8k – Canal Loop: https://www.strava.com/routes/1"));
        assert!(message.contains("• 5k – Riverside: https://www.strava.com/routes/2"));
    }

    #[test]
    fn test_compose_empty_description_has_no_continuation() {
        let message = compose(&sample_row(), "", "");
        assert!(!message.contains("\n   "));
    }

    #[test]
    fn test_compose_description_appears_verbatim_indented() {
        let desc = "No landmarks found along the route. It passes (53.56120, -2.32510).";
        let message = compose(&sample_row(), desc, "");
        assert!(message.contains(&format!("routes/1\n   {desc}")));
        // Only the 8k line gained a continuation.
        assert_eq!(message.matches("\n   ").count(), 1);
    }

    #[test]
    fn test_compose_without_link_omits_separator() {
        let mut row = sample_row();
        row.link_5k = None;
        let message = compose(&row, "", "");
        assert!(message.contains("• 5k – Riverside\n"));
        assert!(!message.contains("• 5k – Riverside:"));
    }

    #[test]
    fn test_channel_headings_are_distinct() {
        let headings: Vec<&str> = Channel::ALL.iter().map(|c| c.heading()).collect();
        assert_eq!(headings.len(), 3);
        assert!(headings.contains(&"📱 WhatsApp Message"));
    }
}
