use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NoticeKind {
    Meeting,
    Maintenance,
    Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticePriority {
    Low,
    Medium,
    High,
}

/// Announcement posted by the society committee. Times are local to the
/// society.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub id: String,
    pub title: String,
    pub description: String,
    pub scheduled_for: NaiveDateTime,
    pub kind: NoticeKind,
    pub priority: NoticePriority,
}

impl Notice {
    /// Card subtitle, e.g. `Feb 15, 2024 • 6:00 PM`.
    pub fn display_date(&self) -> String {
        self.scheduled_for.format("%b %-d, %Y • %-I:%M %p").to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NoticeBoard {
    notices: Vec<Notice>,
}

impl NoticeBoard {
    pub fn new(notices: Vec<Notice>) -> Self {
        Self { notices }
    }

    /// Board shipped with the app.
    pub fn standard() -> Self {
        Self::new(vec![
            notice(
                "1",
                "Annual General Meeting",
                "Annual general meeting to discuss society matters and elect new committee members.",
                "2024-02-15T18:00:00",
                NoticeKind::Meeting,
                NoticePriority::High,
            ),
            notice(
                "2",
                "Water Supply Maintenance",
                "Scheduled maintenance of water supply system. Please store water in advance.",
                "2024-02-10T10:00:00",
                NoticeKind::Maintenance,
                NoticePriority::Medium,
            ),
            notice(
                "3",
                "Cultural Event",
                "Join us for a cultural evening with music and dance performances by society members.",
                "2024-02-20T19:00:00",
                NoticeKind::Event,
                NoticePriority::Low,
            ),
        ])
    }

    /// Notices ordered newest first.
    pub fn latest(&self) -> Vec<Notice> {
        let mut notices = self.notices.clone();
        notices.sort_by(|left, right| right.scheduled_for.cmp(&left.scheduled_for));
        notices
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}

fn notice(
    id: &str,
    title: &str,
    description: &str,
    scheduled_for: &str,
    kind: NoticeKind,
    priority: NoticePriority,
) -> Notice {
    Notice {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        scheduled_for: NaiveDateTime::parse_from_str(scheduled_for, "%Y-%m-%dT%H:%M:%S")
            .unwrap_or_default(),
        kind,
        priority,
    }
}
