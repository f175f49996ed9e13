use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Event lifecycle. Upcoming -> Ongoing -> Completed, with Cancelled
/// reachable from Upcoming or Ongoing. Completed and Cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    Upcoming,
    Ongoing,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Upcoming => "Upcoming",
            EventStatus::Ongoing => "Ongoing",
            EventStatus::Completed => "Completed",
            EventStatus::Cancelled => "Cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<EventStatus> {
        match s {
            "Upcoming" => Some(EventStatus::Upcoming),
            "Ongoing" => Some(EventStatus::Ongoing),
            "Completed" => Some(EventStatus::Completed),
            "Cancelled" => Some(EventStatus::Cancelled),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: EventStatus) -> bool {
        matches!(
            (self, next),
            (EventStatus::Upcoming, EventStatus::Ongoing)
                | (EventStatus::Upcoming, EventStatus::Cancelled)
                | (EventStatus::Ongoing, EventStatus::Completed)
                | (EventStatus::Ongoing, EventStatus::Cancelled)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub institution_id: Uuid,
    pub status: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EventParticipant {
    pub event_id: Uuid,
    pub student_id: Uuid,
    pub attended: Option<bool>,
    pub attendance_marked_by: Option<Uuid>,
    pub attendance_marked_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_transitions() {
        assert!(EventStatus::Upcoming.can_transition_to(EventStatus::Ongoing));
        assert!(EventStatus::Upcoming.can_transition_to(EventStatus::Cancelled));
        assert!(EventStatus::Ongoing.can_transition_to(EventStatus::Completed));
        assert!(EventStatus::Ongoing.can_transition_to(EventStatus::Cancelled));
    }

    #[test]
    fn terminal_states_are_final() {
        for next in [
            EventStatus::Upcoming,
            EventStatus::Ongoing,
            EventStatus::Completed,
            EventStatus::Cancelled,
        ] {
            assert!(!EventStatus::Completed.can_transition_to(next));
            assert!(!EventStatus::Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn no_skipping_ahead() {
        assert!(!EventStatus::Upcoming.can_transition_to(EventStatus::Completed));
        assert!(!EventStatus::Ongoing.can_transition_to(EventStatus::Upcoming));
    }
}
