use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A student's single open (or most recently reviewed) recommendation.
/// The row is overwritten by the next recommendation cycle, never deleted
/// on review.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PendingGraceRecommendation {
    pub student_id: Uuid,
    pub marks: i32,
    pub reason: String,
    pub recommended_by: Uuid,
    pub assigned_teachers: Vec<Uuid>,
    pub status: String,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PendingGraceRecommendation {
    pub fn is_pending(&self) -> bool {
        self.status == "pending"
    }

    pub fn is_assigned_to(&self, teacher_id: Uuid) -> bool {
        self.assigned_teachers.contains(&teacher_id)
    }
}

/// History entry. Two record kinds share this table: recommendation
/// outcomes carry no event_id, direct teacher-assigned marks are keyed by
/// event. See the `source` column.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GraceHistoryEntry {
    pub id: Uuid,
    pub student_id: Uuid,
    pub event_id: Option<Uuid>,
    pub marks: i32,
    pub status: String,
    pub source: String,
    pub awarded_by: Option<Uuid>,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only mirror of a recommendation as seen from the issuing
/// coordinator's side.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CoordinatorRecommendation {
    pub id: Uuid,
    pub coordinator_id: Uuid,
    pub student_id: Uuid,
    pub marks: i32,
    pub reason: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recommendation(status: &str, teachers: Vec<Uuid>) -> PendingGraceRecommendation {
        PendingGraceRecommendation {
            student_id: Uuid::new_v4(),
            marks: 5,
            reason: "Led the cleanliness drive".to_string(),
            recommended_by: Uuid::new_v4(),
            assigned_teachers: teachers,
            status: status.to_string(),
            reviewed_by: None,
            reviewed_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn pending_predicate_tracks_status() {
        assert!(recommendation("pending", vec![]).is_pending());
        assert!(!recommendation("approved", vec![]).is_pending());
        assert!(!recommendation("rejected", vec![]).is_pending());
    }

    #[test]
    fn assignment_check_matches_only_listed_teachers() {
        let assigned = Uuid::new_v4();
        let rec = recommendation("pending", vec![assigned]);
        assert!(rec.is_assigned_to(assigned));
        assert!(!rec.is_assigned_to(Uuid::new_v4()));
    }
}
