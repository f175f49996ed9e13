use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::database::models::account::Student;
use crate::database::models::grace::{
    CoordinatorRecommendation, GraceHistoryEntry, PendingGraceRecommendation,
};

#[derive(Debug, Error)]
pub enum GraceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Duplicate(String),
    #[error("{0}")]
    NotAuthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Reviewer set for a recommendation: the union of teacher ids across the
/// student's Completed events, first-seen order, no duplicates.
pub fn union_teachers(pairs: &[(Uuid, Uuid)]) -> Vec<Uuid> {
    let mut teachers = Vec::new();
    for (_event_id, teacher_id) in pairs {
        if !teachers.contains(teacher_id) {
            teachers.push(*teacher_id);
        }
    }
    teachers
}

/// Preconditions for issuing a recommendation, beyond existence and
/// institution scoping which need the database rows themselves.
pub fn recommendation_preconditions(
    is_volunteer: bool,
    has_pending: bool,
    completed_events: usize,
) -> Result<(), GraceError> {
    if !is_volunteer {
        return Err(GraceError::Validation(
            "Grace marks can only be recommended for volunteers".to_string(),
        ));
    }
    if has_pending {
        return Err(GraceError::Validation(
            "Student already has a pending grace mark recommendation".to_string(),
        ));
    }
    if completed_events == 0 {
        return Err(GraceError::Validation(
            "Student has not participated in any completed event".to_string(),
        ));
    }
    Ok(())
}

fn validate_marks(marks: i32) -> Result<(), GraceError> {
    if marks <= 0 {
        return Err(GraceError::Validation(
            "Marks must be a positive number".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, serde::Serialize)]
pub struct ReviewOutcome {
    pub status: String,
    pub marks: i32,
    pub grace_marks: i32,
}

pub struct GraceService {
    pool: PgPool,
}

impl GraceService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_student(&self, student_id: Uuid) -> Result<Student, GraceError> {
        sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = $1")
            .bind(student_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| GraceError::NotFound("Student not found".to_string()))
    }

    async fn teacher_assigned_to_event(
        &self,
        teacher_id: Uuid,
        event_id: Uuid,
    ) -> Result<bool, GraceError> {
        let row: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM event_teachers WHERE event_id = $1 AND teacher_id = $2",
        )
        .bind(event_id)
        .bind(teacher_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    /// Coordinator issues a grace-mark recommendation for a volunteer.
    ///
    /// The pending row and the coordinator's mirror log are two independent
    /// writes with no transaction between them, matching the behavior this
    /// workflow has always had.
    pub async fn recommend(
        &self,
        coordinator_id: Uuid,
        coordinator_institution: Uuid,
        student_id: Uuid,
        marks: i32,
        reason: &str,
    ) -> Result<PendingGraceRecommendation, GraceError> {
        validate_marks(marks)?;
        if reason.trim().is_empty() {
            return Err(GraceError::Validation("Reason is required".to_string()));
        }

        let student = self.fetch_student(student_id).await?;
        if student.institution_id != coordinator_institution {
            return Err(GraceError::NotAuthorized(
                "Student does not belong to your institution".to_string(),
            ));
        }

        let has_pending: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM pending_grace_recommendations
             WHERE student_id = $1 AND status = 'pending'",
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;

        // (event_id, teacher_id) pairs across the student's Completed events
        let pairs: Vec<(Uuid, Uuid)> = sqlx::query_as(
            "SELECT e.id, et.teacher_id
             FROM events e
             JOIN event_participants ep ON ep.event_id = e.id
             JOIN event_teachers et ON et.event_id = e.id
             WHERE ep.student_id = $1 AND e.status = 'Completed'
             ORDER BY e.created_at",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        let completed_events: Vec<(Uuid,)> = sqlx::query_as(
            "SELECT e.id FROM events e
             JOIN event_participants ep ON ep.event_id = e.id
             WHERE ep.student_id = $1 AND e.status = 'Completed'",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        recommendation_preconditions(
            student.is_volunteer(),
            has_pending.is_some(),
            completed_events.len(),
        )?;

        let assigned_teachers = union_teachers(&pairs);
        if assigned_teachers.is_empty() {
            return Err(GraceError::Validation(
                "No teachers are assigned to the student's completed events".to_string(),
            ));
        }

        let pending = sqlx::query_as::<_, PendingGraceRecommendation>(
            r#"
            INSERT INTO pending_grace_recommendations
                (student_id, marks, reason, recommended_by, assigned_teachers,
                 status, reviewed_by, reviewed_at, created_at)
            VALUES ($1, $2, $3, $4, $5, 'pending', NULL, NULL, $6)
            ON CONFLICT (student_id) DO UPDATE SET
                marks = EXCLUDED.marks,
                reason = EXCLUDED.reason,
                recommended_by = EXCLUDED.recommended_by,
                assigned_teachers = EXCLUDED.assigned_teachers,
                status = 'pending',
                reviewed_by = NULL,
                reviewed_at = NULL,
                created_at = EXCLUDED.created_at
            RETURNING *
            "#,
        )
        .bind(student_id)
        .bind(marks)
        .bind(reason)
        .bind(coordinator_id)
        .bind(&assigned_teachers)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        sqlx::query(
            "INSERT INTO coordinator_recommendations
                 (coordinator_id, student_id, marks, reason, status)
             VALUES ($1, $2, $3, $4, 'pending')",
        )
        .bind(coordinator_id)
        .bind(student_id)
        .bind(marks)
        .bind(reason)
        .execute(&self.pool)
        .await?;

        Ok(pending)
    }

    /// Teacher approves or rejects a pending recommendation.
    pub async fn review(
        &self,
        teacher_id: Uuid,
        student_id: Uuid,
        approve: bool,
    ) -> Result<ReviewOutcome, GraceError> {
        let student = self.fetch_student(student_id).await?;

        let pending = sqlx::query_as::<_, PendingGraceRecommendation>(
            "SELECT * FROM pending_grace_recommendations WHERE student_id = $1",
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?
        .filter(|p| p.is_pending())
        .ok_or_else(|| {
            GraceError::NotFound("No pending grace mark recommendation for this student".to_string())
        })?;

        if !pending.is_assigned_to(teacher_id) {
            return Err(GraceError::NotAuthorized(
                "You are not assigned to review this recommendation".to_string(),
            ));
        }

        let status = if approve { "approved" } else { "rejected" };
        let now = Utc::now();

        // status = 'pending' in the WHERE clause is the only serialization
        // between concurrent reviews
        let updated = sqlx::query(
            "UPDATE pending_grace_recommendations
             SET status = $1, reviewed_by = $2, reviewed_at = $3
             WHERE student_id = $4 AND status = 'pending'",
        )
        .bind(status)
        .bind(teacher_id)
        .bind(now)
        .bind(student_id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(GraceError::NotFound(
                "No pending grace mark recommendation for this student".to_string(),
            ));
        }

        let mut grace_marks = student.grace_marks;
        if approve {
            let row: (i32,) = sqlx::query_as(
                "UPDATE students SET grace_marks = grace_marks + $1
                 WHERE id = $2 RETURNING grace_marks",
            )
            .bind(pending.marks)
            .bind(student_id)
            .fetch_one(&self.pool)
            .await?;
            grace_marks = row.0;
        }

        sqlx::query(
            "INSERT INTO grace_history
                 (student_id, event_id, marks, status, source, awarded_by)
             VALUES ($1, NULL, $2, $3, 'recommendation', $4)",
        )
        .bind(student_id)
        .bind(pending.marks)
        .bind(status)
        .bind(teacher_id)
        .execute(&self.pool)
        .await?;

        // Best-effort sync of the coordinator's mirror log: targets the
        // latest pending entry for this student. A failure here does not
        // fail the review.
        let sync = sqlx::query(
            "UPDATE coordinator_recommendations SET status = $1
             WHERE id = (SELECT id FROM coordinator_recommendations
                         WHERE student_id = $2 AND status = 'pending'
                         ORDER BY created_at DESC LIMIT 1)",
        )
        .bind(status)
        .bind(student_id)
        .execute(&self.pool)
        .await;
        if let Err(e) = sync {
            warn!("coordinator recommendation log sync failed: {}", e);
        }

        Ok(ReviewOutcome {
            status: status.to_string(),
            marks: pending.marks,
            grace_marks,
        })
    }

    /// Teacher directly assigns marks tied to a specific event. Independent
    /// of the recommendation flow; entries from both paths coexist in
    /// grace_history under different shapes.
    pub async fn assign_direct(
        &self,
        teacher_id: Uuid,
        student_id: Uuid,
        event_id: Uuid,
        marks: i32,
    ) -> Result<GraceHistoryEntry, GraceError> {
        validate_marks(marks)?;
        self.fetch_student(student_id).await?;

        let event: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?;
        if event.is_none() {
            return Err(GraceError::NotFound("Event not found".to_string()));
        }

        if !self.teacher_assigned_to_event(teacher_id, event_id).await? {
            return Err(GraceError::NotAuthorized(
                "You are not assigned to this event".to_string(),
            ));
        }

        let participant: Option<(Uuid,)> = sqlx::query_as(
            "SELECT student_id FROM event_participants
             WHERE event_id = $1 AND student_id = $2",
        )
        .bind(event_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;
        if participant.is_none() {
            return Err(GraceError::Validation(
                "Student is not a participant of this event".to_string(),
            ));
        }

        let existing: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM grace_history
             WHERE student_id = $1 AND event_id = $2 AND source = 'direct'",
        )
        .bind(student_id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;
        if existing.is_some() {
            return Err(GraceError::Duplicate(
                "Grace marks already assigned for this student and event".to_string(),
            ));
        }

        let entry = sqlx::query_as::<_, GraceHistoryEntry>(
            "INSERT INTO grace_history
                 (student_id, event_id, marks, status, source, awarded_by)
             VALUES ($1, $2, $3, 'approved', 'direct', $4)
             RETURNING *",
        )
        .bind(student_id)
        .bind(event_id)
        .bind(marks)
        .bind(teacher_id)
        .fetch_one(&self.pool)
        .await?;

        sqlx::query("UPDATE students SET grace_marks = grace_marks + $1 WHERE id = $2")
            .bind(marks)
            .bind(student_id)
            .execute(&self.pool)
            .await?;

        Ok(entry)
    }

    /// Adjust an existing direct entry; the running total moves by the delta.
    pub async fn update_direct(
        &self,
        teacher_id: Uuid,
        student_id: Uuid,
        event_id: Uuid,
        marks: i32,
    ) -> Result<GraceHistoryEntry, GraceError> {
        validate_marks(marks)?;

        let existing = sqlx::query_as::<_, GraceHistoryEntry>(
            "SELECT * FROM grace_history
             WHERE student_id = $1 AND event_id = $2 AND source = 'direct'",
        )
        .bind(student_id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            GraceError::NotFound("No grace mark entry for this student and event".to_string())
        })?;

        if !self.teacher_assigned_to_event(teacher_id, event_id).await? {
            return Err(GraceError::NotAuthorized(
                "You are not assigned to this event".to_string(),
            ));
        }

        let delta = marks - existing.marks;

        let entry = sqlx::query_as::<_, GraceHistoryEntry>(
            "UPDATE grace_history SET marks = $1, awarded_by = $2
             WHERE id = $3 RETURNING *",
        )
        .bind(marks)
        .bind(teacher_id)
        .bind(existing.id)
        .fetch_one(&self.pool)
        .await?;

        sqlx::query("UPDATE students SET grace_marks = grace_marks + $1 WHERE id = $2")
            .bind(delta)
            .bind(student_id)
            .execute(&self.pool)
            .await?;

        Ok(entry)
    }

    /// Remove a direct entry and subtract its marks from the total.
    pub async fn delete_direct(
        &self,
        teacher_id: Uuid,
        student_id: Uuid,
        event_id: Uuid,
    ) -> Result<(), GraceError> {
        let existing = sqlx::query_as::<_, GraceHistoryEntry>(
            "SELECT * FROM grace_history
             WHERE student_id = $1 AND event_id = $2 AND source = 'direct'",
        )
        .bind(student_id)
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            GraceError::NotFound("No grace mark entry for this student and event".to_string())
        })?;

        if !self.teacher_assigned_to_event(teacher_id, event_id).await? {
            return Err(GraceError::NotAuthorized(
                "You are not assigned to this event".to_string(),
            ));
        }

        sqlx::query("DELETE FROM grace_history WHERE id = $1")
            .bind(existing.id)
            .execute(&self.pool)
            .await?;

        sqlx::query("UPDATE students SET grace_marks = grace_marks - $1 WHERE id = $2")
            .bind(existing.marks)
            .bind(student_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Recommendations the coordinator has issued, newest first.
    pub async fn coordinator_log(
        &self,
        coordinator_id: Uuid,
    ) -> Result<Vec<CoordinatorRecommendation>, GraceError> {
        let entries = sqlx::query_as::<_, CoordinatorRecommendation>(
            "SELECT * FROM coordinator_recommendations
             WHERE coordinator_id = $1 ORDER BY created_at DESC",
        )
        .bind(coordinator_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// Running total plus the full history, both record kinds.
    pub async fn history(
        &self,
        student_id: Uuid,
    ) -> Result<(i32, Vec<GraceHistoryEntry>), GraceError> {
        let student = self.fetch_student(student_id).await?;

        let entries = sqlx::query_as::<_, GraceHistoryEntry>(
            "SELECT * FROM grace_history WHERE student_id = $1 ORDER BY recorded_at DESC",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok((student.grace_marks, entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(n: u8) -> Uuid {
        Uuid::from_bytes([n; 16])
    }

    #[test]
    fn union_teachers_dedups_across_events() {
        let pairs = vec![
            (uid(1), uid(10)),
            (uid(1), uid(11)),
            (uid(2), uid(10)),
            (uid(3), uid(12)),
        ];
        assert_eq!(union_teachers(&pairs), vec![uid(10), uid(11), uid(12)]);
    }

    #[test]
    fn union_teachers_empty_input() {
        assert!(union_teachers(&[]).is_empty());
    }

    #[test]
    fn recommendation_requires_volunteer_role() {
        let err = recommendation_preconditions(false, false, 2).unwrap_err();
        assert!(matches!(err, GraceError::Validation(_)));
    }

    #[test]
    fn recommendation_rejects_duplicate_pending() {
        let err = recommendation_preconditions(true, true, 2).unwrap_err();
        assert!(matches!(err, GraceError::Validation(_)));
    }

    #[test]
    fn recommendation_requires_completed_event() {
        let err = recommendation_preconditions(true, false, 0).unwrap_err();
        assert!(matches!(err, GraceError::Validation(_)));
    }

    #[test]
    fn recommendation_allows_eligible_volunteer() {
        assert!(recommendation_preconditions(true, false, 1).is_ok());
    }

    #[test]
    fn marks_must_be_positive() {
        assert!(matches!(validate_marks(0), Err(GraceError::Validation(_))));
        assert!(matches!(validate_marks(-5), Err(GraceError::Validation(_))));
        assert!(validate_marks(5).is_ok());
    }
}
