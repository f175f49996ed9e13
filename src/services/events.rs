use chrono::{DateTime, Utc};
use futures::future::try_join;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::account::Role;
use crate::database::models::event::{Event, EventParticipant, EventStatus};

#[derive(Debug, Error)]
pub enum EventError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotAuthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub struct EventService {
    pool: PgPool,
}

impl EventService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_event(&self, event_id: Uuid) -> Result<Event, EventError> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| EventError::NotFound("Event not found".to_string()))
    }

    async fn notify(
        &self,
        role: Role,
        recipient_id: Uuid,
        event_id: Uuid,
        message: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO notifications (recipient_role, recipient_id, event_id, message)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(role.as_str())
        .bind(recipient_id)
        .bind(event_id)
        .bind(message)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Create an event in the coordinator's institution. Teachers and
    /// volunteers named in the payload are attached immediately and each
    /// receives one notification row.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        coordinator_id: Uuid,
        institution_id: Uuid,
        title: &str,
        description: &str,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        teacher_ids: &[Uuid],
        participant_ids: &[Uuid],
    ) -> Result<Event, EventError> {
        if title.trim().is_empty() {
            return Err(EventError::Validation("Title is required".to_string()));
        }
        if ends_at <= starts_at {
            return Err(EventError::Validation(
                "Event must end after it starts".to_string(),
            ));
        }

        let event = sqlx::query_as::<_, Event>(
            "INSERT INTO events (title, description, institution_id, status, starts_at, ends_at, created_by)
             VALUES ($1, $2, $3, 'Upcoming', $4, $5, $6)
             RETURNING *",
        )
        .bind(title)
        .bind(description)
        .bind(institution_id)
        .bind(starts_at)
        .bind(ends_at)
        .bind(coordinator_id)
        .fetch_one(&self.pool)
        .await?;

        for teacher_id in teacher_ids {
            self.assign_teacher(institution_id, event.id, *teacher_id)
                .await?;
        }
        for student_id in participant_ids {
            self.enroll_participant(institution_id, event.id, *student_id)
                .await?;
        }

        Ok(event)
    }

    pub async fn list(&self, institution_id: Uuid) -> Result<Vec<Event>, EventError> {
        let events = sqlx::query_as::<_, Event>(
            "SELECT * FROM events WHERE institution_id = $1 ORDER BY starts_at DESC",
        )
        .bind(institution_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(events)
    }

    pub async fn show(&self, institution_id: Uuid, event_id: Uuid) -> Result<Event, EventError> {
        let event = self.fetch_event(event_id).await?;
        if event.institution_id != institution_id {
            return Err(EventError::NotFound("Event not found".to_string()));
        }
        Ok(event)
    }

    /// Apply a status transition, rejecting anything outside
    /// Upcoming -> Ongoing -> Completed with Cancelled as the escape hatch.
    pub async fn transition(
        &self,
        institution_id: Uuid,
        event_id: Uuid,
        next: &str,
    ) -> Result<Event, EventError> {
        let event = self.show(institution_id, event_id).await?;

        let current = EventStatus::parse(&event.status).ok_or_else(|| {
            EventError::Validation(format!("Event has unknown status '{}'", event.status))
        })?;
        let next = EventStatus::parse(next)
            .ok_or_else(|| EventError::Validation(format!("Unknown status '{}'", next)))?;

        if !current.can_transition_to(next) {
            return Err(EventError::Validation(format!(
                "Cannot move event from {} to {}",
                current.as_str(),
                next.as_str()
            )));
        }

        let event = sqlx::query_as::<_, Event>(
            "UPDATE events SET status = $1 WHERE id = $2 RETURNING *",
        )
        .bind(next.as_str())
        .bind(event_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(event)
    }

    /// Assign a teacher as event staff; fans out one notification.
    pub async fn assign_teacher(
        &self,
        institution_id: Uuid,
        event_id: Uuid,
        teacher_id: Uuid,
    ) -> Result<(), EventError> {
        let event = self.show(institution_id, event_id).await?;

        let teacher: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM teachers WHERE id = $1 AND institution_id = $2",
        )
        .bind(teacher_id)
        .bind(institution_id)
        .fetch_optional(&self.pool)
        .await?;
        if teacher.is_none() {
            return Err(EventError::NotFound("Teacher not found".to_string()));
        }

        let inserted = sqlx::query(
            "INSERT INTO event_teachers (event_id, teacher_id)
             VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(event_id)
        .bind(teacher_id)
        .execute(&self.pool)
        .await?;
        if inserted.rows_affected() == 0 {
            return Err(EventError::Conflict(
                "Teacher is already assigned to this event".to_string(),
            ));
        }

        self.notify(
            Role::Teacher,
            teacher_id,
            event_id,
            &format!("You have been assigned to the event \"{}\"", event.title),
        )
        .await?;

        Ok(())
    }

    /// Enroll a volunteer as participant; fans out one notification.
    pub async fn enroll_participant(
        &self,
        institution_id: Uuid,
        event_id: Uuid,
        student_id: Uuid,
    ) -> Result<(), EventError> {
        let event = self.show(institution_id, event_id).await?;

        let student: Option<(String,)> = sqlx::query_as(
            "SELECT role FROM students WHERE id = $1 AND institution_id = $2",
        )
        .bind(student_id)
        .bind(institution_id)
        .fetch_optional(&self.pool)
        .await?;
        let role = match student {
            Some((role,)) => role,
            None => return Err(EventError::NotFound("Student not found".to_string())),
        };
        if role != "volunteer" {
            return Err(EventError::Validation(
                "Only volunteers can be enrolled in events".to_string(),
            ));
        }

        let inserted = sqlx::query(
            "INSERT INTO event_participants (event_id, student_id)
             VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(event_id)
        .bind(student_id)
        .execute(&self.pool)
        .await?;
        if inserted.rows_affected() == 0 {
            return Err(EventError::Conflict(
                "Student is already enrolled in this event".to_string(),
            ));
        }

        self.notify(
            Role::Student,
            student_id,
            event_id,
            &format!("You have been enrolled in the event \"{}\"", event.title),
        )
        .await?;

        Ok(())
    }

    /// Teacher marks attendance for a participant of an event they staff.
    pub async fn mark_attendance(
        &self,
        teacher_id: Uuid,
        event_id: Uuid,
        student_id: Uuid,
        attended: bool,
    ) -> Result<EventParticipant, EventError> {
        self.fetch_event(event_id).await?;

        let staffed: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM event_teachers WHERE event_id = $1 AND teacher_id = $2",
        )
        .bind(event_id)
        .bind(teacher_id)
        .fetch_optional(&self.pool)
        .await?;
        if staffed.is_none() {
            return Err(EventError::NotAuthorized(
                "You are not assigned to this event".to_string(),
            ));
        }

        let participant = sqlx::query_as::<_, EventParticipant>(
            "UPDATE event_participants
             SET attended = $1, attendance_marked_by = $2, attendance_marked_at = $3
             WHERE event_id = $4 AND student_id = $5
             RETURNING *",
        )
        .bind(attended)
        .bind(teacher_id)
        .bind(Utc::now())
        .bind(event_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            EventError::NotFound("Student is not a participant of this event".to_string())
        })?;

        Ok(participant)
    }

    /// Promote a student in the coordinator's institution to volunteer and
    /// notify them.
    pub async fn promote_volunteer(
        &self,
        institution_id: Uuid,
        student_id: Uuid,
    ) -> Result<(), EventError> {
        let updated = sqlx::query(
            "UPDATE students SET role = 'volunteer'
             WHERE id = $1 AND institution_id = $2 AND role = 'student'",
        )
        .bind(student_id)
        .bind(institution_id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            // Distinguish missing from already promoted
            let exists: Option<(String,)> = sqlx::query_as(
                "SELECT role FROM students WHERE id = $1 AND institution_id = $2",
            )
            .bind(student_id)
            .bind(institution_id)
            .fetch_optional(&self.pool)
            .await?;
            return match exists {
                Some(_) => Err(EventError::Conflict(
                    "Student is already a volunteer".to_string(),
                )),
                None => Err(EventError::NotFound("Student not found".to_string())),
            };
        }

        sqlx::query(
            "INSERT INTO notifications (recipient_role, recipient_id, event_id, message)
             VALUES ('student', $1, NULL, 'You have been promoted to NSS volunteer')",
        )
        .bind(student_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Teachers and participants of an event, for reports and reviewer
    /// derivation.
    pub async fn roster(
        &self,
        event_id: Uuid,
    ) -> Result<(Vec<(Uuid, String)>, Vec<(Uuid, String, Option<bool>)>), EventError> {
        let teachers_fut = sqlx::query_as::<_, (Uuid, String)>(
            "SELECT t.id, t.name FROM teachers t
             JOIN event_teachers et ON et.teacher_id = t.id
             WHERE et.event_id = $1 ORDER BY t.name",
        )
        .bind(event_id)
        .fetch_all(&self.pool);

        let participants_fut = sqlx::query_as::<_, (Uuid, String, Option<bool>)>(
            "SELECT s.id, s.name, ep.attended FROM students s
             JOIN event_participants ep ON ep.student_id = s.id
             WHERE ep.event_id = $1 ORDER BY s.name",
        )
        .bind(event_id)
        .fetch_all(&self.pool);

        let (teachers, participants) = try_join(teachers_fut, participants_fut).await?;
        Ok((teachers, participants))
    }
}
