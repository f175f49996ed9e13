use axum::{
    extract::Path,
    http::header,
    response::IntoResponse,
    Extension,
};
use chrono::Utc;
use uuid::Uuid;

use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::AuthAccount;
use crate::services::events::EventService;
use crate::services::reports::{
    build_attendance_sheet, build_certificate, build_event_report, ParticipantRow, TeacherRow,
};

fn markdown(body: String) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/markdown; charset=utf-8")], body)
}

async fn load_rosters(
    service: &EventService,
    event_id: Uuid,
) -> Result<(Vec<TeacherRow>, Vec<ParticipantRow>), ApiError> {
    let (teachers, participants) = service.roster(event_id).await?;
    let teachers = teachers
        .into_iter()
        .map(|(_, name)| TeacherRow { name })
        .collect();
    let participants = participants
        .into_iter()
        .map(|(_, name, attended)| ParticipantRow { name, attended })
        .collect();
    Ok((teachers, participants))
}

/// GET /api/reports/events/:id - full event report
pub async fn event_report(
    Extension(account): Extension<AuthAccount>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let institution_id = account.institution_id()?;
    let pool = DatabaseManager::pool().await?;
    let service = EventService::new(pool);

    let event = service.show(institution_id, id).await?;
    let (teachers, participants) = load_rosters(&service, id).await?;

    Ok(markdown(build_event_report(&event, &teachers, &participants)))
}

/// GET /api/reports/events/:id/attendance - attendance sheet
pub async fn attendance_sheet(
    Extension(account): Extension<AuthAccount>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let institution_id = account.institution_id()?;
    let pool = DatabaseManager::pool().await?;
    let service = EventService::new(pool);

    let event = service.show(institution_id, id).await?;
    let (_, participants) = load_rosters(&service, id).await?;

    Ok(markdown(build_attendance_sheet(&event, &participants)))
}

/// GET /api/reports/certificates/:studentId/:eventId - participation
/// certificate; attendance must have been marked present
pub async fn certificate(
    Extension(account): Extension<AuthAccount>,
    Path((student_id, event_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let institution_id = account.institution_id()?;
    let pool = DatabaseManager::pool().await?;
    let service = EventService::new(pool.clone());

    let event = service.show(institution_id, event_id).await?;

    let row: Option<(String, Option<bool>)> = sqlx::query_as(
        "SELECT s.name, ep.attended FROM students s
         JOIN event_participants ep ON ep.student_id = s.id
         WHERE ep.event_id = $1 AND ep.student_id = $2",
    )
    .bind(event_id)
    .bind(student_id)
    .fetch_optional(&pool)
    .await?;

    let (name, attended) =
        row.ok_or_else(|| ApiError::not_found("Student is not a participant of this event"))?;

    if attended != Some(true) {
        return Err(ApiError::bad_request(
            "Attendance was not marked present for this student",
        ));
    }

    Ok(markdown(build_certificate(&name, &event, Utc::now())))
}
