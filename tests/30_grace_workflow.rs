// Grace-mark workflow arithmetic against a real database. Every test is
// skipped when DATABASE_URL is not configured, so the suite stays green on
// machines without Postgres.

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use synapsis_api::database::DatabaseManager;
use synapsis_api::services::grace::{GraceError, GraceService};

async fn pool_or_skip() -> Result<Option<PgPool>> {
    if std::env::var("DATABASE_URL").is_err() {
        return Ok(None);
    }
    DatabaseManager::migrate().await?;
    Ok(Some(DatabaseManager::pool().await?))
}

struct Fixture {
    institution: Uuid,
    coordinator: Uuid,
    teacher: Uuid,
    other_teacher: Uuid,
    volunteer: Uuid,
    event: Uuid,
}

/// One institution with a coordinator, a volunteer, a Completed event
/// staffed by `teacher` with the volunteer enrolled, and a second teacher
/// who is not assigned to anything.
async fn fixture(pool: &PgPool) -> Result<Fixture> {
    let tag = Uuid::new_v4().simple().to_string();

    let institution = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO institutions (name, code) VALUES ($1, $2) RETURNING id",
    )
    .bind(format!("Test College {}", &tag[..8]))
    .bind(format!("TST-{}", tag))
    .fetch_one(pool)
    .await?;

    let coordinator = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO coordinators (name, email, password_hash, institution_id, is_verified)
         VALUES ('Coordinator', $1, 'x', $2, TRUE) RETURNING id",
    )
    .bind(format!("coord-{}@test.example.com", tag))
    .bind(institution)
    .fetch_one(pool)
    .await?;

    let teacher = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO teachers (name, email, password_hash, institution_id, is_verified)
         VALUES ('Assigned Teacher', $1, 'x', $2, TRUE) RETURNING id",
    )
    .bind(format!("teacher-{}@test.example.com", tag))
    .bind(institution)
    .fetch_one(pool)
    .await?;

    let other_teacher = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO teachers (name, email, password_hash, institution_id, is_verified)
         VALUES ('Unassigned Teacher', $1, 'x', $2, TRUE) RETURNING id",
    )
    .bind(format!("other-{}@test.example.com", tag))
    .bind(institution)
    .fetch_one(pool)
    .await?;

    let volunteer = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO students (name, email, password_hash, role, institution_id, is_verified)
         VALUES ('Volunteer', $1, 'x', 'volunteer', $2, TRUE) RETURNING id",
    )
    .bind(format!("vol-{}@test.example.com", tag))
    .bind(institution)
    .fetch_one(pool)
    .await?;

    let event = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO events (title, description, institution_id, status, starts_at, ends_at, created_by)
         VALUES ('Camp', '', $1, 'Completed', now() - interval '2 days', now() - interval '1 day', $2)
         RETURNING id",
    )
    .bind(institution)
    .bind(coordinator)
    .fetch_one(pool)
    .await?;

    sqlx::query("INSERT INTO event_teachers (event_id, teacher_id) VALUES ($1, $2)")
        .bind(event)
        .bind(teacher)
        .execute(pool)
        .await?;

    sqlx::query(
        "INSERT INTO event_participants (event_id, student_id, attended) VALUES ($1, $2, TRUE)",
    )
    .bind(event)
    .bind(volunteer)
    .execute(pool)
    .await?;

    Ok(Fixture {
        institution,
        coordinator,
        teacher,
        other_teacher,
        volunteer,
        event,
    })
}

async fn grace_total(pool: &PgPool, student: Uuid) -> Result<i32> {
    Ok(
        sqlx::query_scalar::<_, i32>("SELECT grace_marks FROM students WHERE id = $1")
            .bind(student)
            .fetch_one(pool)
            .await?,
    )
}

#[tokio::test]
async fn approval_adds_exactly_the_recommended_marks() -> Result<()> {
    let Some(pool) = pool_or_skip().await? else {
        return Ok(());
    };
    let f = fixture(&pool).await?;
    let service = GraceService::new(pool.clone());

    let before = grace_total(&pool, f.volunteer).await?;
    service
        .recommend(f.coordinator, f.institution, f.volunteer, 5, "Led the camp")
        .await?;
    let outcome = service.review(f.teacher, f.volunteer, true).await?;

    assert_eq!(outcome.status, "approved");
    assert_eq!(outcome.marks, 5);
    assert_eq!(outcome.grace_marks, before + 5);
    assert_eq!(grace_total(&pool, f.volunteer).await?, before + 5);

    // Nothing left to review, and the total does not move again
    let err = service.review(f.teacher, f.volunteer, true).await.unwrap_err();
    assert!(matches!(err, GraceError::NotFound(_)));
    assert_eq!(grace_total(&pool, f.volunteer).await?, before + 5);
    Ok(())
}

#[tokio::test]
async fn rejection_leaves_the_total_unchanged() -> Result<()> {
    let Some(pool) = pool_or_skip().await? else {
        return Ok(());
    };
    let f = fixture(&pool).await?;
    let service = GraceService::new(pool.clone());

    let before = grace_total(&pool, f.volunteer).await?;
    service
        .recommend(f.coordinator, f.institution, f.volunteer, 4, "Weekend drive")
        .await?;
    let outcome = service.review(f.teacher, f.volunteer, false).await?;

    assert_eq!(outcome.status, "rejected");
    assert_eq!(grace_total(&pool, f.volunteer).await?, before);

    // The rejection still lands in the history
    let (_, entries) = service.history(f.volunteer).await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, "rejected");
    assert_eq!(entries[0].source, "recommendation");
    Ok(())
}

#[tokio::test]
async fn unassigned_teacher_cannot_review_and_state_is_untouched() -> Result<()> {
    let Some(pool) = pool_or_skip().await? else {
        return Ok(());
    };
    let f = fixture(&pool).await?;
    let service = GraceService::new(pool.clone());

    let before = grace_total(&pool, f.volunteer).await?;
    service
        .recommend(f.coordinator, f.institution, f.volunteer, 3, "Awareness rally")
        .await?;

    let err = service
        .review(f.other_teacher, f.volunteer, true)
        .await
        .unwrap_err();
    assert!(matches!(err, GraceError::NotAuthorized(_)));
    assert_eq!(grace_total(&pool, f.volunteer).await?, before);

    // The recommendation survives for the assigned teacher
    let outcome = service.review(f.teacher, f.volunteer, true).await?;
    assert_eq!(outcome.status, "approved");
    assert_eq!(grace_total(&pool, f.volunteer).await?, before + 3);
    Ok(())
}

#[tokio::test]
async fn pending_recommendation_blocks_a_second_one() -> Result<()> {
    let Some(pool) = pool_or_skip().await? else {
        return Ok(());
    };
    let f = fixture(&pool).await?;
    let service = GraceService::new(pool.clone());

    service
        .recommend(f.coordinator, f.institution, f.volunteer, 2, "First")
        .await?;
    let err = service
        .recommend(f.coordinator, f.institution, f.volunteer, 2, "Second")
        .await
        .unwrap_err();
    assert!(matches!(err, GraceError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn duplicate_direct_assignment_is_rejected() -> Result<()> {
    let Some(pool) = pool_or_skip().await? else {
        return Ok(());
    };
    let f = fixture(&pool).await?;
    let service = GraceService::new(pool.clone());

    let before = grace_total(&pool, f.volunteer).await?;
    service
        .assign_direct(f.teacher, f.volunteer, f.event, 3)
        .await?;
    let err = service
        .assign_direct(f.teacher, f.volunteer, f.event, 3)
        .await
        .unwrap_err();

    assert!(matches!(err, GraceError::Duplicate(_)));
    assert_eq!(grace_total(&pool, f.volunteer).await?, before + 3);
    Ok(())
}

#[tokio::test]
async fn review_outcome_is_mirrored_to_the_coordinator_log() -> Result<()> {
    let Some(pool) = pool_or_skip().await? else {
        return Ok(());
    };
    let f = fixture(&pool).await?;
    let service = GraceService::new(pool.clone());

    service
        .recommend(f.coordinator, f.institution, f.volunteer, 6, "Blood camp")
        .await?;
    let log = service.coordinator_log(f.coordinator).await?;
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].status, "pending");

    service.review(f.teacher, f.volunteer, true).await?;
    let log = service.coordinator_log(f.coordinator).await?;
    assert_eq!(log[0].status, "approved");
    assert_eq!(log[0].marks, 6);
    Ok(())
}
