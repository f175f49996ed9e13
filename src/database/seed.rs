use chrono::{Duration, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::services::credentials::sha256_hex;

/// Load a small, realistic data set for local development: one institution,
/// one account per role, a completed event with the volunteer enrolled and
/// attendance marked, so the grace-mark flow can be exercised end to end.
pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let institution_id: Uuid = sqlx::query(
        r#"
        INSERT INTO institutions (name, code)
        VALUES ($1, $2)
        ON CONFLICT (code) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind("Government College of Engineering")
    .bind("GCE-001")
    .fetch_one(pool)
    .await?
    .get("id");

    let password = sha256_hex("changeme");

    sqlx::query(
        r#"
        INSERT INTO admins (name, email, password_hash, is_verified)
        VALUES ($1, $2, $3, TRUE)
        ON CONFLICT (email) DO NOTHING
        "#,
    )
    .bind("Site Admin")
    .bind("admin@synapsis.example.com")
    .bind(&password)
    .execute(pool)
    .await?;

    let coordinator_id: Uuid = sqlx::query(
        r#"
        INSERT INTO coordinators (name, email, password_hash, institution_id, is_verified)
        VALUES ($1, $2, $3, $4, TRUE)
        ON CONFLICT (email) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind("Meera Nair")
    .bind("meera.nair@synapsis.example.com")
    .bind(&password)
    .bind(institution_id)
    .fetch_one(pool)
    .await?
    .get("id");

    let teacher_id: Uuid = sqlx::query(
        r#"
        INSERT INTO teachers (name, email, password_hash, institution_id, is_verified)
        VALUES ($1, $2, $3, $4, TRUE)
        ON CONFLICT (email) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind("Arun Pillai")
    .bind("arun.pillai@synapsis.example.com")
    .bind(&password)
    .bind(institution_id)
    .fetch_one(pool)
    .await?
    .get("id");

    let volunteer_id: Uuid = sqlx::query(
        r#"
        INSERT INTO students (name, email, password_hash, role, institution_id, is_verified)
        VALUES ($1, $2, $3, 'volunteer', $4, TRUE)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind("Divya Menon")
    .bind("divya.menon@synapsis.example.com")
    .bind(&password)
    .bind(institution_id)
    .fetch_one(pool)
    .await?
    .get("id");

    sqlx::query(
        r#"
        INSERT INTO students (name, email, password_hash, role, institution_id, is_verified)
        VALUES ($1, $2, $3, 'student', $4, TRUE)
        ON CONFLICT (email) DO NOTHING
        "#,
    )
    .bind("Rahul Varma")
    .bind("rahul.varma@synapsis.example.com")
    .bind(&password)
    .bind(institution_id)
    .execute(pool)
    .await?;

    let event_id: Uuid = sqlx::query(
        r#"
        INSERT INTO events (title, description, institution_id, status, starts_at, ends_at, created_by)
        VALUES ($1, $2, $3, 'Completed', $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind("Village Cleanliness Drive")
    .bind("Weekend cleanliness and awareness drive at the adopted village.")
    .bind(institution_id)
    .bind(Utc::now() - Duration::days(14))
    .bind(Utc::now() - Duration::days(13))
    .bind(coordinator_id)
    .fetch_one(pool)
    .await?
    .get("id");

    sqlx::query(
        "INSERT INTO event_teachers (event_id, teacher_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(event_id)
    .bind(teacher_id)
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO event_participants (event_id, student_id, attended, attendance_marked_by, attendance_marked_at)
        VALUES ($1, $2, TRUE, $3, $4)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(event_id)
    .bind(volunteer_id)
    .bind(teacher_id)
    .bind(Utc::now() - Duration::days(13))
    .execute(pool)
    .await?;

    Ok(())
}
