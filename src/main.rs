use anyhow::Context;
use axum::{routing::get, Router};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use synapsis_api::database::{self, DatabaseManager};
use synapsis_api::handlers;
use synapsis_api::middleware::jwt_auth_middleware;

#[derive(Parser)]
#[command(name = "synapsis-api")]
#[command(about = "Synapsis - NSS management portal API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data for local development
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve().await?,
        Commands::InitDb => {
            DatabaseManager::migrate().await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = DatabaseManager::pool().await?;
            database::seed::seed(&pool).await?;
            println!("Seed data inserted.");
        }
    }

    Ok(())
}

async fn serve() -> anyhow::Result<()> {
    let config = synapsis_api::config::config();
    tracing::info!("Starting Synapsis API in {:?} mode", config.environment);

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("SYNAPSIS_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    println!("Synapsis API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server")?;
    Ok(())
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Public auth routes (token acquisition)
        .merge(auth_public_routes())
        // Protected API behind JWT middleware
        .merge(api_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn auth_public_routes() -> Router {
    use axum::routing::post;
    use handlers::public::auth;

    Router::new()
        .route("/auth/:role/signup", post(auth::signup))
        .route("/auth/:role/verify-otp", post(auth::verify_otp))
        .route("/auth/:role/login", post(auth::login))
}

fn api_routes() -> Router {
    use axum::routing::{post, put};
    use handlers::protected::{
        auth, donations, events, grace, institutions, notifications, reports,
    };

    Router::new()
        // Session
        .route("/api/auth/whoami", get(auth::whoami))
        // Institution directory
        .route(
            "/api/institutions",
            get(institutions::list).post(institutions::create),
        )
        .route("/api/institutions/:id", get(institutions::show))
        // Event lifecycle
        .route("/api/events", get(events::list).post(events::create))
        .route("/api/events/:id", get(events::show))
        .route("/api/events/:id/status", put(events::transition))
        .route("/api/events/:id/teachers", post(events::assign_teacher))
        .route(
            "/api/events/:id/participants",
            post(events::enroll_participant),
        )
        .route("/api/events/:id/attendance", put(events::mark_attendance))
        // Volunteer promotion
        .route(
            "/api/coordinator/volunteers/:student_id",
            put(events::promote_volunteer),
        )
        // Grace-mark workflow
        .route(
            "/api/coordinator/recommendgracemark",
            post(grace::recommend),
        )
        .route(
            "/api/coordinator/recommendations",
            get(grace::coordinator_log),
        )
        .route(
            "/api/teacher/approverecommendedgracemark",
            put(grace::review),
        )
        .route("/api/teacher/grace-marks", post(grace::assign_direct))
        .route(
            "/api/teacher/grace-marks/:student_id/:event_id",
            put(grace::update_direct).delete(grace::delete_direct),
        )
        .route("/api/students/:id/grace-marks", get(grace::history))
        // Notifications
        .route("/api/notifications", get(notifications::list))
        .route("/api/notifications/:id/read", put(notifications::mark_read))
        // Reports
        .route("/api/reports/events/:id", get(reports::event_report))
        .route(
            "/api/reports/events/:id/attendance",
            get(reports::attendance_sheet),
        )
        .route(
            "/api/reports/certificates/:student_id/:event_id",
            get(reports::certificate),
        )
        // Donations
        .route("/api/donations", get(donations::list))
        .route("/api/donations/order", post(donations::create_order))
        .route("/api/donations/verify", post(donations::verify))
        .route_layer(axum::middleware::from_fn(jwt_auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Synapsis API",
            "version": version,
            "description": "Role-based management API for a National Service Scheme program",
            "endpoints": {
                "home": "/ (public)",
                "public_auth": "/auth/:role/signup, /auth/:role/verify-otp, /auth/:role/login (public)",
                "auth": "/api/auth/whoami (protected)",
                "institutions": "/api/institutions[/:id] (protected)",
                "events": "/api/events[/:id] (protected)",
                "grace": "/api/coordinator/recommendgracemark, /api/teacher/grace-marks (protected)",
                "notifications": "/api/notifications (protected)",
                "reports": "/api/reports/* (protected)",
                "donations": "/api/donations/* (protected)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
