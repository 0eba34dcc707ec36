use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod policy;
pub mod state;

use state::AppState;

/// Build the full application router.
///
/// Every content route sits behind the token gate; only registration, token
/// issuance and the operational endpoints are public.
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .merge(menu_routes())
        .merge(skill_routes())
        .merge(experience_routes())
        .merge(program_routes())
        .merge(education_routes())
        .merge(case_study_routes())
        .merge(resource_routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_token,
        ));

    let router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_auth_routes())
        // Token-gated content API
        .merge(protected)
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // The `.json` suffix rewrite must run before routing, so it has to wrap
    // the router (middleware added with `Router::layer` runs after a route
    // has already been matched).
    Router::new().fallback_service(tower::Layer::layer(
        &axum::middleware::map_request(middleware::format::strip_format_suffix),
        router,
    ))
}

fn public_auth_routes() -> Router<AppState> {
    use axum::routing::post;
    use handlers::users;

    Router::new()
        .route("/users/", post(users::register))
        .route("/get-token/", post(users::obtain_token))
}

fn menu_routes() -> Router<AppState> {
    use handlers::{menu_items, menus, sub_menu_items};

    Router::new()
        .route("/menus/", get(menus::list).post(menus::create))
        .route(
            "/menus/:id/",
            get(menus::retrieve)
                .put(menus::update)
                .patch(menus::patch)
                .delete(menus::destroy),
        )
        .route(
            "/menu-items/",
            get(menu_items::list).post(menu_items::create),
        )
        .route(
            "/menu-items/:id/",
            get(menu_items::retrieve)
                .put(menu_items::update)
                .patch(menu_items::patch)
                .delete(menu_items::destroy),
        )
        .route(
            "/sub-menu-items/",
            get(sub_menu_items::list).post(sub_menu_items::create),
        )
        .route(
            "/sub-menu-items/:id/",
            get(sub_menu_items::retrieve)
                .put(sub_menu_items::update)
                .patch(sub_menu_items::patch)
                .delete(sub_menu_items::destroy),
        )
}

fn skill_routes() -> Router<AppState> {
    use handlers::{skill_categories, skill_charts, skills};

    Router::new()
        .route(
            "/skill-charts/",
            get(skill_charts::list).post(skill_charts::create),
        )
        .route(
            "/skill-charts/:id/",
            get(skill_charts::retrieve)
                .put(skill_charts::update)
                .patch(skill_charts::patch)
                .delete(skill_charts::destroy),
        )
        .route(
            "/skill-categories/",
            get(skill_categories::list).post(skill_categories::create),
        )
        .route(
            "/skill-categories/:id/",
            get(skill_categories::retrieve)
                .put(skill_categories::update)
                .patch(skill_categories::patch)
                .delete(skill_categories::destroy),
        )
        .route("/skills/", get(skills::list).post(skills::create))
        .route(
            "/skills/:id/",
            get(skills::retrieve)
                .put(skills::update)
                .patch(skills::patch)
                .delete(skills::destroy),
        )
        .route("/skills/search/:url/", get(skills::search))
}

fn experience_routes() -> Router<AppState> {
    use handlers::{experiences, testimonies};

    Router::new()
        .route(
            "/experiences/",
            get(experiences::list).post(experiences::create),
        )
        .route(
            "/experiences/:id/",
            get(experiences::retrieve)
                .put(experiences::update)
                .patch(experiences::patch)
                .delete(experiences::destroy),
        )
        .route(
            "/testimonies/",
            get(testimonies::list).post(testimonies::create),
        )
        .route(
            "/testimonies/:id/",
            get(testimonies::retrieve)
                .put(testimonies::update)
                .patch(testimonies::patch)
                .delete(testimonies::destroy),
        )
}

fn program_routes() -> Router<AppState> {
    use handlers::{program_categories, programs};

    Router::new()
        .route(
            "/program-categories/",
            get(program_categories::list).post(program_categories::create),
        )
        .route(
            "/program-categories/:id/",
            get(program_categories::retrieve)
                .put(program_categories::update)
                .patch(program_categories::patch)
                .delete(program_categories::destroy),
        )
        .route("/programs/", get(programs::list).post(programs::create))
        .route(
            "/programs/:id/",
            get(programs::retrieve)
                .put(programs::update)
                .patch(programs::patch)
                .delete(programs::destroy),
        )
        .route("/programs/search/:url/", get(programs::search))
}

fn education_routes() -> Router<AppState> {
    use handlers::{courses, education};

    Router::new()
        .route("/education/", get(education::list).post(education::create))
        .route(
            "/education/:id/",
            get(education::retrieve)
                .put(education::update)
                .patch(education::patch)
                .delete(education::destroy),
        )
        .route("/courses/", get(courses::list).post(courses::create))
        .route(
            "/courses/:id/",
            get(courses::retrieve)
                .put(courses::update)
                .patch(courses::patch)
                .delete(courses::destroy),
        )
}

fn case_study_routes() -> Router<AppState> {
    use handlers::case_studies;

    Router::new()
        .route(
            "/case-studies/",
            get(case_studies::list).post(case_studies::create),
        )
        .route(
            "/case-studies/:id/",
            get(case_studies::retrieve)
                .put(case_studies::update)
                .patch(case_studies::patch)
                .delete(case_studies::destroy),
        )
}

fn resource_routes() -> Router<AppState> {
    use handlers::{resource_categories, resources};

    Router::new()
        .route(
            "/resource-categories/",
            get(resource_categories::list).post(resource_categories::create),
        )
        .route(
            "/resource-categories/:id/",
            get(resource_categories::retrieve)
                .put(resource_categories::update)
                .patch(resource_categories::patch)
                .delete(resource_categories::destroy),
        )
        .route("/resources/", get(resources::list).post(resources::create))
        .route(
            "/resources/:id/",
            get(resources::retrieve)
                .put(resources::update)
                .patch(resources::patch)
                .delete(resources::destroy),
        )
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Portfolio API",
            "version": version,
            "description": "Personal portfolio content backend (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "register": "/users/ (public)",
                "token": "/get-token/ (public - token acquisition)",
                "menus": "/menus/, /menu-items/, /sub-menu-items/ (token required)",
                "skills": "/skills/[search/:url/], /skill-categories/, /skill-charts/ (token required)",
                "experience": "/experiences/, /testimonies/ (token required)",
                "programs": "/programs/[search/:url/], /program-categories/ (token required)",
                "education": "/education/, /courses/ (token required)",
                "case_studies": "/case-studies/ (token required)",
                "resources": "/resources/, /resource-categories/ (token required)",
            }
        }
    }))
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::pool::health_check(&state.pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": { "status": "degraded", "timestamp": now, "database_error": e.to_string() }
            })),
        ),
    }
}
