// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{assessment, auth, college, course, recommendation, test_result},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Public: auth, college and course reads.
/// * Authenticated: tests, results, recommendations, catalog writes.
/// * Admin: test authoring and analytics under `/api/admin`.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_layer = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let college_routes = Router::new()
        .route("/", get(college::list_colleges))
        .route("/{id}", get(college::get_college))
        .merge(
            Router::new()
                .route("/", post(college::create_college))
                .layer(auth_layer.clone()),
        );

    let course_routes = Router::new()
        .route("/", get(course::list_courses))
        .route("/{id}", get(course::get_course))
        .merge(
            Router::new()
                .route("/", post(course::create_course))
                .route("/{id}", delete(course::retire_course))
                .layer(auth_layer.clone()),
        );

    let test_routes = Router::new()
        .route("/", get(assessment::list_tests))
        .route("/{id}", get(assessment::get_test))
        .layer(auth_layer.clone());

    let result_routes = Router::new()
        .route("/submit", post(test_result::submit_test))
        .route("/my", get(test_result::my_results))
        .route("/my/latest", get(test_result::my_latest_result))
        .route("/{id}", delete(test_result::delete_result))
        .layer(auth_layer.clone());

    let recommendation_routes = Router::new()
        .route("/for-result", post(recommendation::for_result))
        .route("/for-user", post(recommendation::for_user))
        .route("/my", get(recommendation::my_recommendation))
        .route(
            "/{id}",
            get(recommendation::get_recommendation).delete(recommendation::delete_recommendation),
        )
        .layer(auth_layer.clone());

    let admin_routes = Router::new()
        .route("/tests", post(assessment::create_test))
        .route("/results/test/{test_id}", get(test_result::results_for_test))
        .route("/results/analytics", get(test_result::analytics))
        .route("/recommendations/top-courses", get(recommendation::top_courses))
        // Auth runs first (outermost), then the admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(auth_layer);

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/colleges", college_routes)
        .nest("/api/courses", course_routes)
        .nest("/api/tests", test_routes)
        .nest("/api/results", result_routes)
        .nest("/api/recommendations", recommendation_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
