use axum::{
    extract::{DefaultBodyLimit, Request},
    handler::Handler,
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{self, Next},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::config::{SecurityConfig, StorageBackend};
use crate::database::{Collection, Relation};
use crate::error::{ApiError, RESOURCE_NOT_FOUND};
use crate::handlers::{elevated, protected, public};
use crate::middleware::{
    advanced_results, authenticate, authorize, rate_limit, ClientRateLimiter, ResultsLayer, ResultsSpec,
    COMMANDER_ONLY, PILOT_OR_COMMANDER,
};
use crate::state::AppState;

const MISSIONS: ResultsSpec = ResultsSpec::new(Collection::Missions).populate(Relation::MissionIncidents);
const MISSION_INCIDENTS: ResultsSpec = ResultsSpec::new(Collection::Incidents).scoped("missionId", "mission_id");
const INCIDENT_REPORTS: ResultsSpec = ResultsSpec::new(Collection::Reports).scoped("incidentId", "incident_id");
const USERS: ResultsSpec = ResultsSpec::new(Collection::Users);

const REPORT: &str = "/api/missions/:missionId/incidents/:incidentId/reports/:reportId";

/// Hardening headers added to every response that does not set its own.
const SECURITY_HEADERS: [(HeaderName, &str); 8] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "SAMEORIGIN"),
    (header::X_XSS_PROTECTION, "0"),
    (header::X_DNS_PREFETCH_CONTROL, "off"),
    (header::REFERRER_POLICY, "no-referrer"),
    (header::STRICT_TRANSPORT_SECURITY, "max-age=15552000; includeSubDomains"),
    (HeaderName::from_static("x-download-options"), "noopen"),
    (HeaderName::from_static("x-permitted-cross-domain-policies"), "none"),
];

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(public::health::health))
        .merge(auth_routes(&state))
        .merge(mission_routes(&state))
        .merge(incident_routes(&state))
        .merge(report_routes(&state))
        .merge(user_routes(&state))
        .fallback(not_found);

    if state.config.storage.backend == StorageBackend::Local {
        router = router.nest_service("/uploads", ServeDir::new(&state.config.storage.local_root));
    }

    let mut router = router
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes))
        .layer(TraceLayer::new_for_http());

    if let Some(limiter) = ClientRateLimiter::from_config(&state.config.api) {
        router = router.layer(middleware::from_fn_with_state(limiter, rate_limit));
    }

    for (name, value) in SECURITY_HEADERS {
        router = router.layer(SetResponseHeaderLayer::if_not_present(name, HeaderValue::from_static(value)));
    }

    if state.config.security.enable_cors {
        router = router.layer(cors(&state.config.security));
    }

    router.with_state(state)
}

fn auth_routes(state: &AppState) -> Router<AppState> {
    use protected::auth as account;
    use public::auth;

    let authenticated = middleware::from_fn_with_state(state.clone(), authenticate);

    Router::new()
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/forgotpassword", post(auth::forgot_password))
        .route("/api/v1/auth/resetpassword/:resettoken", put(auth::reset_password))
        .route("/api/v1/auth/me", get(account::me.layer(authenticated.clone())))
        .route(
            "/api/v1/auth/updatedetails",
            put(account::update_details.layer(authenticated.clone())),
        )
        .route(
            "/api/v1/auth/updatepassword",
            put(account::update_password.layer(authenticated)),
        )
}

fn mission_routes(state: &AppState) -> Router<AppState> {
    let authenticated = middleware::from_fn_with_state(state.clone(), authenticate);
    let list = middleware::from_fn_with_state(ResultsLayer::new(state, MISSIONS), advanced_results);

    Router::new()
        .route(
            "/api/missions",
            get(public::missions::list.layer(list))
                .post(protected::missions::create.layer(authenticated.clone())),
        )
        .route(
            "/api/missions/:missionId",
            get(public::missions::show)
                .put(protected::missions::update.layer(authenticated.clone()))
                .delete(protected::missions::delete.layer(authenticated)),
        )
}

fn incident_routes(state: &AppState) -> Router<AppState> {
    let authenticated = middleware::from_fn_with_state(state.clone(), authenticate);
    let pilots = middleware::from_fn(|req: Request, next: Next| authorize(PILOT_OR_COMMANDER, req, next));
    let list = middleware::from_fn_with_state(ResultsLayer::new(state, MISSION_INCIDENTS), advanced_results);

    Router::new()
        .route(
            "/api/missions/:missionId/incidents",
            get(public::incidents::list.layer(list)).post(
                protected::incidents::create
                    .layer(pilots.clone())
                    .layer(authenticated.clone()),
            ),
        )
        .route(
            "/api/incidents/:id",
            get(public::incidents::show)
                .put(
                    protected::incidents::update
                        .layer(pilots.clone())
                        .layer(authenticated.clone()),
                )
                .delete(protected::incidents::delete.layer(pilots).layer(authenticated)),
        )
}

fn report_routes(state: &AppState) -> Router<AppState> {
    let authenticated = middleware::from_fn_with_state(state.clone(), authenticate);
    let pilots = middleware::from_fn(|req: Request, next: Next| authorize(PILOT_OR_COMMANDER, req, next));
    let list = middleware::from_fn_with_state(ResultsLayer::new(state, INCIDENT_REPORTS), advanced_results);

    Router::new()
        .route(
            "/api/missions/:missionId/incidents/:incidentId/reports",
            get(public::reports::list.layer(list)).post(
                protected::reports::create
                    .layer(pilots.clone())
                    .layer(authenticated.clone()),
            ),
        )
        .route(
            REPORT,
            get(public::reports::show)
                .put(
                    protected::reports::update
                        .layer(pilots.clone())
                        .layer(authenticated.clone()),
                )
                .delete(
                    protected::reports::delete
                        .layer(pilots.clone())
                        .layer(authenticated.clone()),
                ),
        )
        .route(
            &format!("{}/upload", REPORT),
            post(
                protected::reports::upload
                    .layer(pilots.clone())
                    .layer(authenticated.clone()),
            ),
        )
        .route(&format!("{}/files", REPORT), get(public::reports::files))
        .route(
            &format!("{}/files/:fileId", REPORT),
            get(public::reports::file).delete(protected::reports::delete_file.layer(pilots).layer(authenticated)),
        )
}

/// Commander-only administration. Both guards cover every route here.
fn user_routes(state: &AppState) -> Router<AppState> {
    use elevated::users;

    let list = middleware::from_fn_with_state(ResultsLayer::new(state, USERS), advanced_results);

    Router::new()
        .route("/api", get(users::list.layer(list)).post(users::create))
        .route("/api/:id", get(users::show).put(users::update).delete(users::delete))
        .route_layer(middleware::from_fn(|req: Request, next: Next| {
            authorize(COMMANDER_ONLY, req, next)
        }))
        .route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
}

fn cors(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

async fn not_found() -> ApiError {
    ApiError::not_found(RESOURCE_NOT_FOUND)
}
