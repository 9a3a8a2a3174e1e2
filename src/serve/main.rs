//! HTTP API for hierarchy browsing, region lookup and parcel lookup.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use dzialka::config::Config;
use dzialka::models::{sorted_by_name, AdminHierarchy, AdminLevel, Named};
use dzialka::teryt::load_hierarchy;
use dzialka::{LocatorError, Parcel, ParcelResolver, Region};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "serve")]
#[command(about = "Parcel locator HTTP API")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    listen: String,

    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// TERYT administrative table, plain or .gz
    #[arg(long)]
    teryt: Option<PathBuf>,

    /// Directory of the persistent region cache
    #[arg(long)]
    cache: Option<PathBuf>,
}

/// Application state shared across handlers
struct AppState {
    hierarchy: AdminHierarchy,
    resolver: ParcelResolver,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = Config::load_or_default(args.config.as_deref())?;
    if let Some(path) = args.teryt {
        config.hierarchy.path = path;
    }
    if let Some(path) = args.cache {
        config.cache.path = Some(path);
    }

    info!("Parcel locator API");
    let hierarchy = load_hierarchy(&config.hierarchy.path)?;
    if hierarchy.is_empty() {
        anyhow::bail!(
            "No voivodeships found in {}",
            config.hierarchy.path.display()
        );
    }

    info!("Registry at {}", config.registry.base_url);
    let resolver = ParcelResolver::from_config(&config)?;

    let state = Arc::new(AppState {
        hierarchy,
        resolver,
    });

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/voivodeships", get(voivodeships_handler))
        .route("/v1/voivodeships/{woj}/counties", get(counties_handler))
        .route(
            "/v1/voivodeships/{woj}/counties/{pow}/municipalities",
            get(municipalities_handler),
        )
        .route("/v1/regions", get(regions_handler))
        .route("/v1/parcel", get(parcel_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Error body returned by every endpoint
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: String) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message,
        }
    }
}

impl From<LocatorError> for ApiError {
    fn from(e: LocatorError) -> Self {
        let status = match &e {
            LocatorError::NotFound => StatusCode::NOT_FOUND,
            LocatorError::InsufficientQuery => StatusCode::BAD_REQUEST,
            e if e.is_decode_error() => {
                warn!("Unreadable registry response: {}", e);
                StatusCode::BAD_GATEWAY
            }
            LocatorError::Transport(_) | LocatorError::Status(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("Lookup failed: {}", self.message);
        }
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    voivodeships: usize,
    municipalities: usize,
}

#[derive(Serialize)]
struct UnitEntry {
    code: String,
    name: String,
}

#[derive(Serialize)]
struct MunicipalityEntry {
    /// Identifier accepted by `/v1/regions`
    id: String,
    code: String,
    kind: String,
    name: String,
}

#[derive(Deserialize)]
struct RegionsQueryParams {
    /// Municipality identifier, e.g. 146501_1
    municipality_id: String,
}

#[derive(Deserialize)]
struct ParcelQueryParams {
    /// Parcel number or full identifier
    number: String,
    /// Selected region code
    region: Option<String>,
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        voivodeships: state.hierarchy.len(AdminLevel::Voivodeship),
        municipalities: state.hierarchy.len(AdminLevel::Municipality),
    })
}

fn unit_entries<'a, T, I>(items: I) -> Vec<UnitEntry>
where
    T: Named + 'a,
    I: IntoIterator<Item = &'a T>,
{
    sorted_by_name(items)
        .into_iter()
        .map(|item| UnitEntry {
            code: item.code().to_string(),
            name: item.name().to_string(),
        })
        .collect()
}

async fn voivodeships_handler(State(state): State<Arc<AppState>>) -> Json<Vec<UnitEntry>> {
    Json(unit_entries(state.hierarchy.voivodeships()))
}

async fn counties_handler(
    State(state): State<Arc<AppState>>,
    Path(woj): Path<String>,
) -> Result<Json<Vec<UnitEntry>>, ApiError> {
    let voivodeship = state
        .hierarchy
        .voivodeship(&woj)
        .ok_or_else(|| ApiError::not_found(format!("unknown voivodeship {}", woj)))?;

    Ok(Json(unit_entries(state.hierarchy.counties(voivodeship))))
}

async fn municipalities_handler(
    State(state): State<Arc<AppState>>,
    Path((woj, pow)): Path<(String, String)>,
) -> Result<Json<Vec<MunicipalityEntry>>, ApiError> {
    let hierarchy = &state.hierarchy;
    let county = hierarchy
        .county(&woj, &pow)
        .ok_or_else(|| ApiError::not_found(format!("unknown county {}{}", woj, pow)))?;

    let entries = sorted_by_name(hierarchy.municipalities(county))
        .into_iter()
        .map(|m| MunicipalityEntry {
            id: hierarchy.municipality_identifier(m),
            code: m.code.clone(),
            kind: m.kind.clone(),
            name: m.name.clone(),
        })
        .collect();

    Ok(Json(entries))
}

async fn regions_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RegionsQueryParams>,
) -> Result<Json<Vec<Region>>, ApiError> {
    let regions = state
        .resolver
        .regions(&params.municipality_id)
        .await
        .map_err(|e| match e {
            LocatorError::NotFound => ApiError::not_found(format!(
                "cannot find regions for {}",
                params.municipality_id
            )),
            e => e.into(),
        })?;

    Ok(Json(regions))
}

async fn parcel_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ParcelQueryParams>,
) -> Result<Json<Parcel>, ApiError> {
    let parcel = state
        .resolver
        .parcel(&params.number, params.region.as_deref())
        .await?;

    Ok(Json(parcel))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            ApiError::from(LocatorError::NotFound).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(LocatorError::InsufficientQuery).status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(LocatorError::InvalidFormat("x".into())).status,
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(ApiError::from(LocatorError::Status(500)).status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_decode_errors_are_bad_gateway() {
        for e in [
            LocatorError::InvalidFormat("146501.0001".into()),
            LocatorError::InvalidGeometry("POINT(1 2)".into()),
            LocatorError::InvalidCoordinatePair("abc def".into()),
        ] {
            assert!(e.is_decode_error());
            assert_eq!(ApiError::from(e).status, StatusCode::BAD_GATEWAY);
        }

        let local = LocatorError::CacheCorrupt {
            key: "regions_146501_1".into(),
            reason: "eof".into(),
        };
        assert!(!local.is_decode_error());
        assert_eq!(ApiError::from(local).status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_unit_entries_sorted() {
        let hierarchy = dzialka::teryt::parse_hierarchy(
            "WOJ;POW;GMI;RODZ;NAZWA;NAZWA_OBSZARU\n\
             14;;;;MAZOWIECKIE;województwo\n\
             02;;;;DOLNOŚLĄSKIE;województwo\n",
        );
        let entries = unit_entries(hierarchy.voivodeships());
        let codes: Vec<&str> = entries.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["02", "14"]);
    }
}
