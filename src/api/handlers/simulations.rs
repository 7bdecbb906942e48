//! Simulation handlers, including likes.

use crate::{
    auth::{
        guard::{ensure_readable, ensure_writable},
        middleware::{AuthUser, MaybeUser},
    },
    db::turso::Simulation,
    types::{
        AppError, CreateSimulationRequest, LikeCount, PageRequest, Result, SimulationCreated,
        SimulationSort, SimulationView, UpdateSimulationRequest,
    },
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

/// Query parameters for listing simulations
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListSimulationsQuery {
    /// Page number, starting at 1
    pub page: Option<u32>,
    /// Page size, 1 to 100
    pub size: Option<u32>,
    /// `latest` (default) or `likes`
    #[param(value_type = Option<String>)]
    pub sort: Option<SimulationSort>,
}

/// List public simulations
#[utoipa::path(
    get,
    path = "/api/simulations",
    params(ListSimulationsQuery),
    responses(
        (status = 200, description = "Public simulations", body = Vec<SimulationView>),
        (status = 400, description = "Invalid paging or sort parameters")
    ),
    tag = "simulations"
)]
pub async fn list_simulations(
    State(state): State<AppState>,
    Query(params): Query<ListSimulationsQuery>,
) -> Result<Json<Vec<SimulationView>>> {
    let page = PageRequest::new(params.page, params.size)?;
    let sort = params.sort.unwrap_or_default();

    let simulations = state.turso.list_public_simulations(page, sort).await?;

    simulations
        .into_iter()
        .map(Simulation::into_view)
        .collect::<Result<Vec<_>>>()
        .map(Json)
}

/// Save a simulation owned by the caller
#[utoipa::path(
    post,
    path = "/api/simulations",
    request_body = CreateSimulationRequest,
    responses(
        (status = 201, description = "Simulation created", body = SimulationCreated),
        (status = 401, description = "Unauthorized")
    ),
    tag = "simulations",
    security(("bearer" = []))
)]
pub async fn create_simulation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<CreateSimulationRequest>,
) -> Result<(StatusCode, Json<SimulationCreated>)> {
    if payload.title.trim().is_empty() {
        return Err(AppError::InvalidInput("Title is required".to_string()));
    }

    let simulation_id = state
        .turso
        .create_simulation(
            Some(user.id),
            &payload.title,
            payload.data,
            payload.data2,
            payload.is_public,
        )
        .await?;

    info!(simulation_id, owner_id = user.id, "Simulation created");

    Ok((
        StatusCode::CREATED,
        Json(SimulationCreated { simulation_id }),
    ))
}

/// Read a simulation with its like count
///
/// Signed-in readers also see whether they like it.
#[utoipa::path(
    get,
    path = "/api/simulations/{id}",
    params(
        ("id" = i64, Path, description = "Simulation ID")
    ),
    responses(
        (status = 200, description = "Simulation", body = SimulationView),
        (status = 403, description = "Simulation is private"),
        (status = 404, description = "Simulation not found")
    ),
    tag = "simulations"
)]
pub async fn get_simulation(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Path(id): Path<i64>,
) -> Result<Json<SimulationView>> {
    let simulation = load(&state, id).await?;
    ensure_readable(&simulation, user.as_ref(), "simulation")?;

    let mut view = simulation.into_view()?;
    if let Some(user) = user {
        view.liked_by_me = Some(state.turso.likes().is_liked(user.id, id).await?);
    }

    Ok(Json(view))
}

/// Update a simulation
#[utoipa::path(
    patch,
    path = "/api/simulations/{id}",
    params(
        ("id" = i64, Path, description = "Simulation ID")
    ),
    request_body = UpdateSimulationRequest,
    responses(
        (status = 200, description = "Updated simulation", body = SimulationView),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Simulation not found")
    ),
    tag = "simulations",
    security(("bearer" = []))
)]
pub async fn update_simulation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateSimulationRequest>,
) -> Result<Json<SimulationView>> {
    let simulation = load(&state, id).await?;
    ensure_writable(&simulation, Some(&user), "simulation")?;

    if payload
        .title
        .as_deref()
        .is_some_and(|title| title.trim().is_empty())
    {
        return Err(AppError::InvalidInput("Title must not be empty".to_string()));
    }

    let updated = state.turso.update_simulation(id, &payload).await?;

    info!(simulation_id = id, "Simulation updated");
    Ok(Json(updated.into_view()?))
}

/// Delete a simulation and its likes
#[utoipa::path(
    delete,
    path = "/api/simulations/{id}",
    params(
        ("id" = i64, Path, description = "Simulation ID")
    ),
    responses(
        (status = 204, description = "Simulation deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Simulation not found")
    ),
    tag = "simulations",
    security(("bearer" = []))
)]
pub async fn delete_simulation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let simulation = load(&state, id).await?;
    ensure_writable(&simulation, Some(&user), "simulation")?;

    if !state.turso.delete_simulation(id).await? {
        return Err(not_found());
    }

    info!(simulation_id = id, "Simulation deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Like a simulation
#[utoipa::path(
    post,
    path = "/api/simulations/{id}/like",
    params(
        ("id" = i64, Path, description = "Simulation ID")
    ),
    responses(
        (status = 200, description = "Like recorded", body = LikeCount),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Simulation not found"),
        (status = 409, description = "Already liked")
    ),
    tag = "simulations",
    security(("bearer" = []))
)]
pub async fn like_simulation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<LikeCount>> {
    let count = state.turso.likes().toggle_on(user.id, id).await?;
    Ok(Json(count))
}

/// Remove a like
#[utoipa::path(
    delete,
    path = "/api/simulations/{id}/like",
    params(
        ("id" = i64, Path, description = "Simulation ID")
    ),
    responses(
        (status = 200, description = "Like removed", body = LikeCount),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No like to remove")
    ),
    tag = "simulations",
    security(("bearer" = []))
)]
pub async fn unlike_simulation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<LikeCount>> {
    let count = state.turso.likes().toggle_off(user.id, id).await?;
    Ok(Json(count))
}

async fn load(state: &AppState, id: i64) -> Result<Simulation> {
    state.turso.get_simulation(id).await?.ok_or_else(not_found)
}

fn not_found() -> AppError {
    AppError::NotFound("Simulation not found".to_string())
}
