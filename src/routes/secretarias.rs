use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::DataResponse;
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::secretarias::Secretaria;
use crate::error::ApiError;
use crate::services::cache::keys;

#[derive(Debug, sqlx::FromRow)]
struct SecretariaRow {
    id_secretaria: i32,
    nombre: String,
    siglas: String,
    activa: bool,
}

impl From<SecretariaRow> for Secretaria {
    fn from(row: SecretariaRow) -> Self {
        Self {
            id_secretaria: row.id_secretaria,
            nombre: row.nombre,
            siglas: row.siglas,
            activa: row.activa,
        }
    }
}

/// GET /api/secretarias
pub async fn listar_secretarias(
    State(state): State<Arc<AppState>>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let cache_key = keys::secretarias();

    if let Some(secretarias) = state.cache.get::<Vec<Secretaria>>(&cache_key).await {
        return Ok(Json(DataResponse::new(secretarias)));
    }

    let secretarias: Vec<Secretaria> = sqlx::query_as::<_, SecretariaRow>(
        "SELECT id_secretaria, nombre, siglas, activa FROM secretarias WHERE activa ORDER BY nombre",
    )
    .fetch_all(&state.db)
    .await?
    .into_iter()
    .map(Into::into)
    .collect();

    if let Err(e) = state.cache.set(&cache_key, &secretarias).await {
        tracing::warn!(error = %e, "Failed to cache secretarías");
    }

    Ok(Json(DataResponse::new(secretarias)))
}
