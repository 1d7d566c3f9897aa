//! Partida routes: the static catalog and the partidas each supplier offers

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::api::{Created, DataResponse, MessageResponse};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::articulos::{
    CatalogoPartidasQuery, Partida, ProveedorPartida, ProveedorPartidaQuery,
    RegistrarPartidaRequest,
};
use crate::domain::proveedores::ProveedorIdQuery;
use crate::error::ApiError;
use crate::services::cache::keys;

#[derive(Debug, sqlx::FromRow)]
struct PartidaRow {
    codigo_partida: String,
    descripcion: String,
    capitulo: String,
}

impl From<PartidaRow> for Partida {
    fn from(row: PartidaRow) -> Self {
        Self {
            codigo_partida: row.codigo_partida,
            descripcion: row.descripcion,
            capitulo: row.capitulo,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProveedorPartidaRow {
    id_proveedor: i32,
    codigo_partida: String,
    descripcion: String,
    created_at: DateTime<Utc>,
}

impl From<ProveedorPartidaRow> for ProveedorPartida {
    fn from(row: ProveedorPartidaRow) -> Self {
        Self {
            id_proveedor: row.id_proveedor,
            codigo_partida: row.codigo_partida,
            descripcion: row.descripcion,
            created_at: row.created_at,
        }
    }
}

/// GET /api/catalogo/partidas
///
/// Served from Redis when cached.
pub async fn catalogo_partidas(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CatalogoPartidasQuery>,
    _auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let capitulo = query
        .capitulo
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let cache_key = keys::catalogo_partidas(capitulo);

    if let Some(partidas) = state.cache.get::<Vec<Partida>>(&cache_key).await {
        return Ok(Json(DataResponse::new(partidas)));
    }

    let partidas: Vec<Partida> = sqlx::query_as::<_, PartidaRow>(
        r#"
        SELECT codigo_partida, descripcion, capitulo
        FROM partidas
        WHERE ($1::text IS NULL OR capitulo = $1)
        ORDER BY codigo_partida
        "#,
    )
    .bind(capitulo)
    .fetch_all(&state.db)
    .await?
    .into_iter()
    .map(Into::into)
    .collect();

    // Cache failures only cost a database read next time
    if let Err(e) = state.cache.set(&cache_key, &partidas).await {
        tracing::warn!(error = %e, "Failed to cache partida catalog");
    }

    Ok(Json(DataResponse::new(partidas)))
}

/// GET /api/proveedores/partidas
pub async fn listar_partidas_proveedor(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProveedorIdQuery>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_proveedor(query.id_proveedor)?;

    let partidas: Vec<ProveedorPartida> = sqlx::query_as::<_, ProveedorPartidaRow>(
        r#"
        SELECT pp.id_proveedor, pp.codigo_partida, p.descripcion, pp.created_at
        FROM proveedor_partidas pp
        JOIN partidas p ON p.codigo_partida = pp.codigo_partida
        WHERE pp.id_proveedor = $1
        ORDER BY pp.codigo_partida
        "#,
    )
    .bind(query.id_proveedor)
    .fetch_all(&state.db)
    .await?
    .into_iter()
    .map(Into::into)
    .collect();

    Ok(Json(DataResponse::new(partidas)))
}

/// POST /api/proveedores/partidas
///
/// Registering a partida twice returns the existing registration.
pub async fn registrar_partida(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<RegistrarPartidaRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_proveedor(req.id_proveedor)?;

    let codigo = req.codigo_partida.trim();
    let existe: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM partidas WHERE codigo_partida = $1)")
            .bind(codigo)
            .fetch_one(&state.db)
            .await?;
    if !existe {
        return Err(ApiError::not_found(format!(
            "La partida {codigo} no existe en el catálogo"
        )));
    }

    sqlx::query(
        r#"
        INSERT INTO proveedor_partidas (id_proveedor, codigo_partida)
        VALUES ($1, $2)
        ON CONFLICT (id_proveedor, codigo_partida) DO NOTHING
        "#,
    )
    .bind(req.id_proveedor)
    .bind(codigo)
    .execute(&state.db)
    .await?;

    let partida: ProveedorPartida = sqlx::query_as::<_, ProveedorPartidaRow>(
        r#"
        SELECT pp.id_proveedor, pp.codigo_partida, p.descripcion, pp.created_at
        FROM proveedor_partidas pp
        JOIN partidas p ON p.codigo_partida = pp.codigo_partida
        WHERE pp.id_proveedor = $1 AND pp.codigo_partida = $2
        "#,
    )
    .bind(req.id_proveedor)
    .bind(codigo)
    .fetch_one(&state.db)
    .await?
    .into();

    tracing::info!(
        id_proveedor = partida.id_proveedor,
        partida = %partida.codigo_partida,
        "Partida registered for supplier"
    );

    Ok(Created(partida))
}

/// DELETE /api/proveedores/partidas
///
/// Refused while the supplier still has articles under the partida.
pub async fn eliminar_partida(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProveedorPartidaQuery>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_proveedor(query.id_proveedor)?;

    let articulos: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM articulos_proveedor WHERE id_proveedor = $1 AND codigo_partida = $2",
    )
    .bind(query.id_proveedor)
    .bind(&query.codigo_partida)
    .fetch_one(&state.db)
    .await?;
    if articulos > 0 {
        return Err(ApiError::conflict(format!(
            "La partida {} tiene {articulos} artículo(s) registrados",
            query.codigo_partida
        )));
    }

    let eliminadas = sqlx::query(
        "DELETE FROM proveedor_partidas WHERE id_proveedor = $1 AND codigo_partida = $2",
    )
    .bind(query.id_proveedor)
    .bind(&query.codigo_partida)
    .execute(&state.db)
    .await?
    .rows_affected();

    if eliminadas == 0 {
        return Err(ApiError::not_found("El proveedor no tiene registrada esa partida"));
    }

    Ok(MessageResponse::with_code(
        format!("Partida {} eliminada", query.codigo_partida),
        "PARTIDA_ELIMINADA",
    ))
}
