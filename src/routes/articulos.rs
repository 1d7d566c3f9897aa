//! Supplier catalog item routes
//!
//! Articles are always filed under a partida the supplier registered.

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::api::{Created, DataResponse, MessageResponse};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::articulos::{
    ActualizarArticuloRequest, ArticuloIdQuery, ArticuloProveedor, CrearArticuloRequest,
};
use crate::domain::proveedores::ProveedorIdQuery;
use crate::error::ApiError;

#[derive(Debug, sqlx::FromRow)]
struct ArticuloRow {
    id_articulo: i32,
    id_proveedor: i32,
    codigo_partida: String,
    descripcion: String,
    unidad_medida: String,
    precio_unitario: Decimal,
    activo: bool,
    created_at: DateTime<Utc>,
}

impl From<ArticuloRow> for ArticuloProveedor {
    fn from(row: ArticuloRow) -> Self {
        Self {
            id_articulo: row.id_articulo,
            id_proveedor: row.id_proveedor,
            codigo_partida: row.codigo_partida,
            descripcion: row.descripcion,
            unidad_medida: row.unidad_medida,
            precio_unitario: row.precio_unitario,
            activo: row.activo,
            created_at: row.created_at,
        }
    }
}

const ARTICULO_COLUMNS: &str = "id_articulo, id_proveedor, codigo_partida, descripcion, unidad_medida, precio_unitario, activo, created_at";

async fn exigir_partida_registrada(
    db: &sqlx::PgPool,
    id_proveedor: i32,
    codigo_partida: &str,
) -> Result<(), ApiError> {
    let registrada: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM proveedor_partidas WHERE id_proveedor = $1 AND codigo_partida = $2)",
    )
    .bind(id_proveedor)
    .bind(codigo_partida)
    .fetch_one(db)
    .await?;

    if registrada {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!(
            "La partida {codigo_partida} no está registrada para el proveedor"
        )))
    }
}

async fn propietario_articulo(db: &sqlx::PgPool, id_articulo: i32) -> Result<i32, ApiError> {
    sqlx::query_scalar("SELECT id_proveedor FROM articulos_proveedor WHERE id_articulo = $1")
        .bind(id_articulo)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Artículo no encontrado"))
}

/// GET /api/proveedores/articulos
pub async fn listar_articulos(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProveedorIdQuery>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_proveedor(query.id_proveedor)?;

    let sql = format!(
        "SELECT {ARTICULO_COLUMNS} FROM articulos_proveedor WHERE id_proveedor = $1 ORDER BY codigo_partida, descripcion"
    );
    let articulos: Vec<ArticuloProveedor> = sqlx::query_as::<_, ArticuloRow>(&sql)
        .bind(query.id_proveedor)
        .fetch_all(&state.db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(DataResponse::new(articulos)))
}

/// POST /api/proveedores/articulos
pub async fn crear_articulo(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<CrearArticuloRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_proveedor(req.id_proveedor)?;
    req.validar().map_err(ApiError::bad_request)?;
    exigir_partida_registrada(&state.db, req.id_proveedor, &req.codigo_partida).await?;

    let sql = format!(
        r#"
        INSERT INTO articulos_proveedor (id_proveedor, codigo_partida, descripcion, unidad_medida, precio_unitario)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {ARTICULO_COLUMNS}
        "#
    );
    let articulo: ArticuloProveedor = sqlx::query_as::<_, ArticuloRow>(&sql)
        .bind(req.id_proveedor)
        .bind(&req.codigo_partida)
        .bind(req.descripcion.trim())
        .bind(req.unidad_medida.trim())
        .bind(req.precio_unitario)
        .fetch_one(&state.db)
        .await?
        .into();

    tracing::info!(
        id_proveedor = articulo.id_proveedor,
        id_articulo = articulo.id_articulo,
        partida = %articulo.codigo_partida,
        "Catalog item created"
    );

    Ok(Created(articulo))
}

/// PUT /api/proveedores/articulos
pub async fn actualizar_articulo(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<ActualizarArticuloRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id_proveedor = propietario_articulo(&state.db, req.id_articulo).await?;
    auth.exigir_proveedor(id_proveedor)?;

    if req.precio_unitario.is_some_and(|p| p.is_sign_negative()) {
        return Err(ApiError::bad_request(
            "El precio unitario no puede ser negativo",
        ));
    }
    if let Some(codigo) = &req.codigo_partida {
        exigir_partida_registrada(&state.db, id_proveedor, codigo).await?;
    }

    let sql = format!(
        r#"
        UPDATE articulos_proveedor SET
            codigo_partida = COALESCE($2, codigo_partida),
            descripcion = COALESCE($3, descripcion),
            unidad_medida = COALESCE($4, unidad_medida),
            precio_unitario = COALESCE($5, precio_unitario),
            activo = COALESCE($6, activo)
        WHERE id_articulo = $1
        RETURNING {ARTICULO_COLUMNS}
        "#
    );
    let articulo: ArticuloProveedor = sqlx::query_as::<_, ArticuloRow>(&sql)
        .bind(req.id_articulo)
        .bind(&req.codigo_partida)
        .bind(&req.descripcion)
        .bind(&req.unidad_medida)
        .bind(req.precio_unitario)
        .bind(req.activo)
        .fetch_one(&state.db)
        .await?
        .into();

    Ok(Json(DataResponse::new(articulo)))
}

/// DELETE /api/proveedores/articulos
pub async fn eliminar_articulo(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ArticuloIdQuery>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    let id_proveedor = propietario_articulo(&state.db, query.id_articulo).await?;
    auth.exigir_proveedor(id_proveedor)?;

    sqlx::query("DELETE FROM articulos_proveedor WHERE id_articulo = $1")
        .bind(query.id_articulo)
        .execute(&state.db)
        .await?;

    tracing::info!(id_proveedor, id_articulo = query.id_articulo, "Catalog item deleted");

    Ok(MessageResponse::with_code(
        "Artículo eliminado",
        "ARTICULO_ELIMINADO",
    ))
}
