//! Contract routes
//!
//! Contracts are generated from an awarded concurso for its winning supplier
//! and edited only while in `BORRADOR`.

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::{columna, conflicto_si_duplicado};
use crate::api::{Created, DataResponse};
use crate::app::AppState;
use crate::auth::{AuthContext, RequireAuth, Rol};
use crate::domain::concursos::EstatusConcurso;
use crate::domain::contratos::{
    numero_contrato, validar_generacion, validar_vigencia_y_monto, ActualizarContratoRequest,
    ContextoGeneracion, Contrato, ContratoError, ContratosQuery, EstatusContrato,
    GenerarContratoRequest,
};
use crate::domain::proveedores::EstatusRevision;
use crate::error::ApiError;

pub(crate) const CONTRATO_COLUMNS: &str = r#"
    id_contrato, id_concurso, id_proveedor, numero_contrato, objeto, monto_total,
    fecha_inicio, fecha_fin, estatus, created_at, updated_at
"#;

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ContratoRow {
    id_contrato: i32,
    id_concurso: i32,
    id_proveedor: i32,
    numero_contrato: String,
    objeto: String,
    monto_total: Decimal,
    fecha_inicio: NaiveDate,
    fecha_fin: NaiveDate,
    estatus: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ContratoRow> for Contrato {
    type Error = ApiError;

    fn try_from(row: ContratoRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id_contrato: row.id_contrato,
            id_concurso: row.id_concurso,
            id_proveedor: row.id_proveedor,
            numero_contrato: row.numero_contrato,
            objeto: row.objeto,
            monto_total: row.monto_total,
            fecha_inicio: row.fecha_inicio,
            fecha_fin: row.fecha_fin,
            estatus: columna(&row.estatus)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub(crate) async fn buscar_contrato<'e, E>(db: E, id_contrato: i32) -> Result<Contrato, ApiError>
where
    E: sqlx::PgExecutor<'e>,
{
    let sql = format!("SELECT {CONTRATO_COLUMNS} FROM contratos WHERE id_contrato = $1");
    sqlx::query_as::<_, ContratoRow>(&sql)
        .bind(id_contrato)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Contrato no encontrado"))?
        .try_into()
}

/// Staff see every contract; a supplier only its own.
pub(crate) fn exigir_acceso_contrato(auth: &AuthContext, contrato: &Contrato) -> Result<(), ApiError> {
    match auth.rol {
        Rol::Admin | Rol::Secretaria => Ok(()),
        Rol::Proveedor => auth.exigir_proveedor(contrato.id_proveedor),
    }
}

/// GET /api/contratos
///
/// `?id_contrato=` returns one record. Otherwise lists by `id_concurso` or
/// `id_proveedor`; suppliers are always scoped to themselves.
pub async fn obtener_contratos(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ContratosQuery>,
    auth: RequireAuth,
) -> Result<Response, ApiError> {
    if let Some(id_contrato) = query.id_contrato {
        let contrato = buscar_contrato(&state.db, id_contrato).await?;
        exigir_acceso_contrato(&auth, &contrato)?;
        return Ok(Json(DataResponse::new(contrato)).into_response());
    }

    let id_proveedor = match auth.rol {
        Rol::Proveedor => {
            let propio = auth.id_proveedor;
            if let Some(pedido) = query.id_proveedor {
                auth.exigir_proveedor(pedido)?;
            }
            propio
        }
        Rol::Admin | Rol::Secretaria => query.id_proveedor,
    };

    let sql = format!(
        r#"
        SELECT {CONTRATO_COLUMNS}
        FROM contratos
        WHERE ($1::int IS NULL OR id_concurso = $1)
          AND ($2::int IS NULL OR id_proveedor = $2)
        ORDER BY created_at DESC, id_contrato DESC
        "#
    );
    let contratos = sqlx::query_as::<_, ContratoRow>(&sql)
        .bind(query.id_concurso)
        .bind(id_proveedor)
        .fetch_all(&state.db)
        .await?
        .into_iter()
        .map(Contrato::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(DataResponse::new(contratos)).into_response())
}

/// POST /api/contratos
///
/// Generate a contract for the winner of an awarded concurso. The concurso
/// row is locked so concurrent generations get consecutive numbers.
pub async fn generar_contrato(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<GenerarContratoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_personal()?;

    let mut tx = state.db.begin().await?;

    let (estatus_concurso, id_proveedor_ganador, nombre_concurso): (String, Option<i32>, String) =
        sqlx::query_as(
            "SELECT estatus, id_proveedor_ganador, nombre FROM concursos WHERE id_concurso = $1 FOR UPDATE",
        )
        .bind(req.id_concurso)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::not_found("Concurso no encontrado"))?;

    let estatus_proveedor: String =
        sqlx::query_scalar("SELECT estatus_revision FROM proveedores WHERE id_proveedor = $1")
            .bind(req.id_proveedor)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::not_found("Proveedor no encontrado"))?;

    let contexto = ContextoGeneracion {
        estatus_concurso: columna::<EstatusConcurso>(&estatus_concurso)?,
        id_proveedor_ganador,
        estatus_proveedor: columna::<EstatusRevision>(&estatus_proveedor)?,
    };
    validar_generacion(&contexto, &req)?;

    let objeto = match req.objeto.as_deref().map(str::trim).filter(|o| !o.is_empty()) {
        Some(objeto) => objeto.to_string(),
        None => sqlx::query_scalar::<_, String>("SELECT objeto FROM bases WHERE id_concurso = $1")
            .bind(req.id_concurso)
            .fetch_optional(&mut *tx)
            .await?
            .unwrap_or(nombre_concurso),
    };

    let existentes: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM contratos WHERE id_concurso = $1")
            .bind(req.id_concurso)
            .fetch_one(&mut *tx)
            .await?;
    let numero = numero_contrato(Utc::now().year(), req.id_concurso, existentes);

    let sql = format!(
        r#"
        INSERT INTO contratos (id_concurso, id_proveedor, numero_contrato, objeto, monto_total, fecha_inicio, fecha_fin)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {CONTRATO_COLUMNS}
        "#
    );
    let contrato: Contrato = sqlx::query_as::<_, ContratoRow>(&sql)
        .bind(req.id_concurso)
        .bind(req.id_proveedor)
        .bind(&numero)
        .bind(&objeto)
        .bind(req.monto_total)
        .bind(req.fecha_inicio)
        .bind(req.fecha_fin)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflicto_si_duplicado(e, "El número de contrato ya existe"))?
        .try_into()?;

    tx.commit().await?;

    tracing::info!(
        user_id = auth.user_id,
        id_contrato = contrato.id_contrato,
        numero = %contrato.numero_contrato,
        id_proveedor = contrato.id_proveedor,
        "Contract generated"
    );

    Ok(Created(contrato))
}

/// Merge an edit into a contract, enforcing which edits its status allows.
fn aplicar_cambios(
    contrato: &mut Contrato,
    cambios: ActualizarContratoRequest,
) -> Result<(), ContratoError> {
    let edita_terminos = cambios.objeto.is_some()
        || cambios.monto_total.is_some()
        || cambios.fecha_inicio.is_some()
        || cambios.fecha_fin.is_some();

    if edita_terminos && !contrato.estatus.es_editable() {
        return Err(ContratoError::NoEditable(contrato.estatus));
    }

    if let Some(estatus) = cambios.estatus {
        // Only cancellation is set by hand; signature flow drives the rest
        let permitido = estatus == contrato.estatus
            || (estatus == EstatusContrato::Cancelado && contrato.estatus != EstatusContrato::Firmado);
        if !permitido {
            return Err(ContratoError::NoEditable(contrato.estatus));
        }
        contrato.estatus = estatus;
    }

    if let Some(objeto) = cambios.objeto {
        contrato.objeto = objeto;
    }
    if let Some(monto) = cambios.monto_total {
        contrato.monto_total = monto;
    }
    if let Some(inicio) = cambios.fecha_inicio {
        contrato.fecha_inicio = inicio;
    }
    if let Some(fin) = cambios.fecha_fin {
        contrato.fecha_fin = fin;
    }

    validar_vigencia_y_monto(contrato.fecha_inicio, contrato.fecha_fin, contrato.monto_total)
}

/// PUT /api/contratos
pub async fn actualizar_contrato(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<ActualizarContratoRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.exigir_personal()?;

    let mut contrato = buscar_contrato(&state.db, req.id_contrato).await?;
    let estatus_anterior = contrato.estatus;
    aplicar_cambios(&mut contrato, req)?;

    let sql = format!(
        r#"
        UPDATE contratos SET
            objeto = $3, monto_total = $4, fecha_inicio = $5, fecha_fin = $6,
            estatus = $7, updated_at = NOW()
        WHERE id_contrato = $1 AND estatus = $2
        RETURNING {CONTRATO_COLUMNS}
        "#
    );
    let actualizado: Contrato = sqlx::query_as::<_, ContratoRow>(&sql)
        .bind(contrato.id_contrato)
        .bind(estatus_anterior.as_str())
        .bind(&contrato.objeto)
        .bind(contrato.monto_total)
        .bind(contrato.fecha_inicio)
        .bind(contrato.fecha_fin)
        .bind(contrato.estatus.as_str())
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::conflict("El contrato cambió de estatus; recargue e intente de nuevo"))?
        .try_into()?;

    tracing::info!(
        user_id = auth.user_id,
        id_contrato = actualizado.id_contrato,
        estatus = %actualizado.estatus,
        "Contract updated"
    );

    Ok(Json(DataResponse::new(actualizado)))
}
