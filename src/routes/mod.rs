pub mod admin_proveedores;
pub mod articulos;
pub mod bases;
pub mod concursos;
pub mod contratos;
pub mod documentos;
pub mod eventos;
pub mod firmas;
pub mod health;
pub mod partidas;
pub mod proveedores;
pub mod secretarias;
pub mod solicitudes;

use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use std::str::FromStr;
use std::sync::Arc;

use crate::app::AppState;
use crate::config::Settings;
use crate::domain::UnknownValue;
use crate::error::ApiError;

/// Build the API router with all routes
pub fn api_router(settings: &Settings) -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        // Supplier administration
        .route(
            "/api/adminProveedores",
            get(admin_proveedores::listar_proveedores).put(admin_proveedores::cambiar_estatus),
        )
        .route(
            "/api/adminProveedores/resumen",
            get(admin_proveedores::resumen_revision),
        )
        .route(
            "/api/adminProveedores/bitacora",
            get(admin_proveedores::bitacora_revision),
        )
        // Supplier profile
        .route(
            "/api/proveedores",
            get(proveedores::obtener_proveedor)
                .post(proveedores::registrar_proveedor)
                .put(proveedores::actualizar_proveedor),
        )
        .route(
            "/api/proveedores/articulos",
            get(articulos::listar_articulos)
                .post(articulos::crear_articulo)
                .put(articulos::actualizar_articulo)
                .delete(articulos::eliminar_articulo),
        )
        .route(
            "/api/proveedores/partidas",
            get(partidas::listar_partidas_proveedor)
                .post(partidas::registrar_partida)
                .delete(partidas::eliminar_partida),
        )
        .route("/api/catalogo/partidas", get(partidas::catalogo_partidas))
        // Supplier documents (multipart uploads get their own body limit)
        .route(
            "/api/proveedoresDocumentos",
            get(documentos::listar_documentos)
                .post(documentos::subir_documento)
                .put(documentos::revisar_documento)
                .delete(documentos::eliminar_documento)
                .layer(DefaultBodyLimit::max(settings.max_upload_bytes)),
        )
        .route(
            "/api/proveedoresDocumentos/checklist",
            get(documentos::checklist_documentos),
        )
        // Procurement
        .route("/api/secretarias", get(secretarias::listar_secretarias))
        .route(
            "/api/solicitudes",
            get(solicitudes::listar_solicitudes)
                .post(solicitudes::crear_solicitud)
                .patch(solicitudes::cambiar_estatus_solicitud),
        )
        .route(
            "/api/concursos",
            get(concursos::obtener_concursos)
                .post(concursos::crear_concurso)
                .put(concursos::actualizar_concurso)
                .patch(concursos::cambiar_estatus_concurso)
                .delete(concursos::eliminar_concurso),
        )
        .route(
            "/api/bases",
            get(bases::obtener_bases)
                .post(bases::crear_bases)
                .put(bases::actualizar_bases)
                .patch(bases::publicar_bases),
        )
        .route(
            "/api/contratos",
            get(contratos::obtener_contratos)
                .post(contratos::generar_contrato)
                .put(contratos::actualizar_contrato),
        )
        .route(
            "/api/firmaEnvia",
            get(firmas::listar_firmas)
                .post(firmas::enviar_a_firma)
                .patch(firmas::responder_firma),
        )
        // Realtime admin notifications
        .route("/api/eventos", get(eventos::stream_eventos))
}

/// Parse a TEXT column into its enum. A value outside the enum means the row
/// was written by something other than this service.
pub(crate) fn columna<T>(valor: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = UnknownValue>,
{
    valor
        .parse()
        .map_err(|e: UnknownValue| ApiError::internal(format!("Corrupt row: {e}")))
}

/// Map a unique-constraint violation to 409, anything else to a database error.
pub(crate) fn conflicto_si_duplicado(e: sqlx::Error, mensaje: &str) -> ApiError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return ApiError::conflict(mensaje);
        }
    }
    ApiError::Database(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EstatusRevision;

    #[test]
    fn columna_parses_known_values() {
        let estatus: EstatusRevision = columna("APROBADO").unwrap();
        assert_eq!(estatus, EstatusRevision::Aprobado);
    }

    #[test]
    fn columna_reports_corrupt_rows_as_internal() {
        let err = columna::<EstatusRevision>("aprobado").unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[test]
    fn non_unique_errors_stay_database_errors() {
        let err = conflicto_si_duplicado(sqlx::Error::RowNotFound, "duplicado");
        assert!(matches!(err, ApiError::Database(_)));
    }
}
