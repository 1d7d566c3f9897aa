//! Admin supplier review calls (`/api/adminProveedores`)

use reqwest::Method;

use super::error::{exigir_id, ClientResult};
use super::http::PortalClient;
use crate::api::ApiResponse;
use crate::domain::admin::{
    AdminProveedoresQuery, BitacoraRevision, CambioEstatusRequest, ListadoAdminMeta,
    ResumenRevision,
};
use crate::domain::proveedores::{EstatusRevision, ProveedorIdQuery};
use crate::domain::Proveedor;

const ENDPOINT: &str = "/api/adminProveedores";

/// Admin listing plus the server's pending-review count.
#[derive(Debug, Clone)]
pub struct ListadoAdmin {
    pub proveedores: Vec<Proveedor>,
    pub pendientes_revision: i64,
}

impl PortalClient {
    pub async fn listar_proveedores_admin(
        &self,
        filtro: &AdminProveedoresQuery,
    ) -> ClientResult<ListadoAdmin> {
        let req = self.request(Method::GET, ENDPOINT)?.query(filtro);
        let respuesta: ApiResponse<Vec<Proveedor>, ListadoAdminMeta> =
            self.enviar(req, "Error al obtener proveedores").await?;

        Ok(ListadoAdmin {
            pendientes_revision: respuesta.meta.unwrap_or_default().pendientes_revision,
            proveedores: respuesta.data,
        })
    }

    pub async fn cambiar_estatus_revision(
        &self,
        id_proveedor: i32,
        estatus_revision: EstatusRevision,
        comentario: Option<String>,
    ) -> ClientResult<Proveedor> {
        exigir_id("id_proveedor", id_proveedor)?;

        let body = CambioEstatusRequest {
            id_proveedor,
            estatus_revision,
            comentario: comentario.filter(|c| !c.trim().is_empty()),
        };
        self.json_data(Method::PUT, ENDPOINT, &body, "Error al actualizar estatus de revisión")
            .await
    }

    pub async fn resumen_revision(&self) -> ClientResult<ResumenRevision> {
        self.get_todo(
            "/api/adminProveedores/resumen",
            "Error al obtener resumen de revisión",
        )
        .await
    }

    pub async fn bitacora_revision(&self, id_proveedor: i32) -> ClientResult<Vec<BitacoraRevision>> {
        exigir_id("id_proveedor", id_proveedor)?;
        self.get_data(
            "/api/adminProveedores/bitacora",
            &ProveedorIdQuery { id_proveedor },
            "Error al obtener bitácora de revisión",
        )
        .await
    }
}
