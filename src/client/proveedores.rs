//! Supplier profile calls (`/api/proveedores`)

use reqwest::Method;

use super::error::{exigir_id, exigir_texto, ClientError, ClientResult};
use super::http::PortalClient;
use crate::domain::proveedores::{
    ActualizarProveedorRequest, CrearProveedorRequest, ProveedorCreado, ProveedorQuery,
};
use crate::domain::Proveedor;

const ENDPOINT: &str = "/api/proveedores";

impl PortalClient {
    pub async fn obtener_proveedor(&self, id_proveedor: i32) -> ClientResult<Proveedor> {
        exigir_id("id_proveedor", id_proveedor)?;
        let query = ProveedorQuery {
            id_proveedor: Some(id_proveedor),
            id_usuario: None,
        };
        self.get_data(ENDPOINT, &query, "Error al obtener proveedor").await
    }

    /// Supplier linked to a login account.
    pub async fn obtener_proveedor_por_usuario(&self, id_usuario: i32) -> ClientResult<Proveedor> {
        exigir_id("id_usuario", id_usuario)?;
        let query = ProveedorQuery {
            id_proveedor: None,
            id_usuario: Some(id_usuario),
        };
        self.get_data(ENDPOINT, &query, "Error al obtener proveedor").await
    }

    pub async fn registrar_proveedor(
        &self,
        req: &CrearProveedorRequest,
    ) -> ClientResult<ProveedorCreado> {
        exigir_texto("correo", &req.correo)?;
        exigir_texto("nombre_usuario", &req.nombre_usuario)?;
        req.validar().map_err(ClientError::InvalidArgument)?;

        self.json_data(Method::POST, ENDPOINT, req, "Error al registrar proveedor")
            .await
    }

    pub async fn actualizar_proveedor(
        &self,
        req: &ActualizarProveedorRequest,
    ) -> ClientResult<Proveedor> {
        exigir_id("id_proveedor", req.id_proveedor)?;
        self.json_data(Method::PUT, ENDPOINT, req, "Error al actualizar proveedor")
            .await
    }
}
