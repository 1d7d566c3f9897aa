//! Supplier catalog items (`/api/proveedores/articulos`)

use reqwest::Method;

use super::error::{exigir_id, exigir_texto, ClientError, ClientResult};
use super::http::PortalClient;
use crate::api::MessageResponse;
use crate::domain::articulos::{
    ActualizarArticuloRequest, ArticuloIdQuery, ArticuloProveedor, CrearArticuloRequest,
};
use crate::domain::proveedores::ProveedorIdQuery;

const ENDPOINT: &str = "/api/proveedores/articulos";

impl PortalClient {
    pub async fn listar_articulos(&self, id_proveedor: i32) -> ClientResult<Vec<ArticuloProveedor>> {
        exigir_id("id_proveedor", id_proveedor)?;
        self.get_data(
            ENDPOINT,
            &ProveedorIdQuery { id_proveedor },
            "Error al obtener artículos",
        )
        .await
    }

    pub async fn crear_articulo(&self, req: &CrearArticuloRequest) -> ClientResult<ArticuloProveedor> {
        exigir_id("id_proveedor", req.id_proveedor)?;
        exigir_texto("codigo_partida", &req.codigo_partida)?;
        req.validar().map_err(ClientError::InvalidArgument)?;

        self.json_data(Method::POST, ENDPOINT, req, "Error al crear artículo")
            .await
    }

    pub async fn actualizar_articulo(
        &self,
        req: &ActualizarArticuloRequest,
    ) -> ClientResult<ArticuloProveedor> {
        exigir_id("id_articulo", req.id_articulo)?;
        self.json_data(Method::PUT, ENDPOINT, req, "Error al actualizar artículo")
            .await
    }

    pub async fn eliminar_articulo(&self, id_articulo: i32) -> ClientResult<MessageResponse> {
        exigir_id("id_articulo", id_articulo)?;
        let req = self
            .request(Method::DELETE, ENDPOINT)?
            .query(&ArticuloIdQuery { id_articulo });
        self.enviar(req, "Error al eliminar artículo").await
    }
}
