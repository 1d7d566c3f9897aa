//! Budget partidas: the static catalog and each supplier's registrations

use reqwest::Method;

use super::error::{exigir_id, exigir_texto, ClientResult};
use super::http::PortalClient;
use crate::api::MessageResponse;
use crate::domain::articulos::{
    CatalogoPartidasQuery, Partida, ProveedorPartida, ProveedorPartidaQuery,
    RegistrarPartidaRequest,
};
use crate::domain::proveedores::ProveedorIdQuery;

const ENDPOINT: &str = "/api/proveedores/partidas";

impl PortalClient {
    pub async fn catalogo_partidas(&self, capitulo: Option<&str>) -> ClientResult<Vec<Partida>> {
        let query = CatalogoPartidasQuery {
            capitulo: capitulo
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        };
        self.get_data("/api/catalogo/partidas", &query, "Error al obtener catálogo de partidas")
            .await
    }

    pub async fn listar_partidas_proveedor(
        &self,
        id_proveedor: i32,
    ) -> ClientResult<Vec<ProveedorPartida>> {
        exigir_id("id_proveedor", id_proveedor)?;
        self.get_data(
            ENDPOINT,
            &ProveedorIdQuery { id_proveedor },
            "Error al obtener partidas del proveedor",
        )
        .await
    }

    pub async fn registrar_partida(
        &self,
        id_proveedor: i32,
        codigo_partida: &str,
    ) -> ClientResult<ProveedorPartida> {
        exigir_id("id_proveedor", id_proveedor)?;
        exigir_texto("codigo_partida", codigo_partida)?;

        let body = RegistrarPartidaRequest {
            id_proveedor,
            codigo_partida: codigo_partida.trim().to_string(),
        };
        self.json_data(Method::POST, ENDPOINT, &body, "Error al registrar partida")
            .await
    }

    pub async fn eliminar_partida(
        &self,
        id_proveedor: i32,
        codigo_partida: &str,
    ) -> ClientResult<MessageResponse> {
        exigir_id("id_proveedor", id_proveedor)?;
        exigir_texto("codigo_partida", codigo_partida)?;

        let req = self
            .request(Method::DELETE, ENDPOINT)?
            .query(&ProveedorPartidaQuery {
                id_proveedor,
                codigo_partida: codigo_partida.trim().to_string(),
            });
        self.enviar(req, "Error al eliminar partida").await
    }
}
