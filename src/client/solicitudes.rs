//! Purchase requests (`/api/solicitudes`)

use reqwest::Method;

use super::error::{exigir_id, exigir_texto, ClientResult};
use super::http::PortalClient;
use crate::domain::solicitudes::{
    CambioEstatusSolicitudRequest, CrearSolicitudRequest, EstatusSolicitud, Solicitud,
    SolicitudesQuery,
};

const ENDPOINT: &str = "/api/solicitudes";

impl PortalClient {
    pub async fn listar_solicitudes(&self, filtro: &SolicitudesQuery) -> ClientResult<Vec<Solicitud>> {
        if let Some(id_secretaria) = filtro.id_secretaria {
            exigir_id("id_secretaria", id_secretaria)?;
        }
        self.get_data(ENDPOINT, filtro, "Error al obtener solicitudes").await
    }

    pub async fn crear_solicitud(&self, req: &CrearSolicitudRequest) -> ClientResult<Solicitud> {
        exigir_id("id_secretaria", req.id_secretaria)?;
        exigir_texto("descripcion", &req.descripcion)?;
        self.json_data(Method::POST, ENDPOINT, req, "Error al crear solicitud")
            .await
    }

    pub async fn cambiar_estatus_solicitud(
        &self,
        id_solicitud: i32,
        estatus: EstatusSolicitud,
    ) -> ClientResult<Solicitud> {
        exigir_id("id_solicitud", id_solicitud)?;
        let body = CambioEstatusSolicitudRequest { id_solicitud, estatus };
        self.json_data(Method::PATCH, ENDPOINT, &body, "Error al cambiar estatus de la solicitud")
            .await
    }
}
