use super::error::ClientResult;
use super::http::PortalClient;
use crate::domain::secretarias::Secretaria;

impl PortalClient {
    /// Active secretarías, used by the request and concurso forms.
    pub async fn listar_secretarias(&self) -> ClientResult<Vec<Secretaria>> {
        self.get_todo("/api/secretarias", "Error al obtener secretarías")
            .await
    }
}
