use serde::{Deserialize, Serialize};

/// Channel the admin supplier page listens on
pub const CANAL_ADMIN_PROVEEDORES: &str = "admin-proveedores";

pub const EVENTO_PROVEEDOR_ACTUALIZADO: &str = "proveedor-actualizado";
pub const EVENTO_DOCUMENTO_CARGADO: &str = "documento-cargado";
pub const EVENTO_ESTATUS_REVISION: &str = "estatus-revision";

/// Realtime notification pushed to connected admin pages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventoPortal {
    pub canal: String,
    pub evento: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_proveedor: Option<i32>,
    pub mensaje: String,
}

impl EventoPortal {
    pub fn admin_proveedores(evento: &str, id_proveedor: i32, mensaje: impl Into<String>) -> Self {
        Self {
            canal: CANAL_ADMIN_PROVEEDORES.to_string(),
            evento: evento.to_string(),
            id_proveedor: Some(id_proveedor),
            mensaje: mensaje.into(),
        }
    }
}
