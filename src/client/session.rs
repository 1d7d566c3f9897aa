//! Per-user session values
//!
//! The caller owns a `SessionContext` and passes it explicitly; nothing here
//! is global. Keys serialize with the same names the web front end stores.

use serde::{Deserialize, Serialize};

use super::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proveedor_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proveedor_user_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_secre: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_sistema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_selected_proveedor_id: Option<i32>,
}

impl SessionContext {
    /// Session of a logged-in supplier.
    pub fn proveedor(proveedor_id: i32, proveedor_user_id: i32) -> Self {
        Self {
            proveedor_id: Some(proveedor_id),
            proveedor_user_id: Some(proveedor_user_id),
            ..Default::default()
        }
    }

    pub fn proveedor_id(&self) -> ClientResult<i32> {
        self.proveedor_id
            .ok_or(ClientError::SessionMissing("proveedorId"))
    }

    pub fn proveedor_user_id(&self) -> ClientResult<i32> {
        self.proveedor_user_id
            .ok_or(ClientError::SessionMissing("proveedorUserId"))
    }

    pub fn user_id(&self) -> ClientResult<i32> {
        self.user_id.ok_or(ClientError::SessionMissing("userId"))
    }

    pub fn user_secre(&self) -> ClientResult<i32> {
        self.user_secre.ok_or(ClientError::SessionMissing("userSecre"))
    }

    pub fn user_sistema(&self) -> ClientResult<&str> {
        self.user_sistema
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ClientError::SessionMissing("userSistema"))
    }

    /// Supplier the admin picked in the review panel.
    pub fn admin_selected_proveedor_id(&self) -> ClientResult<i32> {
        self.admin_selected_proveedor_id
            .ok_or(ClientError::SessionMissing("adminSelectedProveedorId"))
    }

    pub fn seleccionar_proveedor(&mut self, id_proveedor: i32) {
        self.admin_selected_proveedor_id = Some(id_proveedor);
    }

    /// Supplier the current screen acts on: the admin's selection when set,
    /// otherwise the logged-in supplier.
    pub fn proveedor_activo(&self) -> ClientResult<i32> {
        self.admin_selected_proveedor_id
            .or(self.proveedor_id)
            .ok_or(ClientError::SessionMissing("proveedorId"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_front_end_key_names() {
        let session = SessionContext {
            proveedor_id: Some(7),
            proveedor_user_id: Some(107),
            user_id: Some(1),
            user_secre: Some(3),
            user_sistema: Some("compras".to_string()),
            admin_selected_proveedor_id: Some(9),
        };

        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["proveedorId"], 7);
        assert_eq!(json["proveedorUserId"], 107);
        assert_eq!(json["userId"], 1);
        assert_eq!(json["userSecre"], 3);
        assert_eq!(json["userSistema"], "compras");
        assert_eq!(json["adminSelectedProveedorId"], 9);

        let back: SessionContext = serde_json::from_value(json).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn missing_keys_name_the_key() {
        let session = SessionContext::default();
        let err = session.proveedor_id().unwrap_err();
        assert!(matches!(err, ClientError::SessionMissing("proveedorId")));
        assert_eq!(err.to_string(), "Falta proveedorId en la sesión");

        assert!(session.user_sistema().is_err());
        assert!(session.admin_selected_proveedor_id().is_err());
    }

    #[test]
    fn blank_sistema_counts_as_missing() {
        let session = SessionContext {
            user_sistema: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(session.user_sistema().is_err());
    }

    #[test]
    fn admin_selection_wins_over_own_supplier() {
        let mut session = SessionContext::proveedor(4, 104);
        assert_eq!(session.proveedor_activo().unwrap(), 4);
        session.seleccionar_proveedor(12);
        assert_eq!(session.proveedor_activo().unwrap(), 12);
    }
}
