use super::{Claims, Rol};
use crate::error::ApiError;

/// Authenticated user context extracted from the JWT
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: i32,
    pub rol: Rol,
    pub id_proveedor: Option<i32>,
    pub id_secretaria: Option<i32>,
    pub sistema: Option<String>,
}

impl AuthContext {
    pub fn from_claims(claims: &Claims) -> Result<Self, &'static str> {
        let user_id = claims
            .sub
            .parse::<i32>()
            .map_err(|_| "Invalid user ID in token")?;

        if claims.rol == Rol::Proveedor && claims.id_proveedor.is_none() {
            return Err("Supplier token without id_proveedor");
        }

        Ok(Self {
            user_id,
            rol: claims.rol,
            id_proveedor: claims.id_proveedor,
            id_secretaria: claims.id_secretaria,
            sistema: claims.sistema.clone(),
        })
    }

    pub fn es_admin(&self) -> bool {
        self.rol == Rol::Admin
    }

    /// Admins see every supplier; a supplier only sees itself.
    pub fn puede_acceder_proveedor(&self, id_proveedor: i32) -> bool {
        match self.rol {
            Rol::Admin => true,
            Rol::Proveedor => self.id_proveedor == Some(id_proveedor),
            Rol::Secretaria => false,
        }
    }

    pub fn exigir_proveedor(&self, id_proveedor: i32) -> Result<(), ApiError> {
        if self.puede_acceder_proveedor(id_proveedor) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = self.user_id,
                id_proveedor,
                "Access to another supplier's data denied"
            );
            Err(ApiError::forbidden("No tiene acceso a este proveedor"))
        }
    }

    /// Staff (admin or secretaría users) manage concursos, bases and contracts.
    pub fn exigir_personal(&self) -> Result<(), ApiError> {
        match self.rol {
            Rol::Admin | Rol::Secretaria => Ok(()),
            Rol::Proveedor => Err(ApiError::forbidden(
                "Operación reservada al personal de la dependencia",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(rol: Rol, id_proveedor: Option<i32>) -> Claims {
        Claims {
            sub: "41".to_string(),
            rol,
            id_proveedor,
            id_secretaria: None,
            sistema: None,
            aud: "portal-compras-web".to_string(),
            iss: "portal-compras".to_string(),
            iat: 0,
            exp: 0,
        }
    }

    #[test]
    fn supplier_only_reaches_itself() {
        let ctx = AuthContext::from_claims(&claims(Rol::Proveedor, Some(9))).unwrap();
        assert!(ctx.puede_acceder_proveedor(9));
        assert!(!ctx.puede_acceder_proveedor(10));
        assert!(ctx.exigir_personal().is_err());
    }

    #[test]
    fn admin_reaches_everything() {
        let ctx = AuthContext::from_claims(&claims(Rol::Admin, None)).unwrap();
        assert!(ctx.es_admin());
        assert!(ctx.puede_acceder_proveedor(123));
        assert!(ctx.exigir_personal().is_ok());
    }

    #[test]
    fn supplier_token_needs_id_proveedor() {
        assert!(AuthContext::from_claims(&claims(Rol::Proveedor, None)).is_err());
    }

    #[test]
    fn non_numeric_subject_is_rejected() {
        let mut c = claims(Rol::Admin, None);
        c.sub = "abc".to_string();
        assert!(AuthContext::from_claims(&c).is_err());
    }
}
