use serde::{Deserialize, Serialize};

/// Role carried in the portal's access tokens
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Rol {
    Admin,
    Proveedor,
    Secretaria,
}

/// JWT claims issued to portal users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    pub rol: Rol,

    /// Supplier owned by this user (proveedor role)
    #[serde(default)]
    pub id_proveedor: Option<i32>,

    /// Secretaría the user works for (secretaria and admin roles)
    #[serde(default)]
    pub id_secretaria: Option<i32>,

    /// Sub-system the session was opened from
    #[serde(default)]
    pub sistema: Option<String>,

    /// Audience
    pub aud: String,

    /// Issuer
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,
}
