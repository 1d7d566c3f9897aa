//! HS256 access-token verification for the portal
//!
//! Tokens are minted by the portal's login service with the shared secret;
//! this service only verifies them.

use anyhow::{Context, Result};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use super::Claims;

#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
}

impl TokenVerifier {
    pub fn new(secret: &str, issuer: String, audience: String) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
        }
    }

    /// Verify a JWT token and return the claims
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.validate_exp = true;

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).context("JWT validation failed")?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Rol;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRETO: &str = "secreto-de-pruebas";

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(
            SECRETO,
            "portal-compras".to_string(),
            "portal-compras-web".to_string(),
        )
    }

    fn claims(user_id: i32, rol: Rol, ttl_seconds: i64) -> Claims {
        let now = Utc::now().timestamp();
        Claims {
            sub: user_id.to_string(),
            rol,
            id_proveedor: None,
            id_secretaria: None,
            sistema: None,
            aud: "portal-compras-web".to_string(),
            iss: "portal-compras".to_string(),
            iat: now,
            exp: now + ttl_seconds,
        }
    }

    fn firmar(claims: &Claims) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(SECRETO.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn signed_tokens_verify() {
        let v = verifier();
        let mut claims = claims(15, Rol::Proveedor, 3600);
        claims.id_proveedor = Some(3);
        let token = firmar(&claims);

        let back = v.verify_token(&token).unwrap();
        assert_eq!(back.sub, "15");
        assert_eq!(back.rol, Rol::Proveedor);
        assert_eq!(back.id_proveedor, Some(3));
    }

    #[test]
    fn expired_tokens_fail() {
        let v = verifier();
        let token = firmar(&claims(1, Rol::Admin, -3600));
        assert!(v.verify_token(&token).is_err());
    }

    #[test]
    fn wrong_secret_or_audience_fails() {
        let token = firmar(&claims(1, Rol::Admin, 3600));

        let other_secret = TokenVerifier::new(
            "otro-secreto",
            "portal-compras".to_string(),
            "portal-compras-web".to_string(),
        );
        assert!(other_secret.verify_token(&token).is_err());

        let other_audience = TokenVerifier::new(
            SECRETO,
            "portal-compras".to_string(),
            "otra-app".to_string(),
        );
        assert!(other_audience.verify_token(&token).is_err());
    }
}
