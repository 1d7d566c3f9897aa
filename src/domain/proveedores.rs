//! Supplier (proveedor) domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

text_enum! {
    /// Legal form of a supplier.
    pub enum TipoProveedor {
        /// Legal entity
        Moral => "moral",
        /// Individual
        Fisica => "fisica",
    }
}

impl TipoProveedor {
    /// Length of a valid RFC for this supplier type.
    pub fn longitud_rfc(&self) -> usize {
        match self {
            Self::Moral => 12,
            Self::Fisica => 13,
        }
    }
}

text_enum! {
    /// Administrative review workflow status of a supplier profile.
    pub enum EstatusRevision {
        PendienteRevision => "PENDIENTE_REVISION",
        EnRevision => "EN_REVISION",
        Aprobado => "APROBADO",
        Rechazado => "RECHAZADO",
        RequiereCorreccion => "REQUIERE_CORRECCION",
    }
}

impl EstatusRevision {
    /// The sentinel counted by the admin "pending review" badge.
    pub fn es_pendiente(&self) -> bool {
        matches!(self, Self::PendienteRevision)
    }
}

/// Supplier profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Proveedor {
    pub id_proveedor: i32,
    pub id_usuario: i32,
    pub tipo_proveedor: TipoProveedor,
    pub rfc: String,
    pub razon_social: Option<String>,
    pub nombre: Option<String>,
    pub apellido_paterno: Option<String>,
    pub apellido_materno: Option<String>,
    pub curp: Option<String>,
    pub representante_legal: Option<String>,
    pub correo: String,
    pub telefono: Option<String>,
    pub calle: Option<String>,
    pub numero_exterior: Option<String>,
    pub colonia: Option<String>,
    pub codigo_postal: Option<String>,
    pub municipio: Option<String>,
    pub estado: Option<String>,
    pub giro: Option<String>,
    pub es_proveedor_eventos: bool,
    pub estatus_revision: EstatusRevision,
    pub comentario_revision: Option<String>,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Proveedor {
    /// Name shown in listings: razón social for legal entities, full name for individuals.
    pub fn nombre_mostrado(&self) -> String {
        match self.tipo_proveedor {
            TipoProveedor::Moral => self.razon_social.clone().unwrap_or_default(),
            TipoProveedor::Fisica => [
                self.nombre.as_deref(),
                self.apellido_paterno.as_deref(),
                self.apellido_materno.as_deref(),
            ]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        }
    }
}

/// Login account linked 1:1 to a supplier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsuarioProveedor {
    pub id_usuario: i32,
    pub correo: String,
    pub nombre_usuario: String,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
}

/// Request DTO for supplier onboarding (account + profile)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CrearProveedorRequest {
    pub correo: String,
    pub nombre_usuario: String,
    pub tipo_proveedor: String,
    pub rfc: String,
    #[serde(default)]
    pub razon_social: Option<String>,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub apellido_paterno: Option<String>,
    #[serde(default)]
    pub apellido_materno: Option<String>,
    #[serde(default)]
    pub curp: Option<String>,
    #[serde(default)]
    pub representante_legal: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub calle: Option<String>,
    #[serde(default)]
    pub numero_exterior: Option<String>,
    #[serde(default)]
    pub colonia: Option<String>,
    #[serde(default)]
    pub codigo_postal: Option<String>,
    #[serde(default)]
    pub municipio: Option<String>,
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default)]
    pub giro: Option<String>,
    #[serde(default)]
    pub es_proveedor_eventos: bool,
}

fn presente(valor: &Option<String>) -> bool {
    valor.as_deref().is_some_and(|s| !s.trim().is_empty())
}

impl CrearProveedorRequest {
    /// Check the fields required by the supplier type. Returns the parsed type.
    pub fn validar(&self) -> Result<TipoProveedor, String> {
        let tipo: TipoProveedor = self
            .tipo_proveedor
            .trim()
            .to_lowercase()
            .parse()
            .map_err(|_| format!("Tipo de proveedor no reconocido: {}", self.tipo_proveedor))?;

        if !self.correo.contains('@') {
            return Err("El correo electrónico no es válido".to_string());
        }
        if self.nombre_usuario.trim().is_empty() {
            return Err("El nombre de usuario es obligatorio".to_string());
        }

        let rfc = self.rfc.trim();
        if rfc.chars().count() != tipo.longitud_rfc() || !rfc.chars().all(|c| c.is_ascii_alphanumeric() || c == '&' || c == 'Ñ') {
            return Err(format!(
                "El RFC de una persona {} debe tener {} caracteres alfanuméricos",
                tipo,
                tipo.longitud_rfc()
            ));
        }

        match tipo {
            TipoProveedor::Moral if !presente(&self.razon_social) => {
                Err("La razón social es obligatoria para personas morales".to_string())
            }
            TipoProveedor::Fisica if !presente(&self.nombre) || !presente(&self.apellido_paterno) => {
                Err("Nombre y apellido paterno son obligatorios para personas físicas".to_string())
            }
            _ => Ok(tipo),
        }
    }
}

/// Request DTO for updating a supplier profile
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ActualizarProveedorRequest {
    pub id_proveedor: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub razon_social: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apellido_paterno: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apellido_materno: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub curp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub representante_legal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numero_exterior: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colonia: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codigo_postal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub municipio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub giro: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub es_proveedor_eventos: Option<bool>,
}

/// Query params for `/api/proveedores`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProveedorQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_proveedor: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_usuario: Option<i32>,
}

/// `?id_proveedor=` for endpoints scoped to one supplier
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProveedorIdQuery {
    pub id_proveedor: i32,
}

/// Response for supplier onboarding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProveedorCreado {
    pub usuario: UsuarioProveedor,
    pub proveedor: Proveedor,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn proveedor(id: i32, tipo: TipoProveedor, estatus: EstatusRevision) -> Proveedor {
        let now = Utc::now();
        Proveedor {
            id_proveedor: id,
            id_usuario: id + 100,
            tipo_proveedor: tipo,
            rfc: match tipo {
                TipoProveedor::Moral => format!("ABC0101{:02}XY1", id % 100),
                TipoProveedor::Fisica => format!("GOMA8001{:02}XY1", id % 100),
            },
            razon_social: matches!(tipo, TipoProveedor::Moral)
                .then(|| format!("Comercializadora {id} SA de CV")),
            nombre: matches!(tipo, TipoProveedor::Fisica).then(|| "María".to_string()),
            apellido_paterno: matches!(tipo, TipoProveedor::Fisica).then(|| "Gómez".to_string()),
            apellido_materno: None,
            curp: None,
            representante_legal: None,
            correo: format!("proveedor{id}@example.com"),
            telefono: None,
            calle: None,
            numero_exterior: None,
            colonia: None,
            codigo_postal: None,
            municipio: None,
            estado: None,
            giro: None,
            es_proveedor_eventos: false,
            estatus_revision: estatus,
            comentario_revision: None,
            activo: true,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solicitud_moral() -> CrearProveedorRequest {
        CrearProveedorRequest {
            correo: "ventas@acme.mx".to_string(),
            nombre_usuario: "acme".to_string(),
            tipo_proveedor: "moral".to_string(),
            rfc: "ACM010101AB1".to_string(),
            razon_social: Some("Acme SA de CV".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn valid_moral_request_passes() {
        assert_eq!(solicitud_moral().validar(), Ok(TipoProveedor::Moral));
    }

    #[test]
    fn tipo_is_parsed_leniently() {
        let mut req = solicitud_moral();
        req.tipo_proveedor = " Moral ".to_string();
        assert_eq!(req.validar(), Ok(TipoProveedor::Moral));
    }

    #[test]
    fn moral_requires_razon_social() {
        let mut req = solicitud_moral();
        req.razon_social = Some("  ".to_string());
        assert!(req.validar().unwrap_err().contains("razón social"));
    }

    #[test]
    fn rfc_length_depends_on_tipo() {
        let mut req = solicitud_moral();
        req.tipo_proveedor = "fisica".to_string();
        req.nombre = Some("Juan".to_string());
        req.apellido_paterno = Some("Pérez".to_string());
        // 12 characters is a moral RFC, not a fisica one
        assert!(req.validar().unwrap_err().contains("13"));
        req.rfc = "PEJJ800101AB1".to_string();
        assert_eq!(req.validar(), Ok(TipoProveedor::Fisica));
    }

    #[test]
    fn unknown_tipo_is_rejected() {
        let mut req = solicitud_moral();
        req.tipo_proveedor = "cooperativa".to_string();
        assert!(req.validar().unwrap_err().contains("cooperativa"));
    }

    #[test]
    fn nombre_mostrado_for_fisica_joins_names() {
        let mut p = fixtures::proveedor(1, TipoProveedor::Fisica, EstatusRevision::Aprobado);
        p.apellido_materno = Some("Ruiz".to_string());
        assert_eq!(p.nombre_mostrado(), "María Gómez Ruiz");
    }
}
