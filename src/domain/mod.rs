//! Domain types and DTOs
//!
//! Plain records mirrored from the portal's relational tables, plus the pure
//! rules (document requirements, status transitions, contract numbering) the
//! routes and the client share.

use thiserror::Error;

/// Declares a status-like enum stored as `TEXT` in PostgreSQL and exchanged as
/// a plain string on the wire.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $text ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::domain::UnknownValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    other => Err($crate::domain::UnknownValue {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = <String as serde::Deserialize>::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

pub mod admin;
pub mod articulos;
pub mod bases;
pub mod concursos;
pub mod contratos;
pub mod documentos;
pub mod eventos;
pub mod firmas;
pub mod proveedores;
pub mod requisitos;
pub mod secretarias;
pub mod solicitudes;

// Re-export commonly used types
pub use documentos::{DocumentoProveedor, EstatusDocumento};
pub use eventos::EventoPortal;
pub use proveedores::{EstatusRevision, Proveedor, TipoProveedor};

/// A stored or submitted string that does not name any known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("valor desconocido para {kind}: '{value}'")]
pub struct UnknownValue {
    pub kind: &'static str,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::proveedores::EstatusRevision;

    #[test]
    fn text_enum_round_trips_through_strings() {
        for estatus in EstatusRevision::ALL {
            let parsed: EstatusRevision = estatus.as_str().parse().unwrap();
            assert_eq!(parsed, *estatus);
        }
    }

    #[test]
    fn text_enum_rejects_unknown_values() {
        let err = "ARCHIVADO".parse::<EstatusRevision>().unwrap_err();
        assert_eq!(err.kind, "EstatusRevision");
        assert!(err.to_string().contains("ARCHIVADO"));
    }

    #[test]
    fn text_enum_serializes_as_plain_string() {
        let json = serde_json::to_string(&EstatusRevision::EnRevision).unwrap();
        assert_eq!(json, "\"EN_REVISION\"");
        let back: EstatusRevision = serde_json::from_str("\"APROBADO\"").unwrap();
        assert_eq!(back, EstatusRevision::Aprobado);
    }
}
