//! Supplier catalog items and budget partidas

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Budget line-item / procurement category
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Partida {
    pub codigo_partida: String,
    pub descripcion: String,
    pub capitulo: String,
}

/// Partida a supplier registered to offer articles under
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProveedorPartida {
    pub id_proveedor: i32,
    pub codigo_partida: String,
    pub descripcion: String,
    pub created_at: DateTime<Utc>,
}

/// Catalog item offered by a supplier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArticuloProveedor {
    pub id_articulo: i32,
    pub id_proveedor: i32,
    pub codigo_partida: String,
    pub descripcion: String,
    pub unidad_medida: String,
    pub precio_unitario: Decimal,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrearArticuloRequest {
    pub id_proveedor: i32,
    pub codigo_partida: String,
    pub descripcion: String,
    pub unidad_medida: String,
    pub precio_unitario: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ActualizarArticuloRequest {
    pub id_articulo: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codigo_partida: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unidad_medida: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precio_unitario: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activo: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticuloIdQuery {
    pub id_articulo: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrarPartidaRequest {
    pub id_proveedor: i32,
    pub codigo_partida: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProveedorPartidaQuery {
    pub id_proveedor: i32,
    pub codigo_partida: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CatalogoPartidasQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capitulo: Option<String>,
}

impl CrearArticuloRequest {
    pub fn validar(&self) -> Result<(), String> {
        if self.descripcion.trim().is_empty() {
            return Err("La descripción del artículo es obligatoria".to_string());
        }
        if self.unidad_medida.trim().is_empty() {
            return Err("La unidad de medida es obligatoria".to_string());
        }
        if self.precio_unitario.is_sign_negative() {
            return Err("El precio unitario no puede ser negativo".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn articulo_validation() {
        let mut req = CrearArticuloRequest {
            id_proveedor: 1,
            codigo_partida: "21101".to_string(),
            descripcion: "Engrapadora".to_string(),
            unidad_medida: "pieza".to_string(),
            precio_unitario: Decimal::new(12550, 2),
        };
        assert!(req.validar().is_ok());

        req.precio_unitario = Decimal::new(-1, 0);
        assert!(req.validar().unwrap_err().contains("negativo"));

        req.precio_unitario = Decimal::ZERO;
        req.unidad_medida = " ".to_string();
        assert!(req.validar().unwrap_err().contains("unidad"));
    }
}
