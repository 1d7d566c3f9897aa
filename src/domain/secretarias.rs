use serde::{Deserialize, Serialize};

/// Government agency that originates purchase requests
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Secretaria {
    pub id_secretaria: i32,
    pub nombre: String,
    pub siglas: String,
    pub activa: bool,
}
