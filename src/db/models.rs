use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Name stored when a complaint is submitted without one.
pub const ANONIMO: &str = "Anónimo";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, FromRow)]
pub struct Denuncia {
    pub id: i64,
    pub numero: i64,
    pub nombre: Option<String>,
    pub lugar: String,
}

impl Denuncia {
    pub fn display_nombre(&self) -> &str {
        self.nombre.as_deref().unwrap_or(ANONIMO)
    }
}

/// Form body shared by the create and edit pages.
#[derive(Debug, Clone, Deserialize)]
pub struct DenunciaForm {
    #[serde(default)]
    pub nombre: String,
    pub lugar: String,
}

impl DenunciaForm {
    /// The reporter name, with an empty submission replaced by [`ANONIMO`].
    pub fn nombre_or_anonimo(&self) -> &str {
        if self.nombre.is_empty() {
            ANONIMO
        } else {
            &self.nombre
        }
    }
}
