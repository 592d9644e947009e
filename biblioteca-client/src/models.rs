//! Wire models of the library API.
//!
//! Field names follow the backend's JSON (`nombre`, `titulo`, ...); the Rust
//! side uses English names.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Library member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
}

/// Create/update payload for [`User`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserForm {
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
}

/// Book author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "nacionalidad", default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
}

/// Create/update payload for [`Author`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorForm {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "nacionalidad", default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
}

/// Catalogue entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "autorId")]
    pub author_id: i64,
    #[serde(rename = "autorNombre", default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(rename = "disponible")]
    pub available: bool,
}

/// Create/update payload for [`Book`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookForm {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "autorId")]
    pub author_id: i64,
    #[serde(rename = "disponible", default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

/// A book lent to a user. `returned_on` is empty while the loan is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: i64,
    #[serde(rename = "usuarioNombre")]
    pub user_name: String,
    #[serde(rename = "libroTitulo")]
    pub book_title: String,
    #[serde(rename = "fechaPrestamo")]
    pub loaned_on: NaiveDate,
    #[serde(rename = "fechaDevolucion", default)]
    pub returned_on: Option<NaiveDate>,
}

impl Loan {
    pub fn is_open(&self) -> bool {
        self.returned_on.is_none()
    }
}

/// Create payload for [`Loan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanForm {
    #[serde(rename = "usuarioId")]
    pub user_id: i64,
    #[serde(rename = "libroId")]
    pub book_id: i64,
}

/// Error document returned by the API on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub timestamp: Option<String>,
    pub status: u16,
    #[serde(default)]
    pub error: Option<String>,
    pub message: String,
    #[serde(default)]
    pub errors: Option<BTreeMap<String, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_loan_from_backend_json() {
        let loan: Loan = serde_json::from_value(json!({
            "id": 4,
            "usuarioNombre": "Ana",
            "libroTitulo": "Rayuela",
            "fechaPrestamo": "2024-03-01",
            "fechaDevolucion": null
        }))
        .unwrap();

        assert_eq!(loan.user_name, "Ana");
        assert_eq!(loan.loaned_on, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert!(loan.is_open());
    }

    #[test]
    fn test_forms_use_backend_field_names() {
        let form = BookForm {
            title: "Ficciones".into(),
            author_id: 2,
            available: None,
        };
        assert_eq!(
            serde_json::to_value(&form).unwrap(),
            json!({"titulo": "Ficciones", "autorId": 2})
        );

        let loan = LoanForm {
            user_id: 1,
            book_id: 9,
        };
        assert_eq!(
            serde_json::to_value(loan).unwrap(),
            json!({"usuarioId": 1, "libroId": 9})
        );
    }

    #[test]
    fn test_author_without_nationality() {
        let author: Author = serde_json::from_str(r#"{"id":3,"nombre":"Borges"}"#).unwrap();
        assert_eq!(author.nationality, None);
        assert_eq!(
            serde_json::to_value(&author).unwrap(),
            json!({"id": 3, "nombre": "Borges"})
        );
    }
}
