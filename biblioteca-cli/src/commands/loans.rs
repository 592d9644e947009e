//! Loan commands.

use biblioteca::AdminApp;
use biblioteca::client::models::{Loan, LoanForm};

use crate::error::CliResult;
use crate::output::{failed, field, succeeded, table};

pub async fn list(app: &AdminApp, open_only: bool) -> CliResult<()> {
    let loans = app
        .api()
        .get_loans()
        .await
        .map_err(|e| failed(app, e, "Error al cargar préstamos"))?;

    let rows: Vec<Vec<String>> = loans
        .iter()
        .filter(|l| !open_only || l.is_open())
        .map(|l| {
            vec![
                l.id.to_string(),
                l.book_title.clone(),
                l.user_name.clone(),
                l.loaned_on.to_string(),
                l.returned_on.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    table(&["ID", "BOOK", "USER", "LOANED", "RETURNED"], &rows);
    Ok(())
}

pub async fn get(app: &AdminApp, id: i64) -> CliResult<()> {
    let loan = app
        .api()
        .get_loan(id)
        .await
        .map_err(|e| failed(app, e, "Error al cargar préstamo"))?;
    show(&loan);
    Ok(())
}

pub async fn create(app: &AdminApp, user_id: i64, book_id: i64) -> CliResult<()> {
    let loan = app
        .api()
        .create_loan(&LoanForm { user_id, book_id })
        .await
        .map_err(|e| failed(app, e, "Error al crear préstamo"))?;
    succeeded(app, "Préstamo creado correctamente");
    show(&loan);
    Ok(())
}

pub async fn return_loan(app: &AdminApp, id: i64) -> CliResult<()> {
    let loan = app
        .api()
        .return_loan(id)
        .await
        .map_err(|e| failed(app, e, "Error al devolver libro"))?;
    succeeded(app, "Libro devuelto correctamente");
    show(&loan);
    Ok(())
}

fn show(loan: &Loan) {
    field("ID", loan.id);
    field("Book", &loan.book_title);
    field("User", &loan.user_name);
    field("Loaned", loan.loaned_on);
    match loan.returned_on {
        Some(date) => field("Returned", date),
        None => field("Returned", "not yet"),
    }
}
