//! Book commands.

use biblioteca::AdminApp;
use biblioteca::client::models::{Book, BookForm};

use crate::error::CliResult;
use crate::output::{failed, field, succeeded, table};

pub async fn list(app: &AdminApp, available_only: bool) -> CliResult<()> {
    let books = app
        .api()
        .get_books()
        .await
        .map_err(|e| failed(app, e, "Error al cargar libros"))?;

    let rows: Vec<Vec<String>> = books
        .iter()
        .filter(|b| !available_only || b.available)
        .map(|b| {
            vec![
                b.id.to_string(),
                b.title.clone(),
                b.author_name
                    .clone()
                    .unwrap_or_else(|| format!("#{}", b.author_id)),
                availability(b.available).to_string(),
            ]
        })
        .collect();
    table(&["ID", "TITLE", "AUTHOR", "STATUS"], &rows);
    Ok(())
}

pub async fn get(app: &AdminApp, id: i64) -> CliResult<()> {
    let book = app
        .api()
        .get_book(id)
        .await
        .map_err(|e| failed(app, e, "Error al cargar libro"))?;
    show(&book);
    Ok(())
}

pub async fn create(app: &AdminApp, form: BookForm) -> CliResult<()> {
    let book = app
        .api()
        .create_book(&form)
        .await
        .map_err(|e| failed(app, e, "Error al guardar libro"))?;
    succeeded(app, "Libro creado exitosamente");
    show(&book);
    Ok(())
}

pub async fn update(app: &AdminApp, id: i64, form: BookForm) -> CliResult<()> {
    let book = app
        .api()
        .update_book(id, &form)
        .await
        .map_err(|e| failed(app, e, "Error al guardar libro"))?;
    succeeded(app, "Libro actualizado correctamente");
    show(&book);
    Ok(())
}

pub async fn delete(app: &AdminApp, id: i64) -> CliResult<()> {
    app.api()
        .delete_book(id)
        .await
        .map_err(|e| failed(app, e, "Error al eliminar libro"))?;
    succeeded(app, "Libro eliminado correctamente");
    Ok(())
}

fn availability(available: bool) -> &'static str {
    if available { "available" } else { "on loan" }
}

fn show(book: &Book) {
    field("ID", book.id);
    field("Title", &book.title);
    match &book.author_name {
        Some(name) => field("Author", format!("{name} (#{})", book.author_id)),
        None => field("Author", format!("#{}", book.author_id)),
    }
    field("Status", availability(book.available));
}
