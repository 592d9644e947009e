//! Author commands.

use biblioteca::AdminApp;
use biblioteca::client::models::{Author, AuthorForm};

use crate::error::CliResult;
use crate::output::{failed, field, succeeded, table};

pub async fn list(app: &AdminApp) -> CliResult<()> {
    let authors = app
        .api()
        .get_authors()
        .await
        .map_err(|e| failed(app, e, "Error al cargar autores"))?;

    let rows: Vec<Vec<String>> = authors
        .iter()
        .map(|a| {
            vec![
                a.id.to_string(),
                a.name.clone(),
                a.nationality.clone().unwrap_or_default(),
            ]
        })
        .collect();
    table(&["ID", "NAME", "NATIONALITY"], &rows);
    Ok(())
}

pub async fn get(app: &AdminApp, id: i64) -> CliResult<()> {
    let author = app
        .api()
        .get_author(id)
        .await
        .map_err(|e| failed(app, e, "Error al cargar autor"))?;
    show(&author);
    Ok(())
}

pub async fn create(app: &AdminApp, name: String, nationality: Option<String>) -> CliResult<()> {
    let author = app
        .api()
        .create_author(&AuthorForm { name, nationality })
        .await
        .map_err(|e| failed(app, e, "Error al guardar autor"))?;
    succeeded(app, "Autor creado exitosamente");
    show(&author);
    Ok(())
}

pub async fn update(
    app: &AdminApp,
    id: i64,
    name: String,
    nationality: Option<String>,
) -> CliResult<()> {
    let author = app
        .api()
        .update_author(id, &AuthorForm { name, nationality })
        .await
        .map_err(|e| failed(app, e, "Error al guardar autor"))?;
    succeeded(app, "Autor actualizado correctamente");
    show(&author);
    Ok(())
}

pub async fn delete(app: &AdminApp, id: i64) -> CliResult<()> {
    app.api()
        .delete_author(id)
        .await
        .map_err(|e| failed(app, e, "Error al eliminar autor"))?;
    succeeded(app, "Autor eliminado correctamente");
    Ok(())
}

fn show(author: &Author) {
    field("ID", author.id);
    field("Name", &author.name);
    field("Nationality", author.nationality.as_deref().unwrap_or("-"));
}
