//! User commands.

use biblioteca::AdminApp;
use biblioteca::client::models::{User, UserForm};

use crate::error::CliResult;
use crate::output::{failed, field, succeeded, table};

pub async fn list(app: &AdminApp) -> CliResult<()> {
    let users = app
        .api()
        .get_users()
        .await
        .map_err(|e| failed(app, e, "Error al cargar usuarios"))?;

    let rows: Vec<Vec<String>> = users
        .iter()
        .map(|u| vec![u.id.to_string(), u.name.clone(), u.email.clone()])
        .collect();
    table(&["ID", "NAME", "EMAIL"], &rows);
    Ok(())
}

pub async fn get(app: &AdminApp, id: i64) -> CliResult<()> {
    let user = app
        .api()
        .get_user(id)
        .await
        .map_err(|e| failed(app, e, "Error al cargar usuario"))?;
    show(&user);
    Ok(())
}

pub async fn create(app: &AdminApp, name: String, email: String) -> CliResult<()> {
    let user = app
        .api()
        .create_user(&UserForm { name, email })
        .await
        .map_err(|e| failed(app, e, "Error al guardar usuario"))?;
    succeeded(app, "Usuario creado exitosamente");
    show(&user);
    Ok(())
}

pub async fn update(app: &AdminApp, id: i64, name: String, email: String) -> CliResult<()> {
    let user = app
        .api()
        .update_user(id, &UserForm { name, email })
        .await
        .map_err(|e| failed(app, e, "Error al guardar usuario"))?;
    succeeded(app, "Usuario actualizado correctamente");
    show(&user);
    Ok(())
}

pub async fn delete(app: &AdminApp, id: i64) -> CliResult<()> {
    app.api()
        .delete_user(id)
        .await
        .map_err(|e| failed(app, e, "Error al eliminar usuario"))?;
    succeeded(app, "Usuario eliminado correctamente");
    Ok(())
}

fn show(user: &User) {
    field("ID", user.id);
    field("Name", &user.name);
    field("Email", &user.email);
}
