use crate::DbConn;
use crate::{
    error::{Error, Result},
    models::categories::{Category, CategoryRequest},
    queries::categories,
    validation::{MAX_NAME_LENGTH, sanitize_optional, validate_length},
};
use uuid::Uuid;

fn category_not_found(id: Uuid) -> Error {
    Error::NotFound(format!("Category {} not found", id))
}

fn required_name(request: CategoryRequest) -> Result<String> {
    let name = sanitize_optional(request.name).ok_or_else(|| Error::missing_fields(&["name"]))?;
    validate_length("name", &name, MAX_NAME_LENGTH)?;
    Ok(name)
}

pub async fn create_category(conn: &mut DbConn, request: CategoryRequest) -> Result<Category> {
    let name = required_name(request)?;
    let category = categories::create_category(conn, &name).await?;
    tracing::info!(category_id = %category.id, name = %category.name, "Category created");
    Ok(category)
}

pub async fn list_categories(conn: &mut DbConn) -> Result<Vec<Category>> {
    categories::list_categories(conn).await
}

pub async fn get_category(conn: &mut DbConn, id: Uuid) -> Result<Category> {
    categories::get_category_by_id(conn, id)
        .await?
        .ok_or_else(|| category_not_found(id))
}

pub async fn update_category(conn: &mut DbConn, id: Uuid, request: CategoryRequest) -> Result<Category> {
    let name = required_name(request)?;
    categories::update_category(conn, id, &name)
        .await?
        .ok_or_else(|| category_not_found(id))
}

/// Deletes a category. Its books stay, uncategorized.
pub async fn delete_category(conn: &mut DbConn, id: Uuid) -> Result<()> {
    if categories::delete_category(conn, id).await? == 0 {
        return Err(category_not_found(id));
    }
    tracing::info!(category_id = %id, "Category deleted");
    Ok(())
}
