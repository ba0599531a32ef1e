use crate::{
    error::{Error, Result},
    models::categories::Category,
};
use uuid::Uuid;

use crate::DbConn;

/// Creates a new category.
pub async fn create_category(conn: &mut DbConn, name: &str) -> Result<Category> {
    let category = sqlx::query_as::<_, Category>(
        r#"
        INSERT INTO categories (name)
        VALUES ($1)
        RETURNING id, name, created_at, updated_at
        "#,
    )
    .bind(name)
    .fetch_one(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(category)
}

/// Lists every category ordered by name.
pub async fn list_categories(conn: &mut DbConn) -> Result<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>(
        r#"
        SELECT id, name, created_at, updated_at
        FROM categories
        ORDER BY name ASC
        "#,
    )
    .fetch_all(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(categories)
}

/// Gets a single category by ID. The category may not exist.
pub async fn get_category_by_id(conn: &mut DbConn, id: Uuid) -> Result<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(
        r#"
        SELECT id, name, created_at, updated_at
        FROM categories
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(category)
}

/// Renames a category. Returns `None` when it does not exist.
pub async fn update_category(conn: &mut DbConn, id: Uuid, name: &str) -> Result<Option<Category>> {
    let category = sqlx::query_as::<_, Category>(
        r#"
        UPDATE categories
        SET name = $1, updated_at = now()
        WHERE id = $2
        RETURNING id, name, created_at, updated_at
        "#,
    )
    .bind(name)
    .bind(id)
    .fetch_optional(conn)
    .await
    .map_err(Error::Sqlx)?;

    Ok(category)
}

/// Deletes a category. Books referencing it get a NULL category.
pub async fn delete_category(conn: &mut DbConn, id: Uuid) -> Result<u64> {
    let rows_affected = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await
        .map_err(Error::Sqlx)?
        .rows_affected();

    Ok(rows_affected)
}
