use sqlx::{FromRow, Row};
use tracing::instrument;
use uuid::Uuid;

use depot_auth::{CredentialHash, Menu, Permission, Role, RoleRecord, User};
use depot_core::{MenuId, RoleId, UserId};

use super::{PgStore, decode_error, map_sqlx_error};
use crate::store::{DirectoryStore, StoreResult};

struct UserRow {
    id: Uuid,
    username: String,
    credential: String,
    enabled: bool,
    true_name: Option<String>,
    remarks: Option<String>,
}

impl<'r> FromRow<'r, sqlx::postgres::PgRow> for UserRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            credential: row.try_get("credential")?,
            enabled: row.try_get("enabled")?,
            true_name: row.try_get("true_name")?,
            remarks: row.try_get("remarks")?,
        })
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::from_uuid(row.id),
            username: row.username,
            credential: CredentialHash::from_phc(row.credential),
            enabled: row.enabled,
            true_name: row.true_name,
            remarks: row.remarks,
        }
    }
}

fn role_from_row(row: &sqlx::postgres::PgRow) -> Result<RoleRecord, sqlx::Error> {
    Ok(RoleRecord {
        id: RoleId::from_uuid(row.try_get("id")?),
        name: Role::new(row.try_get::<String, _>("name")?),
        remarks: row.try_get("remarks")?,
    })
}

fn menu_from_row(row: &sqlx::postgres::PgRow) -> Result<Menu, sqlx::Error> {
    Ok(Menu {
        id: MenuId::from_uuid(row.try_get("id")?),
        name: Permission::new(row.try_get::<String, _>("name")?),
        parent_id: row.try_get::<Option<Uuid>, _>("parent_id")?.map(MenuId::from_uuid),
    })
}

fn users_from_rows(rows: Vec<sqlx::postgres::PgRow>) -> StoreResult<Vec<User>> {
    rows.iter()
        .map(|row| UserRow::from_row(row).map(User::from).map_err(|e| decode_error("user", e)))
        .collect()
}

const USER_COLUMNS: &str = "id, username, credential, enabled, true_name, remarks";

#[async_trait::async_trait]
impl DirectoryStore for PgStore {
    #[instrument(skip(self), err)]
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
            .bind(username)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_username", e))?;
        Ok(users_from_rows(row.into_iter().collect())?.pop())
    }

    #[instrument(skip(self), err)]
    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?;
        Ok(users_from_rows(row.into_iter().collect())?.pop())
    }

    #[instrument(skip(self), err)]
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY username"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;
        users_from_rows(rows)
    }

    #[instrument(skip(self, user), fields(username = %user.username), err)]
    async fn insert_user(&self, user: User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, credential, enabled, true_name, remarks)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(user.credential.as_phc())
        .bind(user.enabled)
        .bind(&user.true_name)
        .bind(&user.remarks)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn set_user_enabled(&self, id: UserId, enabled: bool) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE users SET enabled = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(enabled)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_user_enabled", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn roles_of_user(&self, id: UserId) -> StoreResult<Vec<RoleRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.name, r.remarks
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("roles_of_user", e))?;
        rows.iter()
            .map(|r| role_from_row(r).map_err(|e| decode_error("role", e)))
            .collect()
    }

    #[instrument(skip(self, roles), fields(role_count = roles.len()), err)]
    async fn set_user_roles(&self, id: UserId, roles: &[RoleId]) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        // Lock the user row so a concurrent replacement cannot interleave.
        let exists = sqlx::query("SELECT 1 FROM users WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_user_roles", e))?;
        if exists.is_none() {
            return Err(crate::store::StoreError::Constraint(format!("user {id} does not exist")));
        }

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_user_roles", e))?;
        for role in roles {
            sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(id.as_uuid())
                .bind(role.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("set_user_roles", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip(self), err)]
    async fn get_role(&self, id: RoleId) -> StoreResult<Option<RoleRecord>> {
        let row = sqlx::query("SELECT id, name, remarks FROM roles WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_role", e))?;
        row.as_ref()
            .map(role_from_row)
            .transpose()
            .map_err(|e| decode_error("role", e))
    }

    #[instrument(skip(self), err)]
    async fn list_roles(&self) -> StoreResult<Vec<RoleRecord>> {
        let rows = sqlx::query("SELECT id, name, remarks FROM roles ORDER BY name")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_roles", e))?;
        rows.iter()
            .map(|r| role_from_row(r).map_err(|e| decode_error("role", e)))
            .collect()
    }

    #[instrument(skip(self, role), fields(role = %role.name), err)]
    async fn insert_role(&self, role: RoleRecord) -> StoreResult<()> {
        sqlx::query("INSERT INTO roles (id, name, remarks) VALUES ($1, $2, $3)")
            .bind(role.id.as_uuid())
            .bind(role.name.as_str())
            .bind(&role.remarks)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_role", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn menus_of_role(&self, id: RoleId) -> StoreResult<Vec<Menu>> {
        let rows = sqlx::query(
            r#"
            SELECT m.id, m.name, m.parent_id
            FROM menus m
            JOIN role_menus rm ON rm.menu_id = m.id
            WHERE rm.role_id = $1
            ORDER BY m.name
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("menus_of_role", e))?;
        rows.iter()
            .map(|r| menu_from_row(r).map_err(|e| decode_error("menu", e)))
            .collect()
    }

    #[instrument(skip(self, menus), fields(menu_count = menus.len()), err)]
    async fn set_role_menus(&self, id: RoleId, menus: &[MenuId]) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let exists = sqlx::query("SELECT 1 FROM roles WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_role_menus", e))?;
        if exists.is_none() {
            return Err(crate::store::StoreError::Constraint(format!("role {id} does not exist")));
        }

        sqlx::query("DELETE FROM role_menus WHERE role_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("set_role_menus", e))?;
        for menu in menus {
            sqlx::query("INSERT INTO role_menus (role_id, menu_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(id.as_uuid())
                .bind(menu.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("set_role_menus", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    #[instrument(skip(self), err)]
    async fn list_menus(&self) -> StoreResult<Vec<Menu>> {
        let rows = sqlx::query("SELECT id, name, parent_id FROM menus ORDER BY name")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_menus", e))?;
        rows.iter()
            .map(|r| menu_from_row(r).map_err(|e| decode_error("menu", e)))
            .collect()
    }

    #[instrument(skip(self, menu), fields(menu = %menu.name), err)]
    async fn upsert_menu(&self, menu: Menu) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO menus (id, name, parent_id) VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, parent_id = EXCLUDED.parent_id
            "#,
        )
        .bind(menu.id.as_uuid())
        .bind(menu.name.as_str())
        .bind(menu.parent_id.map(|p| *p.as_uuid()))
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert_menu", e))?;
        Ok(())
    }
}
