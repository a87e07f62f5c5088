//! 初始数据
//!
//! 写入权限目录、系统角色 `admin` 和默认导航树。可重复执行：
//! 已存在的记录保持不变，admin 始终补齐全部权限与菜单。
//! 运行在无主体的审计作用域内，写入的行不带归属。

use crate::{
    audit_context,
    auth::catalog::PERMISSION_CATALOG,
    error::AppError,
};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// 系统管理员角色名
pub const ADMIN_ROLE: &str = "admin";

/// 默认导航条目：(key, 父 key, 名称, 图标, 链接, 排序)
struct SeedMenu {
    key: &'static str,
    parent: Option<&'static str>,
    name: &'static str,
    icon: Option<&'static str>,
    href: Option<&'static str>,
    sort_order: i32,
}

const fn menu(
    key: &'static str,
    parent: Option<&'static str>,
    name: &'static str,
    icon: Option<&'static str>,
    href: Option<&'static str>,
    sort_order: i32,
) -> SeedMenu {
    SeedMenu {
        key,
        parent,
        name,
        icon,
        href,
        sort_order,
    }
}

// 父节点必须排在子节点之前
const DEFAULT_MENUS: &[SeedMenu] = &[
    menu("dashboard", None, "Dashboard", Some("home"), Some("/dashboard"), 0),
    menu("operations", None, "Operations", Some("map"), None, 10),
    menu("operations.zones", Some("operations"), "Zones", None, Some("/zones"), 1),
    menu("operations.buildings", Some("operations"), "Buildings", None, Some("/buildings"), 2),
    menu("people", None, "People", Some("users"), None, 20),
    menu("people.employees", Some("people"), "Employees", None, Some("/employees"), 1),
    menu("finance", None, "Finance", Some("wallet"), None, 30),
    menu("finance.invoices", Some("finance"), "Invoices", None, Some("/invoices"), 1),
    menu("finance.quotes", Some("finance"), "Quotes", None, Some("/quotes"), 2),
    menu("finance.contracts", Some("finance"), "Contracts", None, Some("/contracts"), 3),
    menu("settings", None, "Settings", Some("settings"), None, 90),
    menu("settings.roles", Some("settings"), "Roles", None, Some("/settings/roles"), 1),
    menu("settings.menus", Some("settings"), "Menus", None, Some("/settings/menus"), 2),
    menu("settings.currencies", Some("settings"), "Currencies", None, Some("/settings/currencies"), 3),
    menu("settings.companies", Some("settings"), "Companies", None, Some("/settings/companies"), 4),
];

/// 种子执行结果
#[derive(Debug, Clone, Copy)]
pub struct SeedReport {
    pub admin_role_id: Uuid,
    pub permissions: usize,
    pub menu_items: usize,
}

/// 执行初始数据写入
pub async fn run(pool: &PgPool) -> Result<SeedReport, AppError> {
    audit_context::establish(None, seed(pool)).await
}

async fn seed(pool: &PgPool) -> Result<SeedReport, AppError> {
    let mut tx = pool.begin().await?;

    for entry in PERMISSION_CATALOG.iter() {
        sqlx::query(
            r#"
            INSERT INTO permissions (resource, action, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (resource, action) DO NOTHING
            "#,
        )
        .bind(entry.resource)
        .bind(entry.action)
        .bind(&entry.description)
        .execute(&mut *tx)
        .await?;
    }

    for item in DEFAULT_MENUS {
        upsert_menu(&mut tx, item).await?;
    }

    let admin_role_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO roles (name, display_name, description, is_system)
        VALUES ($1, 'Administrator', 'Full access to every resource', TRUE)
        ON CONFLICT (name) DO UPDATE SET is_system = TRUE
        RETURNING id
        "#,
    )
    .bind(ADMIN_ROLE)
    .fetch_one(&mut *tx)
    .await?;

    // 系统角色不能走管理接口修改，这里直接补齐授权
    let permissions = sqlx::query(
        r#"
        INSERT INTO role_permissions (role_id, permission_id)
        SELECT $1, id FROM permissions
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(admin_role_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let menu_items = sqlx::query(
        r#"
        INSERT INTO role_menu_permissions (role_id, menu_item_id)
        SELECT $1, id FROM menu_items
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(admin_role_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    tx.commit().await?;

    tracing::info!(
        admin_role_id = %admin_role_id,
        new_permission_grants = permissions,
        new_menu_grants = menu_items,
        "Seed data applied"
    );

    Ok(SeedReport {
        admin_role_id,
        permissions: PERMISSION_CATALOG.len(),
        menu_items: DEFAULT_MENUS.len(),
    })
}

async fn upsert_menu(tx: &mut Transaction<'_, Postgres>, item: &SeedMenu) -> Result<(), AppError> {
    let parent_id: Option<Uuid> = match item.parent {
        Some(parent_key) => {
            sqlx::query_scalar("SELECT id FROM menu_items WHERE key = $1")
                .bind(parent_key)
                .fetch_optional(&mut **tx)
                .await?
        }
        None => None,
    };

    sqlx::query(
        r#"
        INSERT INTO menu_items (key, name, icon, href, sort_order, is_active, parent_id)
        VALUES ($1, $2, $3, $4, $5, TRUE, $6)
        ON CONFLICT (key) DO NOTHING
        "#,
    )
    .bind(item.key)
    .bind(item.name)
    .bind(item.icon)
    .bind(item.href)
    .bind(item.sort_order)
    .bind(parent_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
