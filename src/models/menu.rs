//! 导航菜单模型

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

static MENU_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_.-]{0,63}$").expect("valid menu key regex"));

/// 菜单目录条目，通过 parent_id 组成树
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MenuItem {
    pub id: Uuid,
    pub key: String,
    pub name: String,
    pub localized_name: Option<String>,
    pub icon: Option<String>,
    pub href: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub parent_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 可展示的菜单节点
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MenuNode {
    pub id: Uuid,
    pub key: String,
    pub name: String,
    pub localized_name: Option<String>,
    pub icon: Option<String>,
    pub href: Option<String>,
    pub sort_order: i32,
    pub children: Vec<MenuNode>,
}

impl MenuNode {
    pub fn leaf(item: &MenuItem) -> Self {
        Self {
            id: item.id,
            key: item.key.clone(),
            name: item.name.clone(),
            localized_name: item.localized_name.clone(),
            icon: item.icon.clone(),
            href: item.href.clone(),
            sort_order: item.sort_order,
            children: Vec::new(),
        }
    }
}

/// Create menu item request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMenuItemRequest {
    #[validate(regex(path = *MENU_KEY_RE, message = "invalid menu key"))]
    pub key: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub localized_name: Option<String>,
    pub icon: Option<String>,
    pub href: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub parent_id: Option<Uuid>,
}

/// Update menu item request
///
/// 可空字段缺省表示不修改，显式 `null` 表示清空；`parent_id` 为 `null` 时移到根级。
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateMenuItemRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub localized_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub icon: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub href: Option<Option<String>>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<Uuid>>,
}

/// 角色菜单整体替换
#[derive(Debug, Deserialize)]
pub struct AssignMenusRequest {
    pub menu_item_ids: Vec<Uuid>,
}

/// 角色菜单授权视图
#[derive(Debug, Serialize)]
pub struct RoleMenus {
    pub role_id: Uuid,
    pub menu_item_ids: Vec<Uuid>,
    pub menus: Vec<MenuNode>,
}

fn default_true() -> bool {
    true
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
