//! 菜单服务
//! 组合主体 → 角色 → 已授予菜单 → 菜单解析

use crate::{
    error::AppError,
    models::menu::{MenuNode, RoleMenus},
    repository::{menu_repo::MenuRepository, role_repo::RoleRepository, user_repo::UserRepository},
    services::menu_resolver::{resolve_full_tree, resolve_menu_tree},
};
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

pub struct MenuService {
    db: PgPool,
}

impl MenuService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 主体可见的菜单森林
    ///
    /// 主体没有角色、或角色没有任何菜单授权时返回空森林。
    pub async fn get_menus_for_user(&self, principal_id: Uuid) -> Result<Vec<MenuNode>, AppError> {
        let user = UserRepository::new(self.db.clone())
            .find_by_id(principal_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let Some(role_id) = user.role_id else {
            tracing::debug!(principal_id = %principal_id, "User has no role, empty menu");
            return Ok(Vec::new());
        };

        self.resolve_for_role(role_id).await
    }

    /// 角色的菜单授权（ID 列表 + 解析后的森林）
    pub async fn get_menus_for_role(&self, role_id: Uuid) -> Result<RoleMenus, AppError> {
        RoleRepository::new(self.db.clone())
            .find_by_id(role_id)
            .await?
            .ok_or_else(|| AppError::not_found("Role not found"))?;

        let menu_item_ids = MenuRepository::new(self.db.clone())
            .get_role_menu_ids(role_id)
            .await?;
        let menus = self.resolve_for_role(role_id).await?;

        Ok(RoleMenus {
            role_id,
            menu_item_ids,
            menus,
        })
    }

    /// 整体替换角色的菜单授权
    pub async fn assign_menus_to_role(
        &self,
        role_id: Uuid,
        menu_item_ids: &[Uuid],
    ) -> Result<RoleMenus, AppError> {
        MenuRepository::new(self.db.clone())
            .replace_role_menus(role_id, menu_item_ids)
            .await?;

        self.get_menus_for_role(role_id).await
    }

    /// 完整目录树（管理视图）
    pub async fn get_full_tree(&self) -> Result<Vec<MenuNode>, AppError> {
        let catalog = MenuRepository::new(self.db.clone()).list_all().await?;
        Ok(resolve_full_tree(&catalog))
    }

    async fn resolve_for_role(&self, role_id: Uuid) -> Result<Vec<MenuNode>, AppError> {
        let repo = MenuRepository::new(self.db.clone());
        let granted: HashSet<Uuid> = repo.get_role_menu_ids(role_id).await?.into_iter().collect();

        if granted.is_empty() {
            return Ok(Vec::new());
        }

        let catalog = repo.list_all().await?;
        Ok(resolve_menu_tree(&catalog, &granted))
    }
}
