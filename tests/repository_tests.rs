//! 仓库层集成测试（需要 TEST_DATABASE_URL）

use fieldops_admin::{
    audit_context, db,
    auth::access::role_has_permission,
    error::AppError,
    models::{
        company::CreateCompanyRequest,
        currency::{CreateCurrencyRequest, UpdateCurrencyRequest},
        menu::{CreateMenuItemRequest, UpdateMenuItemRequest},
        role::{CreateRoleRequest, UpdateRoleRequest},
    },
    repository::{CompanyRepository, CurrencyRepository, MenuRepository, RoleRepository},
    services::MenuService,
};
use serial_test::serial;
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

mod common;
use common::{
    admin_role_id, cleanup_test_db, create_test_config, create_test_role, create_test_user,
    setup_test_db,
};

fn currency_req(code: &str, name: &str, is_default: bool) -> CreateCurrencyRequest {
    CreateCurrencyRequest {
        code: code.to_string(),
        name: name.to_string(),
        symbol: None,
        is_default,
    }
}

fn menu_req(key: &str, parent_id: Option<Uuid>) -> CreateMenuItemRequest {
    CreateMenuItemRequest {
        key: key.to_string(),
        name: key.to_string(),
        localized_name: None,
        icon: None,
        href: None,
        sort_order: 0,
        is_active: true,
        parent_id,
    }
}

async fn flagged_currencies(pool: &PgPool) -> Vec<Uuid> {
    sqlx::query_scalar("SELECT id FROM currencies WHERE is_default")
        .fetch_all(pool)
        .await
        .unwrap()
}

// ==================== Role menus ====================

#[tokio::test]
#[serial]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_assign_menus_is_full_replacement() {
    let pool = setup_test_db(&create_test_config()).await;
    let repo = MenuRepository::new(pool.clone());
    let role = create_test_role(&pool, "dispatcher").await;

    let a = repo.create(&menu_req("test.a", None)).await.unwrap();
    let b = repo.create(&menu_req("test.b", None)).await.unwrap();
    let c = repo.create(&menu_req("test.c", None)).await.unwrap();

    let service = MenuService::new(pool.clone());
    service.assign_menus_to_role(role, &[a.id, b.id]).await.unwrap();
    let menus = service.assign_menus_to_role(role, &[c.id]).await.unwrap();

    assert_eq!(menus.menu_item_ids, vec![c.id]);
    assert_eq!(repo.get_role_menu_ids(role).await.unwrap(), vec![c.id]);
}

#[tokio::test]
#[serial]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_assign_unknown_menu_leaves_grants_untouched() {
    let pool = setup_test_db(&create_test_config()).await;
    let repo = MenuRepository::new(pool.clone());
    let role = create_test_role(&pool, "dispatcher").await;
    let a = repo.create(&menu_req("test.a", None)).await.unwrap();

    repo.replace_role_menus(role, &[a.id]).await.unwrap();
    let result = repo.replace_role_menus(role, &[Uuid::new_v4()]).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(repo.get_role_menu_ids(role).await.unwrap(), vec![a.id]);
}

#[tokio::test]
#[serial]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_menus_for_user_promotes_withheld_ancestor() {
    let pool = setup_test_db(&create_test_config()).await;
    let repo = MenuRepository::new(pool.clone());
    let role = create_test_role(&pool, "dispatcher").await;
    let user = create_test_user(&pool, "dispatcher1", Some(role)).await;

    let root = repo.create(&menu_req("test.root", None)).await.unwrap();
    let child = repo.create(&menu_req("test.child", Some(root.id))).await.unwrap();
    let grandchild = repo
        .create(&menu_req("test.grandchild", Some(child.id)))
        .await
        .unwrap();
    repo.replace_role_menus(role, &[root.id, grandchild.id]).await.unwrap();

    let forest = MenuService::new(pool.clone())
        .get_menus_for_user(user)
        .await
        .unwrap();

    let ids: HashSet<Uuid> = forest.iter().map(|n| n.id).collect();
    assert_eq!(ids, [root.id, grandchild.id].into_iter().collect());
    assert!(forest.iter().all(|n| n.children.is_empty()));
}

// ==================== Menu catalog guards ====================

#[tokio::test]
#[serial]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_menu_catalog_structural_conflicts() {
    let pool = setup_test_db(&create_test_config()).await;
    let repo = MenuRepository::new(pool.clone());

    let root = repo.create(&menu_req("test.root", None)).await.unwrap();
    let child = repo.create(&menu_req("test.child", Some(root.id))).await.unwrap();

    // 重复 key
    assert!(matches!(
        repo.create(&menu_req("test.root", None)).await,
        Err(AppError::Conflict(_))
    ));

    // 悬空父节点
    assert!(matches!(
        repo.create(&menu_req("test.orphan", Some(Uuid::new_v4()))).await,
        Err(AppError::Conflict(_))
    ));

    // 成环
    let reparent = UpdateMenuItemRequest {
        parent_id: Some(Some(child.id)),
        ..Default::default()
    };
    assert!(matches!(
        repo.update(root.id, &reparent).await,
        Err(AppError::Conflict(_))
    ));

    // 自引用
    let self_parent = UpdateMenuItemRequest {
        parent_id: Some(Some(root.id)),
        ..Default::default()
    };
    assert!(matches!(
        repo.update(root.id, &self_parent).await,
        Err(AppError::Conflict(_))
    ));

    // 仍有子节点
    assert!(matches!(repo.delete(root.id).await, Err(AppError::Conflict(_))));
    assert!(repo.find_by_id(root.id).await.unwrap().is_some());

    repo.delete(child.id).await.unwrap();
    repo.delete(root.id).await.unwrap();
}

#[tokio::test]
#[serial]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_new_menu_item_granted_to_system_roles_only() {
    let pool = setup_test_db(&create_test_config()).await;
    let repo = MenuRepository::new(pool.clone());
    let service = MenuService::new(pool.clone());
    let admin = admin_role_id(&pool).await;
    let dispatcher = create_test_role(&pool, "dispatcher").await;

    let item = repo.create(&menu_req("finance.estimates", None)).await.unwrap();

    let admin_menus = service.get_menus_for_role(admin).await.unwrap();
    assert!(admin_menus.menu_item_ids.contains(&item.id));
    assert!(admin_menus.menus.iter().any(|n| n.id == item.id));

    let dispatcher_menus = service.get_menus_for_role(dispatcher).await.unwrap();
    assert!(dispatcher_menus.menu_item_ids.is_empty());
}

#[tokio::test]
#[serial]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_update_clears_nullable_menu_fields() {
    let pool = setup_test_db(&create_test_config()).await;
    let repo = MenuRepository::new(pool.clone());

    let mut req = menu_req("operations.sites", None);
    req.href = Some("/operations/sites".to_string());
    req.icon = Some("map".to_string());
    let item = repo.create(&req).await.unwrap();

    // 变成父节点：清空 href，icon 不变
    let cleared = repo
        .update(
            item.id,
            &UpdateMenuItemRequest {
                href: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(cleared.href, None);
    assert_eq!(cleared.icon.as_deref(), Some("map"));

    let renamed = repo
        .update(
            item.id,
            &UpdateMenuItemRequest {
                name: Some("Sites".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Sites");
    assert_eq!(renamed.href, None);
    assert_eq!(renamed.icon.as_deref(), Some("map"));
}

// ==================== Roles ====================

#[tokio::test]
#[serial]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_system_role_is_immutable() {
    let pool = setup_test_db(&create_test_config()).await;
    let repo = RoleRepository::new(pool.clone());
    let admin = admin_role_id(&pool).await;
    let before = repo.get_role_permissions(admin).await.unwrap().len();

    assert!(matches!(repo.delete(admin).await, Err(AppError::Conflict(_))));
    assert!(matches!(
        repo.replace_permissions(admin, &[]).await,
        Err(AppError::Conflict(_))
    ));
    assert!(matches!(
        repo.update(
            admin,
            &UpdateRoleRequest {
                display_name: Some("Renamed".to_string()),
                description: None
            }
        )
        .await,
        Err(AppError::Conflict(_))
    ));

    let role = repo.find_by_id(admin).await.unwrap().unwrap();
    assert_eq!(role.display_name, "Administrator");
    assert_eq!(repo.get_role_permissions(admin).await.unwrap().len(), before);
}

#[tokio::test]
#[serial]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_role_with_attached_users_cannot_be_deleted() {
    let pool = setup_test_db(&create_test_config()).await;
    let repo = RoleRepository::new(pool.clone());
    let role = create_test_role(&pool, "dispatcher").await;
    create_test_user(&pool, "dispatcher1", Some(role)).await;

    assert!(matches!(repo.delete(role).await, Err(AppError::Conflict(_))));
    assert!(repo.find_by_id(role).await.unwrap().is_some());
}

#[tokio::test]
#[serial]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_duplicate_role_name_conflicts() {
    let pool = setup_test_db(&create_test_config()).await;
    let repo = RoleRepository::new(pool.clone());

    let req = CreateRoleRequest {
        name: "dispatcher".to_string(),
        display_name: "Dispatcher".to_string(),
        description: None,
        permission_ids: vec![],
        dashboard_widgets: vec!["jobs.today".to_string()],
    };

    let role = repo.create(&req).await.unwrap();
    assert_eq!(
        repo.get_dashboard_widgets(role.id).await.unwrap(),
        vec!["jobs.today".to_string()]
    );
    assert!(matches!(repo.create(&req).await, Err(AppError::Conflict(_))));
}

#[tokio::test]
#[serial]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_replace_permissions_exact_set() {
    let pool = setup_test_db(&create_test_config()).await;
    let repo = RoleRepository::new(pool.clone());
    let role = create_test_role(&pool, "dispatcher").await;

    let all = repo.list_permissions().await.unwrap();
    let zones_write = all
        .iter()
        .find(|p| p.resource == "zones" && p.action == "write")
        .unwrap();

    let granted = repo.replace_permissions(role, &[zones_write.id]).await.unwrap();
    assert_eq!(granted.len(), 1);

    let grants = repo.load_grants(role).await.unwrap().unwrap();
    assert!(role_has_permission(&grants, "zones", "write"));
    assert!(!role_has_permission(&grants, "zones", "read"));
}

// ==================== Default flag ====================

#[tokio::test]
#[serial]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_set_default_moves_flag() {
    let pool = setup_test_db(&create_test_config()).await;
    let repo = CurrencyRepository::new(pool.clone());

    let x = repo.create(&currency_req("EUR", "Euro", false)).await.unwrap();
    let y = repo.create(&currency_req("USD", "US Dollar", false)).await.unwrap();

    repo.set_default(x.id).await.unwrap();
    repo.set_default(y.id).await.unwrap();

    assert_eq!(flagged_currencies(&pool).await, vec![y.id]);
}

#[tokio::test]
#[serial]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_concurrent_set_default_leaves_exactly_one() {
    let pool = setup_test_db(&create_test_config()).await;
    let repo = CurrencyRepository::new(pool.clone());

    let x = repo.create(&currency_req("EUR", "Euro", false)).await.unwrap();
    let y = repo.create(&currency_req("USD", "US Dollar", false)).await.unwrap();
    let (x_id, y_id) = (x.id, y.id);

    for _ in 0..10 {
        let rx = CurrencyRepository::new(pool.clone());
        let ry = CurrencyRepository::new(pool.clone());
        let (a, b) = tokio::join!(
            tokio::spawn(async move { rx.set_default(x_id).await }),
            tokio::spawn(async move { ry.set_default(y_id).await }),
        );
        a.unwrap().unwrap();
        b.unwrap().unwrap();

        let flagged = flagged_currencies(&pool).await;
        assert_eq!(flagged.len(), 1);
        assert!(flagged[0] == x_id || flagged[0] == y_id);
    }
}

#[tokio::test]
#[serial]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_create_with_flag_clears_previous() {
    let pool = setup_test_db(&create_test_config()).await;
    let repo = CurrencyRepository::new(pool.clone());

    repo.create(&currency_req("EUR", "Euro", true)).await.unwrap();
    let usd = repo.create(&currency_req("USD", "US Dollar", true)).await.unwrap();

    assert_eq!(flagged_currencies(&pool).await, vec![usd.id]);
}

#[tokio::test]
#[serial]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_get_default_fallback_and_explicit() {
    let pool = setup_test_db(&create_test_config()).await;
    let repo = CurrencyRepository::new(pool.clone());

    assert!(repo.get_default().await.unwrap().is_none());

    let yen = repo.create(&currency_req("JPY", "Yen", false)).await.unwrap();
    let euro = repo.create(&currency_req("EUR", "Euro", false)).await.unwrap();
    let dinar = repo.create(&currency_req("DZD", "Dinar", false)).await.unwrap();
    repo.delete(dinar.id).await.unwrap();

    // 没有显式标记：最小名称的启用记录
    assert_eq!(repo.get_default().await.unwrap().unwrap().id, euro.id);

    repo.set_default(yen.id).await.unwrap();
    assert_eq!(repo.get_default().await.unwrap().unwrap().id, yen.id);
}

#[tokio::test]
#[serial]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_deactivating_default_clears_flag() {
    let pool = setup_test_db(&create_test_config()).await;
    let repo = CurrencyRepository::new(pool.clone());

    let euro = repo.create(&currency_req("EUR", "Euro", true)).await.unwrap();
    let update = UpdateCurrencyRequest {
        is_active: Some(false),
        ..Default::default()
    };
    let updated = repo.update(euro.id, &update).await.unwrap().unwrap();

    assert!(!updated.is_default);
    assert!(flagged_currencies(&pool).await.is_empty());

    // 停用的记录不能设为默认
    assert!(matches!(
        repo.set_default(euro.id).await,
        Err(AppError::Conflict(_))
    ));
    assert!(matches!(
        repo.set_default(Uuid::new_v4()).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
#[serial]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_company_primary_flag() {
    let pool = setup_test_db(&create_test_config()).await;
    let repo = CompanyRepository::new(pool.clone());

    let req = |name: &str, is_primary: bool| CreateCompanyRequest {
        name: name.to_string(),
        legal_name: None,
        tax_id: None,
        is_primary,
    };

    let north = repo.create(&req("North Facilities", true)).await.unwrap();
    let south = repo.create(&req("South Facilities", false)).await.unwrap();
    assert_eq!(repo.get_primary().await.unwrap().unwrap().id, north.id);

    repo.set_primary(south.id).await.unwrap();
    assert_eq!(repo.get_primary().await.unwrap().unwrap().id, south.id);
    assert!(!repo.find_by_id(north.id).await.unwrap().unwrap().is_primary);
}

// ==================== Attribution ====================

#[tokio::test]
#[serial]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_attribution_follows_audit_context() {
    let pool = setup_test_db(&create_test_config()).await;
    let repo = CurrencyRepository::new(pool.clone());
    let actor = Uuid::new_v4();

    let attributed = audit_context::establish(Some(actor), async {
        repo.create(&currency_req("EUR", "Euro", false)).await
    })
    .await
    .unwrap();
    assert_eq!(attributed.created_by, Some(actor));
    assert_eq!(attributed.updated_by, Some(actor));

    // 没有作用域：不归属，也不报错
    let unattributed = repo.create(&currency_req("USD", "US Dollar", false)).await.unwrap();
    assert_eq!(unattributed.created_by, None);

    // 种子数据不带归属
    let seeded: Option<Uuid> = sqlx::query_scalar("SELECT created_by FROM roles WHERE name = 'admin'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(seeded, None);
}

#[tokio::test]
#[serial]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_seed_is_idempotent() {
    let pool = setup_test_db(&create_test_config()).await;

    let first = fieldops_admin::seed::run(&pool).await.unwrap();
    let second = fieldops_admin::seed::run(&pool).await.unwrap();
    assert_eq!(first.admin_role_id, second.admin_role_id);

    let menus: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM menu_items")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(menus as usize, second.menu_items);
}

#[tokio::test]
#[serial]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_readiness_reports_seed_state() {
    let pool = setup_test_db(&create_test_config()).await;

    let status = db::check_readiness(&pool).await;
    assert!(status.reachable);
    assert!(status.is_seeded());

    cleanup_test_db(&pool).await;

    let status = db::check_readiness(&pool).await;
    assert!(status.reachable);
    assert_eq!(status.permissions, 0);
    assert!(!status.is_seeded());
}
