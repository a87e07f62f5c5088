//! 审计上下文
//!
//! 每个入站操作持有一个独立的可变单元，保存当前操作主体的 ID。
//! 数据访问层在 create / update 时同步读取它来填充 `created_by` / `updated_by`。
//!
//! 两种用法：
//! 1. 已知主体（后台任务、系统作业）：`establish(Some(id), fut)`
//! 2. 先以 `None` 打开作用域，身份解析完成后在同一作用域内调用
//!    `set_current_principal` 原地修改（HTTP 请求走这条路径）
//!
//! 作用域基于 tokio task-local，挂起 / 恢复不会泄露给其他并发操作。

use std::future::Future;
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;
use uuid::Uuid;

tokio::task_local! {
    static AUDIT_CONTEXT: AuditContext;
}

/// 单个操作的审计上下文
///
/// Clone 共享同一个单元，用于把上下文交给同一操作派生的子任务。
#[derive(Debug, Clone, Default)]
pub struct AuditContext {
    principal_id: Arc<RwLock<Option<Uuid>>>,
}

impl AuditContext {
    pub fn new(principal_id: Option<Uuid>) -> Self {
        Self {
            principal_id: Arc::new(RwLock::new(principal_id)),
        }
    }

    /// 读取当前主体 ID
    pub fn principal_id(&self) -> Option<Uuid> {
        match self.principal_id.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// 原地修改主体 ID
    pub fn set_principal_id(&self, principal_id: Option<Uuid>) {
        match self.principal_id.write() {
            Ok(mut guard) => *guard = principal_id,
            Err(poisoned) => *poisoned.into_inner() = principal_id,
        }
    }
}

/// 打开一个新的审计作用域并在其中运行 future
pub async fn establish<F>(principal_id: Option<Uuid>, future: F) -> F::Output
where
    F: Future,
{
    scope(AuditContext::new(principal_id), future).await
}

/// 在给定上下文中运行 future
pub async fn scope<F>(context: AuditContext, future: F) -> F::Output
where
    F: Future,
{
    AUDIT_CONTEXT.scope(context, future).await
}

/// 当前作用域的主体 ID；没有打开的作用域时返回 None
pub fn current_principal_id() -> Option<Uuid> {
    AUDIT_CONTEXT
        .try_with(|ctx| ctx.principal_id())
        .ok()
        .flatten()
}

/// 在当前作用域内写入已解析的主体 ID
///
/// 返回 false 表示调用方不在任何审计作用域内，写入被忽略。
pub fn set_current_principal(principal_id: Uuid) -> bool {
    AUDIT_CONTEXT
        .try_with(|ctx| ctx.set_principal_id(Some(principal_id)))
        .is_ok()
}

/// 当前作用域的上下文句柄
pub fn current() -> Option<AuditContext> {
    AUDIT_CONTEXT.try_with(|ctx| ctx.clone()).ok()
}

/// 派生子任务并携带当前审计上下文
///
/// tokio::spawn 不会继承 task-local，需要显式传递。
pub fn spawn_with_current<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    match current() {
        Some(context) => tokio::spawn(AUDIT_CONTEXT.scope(context, future)),
        None => tokio::spawn(future),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_scope_yields_none() {
        assert_eq!(current_principal_id(), None);
        assert!(!set_current_principal(Uuid::new_v4()));
        assert!(current().is_none());
    }

    #[tokio::test]
    async fn test_establish_with_known_principal() {
        let id = Uuid::new_v4();
        let seen = establish(Some(id), async { current_principal_id() }).await;
        assert_eq!(seen, Some(id));
        assert_eq!(current_principal_id(), None);
    }

    #[tokio::test]
    async fn test_mutate_after_open() {
        let id = Uuid::new_v4();
        let (before, after) = establish(None, async {
            let before = current_principal_id();
            assert!(set_current_principal(id));
            tokio::task::yield_now().await;
            (before, current_principal_id())
        })
        .await;

        assert_eq!(before, None);
        assert_eq!(after, Some(id));
    }

    #[tokio::test]
    async fn test_nested_scope_shadows_outer() {
        let outer = Uuid::new_v4();
        let inner = Uuid::new_v4();

        establish(Some(outer), async {
            let seen_inner = establish(Some(inner), async { current_principal_id() }).await;
            assert_eq!(seen_inner, Some(inner));
            assert_eq!(current_principal_id(), Some(outer));
        })
        .await;
    }

    #[tokio::test]
    async fn test_spawn_with_current_shares_cell() {
        let id = Uuid::new_v4();
        let later = Uuid::new_v4();

        establish(Some(id), async {
            let seen = spawn_with_current(async { current_principal_id() })
                .await
                .unwrap();
            assert_eq!(seen, Some(id));

            // 子任务修改的是同一个单元
            spawn_with_current(async move {
                set_current_principal(later);
            })
            .await
            .unwrap();
            assert_eq!(current_principal_id(), Some(later));
        })
        .await;
    }

    #[tokio::test]
    async fn test_plain_spawn_does_not_inherit() {
        let id = Uuid::new_v4();
        let seen = establish(Some(id), async {
            tokio::spawn(async { current_principal_id() }).await.unwrap()
        })
        .await;
        assert_eq!(seen, None);
    }
}
