//! 菜单解析
//!
//! 把角色已授予的菜单 ID 投影成可展示的森林。目录按 id 建索引成扁平数组，
//! 父子关系用下标数组表示，每次解析都重新构建，不修改目录本身。
//!
//! 规则：
//! - 只保留启用且已授予的条目
//! - 父节点也在结果集中 → 挂到父节点下
//! - 父节点未授予、未启用或不存在 → 提升为根，不丢弃
//! - 同级按 sort_order 升序，相同时按 id 升序

use crate::models::menu::{MenuItem, MenuNode};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// 解析角色可见的菜单森林
pub fn resolve_menu_tree(catalog: &[MenuItem], granted: &HashSet<Uuid>) -> Vec<MenuNode> {
    if catalog.is_empty() || granted.is_empty() {
        return Vec::new();
    }

    let visible: Vec<&MenuItem> = catalog
        .iter()
        .filter(|item| item.is_active && granted.contains(&item.id))
        .collect();

    let index: HashMap<Uuid, usize> = visible
        .iter()
        .enumerate()
        .map(|(i, item)| (item.id, i))
        .collect();

    // 每个可见节点在可见集合内的父节点下标
    let parent_of: Vec<Option<usize>> = visible
        .iter()
        .map(|item| item.parent_id.and_then(|p| index.get(&p).copied()))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); visible.len()];
    let mut roots: Vec<usize> = Vec::new();

    for i in 0..visible.len() {
        match parent_of[i] {
            Some(parent) if !on_cycle(&parent_of, i) => children[parent].push(i),
            _ => roots.push(i),
        }
    }

    let sort_key = |&i: &usize| (visible[i].sort_order, visible[i].id);
    for siblings in children.iter_mut() {
        siblings.sort_by_key(sort_key);
    }
    roots.sort_by_key(sort_key);

    roots
        .into_iter()
        .map(|i| build_node(i, &visible, &children))
        .collect()
}

/// 以全部目录为授权解析整棵树（管理视图）
pub fn resolve_full_tree(catalog: &[MenuItem]) -> Vec<MenuNode> {
    let all: HashSet<Uuid> = catalog.iter().map(|item| item.id).collect();
    resolve_menu_tree(catalog, &all)
}

/// 把 `item_id` 挂到 `new_parent` 下是否会形成环
///
/// 目录里已有的环也按成环处理。
pub fn would_create_cycle(catalog: &[MenuItem], item_id: Uuid, new_parent: Uuid) -> bool {
    let parents: HashMap<Uuid, Option<Uuid>> = catalog
        .iter()
        .map(|item| (item.id, item.parent_id))
        .collect();

    let mut current = Some(new_parent);
    let mut steps = 0;

    while let Some(id) = current {
        if id == item_id {
            return true;
        }
        steps += 1;
        if steps > parents.len() {
            return true;
        }
        current = parents.get(&id).copied().flatten();
    }

    false
}

/// 节点沿可见父链向上能否回到自身
///
/// 目录中的历史脏数据可能成环；环上的节点一律作为根，保证不被丢弃。
fn on_cycle(parent_of: &[Option<usize>], start: usize) -> bool {
    let mut current = parent_of[start];
    let mut steps = 0;

    while let Some(i) = current {
        if i == start {
            return true;
        }
        steps += 1;
        if steps > parent_of.len() {
            // 上游存在不含 start 的环，start 本身仍可挂载
            return false;
        }
        current = parent_of[i];
    }

    false
}

fn build_node(i: usize, visible: &[&MenuItem], children: &[Vec<usize>]) -> MenuNode {
    let mut node = MenuNode::leaf(visible[i]);
    node.children = children[i]
        .iter()
        .map(|&child| build_node(child, visible, children))
        .collect();
    node
}
