//! 数据模型模块
//! 访问控制（角色、权限、菜单、主体）与默认标记实体（币种、公司）

pub mod audit;
pub mod company;
pub mod currency;
pub mod menu;
pub mod role;
pub mod user;
