//! HTTP 处理器模块

pub mod audit;
pub mod company;
pub mod currency;
pub mod health;
pub mod menu;
pub mod permission;
pub mod role;
pub mod user;
