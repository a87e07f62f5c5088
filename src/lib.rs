//! 现场服务后台：访问控制、导航权限与审计归属
//! 提供共享类型和工具

pub mod audit_context;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod seed;
pub mod services;
pub mod telemetry;
