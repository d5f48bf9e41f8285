//! 書籍貸出サービス
//!
//! 有限の在庫を複数の利用者が同時に借りる際の貸出・返却エンジンと、
//! 追記型の貸出台帳を提供する。

pub mod adapters;
pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
