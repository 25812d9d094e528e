//! Repository 모듈
//!
//! 데이터베이스 접근 로직을 담당합니다.

pub mod accounts;

pub use accounts::PgAccountStore;
