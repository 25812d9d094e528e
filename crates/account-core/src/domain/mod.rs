//! 계정 도메인 모델 및 저장소 추상화.

mod account;
pub mod memory;
mod role;
pub mod store;

pub use account::{Account, Identity, NewAccount};
pub use memory::InMemoryAccountStore;
pub use role::Role;
pub use store::{
    AccountFilter, AccountPage, AccountStore, PageRequest, SessionTokens,
    DEFAULT_PAGE_NUMBER, DEFAULT_RECORDS_PER_PAGE,
};
