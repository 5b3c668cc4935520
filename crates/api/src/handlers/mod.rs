pub mod export;
pub mod signature;
