pub mod classify;
pub mod inspect;
pub mod scanner;
pub mod signature;
pub mod writer;
