pub mod export;
pub mod url;
