pub mod arrange;
pub mod domain;
