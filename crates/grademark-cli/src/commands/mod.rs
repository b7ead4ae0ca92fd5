pub mod evaluate;
pub mod extract;
pub mod init;
pub mod override_answer;
pub mod register;
pub mod stats;
pub mod upload;
pub mod validate;
