pub mod check;
pub mod history;
pub mod init_db;
pub mod status;
