pub mod go;
pub mod init;
pub mod ls;
pub mod new;
pub mod offline;
pub mod refresh;
pub mod show;
pub mod status;
pub mod work;
