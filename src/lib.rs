pub mod configure;
pub mod gateway;
pub mod logger;
pub mod models;
pub mod path_translator;
pub mod registry;
pub mod remote;
pub mod transfer;
