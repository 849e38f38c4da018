pub mod config_store;
pub mod topic_manager;
