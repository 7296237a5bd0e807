pub mod commands;
pub mod dispatcher;
pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod polling;
