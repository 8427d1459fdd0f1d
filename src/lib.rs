pub mod cart;
pub mod cli;
pub mod client;
pub mod config;
pub mod dto;
pub mod error;
pub mod fetcher;
pub mod guard;
pub mod models;
pub mod order_status;
pub mod otp;
pub mod response;
pub mod services;
pub mod session;
pub mod state;
