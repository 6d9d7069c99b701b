
mod account;
mod auth;
mod share;
