//! Sundry: a number-guessing game, a spam classifier service, a classifier
//! comparison benchmark and IP-intelligence helpers.

pub mod compare;
pub mod config;
pub mod data;
pub mod game;
pub mod models;
pub mod netdive;
pub mod text;
pub mod web;
