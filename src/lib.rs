//! safeline: emergency assistance client.
//!
//! A five-step emergency process (location, questionnaire, voice, image,
//! helpline) behind an authenticated session, backed by hosted identity and
//! row-store services and a reverse geocoder.

pub mod app;
pub mod backend;
pub mod cli;
pub mod config;
pub mod console;
pub mod device;
pub mod error;
pub mod state;
pub mod steps;
pub mod wizard;
