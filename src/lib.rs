//! Physician lookup by NPI: canonical NPPES registry data merged with an
//! optional public profile match.

pub mod cli;
pub mod constants;
pub mod http;
pub mod lookup;
pub mod npi;
pub mod profile;
pub mod server;
pub mod text;
