//! Typed side-effect ports. Every external collaborator the pipeline talks
//! to — a database cursor, an FTP session, PGP, TIFF append, the ACORD XML
//! tree — is named here as a trait, never called directly, so carrier
//! hooks and orchestrator tests can inject fakes.

pub mod clock {
    pub use asap_utils::clock::{Clock, SystemClock};
}

pub mod db;
pub mod ftp;
pub mod pgp;
pub mod smtp;
pub mod tiff;
pub mod xml;
