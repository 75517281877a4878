//! # BMV Reader Library
//!
//! Read Victron BMV 600/602 battery monitor telemetry over a VE.Direct serial link.
//!
//! This library provides the text protocol parser with half-frame checksum
//! validation, typed field conversion, and publishing of readings to an
//! HTTP ingress API.

pub mod config;
pub mod error;
pub mod bmv;
pub mod serial;
pub mod publisher;
