//! Client control layer for the intake job-submission service.
//!
//! Provides the transport client ([`api::ServiceApi`]), the job
//! lifecycle controller ([`controller::JobController`]), the log
//! stream consumer ([`consumer::LogConsumer`]), and the cleanup
//! coordinator ([`cleanup::CleanupCoordinator`]). Presentation is an
//! external collaborator reached through the [`sink`] traits.

pub mod api;
pub mod cleanup;
pub mod config;
pub mod consumer;
pub mod controller;
pub mod sink;
pub mod sse;
pub mod stream;
