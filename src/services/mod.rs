/// Probe and poll loops keeping the engine fed with live documents.
pub mod connection_supervisor;
/// Operator controls: switchover, resync, manual timer and match number.
pub mod control_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Once-per-second manual timer ticker.
pub mod manual_timer;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Status snapshot assembly.
pub mod status_service;
/// Match tracking and display publication.
pub mod sync_engine;
