// ─── Artifact Acquisition Core ───
// Resolves a version and acquires everything it needs, verified.
//
// Architecture:
//   core/
//     config/     — Immutable run configuration + settings file
//     platform/   — Host OS family + arch suffix
//     version/    — Version manifest + descriptor + OS rules
//     downloader/ — SHA-1 verifier + concurrent verified downloads
//     assets/     — Asset index → content-addressed tasks
//     natives/    — Native archive extraction
//     acquire/    — On-disk layout + orchestrator
//     launch/     — Inputs handed to a process launcher

pub mod acquire;
pub mod assets;
pub mod config;
pub mod downloader;
pub mod error;
pub mod http;
pub mod launch;
pub mod natives;
pub mod platform;
pub mod version;
