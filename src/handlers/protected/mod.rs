// handlers/protected/mod.rs - Protected handlers (JWT authentication required)
//
// Account self-service and resource mutations.
// Middleware: authenticate, then authorize(pilot, commander) for incident and report writes.
// Mission writes are additionally checked against the mission owner inside the services.

pub mod auth;
pub mod incidents;
pub mod missions;
pub mod reports;
