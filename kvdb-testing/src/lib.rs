pub mod fake_sidecar;
pub mod recording_gateway;

pub use fake_sidecar::{FakeSidecar, SidecarMode};
pub use recording_gateway::RecordingGateway;
