pub mod csm;

pub use csm::{CameraView, FrustumCuller};
