//! Camera open/close

use super::{CommandError, HandlerResult};
use crate::capabilities::{CameraDevice, CameraError};
use crate::effects::{Outcome, SideEffect};
use crate::session::SessionState;
use tracing::info;

pub const INSECURE_CONTEXT: &str =
    "Camera requires HTTPS. Use a local HTTPS server or deploy to an HTTPS host.";

pub fn open(
    state: &mut SessionState,
    device: &mut dyn CameraDevice,
    secure_context: bool,
) -> HandlerResult {
    if !secure_context {
        return Err(CommandError::Unconfigured(INSECURE_CONTEXT.to_string()));
    }

    let handle = device.open().map_err(|e| match e {
        CameraError::InsecureContext => CommandError::Unconfigured(INSECURE_CONTEXT.to_string()),
        CameraError::PermissionDenied => CommandError::external(
            "Failed to open camera. Ensure camera permission is granted.",
            e,
        ),
    })?;

    // Release the old stream only once the new one is live
    if let Some(previous) = state.camera.replace(handle) {
        device.close(previous);
    }
    info!("Camera opened ({})", handle.id());

    Ok(Outcome::say("Camera opened.").with_effect(SideEffect::ShowCamera))
}

pub fn close(state: &mut SessionState, device: &mut dyn CameraDevice) -> Outcome {
    match state.camera.take() {
        Some(handle) => {
            device.close(handle);
            info!("Camera closed ({})", handle.id());
            Outcome::say("Camera closed.").with_effect(SideEffect::HideCamera)
        }
        None => Outcome::say("Camera is not open."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{CameraHandle, UnavailableCamera};

    #[derive(Default)]
    struct FakeCamera {
        open: Vec<CameraHandle>,
        closed: Vec<CameraHandle>,
    }

    impl CameraDevice for FakeCamera {
        fn open(&mut self) -> Result<CameraHandle, CameraError> {
            let handle = CameraHandle::new();
            self.open.push(handle);
            Ok(handle)
        }

        fn close(&mut self, handle: CameraHandle) {
            self.closed.push(handle);
        }
    }

    #[test]
    fn test_open_and_close() {
        let mut state = SessionState::new();
        let mut camera = FakeCamera::default();

        let outcome = open(&mut state, &mut camera, true).unwrap();
        assert_eq!(outcome.response, "Camera opened.");
        assert!(state.camera_active());

        let outcome = close(&mut state, &mut camera);
        assert_eq!(outcome.response, "Camera closed.");
        assert_eq!(outcome.effects, vec![SideEffect::HideCamera]);
        assert_eq!(camera.closed, camera.open);
        assert!(!state.camera_active());

        assert_eq!(close(&mut state, &mut camera).response, "Camera is not open.");
    }

    #[test]
    fn test_reopen_releases_previous() {
        let mut state = SessionState::new();
        let mut camera = FakeCamera::default();

        open(&mut state, &mut camera, true).unwrap();
        open(&mut state, &mut camera, true).unwrap();

        assert_eq!(camera.closed, vec![camera.open[0]]);
        assert_eq!(state.camera, Some(camera.open[1]));
    }

    #[test]
    fn test_insecure_context() {
        let mut state = SessionState::new();
        let mut camera = FakeCamera::default();

        let result = open(&mut state, &mut camera, false);
        assert_eq!(
            result,
            Err(CommandError::Unconfigured(INSECURE_CONTEXT.to_string()))
        );
        assert!(camera.open.is_empty());
    }

    #[test]
    fn test_permission_denied() {
        let mut state = SessionState::new();
        let result = open(&mut state, &mut UnavailableCamera, true);

        match result {
            Err(CommandError::ExternalFailure { reply, .. }) => {
                assert_eq!(reply, "Failed to open camera. Ensure camera permission is granted.");
            }
            other => panic!("Expected external failure, got {:?}", other),
        }
        assert!(!state.camera_active());
    }
}
