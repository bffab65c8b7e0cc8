//! Permission gate port interface

/// Port for microphone/recognition authorization.
pub trait PermissionGate: Send + Sync {
    /// Whether audio capture is currently authorized.
    fn has_permission(&self) -> bool;

    /// Fire the asynchronous OS-level permission prompt.
    ///
    /// The outcome is not observed here; callers re-invoke
    /// `start_listening` after the user has responded.
    fn request_permission(&self);
}

impl PermissionGate for Box<dyn PermissionGate> {
    fn has_permission(&self) -> bool {
        (**self).has_permission()
    }

    fn request_permission(&self) {
        (**self).request_permission()
    }
}
