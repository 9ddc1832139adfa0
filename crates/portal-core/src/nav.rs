//! Programmatic navigation

/// Route changes requested by controllers, e.g. after delete-then-redirect
pub trait Navigator: Send + Sync {
    /// Navigate to `route`
    fn navigate(&self, route: &str);
}
