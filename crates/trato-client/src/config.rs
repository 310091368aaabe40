//! Configuration for the orchestration layer.

/// Knobs for [`DealView`](crate::DealView) and
/// [`DealSearch`](crate::DealSearch).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// When the owner opens a deal and has conversations, select the
    /// first one automatically. The original client shipped this branch
    /// disabled, so it is an explicit opt-in rather than silent behavior.
    pub auto_select_first_peer: bool,
    /// Capacity of the view-event broadcast channel.
    pub event_channel_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            auto_select_first_peer: false,
            event_channel_capacity: 64,
        }
    }
}

impl ClientConfig {
    pub fn with_auto_select_first_peer(mut self, enabled: bool) -> Self {
        self.auto_select_first_peer = enabled;
        self
    }

    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity;
        self
    }
}
