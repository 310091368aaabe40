//! The lifecycle of one remotely fetched resource.

/// `Idle → Loading → Ready | Failed`. `Idle` doubles as "not yet
/// requested", which is what makes tab fetches lazy: a tab only fetches
/// when its resource is still `Idle`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Load<T> {
    #[default]
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> Load<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, Load::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Load::Loading)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Load::Ready(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Load::Failed(_))
    }

    /// The value once the fetch succeeded.
    pub fn ready(&self) -> Option<&T> {
        match self {
            Load::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// The user-visible message once the fetch failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            Load::Failed(message) => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_track_the_phase() {
        let mut load: Load<u32> = Load::Idle;
        assert!(load.is_idle());
        load = Load::Loading;
        assert!(load.is_loading());
        load = Load::Ready(3);
        assert_eq!(load.ready(), Some(&3));
        load = Load::Failed("boom".to_string());
        assert_eq!(load.error(), Some("boom"));
        assert!(load.ready().is_none());
    }
}
