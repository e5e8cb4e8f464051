use c_enum::c_enum;

c_enum! {
    /// Status code returned by family operations and the update engine.
    ///
    /// Mirrors the external contract in spec §6 exactly: these values are
    /// meant to travel end-to-end to a host embedding the library, so the
    /// numeric values are part of the API and must not change.
    #[repr(transparent)]
    #[derive(Clone, Copy, Eq, PartialEq, Hash)]
    pub enum Status : i32 {
        /// Operation completed, no further information.
        SUCCESS = 0,
        /// Value changed; a callback should run.
        UPDATED = 1,
        /// Value is known not to have changed.
        UNCHANGED = 2,
        /// The sampling interval has not elapsed yet.
        WAIT_TIMER = 3,
        /// The family's descriptor set changed; the registry must rebind.
        RELOAD_FAMILY = 4,
        /// Not ready; retry on the very next tick.
        LOADING = 5,
        /// Operation failed.
        ERROR = -1,
        /// The operation or platform is not supported.
        NOT_SUPPORTED = -2,
    }
}

impl Status {
    /// True for the two outcomes that the update engine should advance
    /// `next_update_time` for.
    pub const fn advances_timer(self) -> bool {
        matches!(self, Self::UPDATED | Self::UNCHANGED)
    }

    /// True for a terminal failure (as opposed to a transient "not yet").
    pub const fn is_error(self) -> bool {
        matches!(self, Self::ERROR | Self::NOT_SUPPORTED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_match_external_contract() {
        assert_eq!(Status::SUCCESS.0, 0);
        assert_eq!(Status::UPDATED.0, 1);
        assert_eq!(Status::UNCHANGED.0, 2);
        assert_eq!(Status::WAIT_TIMER.0, 3);
        assert_eq!(Status::RELOAD_FAMILY.0, 4);
        assert_eq!(Status::LOADING.0, 5);
        assert_eq!(Status::ERROR.0, -1);
        assert_eq!(Status::NOT_SUPPORTED.0, -2);
    }

    #[test]
    fn timer_advance_rule() {
        assert!(Status::UPDATED.advances_timer());
        assert!(Status::UNCHANGED.advances_timer());
        assert!(!Status::LOADING.advances_timer());
        assert!(!Status::ERROR.advances_timer());
    }
}
