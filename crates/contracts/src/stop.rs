//! StopSignal trait - external termination predicate

/// External "stop requested" predicate, polled once per cycle boundary.
///
/// Production implementations (sentinel file, OS signal flag, channel) are
/// swappable; the pipeline depends on this trait only.
pub trait StopSignal: Send + Sync {
    fn stop_requested(&self) -> bool;
}

impl<F> StopSignal for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn stop_requested(&self) -> bool {
        self()
    }
}
