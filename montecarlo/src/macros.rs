use std::time::Duration;
use trice::Instant;

macro_rules! cfg_test {
    ($($item:item)*) => {
        $(
            #[cfg(test)]
            $item
        )*
    }
}

/// Logs how long its scope took when dropped.
pub(crate) struct Timer {
    file: &'static str,
    line: u32,
    label: &'static str,
    start: Instant,
}

impl Timer {
    pub fn new(file: &'static str, line: u32, label: &'static str) -> Self {
        Self {
            file,
            line,
            label,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        log::debug!(
            "[{}:{}] {}: time elapsed {:?}",
            self.file,
            self.line,
            self.label,
            self.start.elapsed(),
        );
    }
}

/// Evaluate a block or expression, logging the time it took at debug level.
/// Returns the value along with the elapsed [`Duration`].
macro_rules! time {
    ($label:expr, $b:block) => {{
        let timer = $crate::macros::Timer::new(::std::file!(), ::std::line!(), $label);
        let value = $b;
        let elapsed = timer.elapsed();
        (value, elapsed)
    }};
    ($label:expr, $e:expr) => {{
        time!($label, { $e })
    }};
    ($b:block) => {{
        time!("block", $b)
    }};
    ($e:expr) => {{
        time!(::std::stringify!($e), { $e })
    }};
}
