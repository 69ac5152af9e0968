#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(coverage_nightly, coverage(off))] // This is all test code, no need to test it.

//! Private helpers for testing and examples in the emitter workspace.

use std::fmt::Display;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

/// Runs a test with a timeout to prevent infinite hangs.
///
/// This function wraps a test closure with a timeout mechanism. If the test
/// takes longer than the timeout to complete, the test fails instead of
/// blocking CI/build systems forever. Emitter tests block on condition
/// variables and channels, so a lost wakeup would otherwise hang the run.
///
/// The timeout is 10 seconds under normal conditions and 60 seconds under
/// Miri, where thread synchronization primitives are significantly slower.
///
/// When the `MUTATION_TESTING` environment variable is set to "1", the watchdog
/// is disabled and the test function is executed directly. This allows mutation
/// testing to properly detect hanging mutations.
///
/// # Panics
///
/// Panics if the test exceeds the timeout (when not in mutation testing mode).
///
/// # Example
///
/// ```rust
/// use testing::with_watchdog;
///
/// with_watchdog(|| {
///     // Your test code here
///     assert_eq!(2 + 2, 4);
/// });
/// ```
pub fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    // Check if we are running under mutation testing.
    if std::env::var("MUTATION_TESTING").as_deref() == Ok("1") {
        // Under mutation testing, disable the watchdog to allow hanging mutations.
        return test_fn();
    }

    let (tx, rx) = mpsc::channel();

    // Run the test in a separate thread
    let test_handle = thread::spawn(move || {
        let result = test_fn();
        // Send the result back - if this fails, the receiver has timed out
        drop(tx.send(result));
    });

    // Miri is dramatically slower for thread synchronization, so we use a
    // longer timeout to avoid false positives while still catching real hangs.
    let timeout = if cfg!(miri) {
        Duration::from_secs(60)
    } else {
        Duration::from_secs(10)
    };

    // Wait for either the test to complete or timeout.
    match rx.recv_timeout(timeout) {
        Ok(result) => {
            // Test completed successfully, join the thread to clean up
            test_handle.join().expect("Test thread should not panic");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            // Test timed out - this indicates the test is hanging
            let seconds = timeout.as_secs();
            panic!("Test exceeded {seconds}-second timeout");
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            // Thread panicked, join it to get the panic
            match test_handle.join() {
                Ok(()) => panic!("Test thread disconnected unexpectedly"),
                Err(e) => std::panic::resume_unwind(e),
            }
        }
    }
}

/// An ordered record of handler invocations that can be shared between threads.
///
/// Clones share the same record. Handlers created by [`recorder()`][Self::recorder] append
/// `"{label}{args}"` for every invocation, so a test can assert both which handlers ran and in
/// which order.
///
/// # Example
///
/// ```rust
/// use testing::CallLog;
///
/// let log = CallLog::new();
/// let mut handler = log.recorder("h1:");
///
/// handler(&5);
/// log.record("manual");
///
/// assert_eq!(log.entries(), ["h1:5", "manual"]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct CallLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    ///
    /// # Panics
    ///
    /// Panics if a thread panicked while recording.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries
            .lock()
            .expect("a thread panicked while recording a call")
            .push(entry.into());
    }

    /// Returns a handler that records `"{label}{args}"` on every invocation.
    pub fn recorder<T>(&self, label: &'static str) -> impl FnMut(&T) + Send + Sync + 'static
    where
        T: Display + ?Sized,
    {
        let log = self.clone();
        move |args: &T| log.record(format!("{label}{args}"))
    }

    /// A snapshot of all entries in recording order.
    ///
    /// # Panics
    ///
    /// Panics if a thread panicked while recording.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .expect("a thread panicked while recording a call")
            .clone()
    }

    /// The number of recorded entries.
    ///
    /// # Panics
    ///
    /// Panics if a thread panicked while recording.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .expect("a thread panicked while recording a call")
            .len()
    }

    /// Whether nothing has been recorded yet.
    ///
    /// # Panics
    ///
    /// Panics if a thread panicked while recording.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
