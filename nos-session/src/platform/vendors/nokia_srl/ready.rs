//! Boot-readiness polling for SR Linux nodes.
//!
//! A freshly booted node accepts SSH well before it accepts configuration.
//! [`wait_ready`] blocks until the management server reports `running` and
//! the initial commit reports `complete`, in that order.

use std::fmt;
use std::time::Duration;

use log::{debug, info, trace, warn};
use tokio::sync::watch;
use tokio::time::{Instant, sleep_until};

use crate::driver::{Driver, Session};
use crate::error::{ReadinessError, Result};

/// Reports whether the management server process is up.
pub const PROCESS_CHECK_COMMAND: &str =
    "info from state system app-management application mgmt_server state | grep running";

/// Reports whether the initial configuration commit has finished.
pub const CONFIG_CHECK_COMMAND: &str =
    "info from state system configuration commit 1 status | grep complete";

const PROCESS_READY_MARKER: &str = "running";
const CONFIG_READY_MARKER: &str = "complete";

/// Default ceiling on the whole wait.
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(3 * 60);

/// Default delay between two checks.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(2);

/// Check the poller is on.
///
/// Reaching ready is `Ok(())`; timing out and cancellation are
/// [`ReadinessError`] variants carrying the state they interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessState {
    CheckingProcess,
    CheckingConfigLoaded,
}

impl fmt::Display for ReadinessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReadinessState::CheckingProcess => "checking mgmt_server process",
            ReadinessState::CheckingConfigLoaded => "checking initial commit",
        };
        f.write_str(s)
    }
}

/// Timing of the readiness loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPolicy {
    /// Upper bound on the whole wait, measured from the call.
    pub timeout: Duration,

    /// Delay between a failed check and the next attempt.
    pub retry_interval: Duration,
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_READY_TIMEOUT,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

/// Caller-side limits on a wait: an optional deadline and an optional
/// cancellation signal.
///
/// Cancellation fires when the watched value becomes `true`.
#[derive(Debug, Clone, Default)]
pub struct WaitContext {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

impl WaitContext {
    /// No caller deadline and no cancellation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Give up at `deadline` if that comes before the policy timeout.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Give up after `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Stop as soon as `cancel` observes `true`.
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// The caller deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Sleep until `until`, waking early only once cancellation is requested.
    async fn pause(&mut self, until: Instant) {
        let sleep = sleep_until(until);
        tokio::pin!(sleep);

        if let Some(rx) = self.cancel.as_mut() {
            loop {
                let changed = tokio::select! {
                    _ = &mut sleep => return,
                    changed = rx.changed() => changed,
                };
                if changed.is_err() {
                    break;
                }
                if *rx.borrow_and_update() {
                    return;
                }
            }
            // sender dropped, nobody can cancel any more
            self.cancel = None;
        }
        sleep.await;
    }
}

/// Wait for the node behind `session` to be ready for configuration,
/// using the default [`ReadinessPolicy`].
pub async fn wait_ready<D: Driver>(session: &mut Session<D>, ctx: WaitContext) -> Result<()> {
    wait_ready_with(session, ctx, ReadinessPolicy::default()).await
}

/// Wait for the node behind `session` to be ready for configuration.
///
/// The effective deadline is the earlier of the caller's deadline and
/// `policy.timeout` from now. Cancellation and the deadline are both
/// checked before every command; a command already in flight is never
/// interrupted.
pub async fn wait_ready_with<D: Driver>(
    session: &mut Session<D>,
    mut ctx: WaitContext,
    policy: ReadinessPolicy,
) -> Result<()> {
    let own_deadline = Instant::now() + policy.timeout;
    let deadline = ctx
        .deadline
        .map_or(own_deadline, |caller| caller.min(own_deadline));

    let mut state = ReadinessState::CheckingProcess;
    let mut last_error = String::from("no check completed");

    debug!("waiting for {} to finish booting", session.host());

    loop {
        if ctx.is_cancelled() {
            debug!("readiness wait for {} cancelled while {}", session.host(), state);
            return Err(ReadinessError::Cancelled {
                host: session.host().to_string(),
                state,
            }
            .into());
        }

        if Instant::now() >= deadline {
            warn!(
                "{} not ready before deadline ({}, last error: {})",
                session.host(),
                state,
                last_error
            );
            return Err(ReadinessError::Timeout {
                host: session.host().to_string(),
                state,
                last_error,
            }
            .into());
        }

        let (command, marker) = match state {
            ReadinessState::CheckingProcess => (PROCESS_CHECK_COMMAND, PROCESS_READY_MARKER),
            ReadinessState::CheckingConfigLoaded => (CONFIG_CHECK_COMMAND, CONFIG_READY_MARKER),
        };

        match (probe(session, command, marker).await, state) {
            (Ok(()), ReadinessState::CheckingProcess) => {
                debug!("{}: mgmt_server is running", session.host());
                state = ReadinessState::CheckingConfigLoaded;
                continue;
            }
            (Ok(()), ReadinessState::CheckingConfigLoaded) => {
                info!("{} is ready", session.host());
                return Ok(());
            }
            (Err(reason), _) => {
                trace!("{}: {} ({})", session.host(), reason, state);
                last_error = reason;
            }
        }

        let wake = (Instant::now() + policy.retry_interval).min(deadline);
        ctx.pause(wake).await;
    }
}

/// Run one check; `Err` carries a description of why it did not pass.
async fn probe<D: Driver>(
    session: &mut Session<D>,
    command: &str,
    marker: &str,
) -> std::result::Result<(), String> {
    let response = session
        .send_command(command)
        .await
        .map_err(|e| e.to_string())?;

    if let Some(failure) = &response.failure_message {
        return Err(format!("'{}' failed: {}", command, failure));
    }
    if !response.contains(marker) {
        return Err(format!("'{}' output does not contain '{}'", command, marker));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tokio_test::assert_err;

    use super::*;
    use crate::Error;
    use crate::driver::mock::{MockDriver, Reply, Sent};
    use crate::platform::vendors::nokia_srl::{SrlFirmware, platform};

    fn fast() -> ReadinessPolicy {
        ReadinessPolicy {
            timeout: Duration::from_secs(5),
            retry_interval: Duration::from_millis(1),
        }
    }

    fn session(driver: MockDriver) -> Session<MockDriver> {
        Session::new(driver, platform(SrlFirmware::Current)).unwrap()
    }

    fn commands(session: &Session<MockDriver>) -> Vec<Sent> {
        session.driver().sent()
    }

    #[test]
    fn test_default_policy() {
        let policy = ReadinessPolicy::default();
        assert_eq!(policy.timeout, Duration::from_secs(180));
        assert_eq!(policy.retry_interval, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_ready_after_both_checks() {
        let driver = MockDriver::srl()
            .with_reply(PROCESS_CHECK_COMMAND, Reply::Error("channel busy".to_string()))
            .with_reply(PROCESS_CHECK_COMMAND, Reply::Output("state running".to_string()))
            .with_reply(CONFIG_CHECK_COMMAND, Reply::Output(String::new()))
            .with_reply(CONFIG_CHECK_COMMAND, Reply::Output("status complete".to_string()));
        let mut session = session(driver);

        wait_ready_with(&mut session, WaitContext::new(), fast())
            .await
            .unwrap();

        // a failed config check retries the config check, not the process check
        assert_eq!(
            commands(&session),
            vec![
                Sent::command(PROCESS_CHECK_COMMAND),
                Sent::command(PROCESS_CHECK_COMMAND),
                Sent::command(CONFIG_CHECK_COMMAND),
                Sent::command(CONFIG_CHECK_COMMAND),
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_response_is_retried() {
        let driver = MockDriver::srl()
            .with_reply(
                PROCESS_CHECK_COMMAND,
                Reply::Output("Error: path not found (running)".to_string()),
            )
            .with_reply(PROCESS_CHECK_COMMAND, Reply::Output("running".to_string()))
            .with_reply(CONFIG_CHECK_COMMAND, Reply::Output("complete".to_string()));
        let mut session = session(driver);

        wait_ready_with(&mut session, WaitContext::new(), fast())
            .await
            .unwrap();
        assert_eq!(commands(&session).len(), 3);
    }

    #[tokio::test]
    async fn test_past_deadline_sends_nothing() {
        let mut session = session(MockDriver::srl());
        let ctx = WaitContext::new().with_deadline(Instant::now());

        let err = assert_err!(wait_ready(&mut session, ctx).await);
        match err {
            Error::Readiness(ReadinessError::Timeout { host, state, .. }) => {
                assert_eq!(host, "srl1");
                assert_eq!(state, ReadinessState::CheckingProcess);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(commands(&session).is_empty());
    }

    #[tokio::test]
    async fn test_times_out_while_checking_process() {
        let mut session = session(MockDriver::srl());
        let policy = ReadinessPolicy {
            timeout: Duration::from_millis(30),
            retry_interval: Duration::from_millis(5),
        };

        let err = assert_err!(wait_ready_with(&mut session, WaitContext::new(), policy).await);
        match err {
            Error::Readiness(ReadinessError::Timeout {
                state, last_error, ..
            }) => {
                assert_eq!(state, ReadinessState::CheckingProcess);
                assert!(last_error.contains("does not contain 'running'"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(
            commands(&session)
                .iter()
                .all(|sent| *sent == Sent::command(PROCESS_CHECK_COMMAND))
        );
    }

    #[tokio::test]
    async fn test_times_out_while_checking_config() {
        let driver =
            MockDriver::srl().with_reply(PROCESS_CHECK_COMMAND, Reply::Output("running".to_string()));
        let mut session = session(driver);
        let ctx = WaitContext::new().with_timeout(Duration::from_millis(30));

        let err = assert_err!(wait_ready_with(&mut session, ctx, fast()).await);
        assert!(matches!(
            err,
            Error::Readiness(ReadinessError::Timeout {
                state: ReadinessState::CheckingConfigLoaded,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let mut session = session(MockDriver::srl());

        let err = assert_err!(wait_ready(&mut session, WaitContext::new().with_cancel(rx)).await);
        assert!(matches!(
            err,
            Error::Readiness(ReadinessError::Cancelled {
                state: ReadinessState::CheckingProcess,
                ..
            })
        ));
        assert!(commands(&session).is_empty());
    }

    #[tokio::test]
    async fn test_cancel_wakes_retry_sleep() {
        let (tx, rx) = watch::channel(false);
        let mut session = session(MockDriver::srl());
        let policy = ReadinessPolicy {
            timeout: Duration::from_secs(60),
            retry_interval: Duration::from_secs(30),
        };
        let started = Instant::now();

        let (result, _) = tokio::join!(
            wait_ready_with(&mut session, WaitContext::new().with_cancel(rx), policy),
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                tx.send(true).unwrap();
            }
        );

        assert!(matches!(
            result,
            Err(Error::Readiness(ReadinessError::Cancelled { .. }))
        ));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(commands(&session), vec![Sent::command(PROCESS_CHECK_COMMAND)]);
    }

    #[tokio::test]
    async fn test_cancel_wins_over_past_deadline() {
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let mut session = session(MockDriver::srl());
        let ctx = WaitContext::new()
            .with_deadline(Instant::now())
            .with_cancel(rx);

        let err = assert_err!(wait_ready(&mut session, ctx).await);
        assert!(matches!(
            err,
            Error::Readiness(ReadinessError::Cancelled { .. })
        ));
        assert!(commands(&session).is_empty());
    }

    #[tokio::test]
    async fn test_false_signals_do_not_shorten_retry_sleep() {
        let (tx, rx) = watch::channel(false);
        let mut session = session(MockDriver::srl());
        let policy = ReadinessPolicy {
            timeout: Duration::from_millis(100),
            retry_interval: Duration::from_secs(2),
        };
        let started = Instant::now();

        let (result, _) = tokio::join!(
            wait_ready_with(&mut session, WaitContext::new().with_cancel(rx), policy),
            async {
                while started.elapsed() < Duration::from_millis(150) {
                    let _ = tx.send(false);
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            }
        );

        assert!(matches!(
            result,
            Err(Error::Readiness(ReadinessError::Timeout { .. }))
        ));
        assert_eq!(commands(&session), vec![Sent::command(PROCESS_CHECK_COMMAND)]);
    }

    #[tokio::test]
    async fn test_dropped_cancel_sender_keeps_waiting() {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        let driver = MockDriver::srl()
            .with_reply(PROCESS_CHECK_COMMAND, Reply::Output(String::new()))
            .with_reply(PROCESS_CHECK_COMMAND, Reply::Output("running".to_string()))
            .with_reply(CONFIG_CHECK_COMMAND, Reply::Output("complete".to_string()));
        let mut session = session(driver);

        wait_ready_with(&mut session, WaitContext::new().with_cancel(rx), fast())
            .await
            .unwrap();
        assert_eq!(commands(&session).len(), 3);
    }
}
