//! 会话控制器
//!
//! 单线程协作式轮询：按固定间隔调用设备定位器，把结果交给会话状态机；
//! 需要采集时直接调用（阻塞的）采集循环，采集返回后继续轮询。
//! 采集期间不会调用设备定位器。

use crate::capture::{Capture, CaptureOutcome, display_path};
use crate::locator::Locate;
use crate::session::{Session, Transition};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// 会话控制器
pub struct SessionController<L, C> {
    locator: L,
    capturer: C,
    session: Session,
    poll_interval: Duration,
}

impl<L: Locate, C: Capture> SessionController<L, C> {
    pub fn new(locator: L, capturer: C, grace_period: Duration, poll_interval: Duration) -> Self {
        Self {
            locator,
            capturer,
            session: Session::new(grace_period),
            poll_interval,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn locator(&self) -> &L {
        &self.locator
    }

    pub fn capturer(&self) -> &C {
        &self.capturer
    }

    /// 执行一个 tick
    ///
    /// 定位设备 → 状态机转换 → 如有需要执行一次（阻塞的）采集。
    /// 返回本轮的转换；若启动了采集，返回时采集已结束，会话处于宽限状态。
    pub fn step(&mut self, now: Instant) -> Transition {
        let device = self.locator.locate();
        let transition = self.session.tick(device.is_some(), now);
        Self::report(&transition);

        if transition.starts_capture()
            && let Some(device) = device
        {
            let report = self.capturer.capture(&device);
            match report.outcome {
                CaptureOutcome::Disconnected => info!(
                    "Capture of {} finished: {} bytes written to {}",
                    device,
                    report.bytes_received,
                    display_path(report.log_path.as_deref())
                ),
                CaptureOutcome::Failed(ref e) => warn!(
                    "Capture of {} ended with error after {} bytes: {}",
                    device, report.bytes_received, e
                ),
            }
            self.session.capture_finished();
        }

        transition
    }

    /// 永久运行（直到进程被外部终止）
    pub fn run(&mut self) -> ! {
        info!(
            "Watching for device (grace period {:?}, poll interval {:?})",
            self.session.grace_period(),
            self.poll_interval
        );
        loop {
            self.step(Instant::now());
            thread::sleep(self.poll_interval);
        }
    }

    /// 每次状态转换输出一行状态信息（空闲和等待不输出）
    fn report(transition: &Transition) {
        match transition {
            Transition::Started { session } => {
                info!("Device detected. Starting new logging session #{}.", session)
            },
            Transition::Resumed { session } => info!(
                "Device reappeared within grace period. Continuing logging session #{}.",
                session
            ),
            Transition::Restarted { ended, session } => info!(
                "Device reappeared after grace period. Session #{} ended; starting new logging session #{}.",
                ended, session
            ),
            Transition::GraceStarted { .. } => info!("Device disconnected. Starting grace period."),
            Transition::Expired { session } => {
                info!("Grace period expired. Session #{} marked as inactive.", session)
            },
            Transition::Busy => warn!("Tick received while capture is running; ignored"),
            Transition::Idle | Transition::GraceWaiting => {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureReport;
    use crate::port::DeviceId;
    use crate::session::SessionState;
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// 按脚本返回定位结果，脚本用完后视为设备不在场
    #[derive(Default)]
    struct ScriptedLocator {
        script: VecDeque<bool>,
        calls: Rc<Cell<usize>>,
    }

    impl Locate for ScriptedLocator {
        fn locate(&mut self) -> Option<DeviceId> {
            self.calls.set(self.calls.get() + 1);
            self.script
                .pop_front()
                .unwrap_or(false)
                .then(|| DeviceId::new("/dev/ttyACM0"))
        }
    }

    /// 记录每次采集调用，以及调用发生时定位器已被调用的次数
    #[derive(Default)]
    struct RecordingCapture {
        invocations: Vec<DeviceId>,
        locate_calls: Rc<Cell<usize>>,
        locate_calls_at_capture: Vec<usize>,
    }

    impl Capture for RecordingCapture {
        fn capture(&mut self, device: &DeviceId) -> CaptureReport {
            self.invocations.push(device.clone());
            self.locate_calls_at_capture.push(self.locate_calls.get());
            CaptureReport {
                log_path: None,
                bytes_received: 0,
                outcome: CaptureOutcome::Disconnected,
            }
        }
    }

    fn controller(script: &[bool]) -> SessionController<ScriptedLocator, RecordingCapture> {
        let calls = Rc::new(Cell::new(0));
        let locator = ScriptedLocator {
            script: script.iter().copied().collect(),
            calls: Rc::clone(&calls),
        };
        let capturer = RecordingCapture {
            locate_calls: calls,
            ..RecordingCapture::default()
        };
        SessionController::new(
            locator,
            capturer,
            Duration::from_secs(2),
            Duration::from_millis(100),
        )
    }

    #[test]
    fn test_step_runs_capture_and_enters_grace() {
        let mut controller = controller(&[true]);
        let t0 = Instant::now();

        assert_eq!(controller.step(t0), Transition::Started { session: 1 });
        assert_eq!(controller.capturer().invocations.len(), 1);
        assert_eq!(controller.session().state(), SessionState::Grace { deadline: None });
    }

    #[test]
    fn test_step_without_device_does_not_capture() {
        let mut controller = controller(&[]);
        let t0 = Instant::now();

        for i in 0..100 {
            let now = t0 + Duration::from_millis(100 * i);
            assert_eq!(controller.step(now), Transition::Idle);
        }

        assert_eq!(controller.locator().calls.get(), 100);
        assert!(controller.capturer().invocations.is_empty());
        assert_eq!(controller.session().state(), SessionState::Inactive);
    }

    #[test]
    fn test_step_reappearance_within_grace_captures_again() {
        let mut controller = controller(&[true, false, true]);
        let t0 = Instant::now();

        controller.step(t0);
        assert!(matches!(
            controller.step(t0 + Duration::from_secs(6)),
            Transition::GraceStarted { .. }
        ));
        assert_eq!(
            controller.step(t0 + Duration::from_millis(6500)),
            Transition::Resumed { session: 1 }
        );
        assert_eq!(controller.capturer().invocations.len(), 2);
    }

    #[test]
    fn test_locator_not_called_during_capture() {
        // 每个 tick 只定位一次，且定位发生在采集开始之前
        let mut controller = controller(&[true, false, true, false]);
        let t0 = Instant::now();

        controller.step(t0);
        controller.step(t0 + Duration::from_millis(100));
        controller.step(t0 + Duration::from_millis(200));
        controller.step(t0 + Duration::from_millis(300));

        assert_eq!(controller.locator().calls.get(), 4);
        // 两次采集分别发生在第 1、3 个 tick 的定位之后，采集期间计数不变
        assert_eq!(controller.capturer().locate_calls_at_capture, vec![1, 3]);
        assert_eq!(controller.session().sessions_started(), 1);
    }

    #[test]
    fn test_step_reappearance_right_after_capture_starts_new_session() {
        let mut controller = controller(&[true, true]);
        let t0 = Instant::now();

        controller.step(t0);
        assert_eq!(
            controller.step(t0 + Duration::from_millis(100)),
            Transition::Restarted { ended: 1, session: 2 }
        );
        assert_eq!(controller.capturer().invocations.len(), 2);
        assert_eq!(controller.capturer().locate_calls_at_capture, vec![1, 2]);
    }
}
