//! 会话连续性状态机
//!
//! 决定设备的一段字节流属于同一逻辑会话还是新会话，并通过宽限期吸收短暂断开。
//!
//! 状态机是纯函数式的：[`Session::tick`] 接收"本轮是否定位到设备"和当前时间，
//! 返回本轮的 [`Transition`]。时间由调用方传入，测试可以使用合成的 `Instant`。
//!
//! **采集是状态机的阻塞阶段**：`tick` 返回需要启动采集的转换后状态进入
//! [`SessionState::Active`]，采集返回（设备已物理消失）后调用方必须调用
//! [`Session::capture_finished`]，状态进入没有截止时间的宽限状态。
//! 因此控制器在两个 tick 之间永远观察不到"设备在场且会话活跃"。

use std::time::{Duration, Instant};

// ==================== 状态 ====================

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// 无会话
    Inactive,
    /// 会话进行中，采集循环正在运行
    Active,
    /// 会话进行中，设备不在场
    ///
    /// 采集刚返回时 `deadline` 为 `None`，下一次未定位到设备时设置。
    Grace { deadline: Option<Instant> },
}

// ==================== 转换 ====================

/// 单个 tick 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// 无会话且未找到设备
    Idle,
    /// 无会话时检测到设备，开始新会话
    Started { session: u64 },
    /// 宽限期内设备重新出现，继续当前会话
    Resumed { session: u64 },
    /// 宽限期已过（或尚未开始计时）时设备重新出现：旧会话结束，开始新会话
    Restarted { ended: u64, session: u64 },
    /// 设备断开，开始宽限期
    GraceStarted { deadline: Instant },
    /// 宽限期内等待设备重新出现
    GraceWaiting,
    /// 宽限期到期，会话结束
    Expired { session: u64 },
    /// 采集阶段中收到 tick（控制器不会这样调用）
    Busy,
}

impl Transition {
    /// 本轮是否需要启动一次采集
    pub fn starts_capture(&self) -> bool {
        matches!(
            self,
            Transition::Started { .. } | Transition::Resumed { .. } | Transition::Restarted { .. }
        )
    }
}

// ==================== 会话 ====================

/// 会话状态机
///
/// 每个进程只有一个会话；会话编号从 1 开始递增，只用于状态输出。
#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    grace_period: Duration,
    current: u64,
    started: u64,
}

impl Session {
    /// 创建会话状态机（初始状态 `Inactive`）
    pub fn new(grace_period: Duration) -> Self {
        Self {
            state: SessionState::Inactive,
            grace_period,
            current: 0,
            started: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// 会话是否活跃（`Active` 或 `Grace`）
    pub fn is_active(&self) -> bool {
        !matches!(self.state, SessionState::Inactive)
    }

    /// 当前宽限期截止时间
    pub fn grace_deadline(&self) -> Option<Instant> {
        match self.state {
            SessionState::Grace { deadline } => deadline,
            _ => None,
        }
    }

    /// 当前会话编号（无会话时为 `None`）
    pub fn session_number(&self) -> Option<u64> {
        self.is_active().then_some(self.current)
    }

    /// 已开始过的会话总数
    pub fn sessions_started(&self) -> u64 {
        self.started
    }

    /// 执行一个 tick
    ///
    /// # 参数
    /// - `located`: 本轮设备定位器是否找到设备
    /// - `now`: 本轮的当前时间
    ///
    /// 返回需要启动采集的转换时，状态已切换为 `Active`。
    pub fn tick(&mut self, located: bool, now: Instant) -> Transition {
        match (self.state, located) {
            (SessionState::Inactive, false) => Transition::Idle,
            (SessionState::Inactive, true) => Transition::Started {
                session: self.begin(),
            },
            (SessionState::Active, _) => Transition::Busy,
            (SessionState::Grace { deadline }, true) => match deadline {
                Some(deadline) if now <= deadline => {
                    self.state = SessionState::Active;
                    Transition::Resumed {
                        session: self.current,
                    }
                },
                // 截止时间已过，或尚未设置（采集返回后设备立即重新出现）：新会话
                _ => {
                    let ended = self.current;
                    Transition::Restarted {
                        ended,
                        session: self.begin(),
                    }
                },
            },
            (SessionState::Grace { deadline: None }, false) => {
                let deadline = now.checked_add(self.grace_period).unwrap_or(now);
                self.state = SessionState::Grace {
                    deadline: Some(deadline),
                };
                Transition::GraceStarted { deadline }
            },
            (SessionState::Grace { deadline: Some(deadline) }, false) => {
                if now > deadline {
                    self.state = SessionState::Inactive;
                    Transition::Expired {
                        session: self.current,
                    }
                } else {
                    Transition::GraceWaiting
                }
            },
        }
    }

    /// 采集返回（设备已物理消失），进入宽限状态
    ///
    /// 只在 `Active` 状态下生效。
    pub fn capture_finished(&mut self) {
        if self.state == SessionState::Active {
            self.state = SessionState::Grace { deadline: None };
        }
    }

    fn begin(&mut self) -> u64 {
        self.started += 1;
        self.current = self.started;
        self.state = SessionState::Active;
        self.current
    }
}
