use crate::orchestrator::types::ActivityState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ActivationDisposition {
    Begin,
    Restart,
    Ignore,
}

/// 回合状态机的纯粹簿记。互斥活动只有一个当前世代，落后的
/// 世代一律判为陈旧。
pub(crate) struct TurnFlow {
    activity: ActivityState,
    capture_generation: u64,
    request_generation: u64,
    utterance_generation: u64,
    standby_epoch: u64,
}

impl TurnFlow {
    pub(crate) fn new() -> Self {
        Self {
            activity: ActivityState::Idle,
            capture_generation: 0,
            request_generation: 0,
            utterance_generation: 0,
            standby_epoch: 0,
        }
    }

    pub(crate) fn activity(&self) -> ActivityState {
        self.activity
    }

    pub(crate) fn classify_activation(&self) -> ActivationDisposition {
        match self.activity {
            ActivityState::Idle => ActivationDisposition::Begin,
            ActivityState::Listening => ActivationDisposition::Restart,
            ActivityState::AwaitingResponse | ActivityState::Speaking => {
                ActivationDisposition::Ignore
            }
        }
    }

    pub(crate) fn accepts_text_submission(&self) -> bool {
        self.activity == ActivityState::Idle
    }

    pub(crate) fn begin_capture(&mut self) -> u64 {
        self.activity = ActivityState::Listening;
        self.capture_generation += 1;
        self.capture_generation
    }

    pub(crate) fn is_current_capture(&self, generation: u64) -> bool {
        self.capture_generation == generation
    }

    pub(crate) fn begin_request(&mut self) -> u64 {
        self.activity = ActivityState::AwaitingResponse;
        self.request_generation += 1;
        self.request_generation
    }

    pub(crate) fn is_current_request(&self, generation: u64) -> bool {
        self.request_generation == generation
    }

    pub(crate) fn begin_utterance(&mut self) -> u64 {
        self.activity = ActivityState::Speaking;
        self.utterance_generation += 1;
        self.utterance_generation
    }

    pub(crate) fn is_current_utterance(&self, generation: u64) -> bool {
        self.utterance_generation == generation
    }

    /// 回到待机并换一个新的待机纪元，旧纪元的延迟标签作废。
    pub(crate) fn settle_idle(&mut self) -> u64 {
        self.activity = ActivityState::Idle;
        self.standby_epoch += 1;
        self.standby_epoch
    }

    pub(crate) fn standby_due(&self, epoch: u64) -> bool {
        self.activity == ActivityState::Idle && self.standby_epoch == epoch
    }
}
