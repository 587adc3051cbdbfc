//! パイプライン状態
//!
//! 各パイプライン（背景除去・生成・修正・提案）は独立した状態とエポックを持つ。
//! 開始のたびにエポックが進み、完了時にチケットのエポックが現在値と一致しなければ結果は捨てる。

/// パイプラインの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pipeline {
    BackgroundRemoval,
    Generation,
    Refinement,
    Suggestion,
}

impl Pipeline {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pipeline::BackgroundRemoval => "background-removal",
            Pipeline::Generation => "generation",
            Pipeline::Refinement => "refinement",
            Pipeline::Suggestion => "suggestion",
        }
    }
}

/// パイプラインの状態
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PipelineState<T> {
    #[default]
    Idle,
    Running,
    Succeeded(T),
    Failed(String),
}

impl<T> PipelineState<T> {
    pub fn is_running(&self) -> bool {
        matches!(self, PipelineState::Running)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            PipelineState::Failed(reason) => Some(reason),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PipelineState::Idle => "idle",
            PipelineState::Running => "running",
            PipelineState::Succeeded(_) => "done",
            PipelineState::Failed(_) => "failed",
        }
    }
}

/// 実行中の呼び出しを識別するチケット
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub pipeline: Pipeline,
    pub epoch: u64,
}

/// 完了処理の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// 状態に反映した
    Applied,
    /// 後続の操作に追い越されたので捨てた
    Stale,
}

impl Completion {
    pub fn is_applied(&self) -> bool {
        matches!(self, Completion::Applied)
    }
}

/// 状態とエポックの組
#[derive(Debug, Clone)]
pub struct PipelineSlot<T> {
    pipeline: Pipeline,
    state: PipelineState<T>,
    epoch: u64,
}

impl<T> PipelineSlot<T> {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            state: PipelineState::Idle,
            epoch: 0,
        }
    }

    pub fn state(&self) -> &PipelineState<T> {
        &self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// 新しい呼び出しを開始（以前のチケットはすべて無効になる）
    pub fn begin(&mut self) -> Ticket {
        self.epoch += 1;
        self.state = PipelineState::Running;
        Ticket {
            pipeline: self.pipeline,
            epoch: self.epoch,
        }
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.pipeline == self.pipeline && ticket.epoch == self.epoch
    }

    /// 依存データを消したときに呼ぶ
    ///
    /// 実行中の呼び出しは打ち切り（結果は届いても捨てられる）、終了済みの状態も Idle に戻す。
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.state = PipelineState::Idle;
    }

    /// 成功を記録（チケットが古ければ何もしない）
    pub fn succeed(&mut self, ticket: &Ticket, value: T) -> Completion {
        if !self.is_current(ticket) {
            return Completion::Stale;
        }
        self.state = PipelineState::Succeeded(value);
        Completion::Applied
    }

    /// 失敗を記録（チケットが古ければ何もしない）
    pub fn fail(&mut self, ticket: &Ticket, reason: impl Into<String>) -> Completion {
        if !self.is_current(ticket) {
            return Completion::Stale;
        }
        self.state = PipelineState::Failed(reason.into());
        Completion::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_bumps_epoch_and_runs() {
        let mut slot: PipelineSlot<usize> = PipelineSlot::new(Pipeline::Generation);
        assert_eq!(slot.state(), &PipelineState::Idle);

        let ticket = slot.begin();
        assert_eq!(ticket.epoch, 1);
        assert!(slot.is_running());
        assert!(slot.is_current(&ticket));
    }

    #[test]
    fn test_succeed_with_current_ticket() {
        let mut slot = PipelineSlot::new(Pipeline::Generation);
        let ticket = slot.begin();
        assert_eq!(slot.succeed(&ticket, 6usize), Completion::Applied);
        assert_eq!(slot.state(), &PipelineState::Succeeded(6));
    }

    #[test]
    fn test_newer_begin_makes_old_ticket_stale() {
        let mut slot = PipelineSlot::new(Pipeline::Suggestion);
        let old = slot.begin();
        let new = slot.begin();

        assert_eq!(slot.succeed(&old, ()), Completion::Stale);
        assert!(slot.is_running());
        assert_eq!(slot.fail(&new, "boom"), Completion::Applied);
        assert_eq!(slot.state().error(), Some("boom"));
    }

    #[test]
    fn test_reset_stops_running_call() {
        let mut slot: PipelineSlot<usize> = PipelineSlot::new(Pipeline::Refinement);
        let ticket = slot.begin();
        slot.reset();

        assert_eq!(slot.state(), &PipelineState::Idle);
        assert_eq!(slot.fail(&ticket, "late"), Completion::Stale);
        assert_eq!(slot.state(), &PipelineState::Idle);
    }

    #[test]
    fn test_reset_clears_finished_state() {
        let mut slot = PipelineSlot::new(Pipeline::Generation);
        let ticket = slot.begin();
        slot.succeed(&ticket, 6usize);
        slot.reset();
        assert_eq!(slot.state(), &PipelineState::Idle);

        let ticket = slot.begin();
        slot.fail(&ticket, "boom");
        slot.reset();
        assert_eq!(slot.state(), &PipelineState::Idle);
    }

    #[test]
    fn test_ticket_of_other_pipeline_is_not_current() {
        let mut a: PipelineSlot<()> = PipelineSlot::new(Pipeline::Generation);
        let mut b: PipelineSlot<()> = PipelineSlot::new(Pipeline::Refinement);
        let ticket_a = a.begin();
        b.begin();
        assert!(!b.is_current(&ticket_a));
    }

    #[test]
    fn test_state_labels() {
        assert_eq!(PipelineState::<()>::Idle.label(), "idle");
        assert_eq!(PipelineState::<()>::Running.label(), "running");
        assert_eq!(PipelineState::Succeeded(()).label(), "done");
        assert_eq!(PipelineState::<()>::Failed("x".into()).label(), "failed");
    }
}
