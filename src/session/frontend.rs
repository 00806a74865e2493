use crate::conversation::TurnRole;
use crate::session::timeline::TimelineView;

/// 会话界面需要实现的呈现面。回合循环只经由这组回调驱动界面，
/// 不关心界面是终端、桌面窗口还是测试桩。
pub trait Frontend: Send + Sync {
    /// 更新状态栏文案与收音指示。
    fn set_status(&self, label: &str, listening: bool);
    /// 在会话记录末尾追加一条气泡。
    fn append_turn(&self, role: TurnRole, text: &str);
    /// 清空文字输入框。
    fn clear_input(&self);
    /// 显示一次性的提示信息。
    fn show_transient(&self, message: &str);
    /// 用最新的信息流快照重绘时间线。
    fn render_timeline(&self, timeline: &TimelineView);
}

/// 把会话更新直接打印到终端的最小呈现实现。
#[derive(Debug, Default)]
pub struct ConsoleFrontend;

impl ConsoleFrontend {
    pub fn new() -> Self {
        Self
    }
}

impl Frontend for ConsoleFrontend {
    fn set_status(&self, label: &str, listening: bool) {
        if listening {
            println!("[{label}] (音声入力中)");
        } else {
            println!("[{label}]");
        }
    }

    fn append_turn(&self, role: TurnRole, text: &str) {
        println!("{}: {text}", role_display(role));
    }

    fn clear_input(&self) {}

    fn show_transient(&self, message: &str) {
        println!("* {message}");
    }

    fn render_timeline(&self, timeline: &TimelineView) {
        if timeline.is_empty() {
            return;
        }
        println!("--- みんなの投稿 ---");
        for post in timeline.posts() {
            println!("・{}", post.content);
        }
    }
}

fn role_display(role: TurnRole) -> &'static str {
    match role {
        TurnRole::User => "あなた",
        TurnRole::Assistant => "アシスタント",
    }
}
