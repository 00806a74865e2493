use std::time::Duration;

pub(crate) const COMPLETION_ERROR_PREFIX: &str = "エラーが発生しました: ";
pub(crate) const FALLBACK_APOLOGY: &str = "システムエラーが発生しました。";
pub(crate) const UNSUPPORTED_CAPTURE_MESSAGE: &str = "この環境では音声認識を利用できません。";
pub(crate) const EMPTY_HISTORY_MESSAGE: &str = "会話履歴がありません。";
pub(crate) const LOG_FLUSH_ACK_PREFIX: &str = "ログ送信完了: ";
pub(crate) const LOG_FLUSH_ERROR_PREFIX: &str = "ログ送信エラー: ";

pub(crate) const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub(crate) const DEFAULT_STANDBY_DEBOUNCE: Duration = Duration::from_millis(100);
pub(crate) const DEFAULT_MAX_REPLY_LENGTH: u32 = 1000;
