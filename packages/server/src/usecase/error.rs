//! UseCase 層のエラー定義

use thiserror::Error;

/// 参加者登録（join）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    /// 送信元アドレスがレート制限を超過した
    #[error("Too many requests, please try again later")]
    RateLimited,
}
