//! エラー型定義 (sw-mcp)

use thiserror::Error;

/// sw-mcp のエラー型
#[derive(Error, Debug)]
pub enum McpError {
    /// クライアントとの初期化ハンドシェイクに失敗
    #[error("Failed to start tool protocol session: {0}")]
    Initialize(String),

    #[error("Tool protocol task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Result 型エイリアス
pub type Result<T> = std::result::Result<T, McpError>;
