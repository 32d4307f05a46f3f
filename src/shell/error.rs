use nix::errno::Errno;
use thiserror::Error;

/// 解析阶段的错误，遇到即终止当前进程
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("too many args (max {max})")]
    TooManyArgs { max: usize },
    #[error("missing file for redirection")]
    MissingRedirectTarget,
    #[error("leftovers: {0}")]
    Leftovers(String),
    #[error("syntax error near `{0}`")]
    UnexpectedToken(String),
}

/// 执行阶段的资源错误
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("{path}: {source}")]
    Open { path: String, source: Errno },
    #[error("pipe: {0}")]
    Pipe(Errno),
    #[error("fork: {0}")]
    Fork(Errno),
    #[error("dup2: {0}")]
    Dup(Errno),
    #[error("{program}: {source}")]
    Exec { program: String, source: Errno },
    #[error("{0}: argument contains a nul byte")]
    NulByte(String),
}

impl ExecError {
    /// 进程退出码：找不到程序 127，无法执行 126，其余 1
    pub fn exit_code(&self) -> i32 {
        match self {
            ExecError::Exec {
                source: Errno::ENOENT,
                ..
            } => 127,
            ExecError::Exec { .. } => 126,
            _ => 1,
        }
    }
}
