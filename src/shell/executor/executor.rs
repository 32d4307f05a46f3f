use std::convert::Infallible;
use std::ffi::CString;
use std::io::{self, Write};
use std::os::fd::{AsRawFd, FromRawFd, IntoRawFd, OwnedFd, RawFd};
use std::process;

use log::{debug, error, warn};
use nix::fcntl::{open, OFlag};
use nix::sys::signal::{signal, SigHandler, Signal};
use nix::sys::stat::Mode;
use nix::unistd::{dup2, execvp, fork, pipe, ForkResult, Pid};

use super::wait::reap_children;
use crate::shell::error::ExecError;
use crate::shell::parser::ast::{Command, Node, Pipeline, Redirection};
use crate::shell::parser::lexer::RedirectOp;
use crate::shell::parser::parse_line;

const STDIN: RawFd = 0;
const STDOUT: RawFd = 1;

/// 在当前进程中执行命令树，永不返回。
///
/// 调用方必须已经为此 fork 出了专用进程：每条分支要么替换进程映像，
/// 要么以退出码终止进程。
pub fn run(node: &Node) -> ! {
    let err = match execute(node) {
        Ok(never) => match never {},
        Err(err) => err,
    };
    error!("执行失败: {}", err);
    eprintln!("pipesh: {}", err);
    process::exit(err.exit_code());
}

fn execute(node: &Node) -> Result<Infallible, ExecError> {
    match node {
        Node::Command(command) => execute_command(command),
        Node::Redirect(redirection) => execute_redirection(redirection),
        Node::Pipeline(pipeline) => execute_pipeline(pipeline),
    }
}

fn execute_command(command: &Command) -> Result<Infallible, ExecError> {
    let Some(program) = command.program() else {
        debug!("空命令，直接退出");
        process::exit(0);
    };

    let argv = command
        .arguments
        .iter()
        .map(|arg| CString::new(arg.as_str()).map_err(|_| ExecError::NulByte(arg.clone())))
        .collect::<Result<Vec<_>, _>>()?;

    debug!("执行外部命令: {:?}", command.arguments);
    restore_default_signals();
    execvp(&argv[0], &argv).map_err(|source| ExecError::Exec {
        program: program.to_string(),
        source,
    })
}

fn execute_redirection(redirection: &Redirection) -> Result<Infallible, ExecError> {
    let (flags, mode) = match redirection.operator {
        RedirectOp::Input => (OFlag::O_RDONLY, Mode::empty()),
        RedirectOp::Output => (
            OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
            Mode::S_IRUSR | Mode::S_IWUSR,
        ),
    };

    let fd = open(redirection.filename.as_str(), flags, mode).map_err(|source| {
        ExecError::Open {
            path: redirection.filename.clone(),
            source,
        }
    })?;
    // SAFETY: open 刚返回的描述符只归这里所有
    let file = unsafe { OwnedFd::from_raw_fd(fd) };

    debug!(
        "重定向 {} -> fd {}",
        redirection.filename,
        redirection.target_fd()
    );
    attach(file, redirection.target_fd())?;
    execute(&redirection.inner)
}

fn execute_pipeline(pipeline: &Pipeline) -> Result<Infallible, ExecError> {
    let (read_end, write_end) = pipe().map_err(ExecError::Pipe)?;

    flush_stdout();
    // SAFETY: shell 是单线程的，fork 之后子进程只做 dup2/exec/exit
    let left = match unsafe { fork() }.map_err(ExecError::Fork)? {
        ForkResult::Child => {
            drop(read_end);
            attach(write_end, STDOUT)?;
            run(&pipeline.left)
        }
        ForkResult::Parent { child } => child,
    };

    // SAFETY: 同上
    let right = match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            drop(write_end);
            attach(read_end, STDIN)?;
            run(&pipeline.right)
        }
        Ok(ForkResult::Parent { child }) => child,
        Err(errno) => {
            drop(read_end);
            drop(write_end);
            reap_children(&[left]);
            return Err(ExecError::Fork(errno));
        }
    };

    // 父进程必须马上关闭两端，否则读端永远等不到 EOF
    drop(read_end);
    drop(write_end);

    debug!("管道: 等待子进程 {} 和 {}", left, right);
    let codes = reap_children(&[left, right]);
    process::exit(codes[1]);
}

/// 把 `fd` 复制到 `target` 上再关闭原描述符。
/// 如果 `fd` 本身就是 `target`（该槽位之前是关闭的），保持打开。
fn attach(fd: OwnedFd, target: RawFd) -> Result<(), ExecError> {
    if fd.as_raw_fd() == target {
        let _slot: RawFd = fd.into_raw_fd();
        return Ok(());
    }
    dup2(fd.as_raw_fd(), target).map_err(ExecError::Dup)?;
    drop(fd);
    Ok(())
}

/// Rust 运行时启动时忽略了 SIGPIPE，被忽略的信号会跨 exec 继承，
/// 所以 exec 前恢复默认处理
fn restore_default_signals() {
    // SAFETY: SigDfl 不安装任何处理函数
    if let Err(e) = unsafe { signal(Signal::SIGPIPE, SigHandler::SigDfl) } {
        warn!("恢复 SIGPIPE 默认处理失败: {}", e);
    }
}

fn flush_stdout() {
    if let Err(e) = io::stdout().flush() {
        warn!("刷新 stdout 失败: {}", e);
    }
}

/// 为一行输入 fork 一个子进程：子进程解析并执行，父进程等待它结束。
/// 返回子进程的退出码。语法错误只会终止子进程。
pub fn spawn_line(line: &str, max_args: usize) -> Result<i32, ExecError> {
    flush_stdout();
    // SAFETY: 在单线程的 shell 主循环中调用
    let child: Pid = match unsafe { fork() }.map_err(ExecError::Fork)? {
        ForkResult::Child => match parse_line(line, max_args) {
            Ok(node) => run(&node),
            Err(e) => {
                error!("语法错误: {}", e);
                eprintln!("pipesh: {}", e);
                process::exit(1);
            }
        },
        ForkResult::Parent { child } => child,
    };

    debug!("等待命令进程 {}", child);
    Ok(reap_children(&[child])[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::fcntl::{fcntl, FcntlArg};

    fn is_open(fd: RawFd) -> bool {
        fcntl(fd, FcntlArg::F_GETFD).is_ok()
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_attach_keeps_fd_already_in_slot() {
        let (read_end, write_end) = pipe().unwrap();
        let slot = read_end.as_raw_fd();

        attach(read_end, slot).unwrap();
        assert!(is_open(slot));

        // 槽位的所有权交回给测试，用完关闭
        drop(unsafe { OwnedFd::from_raw_fd(slot) });
        drop(write_end);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_attach_moves_fd_onto_target() {
        let (read_end, write_end) = pipe().unwrap();
        let (target, _target_write) = pipe().unwrap();
        let target_fd = target.as_raw_fd();

        attach(write_end, target_fd).unwrap();
        assert!(is_open(target_fd));

        // target 现在指向第一个管道的写端
        let mut file = std::fs::File::from(target);
        file.write_all(b"x").unwrap();
        drop(file);
        let mut buf = [0u8; 1];
        assert_eq!(nix::unistd::read(read_end.as_raw_fd(), &mut buf).unwrap(), 1);
        assert_eq!(&buf, b"x");
    }
}
