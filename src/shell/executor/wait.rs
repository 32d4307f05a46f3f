use log::{debug, error, warn};
use nix::errno::Errno;
use nix::sys::wait::{wait, WaitStatus as WS};
use nix::unistd::Pid;

/// 子进程未能收割时使用的退出码
pub const UNKNOWN_STATUS: i32 = 1;

/// 终止状态换算成退出码，被信号杀死时为 128 + 信号值
pub fn exit_code(status: &WS) -> Option<i32> {
    match status {
        WS::Exited(_, code) => Some(*code),
        WS::Signaled(_, sig, _core_dumped) => Some(128 + *sig as i32),
        _ => None,
    }
}

/// 阻塞直到 `pids` 中每个子进程都终止，顺序不限。
/// 返回的退出码与 `pids` 一一对应。
pub fn reap_children(pids: &[Pid]) -> Vec<i32> {
    let mut codes = vec![UNKNOWN_STATUS; pids.len()];
    let mut reaped = vec![false; pids.len()];
    let mut remaining = pids.len();

    while remaining > 0 {
        match wait() {
            Ok(status) => {
                let (Some(pid), Some(code)) = (status.pid(), exit_code(&status)) else {
                    continue;
                };
                match pids.iter().position(|p| *p == pid) {
                    Some(index) if !reaped[index] => {
                        debug!("子进程 {} 退出，状态 {}", pid, code);
                        codes[index] = code;
                        reaped[index] = true;
                        remaining -= 1;
                    }
                    _ => warn!("收割了非预期的子进程 {}", pid),
                }
            }
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => {
                error!("还有 {} 个子进程未收割，但已没有子进程", remaining);
                break;
            }
            Err(e) => {
                error!("wait 出错: {}", e);
                break;
            }
        }
    }
    codes
}
