use log::{debug, error, warn};
use std::error::Error;
use std::io::IsTerminal;
use std::ops::ControlFlow;

use crate::shell::executor::spawn_line;
use crate::shell::readline::{ReadlineError, ReadlineManager};
use crate::utils::config::Config;
use crate::utils::theme::Theme;

pub struct Shell<'a> {
    config: &'a Config,
    theme: Theme,
    readline: ReadlineManager,
    interactive: bool,
    last_status: i32,
}

impl<'a> Shell<'a> {
    pub fn new(config: &'a Config) -> Result<Self, ReadlineError> {
        Ok(Self {
            config,
            theme: Theme::load_theme(&config.theme),
            readline: ReadlineManager::new(config)?,
            interactive: std::io::stdin().is_terminal(),
            last_status: 0,
        })
    }

    /// 读取并执行命令直到 EOF 或 `exit`，返回 shell 的退出码
    pub fn run(&mut self) -> Result<i32, Box<dyn Error>> {
        debug!("初始化 pipesh...");
        // 只有终端输入才显示提示符
        let prompt = if self.interactive {
            self.theme.prompt.clone()
        } else {
            String::new()
        };

        let mut status = 0;
        loop {
            match self.readline.readline(&prompt) {
                Ok(line) => {
                    if let ControlFlow::Break(code) = self.handle_line(&line) {
                        status = code;
                        break;
                    }
                }
                Err(ReadlineError::Eof) => {
                    debug!("接收到 EOF，退出 pipesh...");
                    break;
                }
                Err(ReadlineError::Interrupted) => {
                    warn!("接收到中断信号，丢弃当前行");
                }
                Err(err) => {
                    error!("读取输入出错: {}", err);
                    return Err(err.into());
                }
            }
        }

        debug!("退出 pipesh...");
        Ok(status)
    }

    /// 处理一行输入：`cd` 和 `exit` 在 shell 进程内处理，其余交给子进程
    /// `Break` 携带 `exit` 要求的退出码
    pub fn handle_line(&mut self, line: &str) -> ControlFlow<i32> {
        let line = line.trim_end_matches(['\n', '\r']);
        let mut words = line.split_whitespace();

        match words.next() {
            Some("exit") => {
                let args: Vec<&str> = words.collect();
                return self.builtin_exit(&args);
            }
            Some("cd") => {
                let target = line.trim_start()[2..].trim();
                self.last_status = self.builtin_cd(target);
                return ControlFlow::Continue(());
            }
            _ => {}
        }

        debug!("执行命令: {}", line);
        self.last_status = match spawn_line(line, self.config.max_args) {
            Ok(status) => status,
            Err(e) => {
                error!("无法启动命令: {}", e);
                eprintln!("{}", (self.theme.error_style)(format!("pipesh: {}", e)));
                1
            }
        };
        if self.last_status != 0 {
            debug!("命令退出码: {}", self.last_status);
            if self.interactive {
                eprintln!(
                    "{}",
                    (self.theme.status_style)(format!("[exit {}]", self.last_status))
                );
            }
        }
        ControlFlow::Continue(())
    }

    /// `exit [status]`，省略时使用上一条命令的退出码
    fn builtin_exit(&mut self, args: &[&str]) -> ControlFlow<i32> {
        match args {
            [] => ControlFlow::Break(self.last_status),
            [code] => match code.parse::<i32>() {
                Ok(code) => ControlFlow::Break(code),
                Err(_) => {
                    self.report_builtin_error(format!("exit: {}: numeric argument required", code));
                    ControlFlow::Continue(())
                }
            },
            _ => {
                self.report_builtin_error("exit: too many arguments".to_string());
                ControlFlow::Continue(())
            }
        }
    }

    fn report_builtin_error(&mut self, message: String) {
        warn!("{}", message);
        eprintln!("{}", (self.theme.error_style)(message));
        self.last_status = 2;
    }

    fn builtin_cd(&self, target: &str) -> i32 {
        let target = if target.is_empty() { "~" } else { target };
        let path = shellexpand::tilde(target);
        match std::env::set_current_dir(path.as_ref()) {
            Ok(()) => {
                debug!("切换目录: {}", path);
                0
            }
            Err(e) => {
                warn!("cd 失败: {}: {}", path, e);
                eprintln!(
                    "{}",
                    (self.theme.error_style)(format!("cd: {}: {}", target, e))
                );
                1
            }
        }
    }
}
