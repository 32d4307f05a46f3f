use crate::utils::config::Config;
use log::debug;
pub use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::{Config as RLConfig, Editor};

/// 行读取。命令历史不在支持范围内，所以不加载也不记录历史
pub struct ReadlineManager {
    editor: Editor<(), FileHistory>,
}

impl ReadlineManager {
    pub fn new(config: &Config) -> Result<Self, ReadlineError> {
        let rl_config = RLConfig::builder()
            .auto_add_history(false)
            .edit_mode(config.get_edit_mode())
            .build();

        let editor = Editor::with_config(rl_config)?;
        debug!("readline 初始化完成");
        Ok(Self { editor })
    }

    pub fn readline(&mut self, prompt: &str) -> Result<String, ReadlineError> {
        self.editor.readline(prompt)
    }
}
