use colored::Colorize;

pub struct Theme {
    pub prompt: String,
    pub error_style: Box<dyn Fn(String) -> String>,
    pub status_style: Box<dyn Fn(String) -> String>,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            prompt: "$ ".bright_cyan().to_string(),
            error_style: Box::new(|s: String| s.bright_red().to_string()),
            status_style: Box::new(|s: String| s.yellow().to_string()),
        }
    }
}

impl Theme {
    pub fn load_theme(theme_name: &str) -> Theme {
        match theme_name {
            "dark" => Theme {
                prompt: "pipesh➤ ".bright_purple().to_string(),
                error_style: Box::new(|s: String| s.red().to_string()),
                status_style: Box::new(|s: String| s.magenta().to_string()),
            },
            "plain" => Theme {
                prompt: "$ ".to_string(),
                error_style: Box::new(|s: String| s),
                status_style: Box::new(|s: String| s),
            },
            _ => Theme::default(),
        }
    }
}
