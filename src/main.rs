use log::{debug, error};
use std::env;
use std::error::Error;
use std::process;

use pipesh::shell::executor::spawn_line;
use pipesh::shell::parser::parse_line;
use pipesh::shell::Shell;
use pipesh::utils::config::Config;
use pipesh::utils::log::init_logger;

const USAGE: &str = "usage: pipesh [-c LINE | --tree LINE]";

fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::new();
    init_logger(&config);
    debug!("配置加载成功 {}", config.config_dir.display());

    let Ok(args) = env::args_os()
        .skip(1)
        .map(|arg| arg.into_string())
        .collect::<Result<Vec<String>, _>>()
    else {
        eprintln!("pipesh: arguments must be valid UTF-8");
        eprintln!("{}", USAGE);
        process::exit(2);
    };

    match args.as_slice() {
        [] => {
            let mut shell = Shell::new(&config)?;
            let status = shell.run()?;
            process::exit(status);
        }
        [flag, line] if flag == "-c" => match spawn_line(line, config.max_args) {
            Ok(status) => process::exit(status),
            Err(e) => {
                error!("无法启动命令: {}", e);
                eprintln!("pipesh: {}", e);
                process::exit(1);
            }
        },
        // 只解析不执行，打印命令树
        [flag, line] if flag == "--tree" => match parse_line(line, config.max_args) {
            Ok(node) => {
                println!("{:#?}", node);
                Ok(())
            }
            Err(e) => {
                eprintln!("pipesh: {}", e);
                process::exit(1);
            }
        },
        _ => {
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    }
}
