use super::lexer::RedirectOp;

/// 一行输入解析出的命令树
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Command(Command),
    Redirect(Redirection),
    Pipeline(Pipeline),
}

/// 程序名加参数，没有重定向也没有管道
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    pub arguments: Vec<String>,
}

impl Command {
    pub fn new(arguments: Vec<String>) -> Self {
        Self { arguments }
    }

    pub fn program(&self) -> Option<&str> {
        self.arguments.first().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirection {
    pub operator: RedirectOp,
    pub filename: String,
    pub inner: Box<Node>,
}

impl Redirection {
    pub fn new(operator: RedirectOp, filename: String, inner: Node) -> Self {
        Self {
            operator,
            filename,
            inner: Box::new(inner),
        }
    }

    pub fn target_fd(&self) -> i32 {
        self.operator.target_fd()
    }
}

/// left 的标准输出接到 right 的标准输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub left: Box<Node>,
    pub right: Box<Node>,
}

impl Pipeline {
    pub fn new(left: Node, right: Node) -> Self {
        Self {
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

impl Node {
    /// 管道中的阶段数，单个命令为 1
    pub fn stages(&self) -> usize {
        match self {
            Node::Command(_) => 1,
            Node::Redirect(redirection) => redirection.inner.stages(),
            Node::Pipeline(pipeline) => pipeline.left.stages() + pipeline.right.stages(),
        }
    }
}
