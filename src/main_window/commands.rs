#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Command {
    Toggle,
    Exit,
}
